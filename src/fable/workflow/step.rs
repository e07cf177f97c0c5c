// SPDX-License-Identifier: MIT

//! Workflow steps, the feedback gate decision and the persisted checkpoint

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::fable::error::StoryError;
use crate::fable::session::{SessionRecord, SessionView, MAX_REVISIONS};

/// Named steps of the story revision workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Generate,
    Grammar,
    HumanFeedback,
    Revise,
    Title,
    Moral,
    Done,
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Generate => "generate",
            Step::Grammar => "grammar",
            Step::HumanFeedback => "human_feedback",
            Step::Revise => "revise",
            Step::Title => "title",
            Step::Moral => "moral",
            Step::Done => "done",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a step asks the orchestrator to do next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Goto(Step),
    /// Stop and hand control back to the caller
    Suspend,
}

/// Outcome of the human-feedback gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Suspend,
    Title,
    Revise(String),
}

/// Decide what the feedback gate does.
///
/// `input` is `None` when the gate is entered from a previous step and
/// `Some` when the caller resumes a suspended session with feedback.
pub fn gate(revision_count: u32, input: Option<&str>) -> Result<GateDecision, StoryError> {
    if revision_count >= MAX_REVISIONS {
        return Ok(GateDecision::Title);
    }

    match input {
        None => Ok(GateDecision::Suspend),
        Some(text) if text.trim().eq_ignore_ascii_case("done") => Ok(GateDecision::Title),
        Some(text) if text.trim().is_empty() => Err(StoryError::EmptyFeedback),
        Some(text) => Ok(GateDecision::Revise(text.to_string())),
    }
}

/// Session record plus the pointer to the step that runs next.
///
/// Committed checkpoints only ever point at `HumanFeedback` (suspended) or
/// `Done` (complete).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Checkpoint {
    pub record: SessionRecord,
    pub next: Step,
}

impl Checkpoint {
    pub fn new(record: SessionRecord) -> Self {
        Self {
            record,
            next: Step::Generate,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.record.session_id
    }

    pub fn is_suspended(&self) -> bool {
        self.next == Step::HumanFeedback
    }

    pub fn is_complete(&self) -> bool {
        self.next == Step::Done
    }

    pub fn view(&self) -> SessionView {
        SessionView::from_record(&self.record, self.is_suspended())
    }
}
