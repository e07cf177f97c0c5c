// SPDX-License-Identifier: MIT

//! Session record and the caller-facing view of it

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Hard cap on feedback-driven revisions
pub const MAX_REVISIONS: u32 = 3;

pub const INITIAL_DRAFT_NOTE: &str = "Initial draft generated.";
pub const GRAMMAR_NOTE: &str = "Grammar and spelling improved locally.";
pub const FEEDBACK_REQUEST: &str = "Please provide feedback or type 'done'";
pub const FINALIZED_MESSAGE: &str = "Story finalized!";

const TITLE_PREFIX: &str = "Title: ";
const MORAL_PREFIX: &str = "Moral: ";

/// All data carried between workflow steps for one session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionRecord {
    pub session_id: String,
    pub prompt: String,
    #[serde(default)]
    pub story: String,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default)]
    pub revision_count: u32,
    #[serde(default)]
    pub history: Vec<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub moral: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn new(session_id: impl Into<String>, prompt: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.into(),
            prompt: prompt.into(),
            story: String::new(),
            feedback: None,
            revision_count: 0,
            history: Vec::new(),
            title: None,
            moral: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn title_note(title: &str) -> String {
        format!("{}{}", TITLE_PREFIX, title)
    }

    pub fn moral_note(moral: &str) -> String {
        format!("{}{}", MORAL_PREFIX, moral)
    }

    pub fn revision_note(revision: u32) -> String {
        format!("Revision {} applied.", revision)
    }

    /// Stored title, else the first `Title: ` marker in history
    pub fn resolved_title(&self) -> Option<String> {
        self.title
            .clone()
            .or_else(|| marker_value(&self.history, TITLE_PREFIX))
    }

    /// Stored moral, else the first `Moral: ` marker in history
    pub fn resolved_moral(&self) -> Option<String> {
        self.moral
            .clone()
            .or_else(|| marker_value(&self.history, MORAL_PREFIX))
    }
}

fn marker_value(history: &[String], prefix: &str) -> Option<String> {
    history
        .iter()
        .find_map(|entry| entry.strip_prefix(prefix))
        .map(str::to_string)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    AwaitingFeedback,
    Completed,
}

/// Snapshot of a session returned by every service operation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionView {
    pub session_id: String,
    pub story: String,
    pub title: Option<String>,
    pub moral: Option<String>,
    pub revision_count: u32,
    pub history: Vec<String>,
    pub requires_feedback: bool,
    pub is_complete: bool,
    pub status: SessionStatus,
    pub message: String,
}

impl SessionView {
    pub fn from_record(record: &SessionRecord, requires_feedback: bool) -> Self {
        let (status, message) = if requires_feedback {
            (SessionStatus::AwaitingFeedback, FEEDBACK_REQUEST)
        } else {
            (SessionStatus::Completed, FINALIZED_MESSAGE)
        };

        Self {
            session_id: record.session_id.clone(),
            story: record.story.clone(),
            title: record.resolved_title(),
            moral: record.resolved_moral(),
            revision_count: record.revision_count,
            history: record.history.clone(),
            requires_feedback,
            is_complete: !requires_feedback,
            status,
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_is_empty() {
        let record = SessionRecord::new("s1", "a dragon and a coin");
        assert_eq!(record.revision_count, 0);
        assert!(record.history.is_empty());
        assert!(record.title.is_none());
        assert!(record.feedback.is_none());
    }

    #[test]
    fn test_title_falls_back_to_history_marker() {
        let mut record = SessionRecord::new("s1", "p");
        record.history = vec![
            INITIAL_DRAFT_NOTE.to_string(),
            SessionRecord::title_note("The Dragon's Coin"),
            SessionRecord::moral_note("Greed costs more than gold."),
        ];

        assert_eq!(
            record.resolved_title().as_deref(),
            Some("The Dragon's Coin")
        );
        assert_eq!(
            record.resolved_moral().as_deref(),
            Some("Greed costs more than gold.")
        );
    }

    #[test]
    fn test_stored_title_wins_over_history() {
        let mut record = SessionRecord::new("s1", "p");
        record.title = Some("Stored".to_string());
        record.history = vec![SessionRecord::title_note("From history")];

        assert_eq!(record.resolved_title().as_deref(), Some("Stored"));
    }

    #[test]
    fn test_view_status_and_message() {
        let record = SessionRecord::new("s1", "p");

        let waiting = SessionView::from_record(&record, true);
        assert_eq!(waiting.status, SessionStatus::AwaitingFeedback);
        assert!(!waiting.is_complete);
        assert_eq!(waiting.message, FEEDBACK_REQUEST);

        let done = SessionView::from_record(&record, false);
        assert_eq!(done.status, SessionStatus::Completed);
        assert!(done.is_complete);
        assert_eq!(done.message, FINALIZED_MESSAGE);
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&SessionStatus::AwaitingFeedback).unwrap();
        assert_eq!(json, "\"awaiting_feedback\"");
    }
}
