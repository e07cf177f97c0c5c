// SPDX-License-Identifier: MIT

//! Story workflow executor
//!
//! Runs steps one at a time against an owned checkpoint until the workflow
//! suspends at the feedback gate or reaches `Done`. Nothing here touches
//! storage; the caller decides when a returned checkpoint is committed.

use std::sync::Arc;
use std::time::Instant;

use super::observer::{LoggingObserver, StepObserver};
use super::step::{gate, Checkpoint, GateDecision, Step, Transition};
use crate::adk::agent::{Agent, LLMAgent};
use crate::adk::model::{GenerationConfig, Model};
use crate::fable::config::Prompts;
use crate::fable::error::StoryError;
use crate::fable::grammar::GrammarCorrector;
use crate::fable::session::{SessionRecord, GRAMMAR_NOTE, INITIAL_DRAFT_NOTE, MAX_REVISIONS};

/// The story revision state machine
pub struct StoryWorkflow {
    storyteller: LLMAgent,
    editor: LLMAgent,
    title_writer: LLMAgent,
    moral_extractor: LLMAgent,
    grammar: Option<Arc<dyn GrammarCorrector>>,
    observer: Arc<dyn StepObserver>,
}

impl StoryWorkflow {
    pub fn new(model: Arc<dyn Model>, prompts: &Prompts) -> Self {
        Self {
            storyteller: LLMAgent::new("storyteller", &prompts.storyteller, model.clone()),
            editor: LLMAgent::new("editor", &prompts.editor, model.clone()),
            title_writer: LLMAgent::new("title_writer", &prompts.title, model.clone()),
            moral_extractor: LLMAgent::new("moral_extractor", &prompts.moral, model),
            grammar: None,
            observer: Arc::new(LoggingObserver),
        }
    }

    /// Apply the same generation settings to every model call
    pub fn with_generation_config(mut self, config: Option<GenerationConfig>) -> Self {
        self.storyteller = self.storyteller.with_config(config.clone());
        self.editor = self.editor.with_config(config.clone());
        self.title_writer = self.title_writer.with_config(config.clone());
        self.moral_extractor = self.moral_extractor.with_config(config);
        self
    }

    /// Enable the grammar pass after the initial draft
    pub fn with_grammar(mut self, grammar: Arc<dyn GrammarCorrector>) -> Self {
        self.grammar = Some(grammar);
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn StepObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Run a fresh session from `generate` up to the first suspension
    pub async fn start(&self, record: SessionRecord) -> Result<Checkpoint, StoryError> {
        self.run(Checkpoint::new(record), None).await
    }

    /// Feed caller input into a suspended checkpoint and run on
    pub async fn resume(
        &self,
        checkpoint: Checkpoint,
        input: &str,
    ) -> Result<Checkpoint, StoryError> {
        if !checkpoint.is_suspended() {
            return Err(StoryError::InvalidState {
                session_id: checkpoint.record.session_id.clone(),
                step: checkpoint.next,
            });
        }
        self.run(checkpoint, Some(input.to_string())).await
    }

    async fn run(
        &self,
        mut checkpoint: Checkpoint,
        mut input: Option<String>,
    ) -> Result<Checkpoint, StoryError> {
        while checkpoint.next != Step::Done {
            let step = checkpoint.next;
            let session_id = checkpoint.record.session_id.clone();

            self.observer.on_enter(&session_id, step);
            let started = Instant::now();
            let result = self
                .execute(step, &mut checkpoint.record, input.take())
                .await;
            self.observer
                .on_exit(&session_id, step, started.elapsed(), result.as_ref());

            match result? {
                Transition::Goto(next) => checkpoint.next = next,
                Transition::Suspend => return Ok(checkpoint),
            }
        }
        Ok(checkpoint)
    }

    /// Run one step. A failing step leaves `record` untouched.
    async fn execute(
        &self,
        step: Step,
        record: &mut SessionRecord,
        input: Option<String>,
    ) -> Result<Transition, StoryError> {
        match step {
            Step::Generate => {
                let story = self
                    .call(&self.storyteller, step, record.prompt.clone())
                    .await?;
                record.story = story;
                record.revision_count = 0;
                record.feedback = None;
                record.history = vec![INITIAL_DRAFT_NOTE.to_string()];

                if self.grammar.is_some() {
                    Ok(Transition::Goto(Step::Grammar))
                } else {
                    Ok(Transition::Goto(Step::HumanFeedback))
                }
            }
            Step::Grammar => {
                if let Some(grammar) = &self.grammar {
                    let corrected = grammar
                        .correct(&record.story)
                        .await
                        .map_err(|e| StoryError::external(step, e))?;
                    if let Some(text) = corrected.filter(|t| *t != record.story) {
                        record.story = text;
                        record.history.push(GRAMMAR_NOTE.to_string());
                    }
                }
                Ok(Transition::Goto(Step::HumanFeedback))
            }
            Step::HumanFeedback => match gate(record.revision_count, input.as_deref())? {
                GateDecision::Suspend => Ok(Transition::Suspend),
                GateDecision::Title => Ok(Transition::Goto(Step::Title)),
                GateDecision::Revise(feedback) => {
                    record.feedback = Some(feedback);
                    Ok(Transition::Goto(Step::Revise))
                }
            },
            Step::Revise => {
                if record.revision_count >= MAX_REVISIONS {
                    return Ok(Transition::Goto(Step::Title));
                }
                let feedback = match record.feedback.clone() {
                    Some(feedback) => feedback,
                    None => return Err(StoryError::invalid_state(&record.session_id, step)),
                };
                let request = format!("Feedback: {}\n\nStory: {}", feedback, record.story);
                let story = self.call(&self.editor, step, request).await?;

                record.story = story;
                record.revision_count += 1;
                record
                    .history
                    .push(SessionRecord::revision_note(record.revision_count));
                Ok(Transition::Goto(Step::HumanFeedback))
            }
            Step::Title => {
                let title = self
                    .call(&self.title_writer, step, record.story.clone())
                    .await?;
                let title = title.trim().to_string();
                record.history.push(SessionRecord::title_note(&title));
                if record.title.is_none() {
                    record.title = Some(title);
                }
                Ok(Transition::Goto(Step::Moral))
            }
            Step::Moral => {
                let moral = self
                    .call(&self.moral_extractor, step, record.story.clone())
                    .await?;
                let moral = moral.trim().to_string();
                record.history.push(SessionRecord::moral_note(&moral));
                if record.moral.is_none() {
                    record.moral = Some(moral);
                }
                Ok(Transition::Goto(Step::Done))
            }
            Step::Done => Ok(Transition::Goto(Step::Done)),
        }
    }

    async fn call(
        &self,
        agent: &LLMAgent,
        step: Step,
        input: String,
    ) -> Result<String, StoryError> {
        agent
            .run(input)
            .await
            .map_err(|e| StoryError::external(step, e))
    }
}
