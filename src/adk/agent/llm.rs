// SPDX-License-Identifier: MIT

//! LLM Agent - sends one instruction + input pair to a model and returns its text

use super::Agent;
use crate::adk::error::ModelError;
use crate::adk::model::{Content, GenerationConfig, Model};
use async_trait::async_trait;
use std::sync::Arc;

/// Single-turn LLM agent
pub struct LLMAgent {
    pub name: String,
    pub instruction: String,
    pub model: Arc<dyn Model>,
    pub config: Option<GenerationConfig>,
}

impl LLMAgent {
    pub fn new(
        name: impl Into<String>,
        instruction: impl Into<String>,
        model: Arc<dyn Model>,
    ) -> Self {
        Self {
            name: name.into(),
            instruction: instruction.into(),
            model,
            config: None,
        }
    }

    pub fn with_config(mut self, config: Option<GenerationConfig>) -> Self {
        self.config = config;
        self
    }
}

#[async_trait]
impl Agent for LLMAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, input: String) -> Result<String, ModelError> {
        let history = [
            Content::system(self.instruction.clone()),
            Content::user(input),
        ];

        let response = self
            .model
            .generate_content(&history, self.config.as_ref())
            .await?;

        let text = response.text();
        if text.trim().is_empty() {
            log::warn!("Agent {} received an empty response", self.name);
            return Err(ModelError::invalid(format!(
                "Agent {} received no text from the model",
                self.name
            )));
        }

        log::info!(
            "Agent {} returning text response (length: {})",
            self.name,
            text.len()
        );
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records the history it was called with and echoes a fixed reply
    struct RecordingModel {
        reply: String,
        seen: Mutex<Vec<Content>>,
    }

    #[async_trait]
    impl Model for RecordingModel {
        async fn generate_content(
            &self,
            history: &[Content],
            _config: Option<&GenerationConfig>,
        ) -> Result<Content, ModelError> {
            self.seen.lock().unwrap().extend_from_slice(history);
            Ok(Content::model(self.reply.clone()))
        }
    }

    #[tokio::test]
    async fn test_llm_agent_sends_instruction_and_input() {
        let model = Arc::new(RecordingModel {
            reply: "A tale".to_string(),
            seen: Mutex::new(vec![]),
        });
        let agent = LLMAgent::new("storyteller", "You are a storyteller.", model.clone());

        let out = agent.run("a dragon".to_string()).await.unwrap();
        assert_eq!(out, "A tale");

        let seen = model.seen.lock().unwrap();
        assert_eq!(seen[0], Content::system("You are a storyteller."));
        assert_eq!(seen[1], Content::user("a dragon"));
    }

    #[tokio::test]
    async fn test_llm_agent_rejects_empty_reply() {
        let model = Arc::new(RecordingModel {
            reply: "   ".to_string(),
            seen: Mutex::new(vec![]),
        });
        let agent = LLMAgent::new("editor", "You are an editor.", model);

        let err = agent.run("fix it".to_string()).await.unwrap_err();
        assert!(matches!(err, ModelError::InvalidResponse(_)));
    }
}
