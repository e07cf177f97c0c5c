// SPDX-License-Identifier: MIT

//! Typed error handling for the story workflow
//!
//! `StoryError` is what callers of the service see. Store and config failures
//! have their own enums and convert into it.

use thiserror::Error;

use super::workflow::Step;

/// Top-level error type for story sessions
#[derive(Debug, Error)]
pub enum StoryError {
    /// Unknown session id on resume/get
    #[error("Session '{0}' not found")]
    SessionNotFound(String),

    /// The text-generation or grammar collaborator failed during a step
    #[error("External call failed during {step}: {source}")]
    ExternalCallFailure {
        step: Step,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Resume attempted on a session that is not suspended at the feedback gate
    #[error("Session '{session_id}' is not awaiting feedback (next step: {step})")]
    InvalidState { session_id: String, step: Step },

    #[error("Prompt must not be empty")]
    EmptyPrompt,

    #[error("Feedback must not be empty; type 'done' to finish")]
    EmptyFeedback,

    /// Caller-supplied session ids must be filesystem and URL safe
    #[error("Invalid session id '{0}': use letters, digits, '-' or '_' (max 128 chars)")]
    InvalidSessionId(String),

    #[error("Session '{0}' already exists")]
    SessionExists(String),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl StoryError {
    pub fn invalid_state(session_id: impl Into<String>, step: Step) -> Self {
        Self::InvalidState {
            session_id: session_id.into(),
            step,
        }
    }

    /// Wrap a collaborator failure with the step it happened in
    pub fn external(
        step: Step,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::ExternalCallFailure {
            step,
            source: source.into(),
        }
    }
}

/// Checkpoint persistence errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
