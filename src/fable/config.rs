// SPDX-License-Identifier: MIT

//! Runtime configuration
//!
//! Layering, lowest to highest precedence: built-in defaults, optional YAML
//! file, `FABLE_*` environment variables, CLI flags (applied by the binary).

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::error::ConfigError;
use crate::adk::model::GenerationConfig;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_STORE_DIR: &str = "stories";

/// System instructions for each model-backed step
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Prompts {
    pub storyteller: String,
    pub editor: String,
    pub title: String,
    pub moral: String,
}

impl Default for Prompts {
    fn default() -> Self {
        Self {
            storyteller: "You are a storyteller.".to_string(),
            editor: "You are an editor.".to_string(),
            title: "You generate a creative title for a story.".to_string(),
            moral: "You extract the central moral or theme of a story.".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FableConfig {
    /// Gemini model name
    pub model: String,
    /// Directory holding one JSON checkpoint per session
    pub store_dir: PathBuf,
    /// Run the local grammar pass after the initial draft
    pub grammar_pass: bool,
    pub generation: Option<GenerationConfig>,
    pub prompts: Prompts,
}

impl Default for FableConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            store_dir: PathBuf::from(DEFAULT_STORE_DIR),
            grammar_pass: false,
            generation: None,
            prompts: Prompts::default(),
        }
    }
}

impl FableConfig {
    /// Load defaults, then the YAML file if given, then process env overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::load_file(p)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse_yaml(&content)
    }

    pub fn parse_yaml(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Apply `FABLE_MODEL`, `FABLE_STORE_DIR` and `FABLE_GRAMMAR` overrides
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(model) = lookup("FABLE_MODEL").filter(|v| !v.is_empty()) {
            self.model = model;
        }
        if let Some(dir) = lookup("FABLE_STORE_DIR").filter(|v| !v.is_empty()) {
            self.store_dir = PathBuf::from(dir);
        }
        if let Some(flag) = lookup("FABLE_GRAMMAR") {
            self.grammar_pass = matches!(
                flag.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::Invalid("model must not be empty".into()));
        }
        let prompts = [
            ("storyteller", &self.prompts.storyteller),
            ("editor", &self.prompts.editor),
            ("title", &self.prompts.title),
            ("moral", &self.prompts.moral),
        ];
        for (name, text) in prompts {
            if text.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "prompts.{} must not be empty",
                    name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = FableConfig::default();
        assert_eq!(config.model, "gemini-2.5-flash");
        assert_eq!(config.store_dir, PathBuf::from("stories"));
        assert!(!config.grammar_pass);
        assert_eq!(config.prompts.editor, "You are an editor.");
    }

    #[test]
    fn test_parse_partial_yaml_keeps_defaults() {
        let yaml = r#"
model: gemini-2.0-flash
grammar_pass: true
prompts:
  storyteller: "You write bedtime stories for children."
generation:
  temperature: 0.9
  max_output_tokens: 2048
"#;
        let config = FableConfig::parse_yaml(yaml).unwrap();

        assert_eq!(config.model, "gemini-2.0-flash");
        assert!(config.grammar_pass);
        assert_eq!(
            config.prompts.storyteller,
            "You write bedtime stories for children."
        );
        assert_eq!(config.prompts.moral, Prompts::default().moral);
        assert_eq!(config.store_dir, PathBuf::from(DEFAULT_STORE_DIR));

        let generation = config.generation.unwrap();
        assert_eq!(generation.temperature, Some(0.9));
        assert_eq!(generation.max_output_tokens, Some(2048));
        assert_eq!(generation.top_p, None);
    }

    #[test]
    fn test_invalid_yaml_returns_error() {
        let yaml = "model:\n  - not a string\n";
        assert!(matches!(
            FableConfig::parse_yaml(yaml),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("FABLE_MODEL", "gemini-1.5-pro"),
            ("FABLE_STORE_DIR", "/tmp/fables"),
            ("FABLE_GRAMMAR", "TRUE"),
        ]
        .into_iter()
        .collect();

        let mut config = FableConfig::default();
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.model, "gemini-1.5-pro");
        assert_eq!(config.store_dir, PathBuf::from("/tmp/fables"));
        assert!(config.grammar_pass);
    }

    #[test]
    fn test_grammar_env_can_disable() {
        let mut config = FableConfig {
            grammar_pass: true,
            ..Default::default()
        };
        config.apply_env(|k| (k == "FABLE_GRAMMAR").then(|| "0".to_string()));
        assert!(!config.grammar_pass);
    }

    #[test]
    fn test_validate_rejects_blank_prompt() {
        let mut config = FableConfig::default();
        config.prompts.title = "  ".to_string();
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid configuration: prompts.title must not be empty"
        );
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = FableConfig::load_file(Path::new("/nonexistent/fable.yaml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/fable.yaml"));
    }
}
