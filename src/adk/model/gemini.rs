// SPDX-License-Identifier: MIT

//! Gemini Model - Google's Gemini API implementation

use super::{Content, GenerationConfig, Model, Part};
use crate::adk::error::ModelError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::env;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Google Gemini model implementation
pub struct GeminiModel {
    client: Client,
    api_key: String,
    model_name: String,
    base_url: String,
}

impl GeminiModel {
    /// Create a new GeminiModel
    ///
    /// Requires `GOOGLE_API_KEY` environment variable to be set.
    /// Optionally uses `GEMINI_BASE_URL` for custom endpoints.
    pub fn new(model_name: impl Into<String>) -> Result<Self, ModelError> {
        let api_key =
            env::var("GOOGLE_API_KEY").map_err(|_| ModelError::ApiKeyMissing("Gemini".into()))?;
        let base_url = env::var("GEMINI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Ok(Self::with_key(model_name, api_key, base_url))
    }

    pub fn with_key(
        model_name: impl Into<String>,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model_name: model_name.into(),
            base_url: base_url.into(),
        }
    }
}

/// Build the `generateContent` request body.
///
/// System turns are lifted into `systemInstruction`; Gemini only accepts
/// `user` and `model` roles inside `contents`.
pub fn build_request_body(history: &[Content], config: Option<&GenerationConfig>) -> Value {
    let mut system_texts = Vec::new();
    let mut contents = Vec::new();

    for c in history {
        if c.role == "system" {
            system_texts.push(c.text());
            continue;
        }
        let parts: Vec<Value> = c.parts.iter().filter_map(part_to_gemini_json).collect();
        let role = if c.role == "model" { "model" } else { "user" };
        contents.push(json!({ "role": role, "parts": parts }));
    }

    let mut body = json!({ "contents": contents });

    if !system_texts.is_empty() {
        body["systemInstruction"] = json!({ "parts": [{ "text": system_texts.join("\n\n") }] });
    }

    if let Some(cfg) = config.filter(|c| !c.is_empty()) {
        let mut fields = serde_json::Map::new();
        if let Some(t) = cfg.temperature {
            fields.insert("temperature".into(), json!(t));
        }
        if let Some(m) = cfg.max_output_tokens {
            fields.insert("maxOutputTokens".into(), json!(m));
        }
        if let Some(p) = cfg.top_p {
            fields.insert("topP".into(), json!(p));
        }
        if let Some(k) = cfg.top_k {
            fields.insert("topK".into(), json!(k));
        }
        body["generationConfig"] = Value::Object(fields);
    }

    body
}

/// Serialize a Part to Gemini API JSON format
/// Returns None for parts that shouldn't be sent (e.g., Thinking)
pub fn part_to_gemini_json(part: &Part) -> Option<Value> {
    match part {
        Part::Text(t) => Some(json!({ "text": t })),
        Part::Thinking(_) => None, // Thinking is internal, not sent to API
    }
}

/// Parse a Gemini API JSON part into parts
pub fn parse_gemini_part(p: &Value) -> Vec<Part> {
    let mut parts = Vec::new();

    // Thinking models flag reasoning parts with `"thought": true`
    if p.get("thought").and_then(|t| t.as_bool()) == Some(true) {
        if let Some(text) = p["text"].as_str() {
            parts.push(Part::Thinking(text.to_string()));
        }
        return parts;
    }

    if let Some(text) = p["text"].as_str() {
        parts.push(Part::Text(text.to_string()));
    }

    parts
}

/// Parse a full `generateContent` response into a model turn
pub fn parse_response(resp_json: &Value) -> Result<Content, ModelError> {
    let candidate = resp_json["candidates"]
        .as_array()
        .and_then(|c| c.first())
        .ok_or_else(|| {
            // A prompt rejected outright carries promptFeedback instead of candidates
            match resp_json["promptFeedback"]["blockReason"].as_str() {
                Some(reason) => ModelError::Blocked(reason.to_string()),
                None => ModelError::invalid("No candidates in response"),
            }
        })?;

    if let Some(finish_reason) = candidate.get("finishReason").and_then(|v| v.as_str()) {
        log::debug!("Gemini finish reason: {}", finish_reason);
        if matches!(finish_reason, "SAFETY" | "RECITATION" | "BLOCKLIST") {
            return Err(ModelError::Blocked(finish_reason.to_string()));
        }
    }

    let parts_json = candidate["content"]["parts"].as_array().ok_or_else(|| {
        log::error!("No parts in candidate: {}", candidate);
        ModelError::invalid(format!("No content parts in candidate: {}", candidate))
    })?;

    let parts: Vec<Part> = parts_json.iter().flat_map(parse_gemini_part).collect();

    Ok(Content {
        role: "model".to_string(),
        parts,
    })
}

#[async_trait]
impl Model for GeminiModel {
    async fn generate_content(
        &self,
        history: &[Content],
        config: Option<&GenerationConfig>,
    ) -> Result<Content, ModelError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model_name, self.api_key
        );

        let body = build_request_body(history, config);

        log::debug!(
            "Gemini request body: {}",
            serde_json::to_string_pretty(&body).unwrap_or_default()
        );

        let resp = self.client.post(&url).json(&body).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await?;
            return Err(ModelError::api("Gemini", status.as_u16(), text));
        }

        let resp_json: Value = resp.json().await?;
        log::debug!("Gemini response: {}", resp_json);

        parse_response(&resp_json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_system_turn_becomes_system_instruction() {
        let history = [
            Content::system("You are a storyteller."),
            Content::user("a dragon and a coin"),
        ];
        let body = build_request_body(&history, None);

        assert_eq!(
            body["systemInstruction"]["parts"][0]["text"],
            "You are a storyteller."
        );
        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 1);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[0]["parts"][0]["text"], "a dragon and a coin");
        assert!(body.get("generationConfig").is_none());
    }

    #[test]
    fn test_generation_config_serialized_in_camel_case() {
        let cfg = GenerationConfig {
            temperature: Some(0.5),
            max_output_tokens: Some(512),
            top_p: None,
            top_k: Some(40),
        };
        let body = build_request_body(&[Content::user("hi")], Some(&cfg));

        assert_eq!(body["generationConfig"]["temperature"], json!(0.5));
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 512);
        assert_eq!(body["generationConfig"]["topK"], 40);
        assert!(body["generationConfig"].get("topP").is_none());
    }

    #[test]
    fn test_serialize_thinking_part_returns_none() {
        let part = Part::Thinking("Internal reasoning".to_string());
        assert!(part_to_gemini_json(&part).is_none());
    }

    #[test]
    fn test_parse_thought_part() {
        let json = json!({ "text": "Let me think...", "thought": true });
        let parts = parse_gemini_part(&json);

        assert_eq!(parts, vec![Part::Thinking("Let me think...".to_string())]);
    }

    #[test]
    fn test_parse_response_text() {
        let resp = json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "Once upon a time" }] },
                "finishReason": "STOP"
            }]
        });
        let content = parse_response(&resp).unwrap();
        assert_eq!(content.text(), "Once upon a time");
    }

    #[test]
    fn test_parse_response_safety_block() {
        let resp = json!({
            "candidates": [{ "finishReason": "SAFETY" }]
        });
        match parse_response(&resp) {
            Err(ModelError::Blocked(reason)) => assert_eq!(reason, "SAFETY"),
            other => panic!("Expected Blocked, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_response_prompt_blocked() {
        let resp = json!({ "promptFeedback": { "blockReason": "OTHER" } });
        assert!(matches!(
            parse_response(&resp),
            Err(ModelError::Blocked(r)) if r == "OTHER"
        ));
    }

    #[test]
    fn test_parse_response_without_candidates() {
        let resp = json!({});
        assert!(matches!(
            parse_response(&resp),
            Err(ModelError::InvalidResponse(_))
        ));
    }
}
