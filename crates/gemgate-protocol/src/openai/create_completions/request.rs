use serde::{Deserialize, Serialize};

pub const DEFAULT_LEGACY_MODEL: &str = "gpt-3.5-turbo";

/// Body of the legacy `POST /v1/completions` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CreateCompletionRequestBody {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub prompt: CompletionPrompt,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

fn default_model() -> String {
    DEFAULT_LEGACY_MODEL.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CompletionPrompt {
    Single(String),
    Many(Vec<String>),
}

impl Default for CompletionPrompt {
    fn default() -> Self {
        CompletionPrompt::Single(String::new())
    }
}

impl CompletionPrompt {
    pub fn into_text(self) -> String {
        match self {
            CompletionPrompt::Single(text) => text,
            CompletionPrompt::Many(lines) => lines.join("\n"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_uses_defaults() {
        let body: CreateCompletionRequestBody =
            serde_json::from_str("{}").expect("empty body should parse");
        assert_eq!(body.model, DEFAULT_LEGACY_MODEL);
        assert_eq!(body.prompt, CompletionPrompt::Single(String::new()));
        assert_eq!(body.stream, None);
    }

    #[test]
    fn prompt_array_joins_with_newlines() {
        let body: CreateCompletionRequestBody =
            serde_json::from_value(serde_json::json!({"prompt": ["a", "b"]}))
                .expect("body should parse");
        assert_eq!(body.prompt.into_text(), "a\nb");
    }
}
