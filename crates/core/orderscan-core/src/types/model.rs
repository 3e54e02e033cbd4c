//! Model and LLM types

use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Parameters for text generation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateTextParams {
    /// Input prompt
    pub prompt: String,

    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Temperature (0.0 - 2.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Specific model to use
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl GenerateTextParams {
    /// Params carrying only a prompt; the provider's configured defaults apply
    pub fn prompt(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }
}

/// A hosted language model that turns one prompt into one completion
///
/// Implementations own their client and credentials; callers only see text.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Provider name, for logs
    fn name(&self) -> &str;

    /// Complete one prompt
    async fn generate_text(&self, params: GenerateTextParams) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_text_params() {
        let params = GenerateTextParams::prompt("Hello");
        assert_eq!(params.prompt, "Hello");
        assert_eq!(params.max_tokens, None);
        assert_eq!(params.temperature, None);

        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json, serde_json::json!({ "prompt": "Hello" }));
    }

    #[tokio::test]
    async fn test_mock_model() {
        let mut model = MockLanguageModel::new();
        model.expect_name().return_const("mock".to_string());
        model
            .expect_generate_text()
            .times(1)
            .returning(|params| Ok(format!("echo: {}", params.prompt)));

        assert_eq!(model.name(), "mock");
        let out = model
            .generate_text(GenerateTextParams::prompt("ping"))
            .await
            .unwrap();
        assert_eq!(out, "echo: ping");
    }
}
