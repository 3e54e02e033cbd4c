//! OpenAI chat completion backend for OrderScan

#![warn(missing_docs)]
#![warn(clippy::all)]

mod settings;

pub use settings::{print_settings, render_settings, settings_rows, SettingRow};

use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use orderscan_core::{GenerateTextParams, LanguageModel, ModelConfig, OrderScanError, Result};
use std::time::{Duration, Instant};
use tracing::debug;

/// [`LanguageModel`] backed by the OpenAI chat completions API
///
/// One request per prompt, no streaming. The client is built once from a
/// [`ModelConfig`] and reused for every call.
pub struct OpenAIModel {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl OpenAIModel {
    /// Build the client from configuration
    pub fn new(config: &ModelConfig) -> Result<Self> {
        let mut openai_config = OpenAIConfig::new().with_api_key(config.api_key.clone());
        if let Some(base) = &config.api_base {
            openai_config = openai_config.with_api_base(base.trim_end_matches('/'));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| OrderScanError::config(format!("failed to build HTTP client: {}", e)))?;

        debug!("Initializing OpenAI client for model {}", config.model);
        Ok(Self {
            client: Client::with_config(openai_config).with_http_client(http),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    /// Configured default model
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LanguageModel for OpenAIModel {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate_text(&self, params: GenerateTextParams) -> Result<String> {
        let start_time = Instant::now();
        let model = params.model.unwrap_or_else(|| self.model.clone());

        let mut request_builder = CreateChatCompletionRequestArgs::default();
        request_builder.model(model.clone());
        request_builder.messages(vec![ChatCompletionRequestMessage::User(
            ChatCompletionRequestUserMessageArgs::default()
                .content(params.prompt)
                .build()
                .map_err(|e| OrderScanError::model(e.to_string()))?,
        )]);
        request_builder.temperature(params.temperature.unwrap_or(self.temperature));
        if let Some(max_tokens) = params.max_tokens.or(self.max_tokens) {
            request_builder.max_tokens(max_tokens);
        }

        let request = request_builder
            .build()
            .map_err(|e| OrderScanError::model(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| OrderScanError::model(e.to_string()))?;

        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| OrderScanError::model("completion contained no text"))?;

        debug!(
            "MODEL_CALL provider=openai model={} chars={} latency_ms={}",
            model,
            text.chars().count(),
            start_time.elapsed().as_millis()
        );
        Ok(text)
    }
}
