use std::sync::Arc;

use tracing::debug;
use wellspring_common::{Error, Result};

use crate::providers::{ChatMessage, LlmProvider, LlmRequest};

/// Uniform call-and-normalize wrapper around a chat-completion provider.
/// One synchronous request per call; no caching, no retry, no streaming.
pub struct LlmGateway {
    provider: Arc<dyn LlmProvider>,
    api_key_present: bool,
}

impl LlmGateway {
    pub fn new(provider: Arc<dyn LlmProvider>, api_key: &str) -> Self {
        Self {
            provider,
            api_key_present: !api_key.trim().is_empty(),
        }
    }

    /// Issue one completion call and return the flattened text content.
    ///
    /// Fails fast with a configuration error when no API key was provided,
    /// before any network I/O. Absent response content yields an empty string.
    pub async fn complete_text(
        &self,
        model: &str,
        messages: Vec<ChatMessage>,
        temperature: f64,
        max_tokens: u32,
    ) -> Result<String> {
        if !self.api_key_present {
            return Err(Error::Config(
                "TOGETHER_API_KEY is missing. Create a .env file with \
                 TOGETHER_API_KEY=your_key_here or set it in the environment"
                    .to_string(),
            ));
        }

        let request = LlmRequest {
            model: model.to_string(),
            messages,
            temperature: Some(temperature),
            max_tokens: Some(max_tokens),
        };

        debug!(
            provider = self.provider.provider_id(),
            model, temperature, max_tokens, "dispatching completion request"
        );

        let response = self.provider.complete(&request).await?;
        Ok(response.content.extract_text())
    }

    pub async fn health_check(&self) -> Result<bool> {
        if !self.api_key_present {
            return Ok(false);
        }
        self.provider.health_check().await
    }
}
