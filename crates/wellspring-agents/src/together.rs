use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use wellspring_common::{Error, Result};

use crate::providers::{
    ChatMessage, ChatRole, ContentBlock, LlmProvider, LlmRequest, LlmResponse, MessagePart, Usage,
};

pub const DEFAULT_BASE_URL: &str = "https://api.together.xyz/v1";

#[derive(Clone)]
pub struct TogetherProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl TogetherProvider {
    pub fn new(api_key: String, base_url: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        }
    }
}

#[async_trait]
impl LlmProvider for TogetherProvider {
    fn provider_id(&self) -> &str {
        "together"
    }

    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse> {
        let url = format!("{}/chat/completions", self.base_url);
        let wire_request = convert_request(request);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&wire_request)
            .send()
            .await
            .map_err(|e| Error::Agent(format!("Together request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::Agent(format!(
                "Together API error ({status}): {error_text}"
            )));
        }

        let wire_response: WireResponse = response
            .json()
            .await
            .map_err(|e| Error::Agent(format!("failed to parse Together response: {e}")))?;

        convert_response(wire_response)
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await;

        match response {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }
}

fn convert_request(request: &LlmRequest) -> WireRequest {
    let messages = request
        .messages
        .iter()
        .map(|msg| WireMessage {
            role: match msg.role {
                ChatRole::System => "system",
                ChatRole::User => "user",
                ChatRole::Assistant => "assistant",
            },
            content: match &msg.content {
                MessagePart::Text(text) => WireContent::Text(text.clone()),
                MessagePart::Parts(parts) => WireContent::Parts(
                    parts
                        .iter()
                        .map(|part| match part {
                            ContentBlock::Text { text } => {
                                WirePart::Text { text: text.clone() }
                            }
                            ContentBlock::ImageUrl { url } => WirePart::ImageUrl {
                                image_url: WireImageUrl { url: url.clone() },
                            },
                        })
                        .collect(),
                ),
            },
        })
        .collect();

    WireRequest {
        model: request.model.clone(),
        messages,
        temperature: request.temperature,
        max_tokens: request.max_tokens,
    }
}

fn convert_response(response: WireResponse) -> Result<LlmResponse> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| Error::Agent("no choices in response".to_string()))?;

    Ok(LlmResponse {
        content: normalize_content(choice.message.content),
        model: response.model,
        usage: response.usage.map(|u| Usage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        }),
        stop_reason: choice.finish_reason,
    })
}

/// Coerce whatever shape the provider sends back into the typed union.
/// Content may be a string, a list of tagged parts, a list of bare strings,
/// or absent entirely.
fn normalize_content(content: Option<serde_json::Value>) -> MessagePart {
    match content {
        None | Some(serde_json::Value::Null) => MessagePart::Text(String::new()),
        Some(serde_json::Value::String(text)) => MessagePart::Text(text),
        Some(serde_json::Value::Array(items)) => {
            let mut blocks = Vec::new();
            for item in items {
                match item {
                    serde_json::Value::String(text) => {
                        blocks.push(ContentBlock::Text { text });
                    }
                    other => {
                        if let Ok(block) = serde_json::from_value::<ContentBlock>(other) {
                            blocks.push(block);
                        }
                    }
                }
            }
            MessagePart::Parts(blocks)
        }
        Some(other) => MessagePart::Text(other.to_string()),
    }
}

// Wire types for the OpenAI-compatible chat completions endpoint.

#[derive(Serialize)]
struct WireRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct WireMessage {
    role: &'static str,
    content: WireContent,
}

#[derive(Serialize)]
#[serde(untagged)]
enum WireContent {
    Text(String),
    Parts(Vec<WirePart>),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WirePart {
    Text { text: String },
    ImageUrl { image_url: WireImageUrl },
}

#[derive(Serialize)]
struct WireImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct WireResponse {
    model: String,
    choices: Vec<WireChoice>,
    usage: Option<WireUsage>,
}

#[derive(Deserialize)]
struct WireChoice {
    message: WireResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct WireResponseMessage {
    content: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct WireUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalize_handles_bare_string_parts() {
        let content = normalize_content(Some(json!([
            {"type": "text", "text": "typed"},
            "bare",
        ])));
        assert_eq!(content.extract_text(), "typed\nbare");
    }

    #[test]
    fn normalize_absent_content_is_empty() {
        assert_eq!(normalize_content(None).extract_text(), "");
        assert_eq!(
            normalize_content(Some(serde_json::Value::Null)).extract_text(),
            ""
        );
    }

    #[test]
    fn image_parts_serialize_in_provider_format() {
        let request = LlmRequest {
            model: "m".to_string(),
            messages: vec![ChatMessage {
                role: ChatRole::User,
                content: MessagePart::Parts(vec![
                    ContentBlock::Text {
                        text: "look".to_string(),
                    },
                    ContentBlock::ImageUrl {
                        url: "data:image/jpeg;base64,abc".to_string(),
                    },
                ]),
            }],
            temperature: Some(0.2),
            max_tokens: Some(512),
        };
        let wire = serde_json::to_value(convert_request(&request)).unwrap();
        assert_eq!(
            wire["messages"][0]["content"][1],
            json!({"type": "image_url", "image_url": {"url": "data:image/jpeg;base64,abc"}})
        );
    }
}
