use wellspring_common::Result;

use crate::gateway::LlmGateway;
use crate::providers::ChatMessage;

/// Supportive mental-health conversation from a prepared message list.
pub async fn get_mental_health_response(
    gateway: &LlmGateway,
    model: &str,
    messages: Vec<ChatMessage>,
) -> Result<String> {
    gateway.complete_text(model, messages, 0.6, 512).await
}

/// Condense a conversation into a short factual bullet list for storage as
/// a memory.
pub async fn summarize_messages(
    gateway: &LlmGateway,
    model: &str,
    messages: Vec<ChatMessage>,
) -> Result<String> {
    let mut with_system = vec![ChatMessage::system(
        "Summarize the following conversation into a short, factual bullet list \
         with key events, needs, and action items.",
    )];
    with_system.extend(messages);
    gateway.complete_text(model, with_system, 0.2, 256).await
}
