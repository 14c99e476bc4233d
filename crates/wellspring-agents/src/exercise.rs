use wellspring_common::Result;

use crate::gateway::LlmGateway;
use crate::providers::ChatMessage;

/// Exercise recommendations from a prepared message list.
pub async fn get_exercise_plan(
    gateway: &LlmGateway,
    model: &str,
    messages: Vec<ChatMessage>,
) -> Result<String> {
    gateway.complete_text(model, messages, 0.5, 512).await
}
