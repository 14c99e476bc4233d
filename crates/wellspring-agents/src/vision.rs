use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use tracing::warn;

use crate::gateway::LlmGateway;
use crate::parse::text_before_first_fence;
use crate::providers::{ChatMessage, ChatRole, ContentBlock, MessagePart};

const VISION_PROMPT: &str = "You are a nutrition analyst. Given a meal photo, identify foods, \
estimate portion sizes, and provide a rough calorie and macro breakdown in JSON with keys: \
items (list of {name, grams, calories}), total_calories, macros {protein_g, carbs_g, fat_g}.";

/// Outcome of an image analysis. Failures (missing credential, unreadable
/// file, provider error) travel in the `Error` variant instead of a
/// `Result`, so the dispatcher can turn them into a chat reply.
#[derive(Debug, Clone)]
pub enum VisionAnalysis {
    Raw(String),
    Error(String),
}

/// Analyze a meal photo: the file is inlined as a base64 data URL in one
/// multimodal request. The reply keeps only the text before the first code
/// fence and drops any literal "JSON Output:" marker the model echoes.
pub async fn analyze_meal_image(
    gateway: &LlmGateway,
    model: &str,
    image_path: &Path,
) -> VisionAnalysis {
    let bytes = match std::fs::read(image_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("failed to read meal image {}: {e}", image_path.display());
            return VisionAnalysis::Error(format!("Failed to analyze image: {e}"));
        }
    };
    let data_url = format!("data:image/jpeg;base64,{}", BASE64.encode(bytes));

    let messages = vec![ChatMessage {
        role: ChatRole::User,
        content: MessagePart::Parts(vec![
            ContentBlock::Text {
                text: VISION_PROMPT.to_string(),
            },
            ContentBlock::ImageUrl { url: data_url },
        ]),
    }];

    match gateway.complete_text(model, messages, 0.2, 512).await {
        Ok(reply) => {
            let mut text = text_before_first_fence(&reply);
            for marker in ["JSON Output:", "JSON output:"] {
                text = text.replace(marker, "").trim().to_string();
            }
            VisionAnalysis::Raw(text)
        }
        Err(e) => {
            warn!("vision analysis failed: {e}");
            VisionAnalysis::Error(e.to_string())
        }
    }
}
