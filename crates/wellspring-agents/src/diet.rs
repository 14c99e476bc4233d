use tracing::warn;
use wellspring_common::Result;

use crate::gateway::LlmGateway;
use crate::parse::{looks_like_json, strip_wrapped_fence};
use crate::providers::ChatMessage;

const ANALYSIS_APOLOGY: &str = "Unable to analyze nutrition for this meal.";

const MEAL_ANALYST_PROMPT: &str = "You are a nutrition analyst. Given a meal description, identify foods, estimate portion sizes, and provide a rough calorie and macro breakdown. Format your response like this:\n\n\
The meal consists of [food items].\n\n\
To estimate the portion sizes and provide a rough calorie and macro breakdown, we can make the following assumptions:\n\n\
[List assumptions about portion sizes]\n\n\
Based on these assumptions, we can estimate the portion sizes as follows:\n\n\
[List estimated portions]\n\n\
To calculate the total calories, we can use the following approximate values:\n\n\
[List calorie estimates]\n\n\
Total calories: [X] calories\n\n\
To calculate the macros, we can use the following approximate values:\n\n\
[List macro estimates]";

const MEAL_NAME_PROMPT: &str = "You extract a concise food dish name from user-provided text. \
Output ONLY the dish name, with no extra words, no punctuation, no quotes, no emojis. \
Examples: '\"I had a grilled chicken salad\"' -> 'Grilled Chicken Salad'; \
'2 eggs, toast and coffee' -> 'Eggs and Toast'.";

/// Personalized diet advice. A reply wrapped in a code fence is reduced to
/// its inner text, and a bare JSON object gets a natural-language preface so
/// the chat surface never shows raw JSON as the primary message.
pub async fn get_diet_suggestion(
    gateway: &LlmGateway,
    model: &str,
    messages: Vec<ChatMessage>,
) -> Result<String> {
    let reply = gateway.complete_text(model, messages, 0.5, 512).await?;
    let mut content = strip_wrapped_fence(&reply);
    if looks_like_json(&content) {
        content = format!("Here is a concise suggestion based on your input:\n\n{content}");
    }
    Ok(content)
}

/// Nutritional analysis of a text meal description. Empty input and any
/// gateway failure both produce the fixed apology string; this function
/// never surfaces an error.
pub async fn analyze_meal_text(gateway: &LlmGateway, model: &str, meal_text: &str) -> String {
    if meal_text.trim().is_empty() {
        return ANALYSIS_APOLOGY.to_string();
    }

    let messages = vec![
        ChatMessage::system(MEAL_ANALYST_PROMPT),
        ChatMessage::user(format!(
            "Meal description: {meal_text}\nProvide nutritional analysis:"
        )),
    ];

    match gateway.complete_text(model, messages, 0.2, 512).await {
        Ok(reply) => reply.trim().to_string(),
        Err(e) => {
            warn!("meal analysis failed: {e}");
            ANALYSIS_APOLOGY.to_string()
        }
    }
}

/// Extract a concise dish name from free text. Empty input returns "Meal"
/// without a provider call. The model's answer is accepted only when it is
/// 1 to 80 characters after trimming whitespace and quotes; otherwise (or on
/// any error) the trimmed original text is returned verbatim.
pub async fn extract_meal_name(gateway: &LlmGateway, model: &str, meal_text: &str) -> String {
    if meal_text.trim().is_empty() {
        return "Meal".to_string();
    }

    let messages = vec![
        ChatMessage::system(MEAL_NAME_PROMPT),
        ChatMessage::user(format!("Text: {meal_text}\nDish name:")),
    ];

    if let Ok(reply) = gateway.complete_text(model, messages, 0.0, 32).await {
        let name = reply.trim().trim_matches(['"', '\'']).trim();
        if (1..=80).contains(&name.chars().count()) {
            return name.to_string();
        }
    }
    meal_text.trim().to_string()
}
