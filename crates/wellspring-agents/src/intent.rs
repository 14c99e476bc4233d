use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use crate::gateway::LlmGateway;
use crate::parse::extract_json_object;
use crate::providers::ChatMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    DietAnalysis,
    DietSuggestion,
    ExercisePlan,
    MentalHealth,
    ReportGeneration,
    GeneralChat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentClassification {
    pub intent: Intent,
    pub confidence: f64,
    pub parameters: Value,
}

const CLASSIFIER_PROMPT: &str = "You are an intent classifier for a wellness assistant. Analyze the user's message and classify their intent into one of these categories:

1. DIET_ANALYSIS - User wants to analyze food/nutrition (e.g., \"analyze this food\", \"what's in this meal\", \"check nutrition\")
2. DIET_SUGGESTION - User wants diet advice (e.g., \"what should I eat\", \"meal suggestions\", \"diet plan\")
3. EXERCISE_PLAN - User wants exercise advice (e.g., \"workout plan\", \"exercise routine\", \"fitness advice\")
4. MENTAL_HEALTH - User wants mental health support (e.g., \"I'm stressed\", \"feeling anxious\", \"mental health advice\")
5. REPORT_GENERATION - User wants a report (e.g., \"generate report\", \"show my progress\", \"dashboard\")
6. GENERAL_CHAT - General conversation or unclear intent

Also extract any relevant parameters like:
- food_image: if user mentions analyzing an image
- meal_description: if user describes a meal
- exercise_type: if user mentions specific exercise
- mood: if user mentions their emotional state

Respond with JSON only:
{
    \"intent\": \"INTENT_TYPE\",
    \"confidence\": 0.0-1.0,
    \"parameters\": {
        \"food_image\": boolean,
        \"meal_description\": string or null,
        \"exercise_type\": string or null,
        \"mood\": string or null
    }
}";

const DIET_TERMS: [&str; 5] = ["food", "meal", "nutrition", "calories", "diet"];
const EXERCISE_TERMS: [&str; 4] = ["exercise", "workout", "fitness", "training"];
const MENTAL_TERMS: [&str; 5] = ["stress", "anxiety", "mood", "mental", "feel"];
const REPORT_TERMS: [&str; 4] = ["report", "progress", "dashboard", "summary"];

/// Classify a user message into one of the six intents. Total: a provider
/// error or an unparseable reply falls through to the keyword heuristic, so
/// the caller always gets a well-formed classification.
pub async fn classify_user_intent(
    gateway: &LlmGateway,
    model: &str,
    user_message: &str,
) -> IntentClassification {
    let messages = vec![
        ChatMessage::system(CLASSIFIER_PROMPT),
        ChatMessage::user(user_message),
    ];

    match gateway.complete_text(model, messages, 0.1, 256).await {
        Ok(reply) => match parse_classification(&reply) {
            Some(classification) => classification,
            None => {
                debug!("classifier reply had no usable JSON, using keyword fallback");
                keyword_fallback(user_message, 0.7)
            }
        },
        Err(e) => {
            debug!("classifier call failed ({e}), using keyword fallback");
            keyword_fallback(user_message, 0.6)
        }
    }
}

fn parse_classification(reply: &str) -> Option<IntentClassification> {
    let raw = extract_json_object(reply)?;
    let parsed: Value = serde_json::from_str(raw).ok()?;

    let intent: Intent = serde_json::from_value(parsed.get("intent")?.clone()).ok()?;
    let confidence = parsed
        .get("confidence")
        .and_then(Value::as_f64)
        .unwrap_or(0.5)
        .clamp(0.0, 1.0);
    let parameters = match parsed.get("parameters") {
        Some(value @ Value::Object(_)) => value.clone(),
        _ => json!({}),
    };

    Some(IntentClassification {
        intent,
        confidence,
        parameters,
    })
}

/// Deterministic keyword scan over the lowercased message. Check order is
/// fixed: diet, exercise, mental health, report, then general chat at 0.5.
/// Diet terms map to DIET_SUGGESTION.
fn keyword_fallback(user_message: &str, confidence: f64) -> IntentClassification {
    let lower = user_message.to_lowercase();
    let contains_any = |terms: &[&str]| terms.iter().any(|term| lower.contains(term));

    let (intent, confidence) = if contains_any(&DIET_TERMS) {
        (Intent::DietSuggestion, confidence)
    } else if contains_any(&EXERCISE_TERMS) {
        (Intent::ExercisePlan, confidence)
    } else if contains_any(&MENTAL_TERMS) {
        (Intent::MentalHealth, confidence)
    } else if contains_any(&REPORT_TERMS) {
        (Intent::ReportGeneration, confidence)
    } else {
        (Intent::GeneralChat, 0.5)
    };

    IntentClassification {
        intent,
        confidence,
        parameters: json!({}),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_json_embedded_in_prose() {
        let reply = "Sure, here is the classification:\n\
            {\"intent\":\"EXERCISE_PLAN\",\"confidence\":0.9,\"parameters\":{}}\n\
            Let me know if you need anything else.";
        let c = parse_classification(reply).expect("should parse");
        assert_eq!(c.intent, Intent::ExercisePlan);
        assert_eq!(c.confidence, 0.9);
        assert!(c.parameters.is_object());
    }

    #[test]
    fn out_of_range_confidence_is_clamped() {
        let c = parse_classification("{\"intent\":\"GENERAL_CHAT\",\"confidence\":3.5}").unwrap();
        assert_eq!(c.confidence, 1.0);
        let c = parse_classification("{\"intent\":\"GENERAL_CHAT\",\"confidence\":-1}").unwrap();
        assert_eq!(c.confidence, 0.0);
    }

    #[test]
    fn unknown_intent_label_is_rejected() {
        assert!(parse_classification("{\"intent\":\"MAKE_COFFEE\",\"confidence\":0.9}").is_none());
        assert!(parse_classification("not json at all").is_none());
    }

    #[test]
    fn missing_parameters_defaults_to_empty_object() {
        let c = parse_classification("{\"intent\":\"MENTAL_HEALTH\",\"confidence\":0.8}").unwrap();
        assert_eq!(c.parameters, json!({}));
    }

    #[test]
    fn keyword_fallback_order_and_mapping() {
        assert_eq!(
            keyword_fallback("what food should I eat", 0.7).intent,
            Intent::DietSuggestion
        );
        assert_eq!(
            keyword_fallback("plan my workout", 0.7).intent,
            Intent::ExercisePlan
        );
        assert_eq!(
            keyword_fallback("I feel down", 0.7).intent,
            Intent::MentalHealth
        );
        assert_eq!(
            keyword_fallback("show my progress", 0.7).intent,
            Intent::ReportGeneration
        );

        let unmatched = keyword_fallback("tell me a story", 0.7);
        assert_eq!(unmatched.intent, Intent::GeneralChat);
        assert_eq!(unmatched.confidence, 0.5);
    }

    #[test]
    fn diet_terms_win_over_later_categories() {
        // "meal" and "workout" both present: diet is checked first.
        let c = keyword_fallback("meal after workout", 0.6);
        assert_eq!(c.intent, Intent::DietSuggestion);
        assert_eq!(c.confidence, 0.6);
    }
}
