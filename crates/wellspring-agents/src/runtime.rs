use std::path::Path;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{info, warn};
use wellspring_common::Result;
use wellspring_db::{DashboardStats, NewMealLog, User, WellnessStore};

use crate::budget::trim_messages_to_token_limit;
use crate::diet::{analyze_meal_text, extract_meal_name, get_diet_suggestion};
use crate::exercise::get_exercise_plan;
use crate::gateway::LlmGateway;
use crate::intent::{Intent, classify_user_intent};
use crate::mental_health::get_mental_health_response;
use crate::providers::ChatMessage;
use crate::vision::{VisionAnalysis, analyze_meal_image};

const REDIRECT_RESPONSE: &str = "I'm your wellness assistant, so I focus on nutrition, \
exercise, mental health, and progress tracking. Try asking me to analyze a meal, plan a \
workout, talk through how you're feeling, or show your progress report.";

const NUTRITIONIST_PROMPT: &str =
    "You are a helpful nutritionist providing personalized diet advice. Be encouraging and practical.";
const TRAINER_PROMPT: &str =
    "You are a helpful fitness trainer providing personalized exercise advice. Be encouraging and practical.";
const COMPANION_PROMPT: &str =
    "You are a supportive mental health companion. Be empathetic, encouraging, and helpful.";
const GENERAL_PROMPT: &str = "You are a friendly wellness assistant. Help users with their \
health and fitness goals. If they ask general questions, guide them to specific features like \
meal tracking, exercise planning, or mental health support.";

const WELLNESS_KEYWORDS: &[&str] = &[
    "food", "meal", "nutrition", "calories", "calorie", "diet", "eat", "protein", "exercise",
    "workout", "fitness", "training", "run", "yoga", "stretch", "stress", "anxiety", "anxious",
    "mood", "mental", "feel", "sleep", "report", "progress", "dashboard", "summary", "health",
    "wellness", "weight", "water", "meditation", "habit", "goal",
];

static ADVICE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(how\s+(do|can|should)\s+i|what\s+should\s+i|help\s+me|advice|recommend|suggest)\b")
        .expect("advice pattern is a fixed literal")
});

static ANALYSIS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(analyz|analys|what'?s\s+in|check|nutrition|calorie)")
        .expect("analysis pattern is a fixed literal")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseKind {
    DietAnalysis,
    DietSuggestion,
    ExercisePlan,
    MentalHealth,
    Report,
    GeneralChat,
    Redirect,
    Error,
}

/// The dispatcher's reply to one user turn. Errors ride inside the envelope
/// (`kind = Error`) rather than as a `Result`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub response: String,
    #[serde(rename = "type")]
    pub kind: ResponseKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meal_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<DashboardStats>,
}

impl ResponseEnvelope {
    fn new(response: String, kind: ResponseKind) -> Self {
        Self {
            response,
            kind,
            meal_id: None,
            memory_id: None,
            stats: None,
        }
    }
}

/// Routes each user message through the wellness gate, intent classifier,
/// and domain agents, persisting logs and memories along the way. State is
/// explicit: the store is passed in at construction, not picked up from any
/// ambient session.
pub struct AssistantRuntime {
    gateway: LlmGateway,
    store: Arc<Mutex<WellnessStore>>,
    text_model: String,
    vision_model: String,
    history_token_budget: usize,
}

impl AssistantRuntime {
    pub fn new(
        gateway: LlmGateway,
        store: Arc<Mutex<WellnessStore>>,
        text_model: String,
        vision_model: String,
        history_token_budget: usize,
    ) -> Self {
        Self {
            gateway,
            store,
            text_model,
            vision_model,
            history_token_budget,
        }
    }

    /// Handle one user turn. Never returns an error: anything that fails
    /// inside the branches is converted into an `Error` envelope.
    pub async fn generate_unified_response(
        &self,
        user_message: &str,
        user_id: i64,
        chat_history: &[ChatMessage],
        image_path: Option<&Path>,
    ) -> ResponseEnvelope {
        if !is_wellness_related(user_message) {
            info!(user_id, "message rejected by wellness gate");
            return ResponseEnvelope::new(REDIRECT_RESPONSE.to_string(), ResponseKind::Redirect);
        }

        match self
            .dispatch(user_message, user_id, chat_history, image_path)
            .await
        {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(user_id, "dispatch failed: {e}");
                ResponseEnvelope::new(
                    format!("❌ Sorry, I encountered an error: {e}"),
                    ResponseKind::Error,
                )
            }
        }
    }

    /// Voice transcription placeholder. Always returns the same string.
    pub fn process_voice_input(&self, _audio: &[u8]) -> String {
        "Voice input received. Please type your message for now.".to_string()
    }

    async fn dispatch(
        &self,
        user_message: &str,
        user_id: i64,
        chat_history: &[ChatMessage],
        image_path: Option<&Path>,
    ) -> Result<ResponseEnvelope> {
        let profile = {
            let store = self.store.lock().await;
            store.get_user_by_id(user_id)?
        };
        let profile_block = profile.as_ref().map(profile_context).unwrap_or_default();

        // An image plus analysis wording goes straight to the vision agent;
        // everything else is routed by the classifier.
        let intent = if image_path.is_some() && ANALYSIS_PATTERN.is_match(user_message) {
            Intent::DietAnalysis
        } else {
            let classification =
                classify_user_intent(&self.gateway, &self.text_model, user_message).await;
            info!(
                user_id,
                intent = ?classification.intent,
                confidence = classification.confidence,
                "classified user intent"
            );
            classification.intent
        };

        match intent {
            Intent::DietAnalysis => {
                self.handle_diet_analysis(user_message, user_id, image_path)
                    .await
            }
            Intent::DietSuggestion => {
                self.handle_diet_suggestion(user_message, user_id, &profile_block)
                    .await
            }
            Intent::ExercisePlan => {
                self.handle_exercise_plan(user_message, user_id, &profile_block)
                    .await
            }
            Intent::MentalHealth => {
                self.handle_mental_health(user_message, user_id, &profile_block)
                    .await
            }
            Intent::ReportGeneration => self.handle_report(user_id).await,
            Intent::GeneralChat => {
                self.handle_general_chat(user_message, chat_history, &profile_block)
                    .await
            }
        }
    }

    async fn handle_diet_analysis(
        &self,
        user_message: &str,
        user_id: i64,
        image_path: Option<&Path>,
    ) -> Result<ResponseEnvelope> {
        let (analysis, meal_name, image_path_str) = match image_path {
            Some(path) => {
                let analysis =
                    match analyze_meal_image(&self.gateway, &self.vision_model, path).await {
                        VisionAnalysis::Raw(text) => text,
                        VisionAnalysis::Error(e) => {
                            return Ok(ResponseEnvelope::new(
                                format!("❌ {e}"),
                                ResponseKind::Error,
                            ));
                        }
                    };
                let meal_name = if user_message.trim().is_empty() {
                    "Analyzed Meal".to_string()
                } else {
                    extract_meal_name(&self.gateway, &self.text_model, user_message).await
                };
                (analysis, meal_name, Some(path.display().to_string()))
            }
            None => {
                let analysis =
                    analyze_meal_text(&self.gateway, &self.text_model, user_message).await;
                let meal_name =
                    extract_meal_name(&self.gateway, &self.text_model, user_message).await;
                (analysis, meal_name, None)
            }
        };

        let store = self.store.lock().await;
        let meal_id = store.insert_meal_log(&NewMealLog {
            user_id,
            date: today(),
            meal_name: Some(meal_name.clone()),
            description: Some(user_message.to_string()),
            image_path: image_path_str,
            calories_est: None,
            macros_json: None,
        })?;
        store.log_activity(
            user_id,
            "meal_analyzed",
            &serde_json::json!({
                "meal_id": meal_id,
                "meal_name": meal_name,
                "analysis": analysis,
            }),
        )?;

        let mut envelope = ResponseEnvelope::new(
            format!(
                "🍽️ **Meal Analysis Complete!**\n\n{analysis}\n\nI've logged this meal to your tracker."
            ),
            ResponseKind::DietAnalysis,
        );
        envelope.meal_id = Some(meal_id);
        Ok(envelope)
    }

    async fn handle_diet_suggestion(
        &self,
        user_message: &str,
        user_id: i64,
        profile_block: &str,
    ) -> Result<ResponseEnvelope> {
        let recent_meals = {
            let store = self.store.lock().await;
            store.list_meal_logs(user_id, 3)?
        };
        let mut content = user_message.to_string();
        if !recent_meals.is_empty() {
            let names: Vec<String> = recent_meals
                .iter()
                .map(|m| m.meal_name.clone().unwrap_or_else(|| "Unknown".to_string()))
                .collect();
            content.push_str(&format!("\n\nContext: Recent meals: {}", names.join(", ")));
        }

        let messages = vec![
            ChatMessage::system(with_profile(NUTRITIONIST_PROMPT, profile_block)),
            ChatMessage::user(content),
        ];
        let suggestion = get_diet_suggestion(&self.gateway, &self.text_model, messages).await?;

        Ok(ResponseEnvelope::new(
            format!("🥗 **Nutrition Advice**\n\n{suggestion}"),
            ResponseKind::DietSuggestion,
        ))
    }

    async fn handle_exercise_plan(
        &self,
        user_message: &str,
        user_id: i64,
        profile_block: &str,
    ) -> Result<ResponseEnvelope> {
        let recent_workouts = {
            let store = self.store.lock().await;
            store.list_workout_logs(user_id, 3)?
        };
        let mut content = user_message.to_string();
        if !recent_workouts.is_empty() {
            let routines: Vec<&str> = recent_workouts
                .iter()
                .map(|w| w.routine.as_str())
                .collect();
            content.push_str(&format!(
                "\n\nContext: Recent workouts: {}",
                routines.join(", ")
            ));
        }

        let messages = vec![
            ChatMessage::system(with_profile(TRAINER_PROMPT, profile_block)),
            ChatMessage::user(content),
        ];
        let plan = get_exercise_plan(&self.gateway, &self.text_model, messages).await?;

        Ok(ResponseEnvelope::new(
            format!("💪 **Exercise Plan**\n\n{plan}"),
            ResponseKind::ExercisePlan,
        ))
    }

    async fn handle_mental_health(
        &self,
        user_message: &str,
        user_id: i64,
        profile_block: &str,
    ) -> Result<ResponseEnvelope> {
        let recent_memories = {
            let store = self.store.lock().await;
            store.list_memories(user_id, 3)?
        };
        let mut content = user_message.to_string();
        if !recent_memories.is_empty() {
            let summaries: Vec<String> = recent_memories
                .iter()
                .map(|m| format!("{}...", char_prefix(&m.summary, 50)))
                .collect();
            content.push_str(&format!(
                "\n\nContext: Recent conversations: {}",
                summaries.join(", ")
            ));
        }

        let messages = vec![
            ChatMessage::system(with_profile(COMPANION_PROMPT, profile_block)),
            ChatMessage::user(content),
        ];
        let response = get_mental_health_response(&self.gateway, &self.text_model, messages).await?;

        let store = self.store.lock().await;
        let memory_id = store.insert_memory(
            user_id,
            &format!(
                "User: {}... | Assistant: {}...",
                char_prefix(user_message, 100),
                char_prefix(&response, 100)
            ),
            "mental_health",
        )?;
        store.log_activity(
            user_id,
            "mental_health_chat",
            &serde_json::json!({
                "memory_id": memory_id,
                "user_message": char_prefix(user_message, 200),
            }),
        )?;

        let mut envelope = ResponseEnvelope::new(
            format!("🧠 **Mental Health Support**\n\n{response}"),
            ResponseKind::MentalHealth,
        );
        envelope.memory_id = Some(memory_id);
        Ok(envelope)
    }

    // Report generation is pure aggregation; no LLM call.
    async fn handle_report(&self, user_id: i64) -> Result<ResponseEnvelope> {
        let stats = {
            let store = self.store.lock().await;
            store.dashboard_stats(user_id, &today())?
        };

        let report = format!(
            "📊 **Your Wellness Report**\n\n\
             **Activity Summary:**\n\
             • Total meals logged: {}\n\
             • Total workouts logged: {}\n\
             • Recent meals (today): {}\n\
             • Recent workouts (today): {}\n\n\
             **Recent Activity:**\n\
             • Last meal: {}\n\
             • Last workout: {}\n\
             • Mental health conversations: {}\n\n\
             **Recommendations:**\n\
             • Keep up the great work with your wellness tracking!\n\
             • Consider logging your next meal or workout\n\
             • Take time for mental health reflection\n\n\
             Would you like me to help you with anything specific today?",
            stats.total_meals,
            stats.total_workouts,
            stats.meals_today,
            stats.workouts_today,
            stats.last_meal_name.as_deref().unwrap_or("None"),
            stats.last_workout_routine.as_deref().unwrap_or("None"),
            stats.memory_count,
        );

        let mut envelope = ResponseEnvelope::new(report, ResponseKind::Report);
        envelope.stats = Some(stats);
        Ok(envelope)
    }

    async fn handle_general_chat(
        &self,
        user_message: &str,
        chat_history: &[ChatMessage],
        profile_block: &str,
    ) -> Result<ResponseEnvelope> {
        let mut messages = vec![ChatMessage::system(with_profile(
            GENERAL_PROMPT,
            profile_block,
        ))];
        messages.extend(trim_messages_to_token_limit(
            chat_history,
            self.history_token_budget,
        ));
        messages.push(ChatMessage::user(user_message));

        let response = self
            .gateway
            .complete_text(&self.text_model, messages, 0.6, 512)
            .await?;

        Ok(ResponseEnvelope::new(
            format!("👋 **Wellness Assistant**\n\n{response}"),
            ResponseKind::GeneralChat,
        ))
    }
}

/// The wellness gate: a message passes when it mentions wellness vocabulary
/// or reads as an advice request. Rejected messages never reach an LLM or
/// the store.
pub fn is_wellness_related(user_message: &str) -> bool {
    let lower = user_message.to_lowercase();
    WELLNESS_KEYWORDS.iter().any(|kw| lower.contains(kw)) || ADVICE_PATTERN.is_match(user_message)
}

fn with_profile(prompt: &str, profile_block: &str) -> String {
    if profile_block.is_empty() {
        prompt.to_string()
    } else {
        format!("{prompt}\n\n{profile_block}")
    }
}

fn profile_context(user: &User) -> String {
    let mut lines = Vec::new();
    if let Some(goal) = &user.fitness_goal {
        lines.push(format!("fitness goal: {goal}"));
    }
    if let Some(level) = &user.activity_level {
        lines.push(format!("activity level: {level}"));
    }
    if let Some(prefs) = &user.dietary_preferences {
        lines.push(format!("dietary preferences: {prefs}"));
    }
    if let Some(conditions) = &user.medical_conditions {
        lines.push(format!("medical conditions: {conditions}"));
    }
    if lines.is_empty() {
        String::new()
    } else {
        format!("User profile: {}.", lines.join("; "))
    }
}

fn char_prefix(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

fn today() -> String {
    chrono::Utc::now().date_naive().to_string()
}
