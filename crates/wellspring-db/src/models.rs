use serde::{Deserialize, Serialize};

/// A registered user with profile attributes. `password_hash` is skipped
/// during serialization so user rows can be returned over the API directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub age: Option<i64>,
    pub gender: Option<String>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub fitness_goal: Option<String>,
    pub activity_level: Option<String>,
    pub dietary_preferences: Option<String>,
    pub mental_health_background: Option<String>,
    pub daily_schedule: Option<String>,
    pub medical_conditions: Option<String>,
    pub profile_photo_path: Option<String>,
    pub avatar_choice: Option<String>,
}

/// Partial profile update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub age: Option<i64>,
    pub gender: Option<String>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub fitness_goal: Option<String>,
    pub activity_level: Option<String>,
    pub dietary_preferences: Option<String>,
    pub mental_health_background: Option<String>,
    pub daily_schedule: Option<String>,
    pub medical_conditions: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealLog {
    pub id: i64,
    pub user_id: i64,
    pub date: String,
    pub meal_name: Option<String>,
    pub description: Option<String>,
    pub image_path: Option<String>,
    pub calories_est: Option<f64>,
    pub macros_json: Option<String>,
}

/// Insert payload for a meal log. Logs are immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMealLog {
    pub user_id: i64,
    pub date: String,
    pub meal_name: Option<String>,
    pub description: Option<String>,
    pub image_path: Option<String>,
    pub calories_est: Option<f64>,
    pub macros_json: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkoutLog {
    pub id: i64,
    pub user_id: i64,
    pub date: String,
    pub routine: String,
    pub calories_burned: Option<f64>,
}

/// A short summary of a mental-health interaction, kept as conversational
/// context. Never updated after insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
    pub id: i64,
    pub user_id: i64,
    pub tags: Option<String>,
    pub summary: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Challenge {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub goal_type: Option<String>,
    pub difficulty: Option<String>,
    pub duration_days: Option<i64>,
}

/// Per-user join record against the challenge catalog. Status transitions
/// are driven by explicit user action only: active -> completed | dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserChallenge {
    pub id: i64,
    pub user_id: i64,
    pub challenge_id: i64,
    pub status: String,
    pub progress: i64,
    pub started_at: String,
    pub updated_at: String,
    pub title: String,
    pub description: Option<String>,
}

/// Append-only activity stream entry; `payload` is arbitrary JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub id: i64,
    pub user_id: i64,
    pub created_at: String,
    pub kind: String,
    pub payload: serde_json::Value,
}

/// Aggregates for the report branch and the dashboard endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardStats {
    pub total_meals: i64,
    pub total_workouts: i64,
    pub meals_today: i64,
    pub workouts_today: i64,
    pub memory_count: i64,
    pub last_meal_name: Option<String>,
    pub last_workout_routine: Option<String>,
}
