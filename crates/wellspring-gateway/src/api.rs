use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::warn;
use wellspring_agents::{ChatMessage, ResponseEnvelope};
use wellspring_common::Error;
use wellspring_db::{NewMealLog, ProfileUpdate};
use wellspring_security::{hash_password, verify_password};

use crate::state::SharedState;

type ApiResult = (StatusCode, Json<Value>);

fn error_response(status: StatusCode, message: impl Into<String>) -> ApiResult {
    (
        status,
        Json(json!({ "status": "error", "message": message.into() })),
    )
}

fn internal_error(e: Error) -> ApiResult {
    warn!("request failed: {e}");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

#[derive(Deserialize)]
pub struct ListParams {
    pub limit: Option<usize>,
}

impl ListParams {
    fn limit(&self) -> usize {
        self.limit.unwrap_or(20)
    }
}

// --- Auth ---

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// POST /api/auth/register — create a user; duplicate email is a 409.
pub async fn register(
    State(state): State<SharedState>,
    Json(body): Json<RegisterRequest>,
) -> ApiResult {
    if body.email.trim().is_empty() || body.password.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "email and password are required");
    }

    let password_hash = match hash_password(&body.password) {
        Ok(hash) => hash,
        Err(e) => return internal_error(e),
    };

    let store = state.store.lock().await;
    match store.get_user_by_email(&body.email) {
        Ok(Some(_)) => {
            return error_response(StatusCode::CONFLICT, "email is already registered");
        }
        Ok(None) => {}
        Err(e) => return internal_error(e),
    }

    match store.create_user(&body.name, &body.email, &password_hash) {
        Ok(user_id) => (StatusCode::CREATED, Json(json!({ "user_id": user_id }))),
        Err(e) => internal_error(e),
    }
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /api/auth/login — verify credentials and return the sanitized user.
pub async fn login(
    State(state): State<SharedState>,
    Json(body): Json<LoginRequest>,
) -> ApiResult {
    let store = state.store.lock().await;
    let user = match store.get_user_by_email(&body.email) {
        Ok(Some(user)) => user,
        Ok(None) => return error_response(StatusCode::UNAUTHORIZED, "invalid credentials"),
        Err(e) => return internal_error(e),
    };

    if !verify_password(&body.password, &user.password_hash) {
        return error_response(StatusCode::UNAUTHORIZED, "invalid credentials");
    }

    match serde_json::to_value(&user) {
        Ok(value) => (StatusCode::OK, Json(value)),
        Err(e) => internal_error(Error::Database(format!("failed to serialize user: {e}"))),
    }
}

// --- Users ---

/// GET /api/users/{id}
pub async fn get_user(State(state): State<SharedState>, Path(user_id): Path<i64>) -> ApiResult {
    let store = state.store.lock().await;
    match store.get_user_by_id(user_id) {
        Ok(Some(user)) => (
            StatusCode::OK,
            Json(serde_json::to_value(&user).unwrap_or(Value::Null)),
        ),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "user not found"),
        Err(e) => internal_error(e),
    }
}

/// PUT /api/users/{id}/profile — partial profile update.
pub async fn update_profile(
    State(state): State<SharedState>,
    Path(user_id): Path<i64>,
    Json(update): Json<ProfileUpdate>,
) -> ApiResult {
    let store = state.store.lock().await;
    match store.get_user_by_id(user_id) {
        Ok(Some(_)) => {}
        Ok(None) => return error_response(StatusCode::NOT_FOUND, "user not found"),
        Err(e) => return internal_error(e),
    }

    if let Err(e) = store.update_user_profile(user_id, &update) {
        return internal_error(e);
    }
    if let Err(e) = store.log_activity(user_id, "profile_update", &json!({})) {
        return internal_error(e);
    }

    match store.get_user_by_id(user_id) {
        Ok(Some(user)) => (
            StatusCode::OK,
            Json(serde_json::to_value(&user).unwrap_or(Value::Null)),
        ),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "user not found"),
        Err(e) => internal_error(e),
    }
}

// --- Chat ---

#[derive(Deserialize)]
pub struct ChatRequest {
    pub user_id: i64,
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
    pub image_path: Option<String>,
}

/// POST /api/chat — dispatch one user turn. Always 200: errors ride inside
/// the envelope.
pub async fn chat(
    State(state): State<SharedState>,
    Json(body): Json<ChatRequest>,
) -> Json<ResponseEnvelope> {
    let image_path = body.image_path.as_deref().map(std::path::Path::new);
    let envelope = state
        .runtime
        .generate_unified_response(&body.message, body.user_id, &body.history, image_path)
        .await;
    Json(envelope)
}

// --- Meal logs ---

#[derive(Deserialize)]
pub struct MealLogRequest {
    pub date: Option<String>,
    pub meal_name: Option<String>,
    pub description: Option<String>,
    pub image_path: Option<String>,
    pub calories_est: Option<f64>,
    pub macros_json: Option<String>,
}

/// POST /api/users/{id}/meals — manual meal log entry.
pub async fn create_meal_log(
    State(state): State<SharedState>,
    Path(user_id): Path<i64>,
    Json(body): Json<MealLogRequest>,
) -> ApiResult {
    let log = NewMealLog {
        user_id,
        date: body.date.unwrap_or_else(today),
        meal_name: body.meal_name,
        description: body.description,
        image_path: body.image_path,
        calories_est: body.calories_est,
        macros_json: body.macros_json,
    };

    let store = state.store.lock().await;
    let meal_id = match store.insert_meal_log(&log) {
        Ok(id) => id,
        Err(e) => return internal_error(e),
    };
    if let Err(e) = store.log_activity(
        user_id,
        "meal_log",
        &json!({ "meal_id": meal_id, "meal_name": log.meal_name }),
    ) {
        return internal_error(e);
    }

    (StatusCode::CREATED, Json(json!({ "meal_id": meal_id })))
}

/// GET /api/users/{id}/meals
pub async fn list_meal_logs(
    State(state): State<SharedState>,
    Path(user_id): Path<i64>,
    Query(params): Query<ListParams>,
) -> ApiResult {
    let store = state.store.lock().await;
    match store.list_meal_logs(user_id, params.limit()) {
        Ok(logs) => (StatusCode::OK, Json(json!({ "meals": logs }))),
        Err(e) => internal_error(e),
    }
}

// --- Workout logs ---

#[derive(Deserialize)]
pub struct WorkoutLogRequest {
    pub date: Option<String>,
    pub routine: String,
    pub calories_burned: Option<f64>,
}

/// POST /api/users/{id}/workouts
pub async fn create_workout_log(
    State(state): State<SharedState>,
    Path(user_id): Path<i64>,
    Json(body): Json<WorkoutLogRequest>,
) -> ApiResult {
    let date = body.date.unwrap_or_else(today);
    let store = state.store.lock().await;
    let log_id = match store.insert_workout_log(user_id, &date, &body.routine, body.calories_burned)
    {
        Ok(id) => id,
        Err(e) => return internal_error(e),
    };
    if let Err(e) = store.log_activity(
        user_id,
        "workout_log",
        &json!({ "log_id": log_id, "routine": body.routine }),
    ) {
        return internal_error(e);
    }

    (StatusCode::CREATED, Json(json!({ "log_id": log_id })))
}

/// GET /api/users/{id}/workouts
pub async fn list_workout_logs(
    State(state): State<SharedState>,
    Path(user_id): Path<i64>,
    Query(params): Query<ListParams>,
) -> ApiResult {
    let store = state.store.lock().await;
    match store.list_workout_logs(user_id, params.limit()) {
        Ok(logs) => (StatusCode::OK, Json(json!({ "workouts": logs }))),
        Err(e) => internal_error(e),
    }
}

// --- Memories and activity ---

/// GET /api/users/{id}/memories
pub async fn list_memories(
    State(state): State<SharedState>,
    Path(user_id): Path<i64>,
    Query(params): Query<ListParams>,
) -> ApiResult {
    let store = state.store.lock().await;
    match store.list_memories(user_id, params.limit()) {
        Ok(memories) => (StatusCode::OK, Json(json!({ "memories": memories }))),
        Err(e) => internal_error(e),
    }
}

/// GET /api/users/{id}/activity
pub async fn list_activity(
    State(state): State<SharedState>,
    Path(user_id): Path<i64>,
    Query(params): Query<ListParams>,
) -> ApiResult {
    let store = state.store.lock().await;
    match store.list_activity(user_id, params.limit()) {
        Ok(events) => (StatusCode::OK, Json(json!({ "activity": events }))),
        Err(e) => internal_error(e),
    }
}

// --- Challenges ---

#[derive(Deserialize)]
pub struct ChallengeFilter {
    pub goal_type: Option<String>,
    pub difficulty: Option<String>,
    pub limit: Option<usize>,
}

/// GET /api/challenges — catalog, optionally filtered.
pub async fn list_challenges(
    State(state): State<SharedState>,
    Query(filter): Query<ChallengeFilter>,
) -> ApiResult {
    let store = state.store.lock().await;
    match store.list_relevant_challenges(
        filter.goal_type.as_deref(),
        filter.difficulty.as_deref(),
        filter.limit.unwrap_or(20),
    ) {
        Ok(challenges) => (StatusCode::OK, Json(json!({ "challenges": challenges }))),
        Err(e) => internal_error(e),
    }
}

/// POST /api/users/{id}/challenges/{challenge_id}/join
pub async fn join_challenge(
    State(state): State<SharedState>,
    Path((user_id, challenge_id)): Path<(i64, i64)>,
) -> ApiResult {
    let store = state.store.lock().await;
    let joined_id = match store.join_challenge(user_id, challenge_id) {
        Ok(id) => id,
        Err(e) => return internal_error(e),
    };
    if let Err(e) = store.log_activity(
        user_id,
        "challenge_joined",
        &json!({ "challenge_id": challenge_id }),
    ) {
        return internal_error(e);
    }

    (
        StatusCode::CREATED,
        Json(json!({ "user_challenge_id": joined_id })),
    )
}

#[derive(Deserialize)]
pub struct ProgressUpdate {
    pub progress: i64,
    pub status: Option<String>,
}

/// PUT /api/users/{id}/challenges/{challenge_id}/progress
pub async fn update_challenge_progress(
    State(state): State<SharedState>,
    Path((user_id, challenge_id)): Path<(i64, i64)>,
    Json(body): Json<ProgressUpdate>,
) -> ApiResult {
    let store = state.store.lock().await;
    if let Err(e) = store.update_challenge_progress(
        user_id,
        challenge_id,
        body.progress,
        body.status.as_deref(),
    ) {
        return internal_error(e);
    }
    if let Err(e) = store.log_activity(
        user_id,
        "challenge_update",
        &json!({
            "challenge_id": challenge_id,
            "progress": body.progress,
            "status": body.status,
        }),
    ) {
        return internal_error(e);
    }

    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

/// GET /api/users/{id}/challenges — joined challenges with progress.
pub async fn list_user_challenges(
    State(state): State<SharedState>,
    Path(user_id): Path<i64>,
) -> ApiResult {
    let store = state.store.lock().await;
    match store.list_user_challenges(user_id) {
        Ok(challenges) => (StatusCode::OK, Json(json!({ "challenges": challenges }))),
        Err(e) => internal_error(e),
    }
}

// --- Dashboard ---

/// GET /api/users/{id}/dashboard — aggregate stats.
pub async fn dashboard(State(state): State<SharedState>, Path(user_id): Path<i64>) -> ApiResult {
    let store = state.store.lock().await;
    match store.dashboard_stats(user_id, &today()) {
        Ok(stats) => (
            StatusCode::OK,
            Json(serde_json::to_value(&stats).unwrap_or(Value::Null)),
        ),
        Err(e) => internal_error(e),
    }
}

fn today() -> String {
    chrono::Utc::now().date_naive().to_string()
}
