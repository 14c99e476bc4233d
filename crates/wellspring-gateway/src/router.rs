use axum::Router;
use axum::extract::State;
use axum::routing::{get, post, put};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::state::SharedState;

/// Build the application router with all routes.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/status", get(status))
        .route("/api/auth/register", post(api::register))
        .route("/api/auth/login", post(api::login))
        .route("/api/chat", post(api::chat))
        .route("/api/users/{id}", get(api::get_user))
        .route("/api/users/{id}/profile", put(api::update_profile))
        .route(
            "/api/users/{id}/meals",
            get(api::list_meal_logs).post(api::create_meal_log),
        )
        .route(
            "/api/users/{id}/workouts",
            get(api::list_workout_logs).post(api::create_workout_log),
        )
        .route("/api/users/{id}/memories", get(api::list_memories))
        .route("/api/users/{id}/activity", get(api::list_activity))
        .route("/api/users/{id}/dashboard", get(api::dashboard))
        .route("/api/users/{id}/challenges", get(api::list_user_challenges))
        .route(
            "/api/users/{id}/challenges/{challenge_id}/join",
            post(api::join_challenge),
        )
        .route(
            "/api/users/{id}/challenges/{challenge_id}/progress",
            put(api::update_challenge_progress),
        )
        .route("/api/challenges", get(api::list_challenges))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn status(State(state): State<SharedState>) -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "running",
        "version": env!("CARGO_PKG_VERSION"),
        "text_model": state.config.llm.text_model,
        "vision_model": state.config.llm.vision_model,
    }))
}
