use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tower::ServiceExt;
use wellspring_agents::{AssistantRuntime, LlmGateway, TogetherProvider};
use wellspring_config::AppConfig;
use wellspring_db::WellnessStore;
use wellspring_gateway::{AppState, build_router};

fn test_app() -> Router {
    let store = WellnessStore::in_memory().unwrap();
    store.ensure_default_challenges().unwrap();
    let store = Arc::new(Mutex::new(store));

    let config = AppConfig::default();
    // Point at an unroutable host: the tests below never reach the provider.
    let provider = TogetherProvider::new(
        "test-key".to_string(),
        Some("http://127.0.0.1:9".to_string()),
    );
    let gateway = LlmGateway::new(Arc::new(provider), "test-key");
    let runtime = AssistantRuntime::new(
        gateway,
        Arc::clone(&store),
        config.llm.text_model.clone(),
        config.llm.vision_model.clone(),
        config.llm.history_token_budget,
    );

    build_router(Arc::new(AppState {
        config,
        runtime,
        store,
    }))
}

async fn send_json(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let request = match body {
        Some(body) => Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::String(
            String::from_utf8_lossy(&bytes).into_owned(),
        ))
    };
    (status, value)
}

async fn register_user(app: &Router) -> i64 {
    let (status, body) = send_json(
        app,
        "POST",
        "/api/auth/register",
        Some(json!({
            "name": "Ada",
            "email": "ada@example.com",
            "password": "hunter2-long"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["user_id"].as_i64().expect("user_id in response")
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = test_app();
    let (status, body) = send_json(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, Value::String("ok".to_string()));
}

#[tokio::test]
async fn test_register_then_login() {
    let app = test_app();
    let user_id = register_user(&app).await;

    // Duplicate email is rejected.
    let (status, _) = send_json(
        &app,
        "POST",
        "/api/auth/register",
        Some(json!({
            "name": "Imposter",
            "email": "ada@example.com",
            "password": "other-password"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Correct credentials return the sanitized user.
    let (status, body) = send_json(
        &app,
        "POST",
        "/api/auth/login",
        Some(json!({ "email": "ada@example.com", "password": "hunter2-long" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"].as_i64(), Some(user_id));
    assert_eq!(body["name"], "Ada");
    assert!(body.get("password_hash").is_none(), "hash must not leak");

    // Wrong password is a 401.
    let (status, _) = send_json(
        &app,
        "POST",
        "/api/auth/login",
        Some(json!({ "email": "ada@example.com", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_profile_update_and_fetch() {
    let app = test_app();
    let user_id = register_user(&app).await;

    let (status, body) = send_json(
        &app,
        "PUT",
        &format!("/api/users/{user_id}/profile"),
        Some(json!({ "age": 31, "fitness_goal": "muscle_gain" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["age"].as_i64(), Some(31));

    let (status, body) = send_json(&app, "GET", &format!("/api/users/{user_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fitness_goal"], "muscle_gain");

    let (status, _) = send_json(&app, "GET", "/api/users/9999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Profile edits land in the activity stream.
    let (_, body) = send_json(
        &app,
        "GET",
        &format!("/api/users/{user_id}/activity"),
        None,
    )
    .await;
    assert_eq!(body["activity"][0]["kind"], "profile_update");
}

#[tokio::test]
async fn test_meal_and_workout_logs_with_activity_events() {
    let app = test_app();
    let user_id = register_user(&app).await;

    let (status, body) = send_json(
        &app,
        "POST",
        &format!("/api/users/{user_id}/meals"),
        Some(json!({ "meal_name": "Oatmeal", "description": "oats with banana" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["meal_id"].as_i64().is_some());

    let (status, _) = send_json(
        &app,
        "POST",
        &format!("/api/users/{user_id}/workouts"),
        Some(json!({ "routine": "5k run", "calories_burned": 320.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = send_json(&app, "GET", &format!("/api/users/{user_id}/meals"), None).await;
    assert_eq!(body["meals"].as_array().unwrap().len(), 1);
    assert_eq!(body["meals"][0]["meal_name"], "Oatmeal");

    let (_, body) = send_json(
        &app,
        "GET",
        &format!("/api/users/{user_id}/activity?limit=10"),
        None,
    )
    .await;
    let kinds: Vec<&str> = body["activity"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|e| e["kind"].as_str())
        .collect();
    assert!(kinds.contains(&"meal_log"));
    assert!(kinds.contains(&"workout_log"));

    let (_, body) = send_json(
        &app,
        "GET",
        &format!("/api/users/{user_id}/dashboard"),
        None,
    )
    .await;
    assert_eq!(body["total_meals"].as_i64(), Some(1));
    assert_eq!(body["total_workouts"].as_i64(), Some(1));
}

#[tokio::test]
async fn test_challenge_join_and_progress_flow() {
    let app = test_app();
    let user_id = register_user(&app).await;

    let (status, body) = send_json(&app, "GET", "/api/challenges", None).await;
    assert_eq!(status, StatusCode::OK);
    let challenges = body["challenges"].as_array().unwrap();
    assert_eq!(challenges.len(), 5);
    let challenge_id = challenges[0]["id"].as_i64().unwrap();

    let (status, _) = send_json(
        &app,
        "POST",
        &format!("/api/users/{user_id}/challenges/{challenge_id}/join"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send_json(
        &app,
        "PUT",
        &format!("/api/users/{user_id}/challenges/{challenge_id}/progress"),
        Some(json!({ "progress": 40 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send_json(
        &app,
        "GET",
        &format!("/api/users/{user_id}/challenges"),
        None,
    )
    .await;
    let joined = body["challenges"].as_array().unwrap();
    assert_eq!(joined.len(), 1);
    assert_eq!(joined[0]["progress"].as_i64(), Some(40));
    assert_eq!(joined[0]["status"], "active");

    // Filtered catalog query.
    let (_, body) = send_json(
        &app,
        "GET",
        "/api/challenges?goal_type=weight_loss&difficulty=beginner",
        None,
    )
    .await;
    assert_eq!(body["challenges"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_chat_rejects_off_topic_with_redirect_envelope() {
    let app = test_app();
    let user_id = register_user(&app).await;

    let (status, body) = send_json(
        &app,
        "POST",
        "/api/chat",
        Some(json!({
            "user_id": user_id,
            "message": "What's the capital of France?"
        })),
    )
    .await;

    // Dispatcher results always ride a 200.
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "redirect");
    assert!(body["response"].as_str().unwrap().contains("wellness"));

    let (_, body) = send_json(
        &app,
        "GET",
        &format!("/api/users/{user_id}/activity"),
        None,
    )
    .await;
    assert!(body["activity"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_chat_provider_failure_rides_inside_envelope() {
    let app = test_app();
    let user_id = register_user(&app).await;

    // Provider is unreachable; the classifier falls back to keywords and
    // the exercise completion fails, so the envelope carries the error.
    let (status, body) = send_json(
        &app,
        "POST",
        "/api/chat",
        Some(json!({ "user_id": user_id, "message": "plan my workout" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "error");
    assert!(
        body["response"]
            .as_str()
            .unwrap()
            .starts_with("❌ Sorry, I encountered an error:")
    );
}

#[tokio::test]
async fn test_status_reports_models() {
    let app = test_app();
    let (status, body) = send_json(&app, "GET", "/api/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "running");
    assert!(body["text_model"].as_str().unwrap().contains("Llama"));
}
