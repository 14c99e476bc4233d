use std::sync::Arc;

use serde_json::json;
use tokio::sync::Mutex;
use wellspring_agents::runtime::AssistantRuntime;
use wellspring_agents::{LlmGateway, ResponseKind, TogetherProvider};
use wellspring_db::WellnessStore;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TEXT_MODEL: &str = "text-model";
const VISION_MODEL: &str = "vision-model";

fn completion_body(content: serde_json::Value) -> serde_json::Value {
    json!({
        "id": "cmpl-1",
        "model": TEXT_MODEL,
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
}

async fn runtime_with_user(server: &MockServer) -> (AssistantRuntime, Arc<Mutex<WellnessStore>>, i64) {
    let store = WellnessStore::in_memory().unwrap();
    let user_id = store.create_user("Ada", "ada@example.com", "hash").unwrap();
    let store = Arc::new(Mutex::new(store));

    let provider = TogetherProvider::new("test-key".to_string(), Some(server.uri()));
    let gateway = LlmGateway::new(Arc::new(provider), "test-key");
    let runtime = AssistantRuntime::new(
        gateway,
        Arc::clone(&store),
        TEXT_MODEL.to_string(),
        VISION_MODEL.to_string(),
        2000,
    );
    (runtime, store, user_id)
}

/// Mount the three completions the text meal-analysis flow makes, keyed by
/// their distinct sampling settings: classifier (0.1/256), nutrition
/// analysis (0.2/512), meal-name extraction (0.0/32).
async fn mount_meal_analysis_mocks(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({"temperature": 0.1, "max_tokens": 256})))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(json!(
            "Classification: {\"intent\":\"DIET_ANALYSIS\",\"confidence\":0.95,\"parameters\":{}}"
        ))))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({"temperature": 0.2, "max_tokens": 512})))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(json!(
            "The meal consists of eggs and toast.\n\nTotal calories: 350 calories"
        ))))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({"max_tokens": 32})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(completion_body(json!("Eggs and Toast"))),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_meal_text_dispatch_logs_exactly_one_meal_and_one_activity() {
    let server = MockServer::start().await;
    mount_meal_analysis_mocks(&server).await;
    let (runtime, store, user_id) = runtime_with_user(&server).await;

    let message = "I had eggs and toast for breakfast";
    let envelope = runtime
        .generate_unified_response(message, user_id, &[], None)
        .await;

    assert_eq!(envelope.kind, ResponseKind::DietAnalysis);
    assert!(envelope.response.contains("🍽️ **Meal Analysis Complete!**"));
    assert!(envelope.response.contains("Total calories: 350 calories"));
    let meal_id = envelope.meal_id.expect("meal id in envelope");

    let store = store.lock().await;
    let meals = store.list_meal_logs(user_id, 10).unwrap();
    assert_eq!(meals.len(), 1);
    assert_eq!(meals[0].id, meal_id);
    assert_eq!(meals[0].description.as_deref(), Some(message));
    assert_eq!(meals[0].meal_name.as_deref(), Some("Eggs and Toast"));

    let activity = store.list_activity(user_id, 10).unwrap();
    assert_eq!(activity.len(), 1);
    assert_eq!(activity[0].kind, "meal_analyzed");
    assert_eq!(
        activity[0].payload.get("meal_id").and_then(|v| v.as_i64()),
        Some(meal_id)
    );
}

#[tokio::test]
async fn test_gate_rejection_makes_no_llm_calls_and_no_writes() {
    let server = MockServer::start().await;
    let (runtime, store, user_id) = runtime_with_user(&server).await;

    let envelope = runtime
        .generate_unified_response("What's the capital of France?", user_id, &[], None)
        .await;

    assert_eq!(envelope.kind, ResponseKind::Redirect);
    assert_eq!(server.received_requests().await.unwrap().len(), 0);

    let store = store.lock().await;
    assert!(store.list_meal_logs(user_id, 10).unwrap().is_empty());
    assert!(store.list_activity(user_id, 10).unwrap().is_empty());
    assert!(store.list_memories(user_id, 10).unwrap().is_empty());
}

#[tokio::test]
async fn test_mental_health_dispatch_stores_memory_and_activity() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({"temperature": 0.1})))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(json!(
            "{\"intent\":\"MENTAL_HEALTH\",\"confidence\":0.9,\"parameters\":{}}"
        ))))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({"temperature": 0.6})))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(json!(
            "That sounds hard. Let's take it one step at a time."
        ))))
        .mount(&server)
        .await;

    let (runtime, store, user_id) = runtime_with_user(&server).await;
    let envelope = runtime
        .generate_unified_response("I'm feeling very stressed about work", user_id, &[], None)
        .await;

    assert_eq!(envelope.kind, ResponseKind::MentalHealth);
    assert!(envelope.response.contains("🧠 **Mental Health Support**"));
    let memory_id = envelope.memory_id.expect("memory id in envelope");

    let store = store.lock().await;
    let memories = store.list_memories(user_id, 10).unwrap();
    assert_eq!(memories.len(), 1);
    assert_eq!(memories[0].id, memory_id);
    assert!(memories[0].summary.starts_with("User: I'm feeling very stressed"));
    assert_eq!(memories[0].tags.as_deref(), Some("mental_health"));

    let activity = store.list_activity(user_id, 10).unwrap();
    assert_eq!(activity.len(), 1);
    assert_eq!(activity[0].kind, "mental_health_chat");
}

#[tokio::test]
async fn test_report_generation_uses_no_llm_beyond_classifier() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(json!(
            "{\"intent\":\"REPORT_GENERATION\",\"confidence\":0.9,\"parameters\":{}}"
        ))))
        .mount(&server)
        .await;

    let (runtime, store, user_id) = runtime_with_user(&server).await;
    {
        let store = store.lock().await;
        store
            .insert_workout_log(user_id, "2026-01-05", "5k run", Some(300.0))
            .unwrap();
    }

    let envelope = runtime
        .generate_unified_response("show my progress report", user_id, &[], None)
        .await;

    assert_eq!(envelope.kind, ResponseKind::Report);
    assert!(envelope.response.contains("📊 **Your Wellness Report**"));
    let stats = envelope.stats.expect("stats in envelope");
    assert_eq!(stats.total_workouts, 1);
    assert_eq!(stats.last_workout_routine.as_deref(), Some("5k run"));

    // Only the classifier hit the provider.
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_vision_dispatch_keeps_text_before_fence_and_records_image_path() {
    let server = MockServer::start().await;

    // Vision request goes to the vision model; no classifier call is made
    // when an image is present alongside analysis wording.
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({"model": VISION_MODEL})))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(json!(
            "JSON Output: The plate shows scrambled eggs with toast.\n```json\n{\"total_calories\": 350}\n```"
        ))))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({"max_tokens": 32})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(completion_body(json!("Scrambled Eggs"))),
        )
        .mount(&server)
        .await;

    let (runtime, store, user_id) = runtime_with_user(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let image_path = dir.path().join("meal.jpg");
    std::fs::write(&image_path, b"\xff\xd8\xff\xe0fakejpeg").unwrap();

    let envelope = runtime
        .generate_unified_response(
            "analyze this meal for me",
            user_id,
            &[],
            Some(image_path.as_path()),
        )
        .await;

    assert_eq!(envelope.kind, ResponseKind::DietAnalysis);
    assert!(envelope.response.contains("The plate shows scrambled eggs with toast."));
    assert!(!envelope.response.contains("total_calories"));
    assert!(!envelope.response.contains("JSON Output:"));

    let store = store.lock().await;
    let meals = store.list_meal_logs(user_id, 10).unwrap();
    assert_eq!(meals.len(), 1);
    assert_eq!(meals[0].meal_name.as_deref(), Some("Scrambled Eggs"));
    assert_eq!(
        meals[0].image_path.as_deref(),
        Some(image_path.display().to_string().as_str())
    );
}

#[tokio::test]
async fn test_provider_failure_becomes_error_envelope() {
    let server = MockServer::start().await;

    // Classifier succeeds, the exercise completion fails.
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({"temperature": 0.1})))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(json!(
            "{\"intent\":\"EXERCISE_PLAN\",\"confidence\":0.9,\"parameters\":{}}"
        ))))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({"temperature": 0.5})))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let (runtime, store, user_id) = runtime_with_user(&server).await;
    let envelope = runtime
        .generate_unified_response("plan my workout", user_id, &[], None)
        .await;

    assert_eq!(envelope.kind, ResponseKind::Error);
    assert!(envelope.response.starts_with("❌ Sorry, I encountered an error:"));

    // The failed branch wrote nothing.
    let store = store.lock().await;
    assert!(store.list_activity(user_id, 10).unwrap().is_empty());
}
