pub mod budget;
pub mod diet;
pub mod exercise;
pub mod gateway;
pub mod intent;
pub mod mental_health;
pub mod parse;
pub mod providers;
pub mod runtime;
pub mod together;
pub mod vision;

pub use gateway::LlmGateway;
pub use intent::{Intent, IntentClassification, classify_user_intent};
pub use providers::{ChatMessage, ChatRole, ContentBlock, LlmProvider, LlmRequest, LlmResponse, MessagePart};
pub use runtime::{AssistantRuntime, ResponseEnvelope, ResponseKind};
pub use together::TogetherProvider;
pub use vision::VisionAnalysis;

/// Default model identifiers for the Together platform.
pub const DEFAULT_TEXT_MODEL: &str = "meta-llama/Meta-Llama-3.1-8B-Instruct-Turbo";
pub const DEFAULT_VISION_MODEL: &str = "meta-llama/Llama-3.2-11B-Vision-Instruct-Turbo";
