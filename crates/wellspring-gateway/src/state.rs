use std::sync::Arc;

use tokio::sync::Mutex;
use wellspring_agents::AssistantRuntime;
use wellspring_config::AppConfig;
use wellspring_db::WellnessStore;

/// Shared state for all HTTP handlers.
pub struct AppState {
    pub config: AppConfig,
    pub runtime: AssistantRuntime,
    pub store: Arc<Mutex<WellnessStore>>,
}

pub type SharedState = Arc<AppState>;
