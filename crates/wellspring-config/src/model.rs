use serde::{Deserialize, Serialize};

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub storage: StorageConfig,
    pub gateway: GatewayConfig,
}

/// LLM provider settings. The API key is never read from the config file;
/// it comes from the `TOGETHER_API_KEY` environment variable (a `.env` file
/// is honored for local development).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    #[serde(skip)]
    pub api_key: String,
    pub base_url: String,
    pub text_model: String,
    pub vision_model: String,
    /// Approximate token budget applied to chat history before completions.
    pub history_token_budget: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.together.xyz/v1".to_string(),
            text_model: "meta-llama/Meta-Llama-3.1-8B-Instruct-Turbo".to_string(),
            vision_model: "meta-llama/Llama-3.2-11B-Vision-Instruct-Turbo".to_string(),
            history_token_budget: 2000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the SQLite database and uploaded images.
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl AppConfig {
    /// Path of the database file under the configured data directory.
    pub fn db_path(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.storage.data_dir).join("wellness.db")
    }
}
