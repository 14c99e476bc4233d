use std::path::Path;

use tracing::{info, warn};
use wellspring_common::{Error, Result};

use crate::model::AppConfig;

/// Loads configuration from an optional TOML file, then applies environment
/// overrides. The API credential only ever comes from the environment.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from `path` if it exists, otherwise start from defaults.
    pub fn load(path: Option<&Path>) -> Result<AppConfig> {
        // Pick up a local .env file when present; missing files are fine.
        let _ = dotenvy::dotenv();

        let mut config = match path {
            Some(p) if p.exists() => {
                let raw = std::fs::read_to_string(p).map_err(|e| {
                    Error::Config(format!("failed to read config at {}: {e}", p.display()))
                })?;
                let parsed: AppConfig = toml::from_str(&raw).map_err(|e| {
                    Error::Config(format!("failed to parse config at {}: {e}", p.display()))
                })?;
                info!("loaded config from {}", p.display());
                parsed
            }
            Some(p) => {
                warn!("config file {} not found, using defaults", p.display());
                AppConfig::default()
            }
            None => AppConfig::default(),
        };

        Self::apply_env_overrides(&mut config);
        Ok(config)
    }

    fn apply_env_overrides(config: &mut AppConfig) {
        if let Ok(key) = std::env::var("TOGETHER_API_KEY") {
            config.llm.api_key = key;
        }
        if let Ok(url) = std::env::var("WELLSPRING_LLM_BASE_URL") {
            config.llm.base_url = url;
        }
        if let Ok(model) = std::env::var("WELLSPRING_TEXT_MODEL") {
            config.llm.text_model = model;
        }
        if let Ok(model) = std::env::var("WELLSPRING_VISION_MODEL") {
            config.llm.vision_model = model;
        }
        if let Ok(dir) = std::env::var("WELLSPRING_DATA_DIR") {
            config.storage.data_dir = dir;
        }

        if config.llm.api_key.is_empty() {
            warn!("TOGETHER_API_KEY is not set; LLM calls will fail");
        }
    }
}
