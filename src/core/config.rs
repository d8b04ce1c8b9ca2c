use std::fs;
use std::path::PathBuf;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use super::error::AppError;

/// The credential is read exactly once at process start; it never lives in
/// the config file.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub model: String,
    pub api_base_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            api_base_url: "https://generativelanguage.googleapis.com".to_string(),
        }
    }
}

fn config_path() -> anyhow::Result<PathBuf> {
    if let Ok(dir) = std::env::var("ALTTEXT_CONFIG_DIR") {
        let dir = PathBuf::from(dir);
        fs::create_dir_all(&dir)?;
        return Ok(dir.join("config.json"));
    }

    let dirs = ProjectDirs::from("dev", "alttext", "alttext")
        .ok_or_else(|| anyhow::anyhow!("could not resolve config dir"))?;
    let dir = dirs.config_dir();
    fs::create_dir_all(dir)?;
    Ok(dir.join("config.json"))
}

pub fn load_config() -> anyhow::Result<AppConfig> {
    let path = config_path()?;
    if !path.exists() {
        let cfg = AppConfig::default();
        save_config(&cfg)?;
        return Ok(cfg);
    }

    let raw = fs::read_to_string(&path)?;
    match serde_json::from_str::<AppConfig>(&raw) {
        Ok(cfg) => Ok(cfg),
        Err(_) => {
            // Recover from broken config by regenerating defaults.
            let cfg = AppConfig::default();
            save_config(&cfg)?;
            Ok(cfg)
        }
    }
}

pub fn save_config(cfg: &AppConfig) -> anyhow::Result<()> {
    let path = config_path()?;
    let raw = serde_json::to_string_pretty(cfg)?;
    fs::write(path, raw)?;
    Ok(())
}

/// Missing credential is fatal: the caller must refuse to start rather than
/// run with no way to reach the service.
pub fn load_api_key() -> Result<String, AppError> {
    match std::env::var(API_KEY_ENV) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(AppError::startup_config(format!("{API_KEY_ENV} is not set"))),
    }
}
