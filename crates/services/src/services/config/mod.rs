use std::path::Path;

use thiserror::Error;

mod versions;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("Validation error: {0}")]
    ValidationError(String),
}

pub type Config = versions::v2::Config;
pub type UploadConfig = versions::v2::UploadConfig;

pub const JWT_SECRET_ENV: &str = "TB_JWT_SECRET";
pub const PUBLIC_URL_ENV: &str = "TB_PUBLIC_URL";

/// Will always return config, trying old schemas or eventually returning default
pub async fn load_config_from_file(config_path: &Path) -> Config {
    match std::fs::read_to_string(config_path) {
        Ok(raw_config) => Config::from(raw_config),
        Err(_) => {
            tracing::info!("No config file found, creating one");
            Config::default()
        }
    }
}

/// Saves the config to the given path
pub async fn save_config_to_file(config: &Config, config_path: &Path) -> Result<(), ConfigError> {
    config.validate()?;
    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let raw_config = serde_json::to_string_pretty(config)?;
    std::fs::write(config_path, raw_config)?;
    Ok(())
}

impl Config {
    /// `TB_JWT_SECRET` and `TB_PUBLIC_URL` take precedence over the file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(secret) = std::env::var(JWT_SECRET_ENV)
            && !secret.is_empty()
        {
            self.jwt_secret = secret;
        }
        if let Ok(url) = std::env::var(PUBLIC_URL_ENV)
            && !url.is_empty()
        {
            self.public_url = Some(url.trim_end_matches('/').to_string());
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "jwt_secret must not be empty".to_string(),
            ));
        }
        if self.activity_default_limit == 0
            || self.activity_default_limit > self.activity_max_limit
        {
            return Err(ConfigError::ValidationError(format!(
                "activity_default_limit must be between 1 and {}",
                self.activity_max_limit
            )));
        }
        if self.history_limit == 0 {
            return Err(ConfigError::ValidationError(
                "history_limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Clamp a requested activity page size to the configured bounds.
    pub fn activity_limit(&self, requested: Option<u32>) -> u32 {
        requested
            .unwrap_or(self.activity_default_limit)
            .clamp(1, self.activity_max_limit)
    }
}
