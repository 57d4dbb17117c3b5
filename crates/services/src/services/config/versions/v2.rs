use anyhow::Error;
use db::models::board::DEFAULT_BOARD_COLOR;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::services::{
    config::versions::v1,
    history::DEFAULT_HISTORY_LIMIT,
};

fn default_activity_default_limit() -> u32 {
    50
}

fn default_activity_max_limit() -> u32 {
    100
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

fn default_board_color() -> String {
    DEFAULT_BOARD_COLOR.to_string()
}

fn default_max_upload_bytes() -> u64 {
    50 * 1024 * 1024
}

#[derive(Clone, Debug, Serialize, Deserialize, TS, PartialEq)]
pub struct UploadConfig {
    #[serde(default = "default_max_upload_bytes")]
    pub max_bytes: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_upload_bytes(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, TS)]
pub struct Config {
    pub config_version: String,
    /// HS256 key bearer tokens are signed with
    #[ts(skip)]
    pub jwt_secret: String,
    /// Base URL attachment links are built from; the bound address when unset
    pub public_url: Option<String>,
    #[serde(default = "default_activity_default_limit")]
    pub activity_default_limit: u32,
    #[serde(default = "default_activity_max_limit")]
    pub activity_max_limit: u32,
    /// Undo snapshots kept per demo session
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    #[serde(default = "default_board_color")]
    pub default_board_color: String,
    #[serde(default)]
    pub uploads: UploadConfig,
}

impl Config {
    fn from_v1_config(old_config: v1::Config) -> Self {
        Self {
            config_version: "v2".to_string(),
            jwt_secret: old_config.jwt_secret,
            public_url: old_config.public_url,
            ..Self::default()
        }
    }

    pub fn from_previous_version(raw_config: &str) -> Result<Self, Error> {
        let old_config = v1::Config::from(raw_config.to_string());
        Ok(Self::from_v1_config(old_config))
    }
}

impl From<String> for Config {
    fn from(raw_config: String) -> Self {
        if let Ok(config) = serde_json::from_str::<Config>(&raw_config)
            && config.config_version == "v2"
        {
            return config;
        }

        match Self::from_previous_version(&raw_config) {
            Ok(config) => {
                tracing::info!("Config upgraded to v2");
                config
            }
            Err(e) => {
                tracing::warn!("Config migration failed: {}, using default", e);
                Self::default()
            }
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_version: "v2".to_string(),
            jwt_secret: v1::generate_secret(),
            public_url: None,
            activity_default_limit: default_activity_default_limit(),
            activity_max_limit: default_activity_max_limit(),
            history_limit: default_history_limit(),
            default_board_color: default_board_color(),
            uploads: UploadConfig::default(),
        }
    }
}
