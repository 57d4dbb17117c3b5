use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub(crate) fn generate_secret() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub config_version: String,
    pub jwt_secret: String,
    pub public_url: Option<String>,
}

impl From<String> for Config {
    fn from(raw_config: String) -> Self {
        match serde_json::from_str::<Config>(&raw_config) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Config v1 parse failed: {}, using default", e);
                Self::default()
            }
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_version: "v1".to_string(),
            jwt_secret: generate_secret(),
            public_url: None,
        }
    }
}
