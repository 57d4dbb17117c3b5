use axum::{Router, extract::State, response::Json as ResponseJson, routing::get};
use serde::Serialize;
use services::services::config::UploadConfig;
use ts_rs::TS;
use utils::response::ApiResponse;

use crate::AppState;

/// The client-visible part of the server config. The signing secret never leaves the server.
#[derive(Debug, Serialize, TS)]
pub struct ConfigInfo {
    pub config_version: String,
    pub public_url: Option<String>,
    pub activity_default_limit: u32,
    pub activity_max_limit: u32,
    pub history_limit: usize,
    pub default_board_color: String,
    pub uploads: UploadConfig,
}

pub async fn get_config(State(state): State<AppState>) -> ResponseJson<ApiResponse<ConfigInfo>> {
    let config = state.config();
    ResponseJson(ApiResponse::success(ConfigInfo {
        config_version: config.config_version.clone(),
        public_url: config.public_url.clone(),
        activity_default_limit: config.activity_default_limit,
        activity_max_limit: config.activity_max_limit,
        history_limit: config.history_limit,
        default_board_color: config.default_board_color.clone(),
        uploads: config.uploads.clone(),
    }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/config", get(get_config))
}
