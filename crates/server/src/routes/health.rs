use axum::{extract::State, response::Json};
use serde::Serialize;
use utils::build_info;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub git_commit: &'static str,
    pub git_branch: &'static str,
    pub build_timestamp: &'static str,
    pub database_ready: bool,
    pub feed_subscribers: usize,
}

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database_ready = sqlx::query("SELECT 1")
        .fetch_one(state.pool())
        .await
        .is_ok();
    let info = build_info!();

    Json(HealthResponse {
        status: if database_ready { "ok" } else { "degraded" },
        version: info.version,
        git_commit: info.git_commit,
        git_branch: info.git_branch,
        build_timestamp: info.build_timestamp,
        database_ready,
        feed_subscribers: state.feed.subscriber_count(),
    })
}
