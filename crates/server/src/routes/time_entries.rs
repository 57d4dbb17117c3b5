use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{delete, get, post},
};
use db::models::{
    board::Board,
    task::Task,
    time_entry::{StartTimer, TimeEntry},
};
use serde::Serialize;
use services::services::{
    friendly_errors::Feature,
    time_tracking::{self, format_duration},
};
use sqlx::SqlitePool;
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{
    AppState,
    auth::CurrentUser,
    error::{ApiError, DbResultExt},
    middleware::task_for_user,
};

#[derive(Debug, Serialize, TS)]
pub struct TimeTotal {
    pub task_id: Uuid,
    pub seconds: i64,
    /// `HH:MM:SS`
    pub formatted: String,
}

/// Entries are private to the user who tracked them, and only reachable while their task
/// is on one of the caller's boards.
async fn own_entry(
    pool: &SqlitePool,
    entry_id: Uuid,
    user: &CurrentUser,
) -> Result<TimeEntry, ApiError> {
    let not_found = || ApiError::NotFound("Time entry not found".to_string());
    let entry = TimeEntry::find_by_id(pool, entry_id)
        .await
        .feature_failed_to(Feature::TimeTracking, "load the time entry")?
        .filter(|entry| entry.user_id == user.id)
        .ok_or_else(not_found)?;
    match task_for_user(pool, entry.task_id, user).await {
        Ok(_) => Ok(entry),
        Err(ApiError::NotFound(_)) => Err(not_found()),
        Err(e) => Err(e),
    }
}

pub async fn list_time_entries(
    Extension(task): Extension<Task>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<TimeEntry>>>, ApiError> {
    let entries = TimeEntry::find_by_task(state.pool(), task.id)
        .await
        .feature_failed_to(Feature::TimeTracking, "load time entries")?;
    Ok(ResponseJson(ApiResponse::success(entries)))
}

/// POST /api/tasks/{task_id}/time-entries/start - 409 while another timer runs
pub async fn start_timer(
    Extension(task): Extension<Task>,
    Extension(board): Extension<Board>,
    Extension(user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Json(payload): Json<StartTimer>,
) -> Result<ResponseJson<ApiResponse<TimeEntry>>, ApiError> {
    let entry = time_tracking::start_timer(state.pool(), task.id, &user.id, &payload).await?;
    tracing::info!(board_id = %board.id, task_id = %task.id, entry_id = %entry.id, "Timer started");
    Ok(ResponseJson(ApiResponse::success(entry)))
}

pub async fn task_total(
    Extension(task): Extension<Task>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<TimeTotal>>, ApiError> {
    let seconds = TimeEntry::total_duration_for_task(state.pool(), task.id)
        .await
        .feature_failed_to(Feature::TimeTracking, "total tracked time")?;
    Ok(ResponseJson(ApiResponse::success(TimeTotal {
        task_id: task.id,
        seconds,
        formatted: format_duration(Some(seconds)),
    })))
}

/// GET /api/time-entries/active - the caller's running timer, if any
pub async fn active_timer(
    Extension(user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Option<TimeEntry>>>, ApiError> {
    let entry = TimeEntry::find_active_for_user(state.pool(), &user.id)
        .await
        .feature_failed_to(Feature::TimeTracking, "load the running timer")?;
    Ok(ResponseJson(ApiResponse::success(entry)))
}

pub async fn stop_timer(
    Extension(user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(entry_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<TimeEntry>>, ApiError> {
    let entry = own_entry(state.pool(), entry_id, &user).await?;
    if !entry.is_running() {
        return Err(ApiError::Conflict("Timer is not running".to_string()));
    }
    let stopped = time_tracking::stop_timer(state.pool(), entry.id).await?;
    tracing::info!(
        entry_id = %stopped.id,
        duration = %format_duration(stopped.duration),
        "Timer stopped"
    );
    Ok(ResponseJson(ApiResponse::success(stopped)))
}

pub async fn delete_time_entry(
    Extension(user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(entry_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let entry = own_entry(state.pool(), entry_id, &user).await?;

    TimeEntry::delete(state.pool(), entry.id)
        .await
        .feature_failed_to(Feature::TimeTracking, "delete the time entry")?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn task_routes() -> Router<AppState> {
    Router::new()
        .route("/time-entries", get(list_time_entries))
        .route("/time-entries/start", post(start_timer))
        .route("/time-entries/total", get(task_total))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/time-entries/active", get(active_timer))
        .route("/time-entries/{entry_id}", delete(delete_time_entry))
        .route("/time-entries/{entry_id}/stop", post(stop_timer))
}
