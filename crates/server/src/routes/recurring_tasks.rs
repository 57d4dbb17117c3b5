use axum::{
    Extension, Json, Router,
    extract::State,
    response::Json as ResponseJson,
    routing::get,
};
use chrono::Utc;
use db::models::{
    recurring_task::{CreateRecurringTask, RecurringTask, UpdateRecurringTask},
    task::Task,
};
use services::services::{
    friendly_errors::Feature,
    recurrence::{Schedule, next_run},
};
use utils::response::ApiResponse;

use crate::{
    AppState,
    error::{ApiError, DbResultExt},
};

/// GET /api/tasks/{task_id}/recurrence - `null` when the task does not repeat
pub async fn get_recurrence(
    Extension(task): Extension<Task>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Option<RecurringTask>>>, ApiError> {
    let rule = RecurringTask::find_by_task(state.pool(), task.id)
        .await
        .feature_failed_to(Feature::RecurringTasks, "load the recurrence")?;
    Ok(ResponseJson(ApiResponse::success(rule)))
}

/// PUT /api/tasks/{task_id}/recurrence - replace the task's rule
pub async fn set_recurrence(
    Extension(task): Extension<Task>,
    State(state): State<AppState>,
    Json(payload): Json<CreateRecurringTask>,
) -> Result<ResponseJson<ApiResponse<RecurringTask>>, ApiError> {
    let schedule = Schedule::try_from(&payload)?;
    let next = next_run(&schedule, Utc::now());
    let pool = state.pool();

    if let Some(existing) = RecurringTask::find_by_task(pool, task.id)
        .await
        .feature_failed_to(Feature::RecurringTasks, "load the recurrence")?
    {
        RecurringTask::delete(pool, existing.id)
            .await
            .feature_failed_to(Feature::RecurringTasks, "replace the recurrence")?;
    }

    let rule = RecurringTask::create(pool, task.id, &payload, next)
        .await
        .feature_failed_to(Feature::RecurringTasks, "save the recurrence")?;
    tracing::debug!(task_id = %task.id, frequency = %schedule.frequency, next_run = ?rule.next_run, "Recurrence set");
    Ok(ResponseJson(ApiResponse::success(rule)))
}

/// PATCH /api/tasks/{task_id}/recurrence - change some fields; the next run is recomputed
pub async fn update_recurrence(
    Extension(task): Extension<Task>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateRecurringTask>,
) -> Result<ResponseJson<ApiResponse<RecurringTask>>, ApiError> {
    let pool = state.pool();
    let existing = RecurringTask::find_by_task(pool, task.id)
        .await
        .feature_failed_to(Feature::RecurringTasks, "load the recurrence")?
        .ok_or_else(|| ApiError::NotFound("Task does not repeat".to_string()))?;

    let mut rule = existing.merged(&payload);
    let schedule = Schedule::try_from(&rule)?;
    rule.next_run = next_run(&schedule, Utc::now());

    let updated = RecurringTask::update(pool, &rule)
        .await
        .feature_failed_to(Feature::RecurringTasks, "update the recurrence")?;
    Ok(ResponseJson(ApiResponse::success(updated)))
}

pub async fn delete_recurrence(
    Extension(task): Extension<Task>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let pool = state.pool();
    let existing = RecurringTask::find_by_task(pool, task.id)
        .await
        .feature_failed_to(Feature::RecurringTasks, "load the recurrence")?
        .ok_or_else(|| ApiError::NotFound("Task does not repeat".to_string()))?;
    RecurringTask::delete(pool, existing.id)
        .await
        .feature_failed_to(Feature::RecurringTasks, "delete the recurrence")?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn task_routes() -> Router<AppState> {
    Router::new().route(
        "/recurrence",
        get(get_recurrence)
            .put(set_recurrence)
            .patch(update_recurrence)
            .delete(delete_recurrence),
    )
}
