use axum::{
    Extension, Json, Router,
    extract::State,
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::{
    models::{
        activity::CreateActivity,
        board::Board,
        task::{CreateTask, MoveTask, Task, UpdateTask},
    },
    validation::validate_not_blank,
};
use serde_json::json;
use tracing::instrument;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{
    AppState,
    auth::CurrentUser,
    error::{ApiError, DbResultExt},
    middleware::{column_for_user, load_task_middleware},
    routes::{
        activities::record_activity, attachments, checklists, comments, custom_fields,
        recurring_tasks, tags, task_relations, time_entries,
    },
};

/// POST /api/tasks - the column in the body decides the board
#[instrument(skip(state, payload), fields(column_id = %payload.column_id))]
pub async fn create_task(
    Extension(user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Json(mut payload): Json<CreateTask>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    validate_not_blank("Title", &payload.title)?;
    let (column, board) = column_for_user(state.pool(), payload.column_id, &user).await?;
    payload.title = payload.title.trim().to_string();

    let task = Task::create(state.pool(), &payload)
        .await
        .failed_to("create the task")?;

    record_activity(
        &state,
        board.id,
        &user.id,
        CreateActivity::new(
            "created",
            "task",
            task.id,
            json!({ "title": task.title, "column": column.title }),
        ),
    )
    .await;

    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn get_task(
    Extension(task): Extension<Task>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn update_task(
    Extension(task): Extension<Task>,
    Extension(board): Extension<Board>,
    Extension(user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateTask>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    if let Some(title) = &payload.title {
        validate_not_blank("Title", title)?;
    }
    let updated = Task::update(state.pool(), task.id, &payload)
        .await
        .failed_to("update the task")?;

    record_activity(
        &state,
        board.id,
        &user.id,
        CreateActivity::new("updated", "task", task.id, json!({ "title": updated.title })),
    )
    .await;

    Ok(ResponseJson(ApiResponse::success(updated)))
}

pub async fn delete_task(
    Extension(task): Extension<Task>,
    Extension(board): Extension<Board>,
    Extension(user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let rows_affected = Task::delete(state.pool(), task.id)
        .await
        .failed_to("delete the task")?;
    if rows_affected == 0 {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }
    remove_attachments(&state, &[task.id]).await;

    // The task is gone; the activity keeps its id and title for the feed.
    record_activity(
        &state,
        board.id,
        &user.id,
        CreateActivity::new("deleted", "task", task.id, json!({ "title": task.title })),
    )
    .await;

    Ok(ResponseJson(ApiResponse::success(())))
}

/// Drop the stored attachments of deleted tasks. The rows are already gone, so a failure
/// only leaves orphaned files behind and is logged.
pub(crate) async fn remove_attachments(state: &AppState, task_ids: &[Uuid]) {
    for task_id in task_ids {
        if let Err(e) = state.attachments.delete_task_objects(*task_id).await {
            tracing::warn!(%task_id, "Failed to remove task attachments: {}", e);
        }
    }
}

/// POST /api/tasks/{task_id}/move - put the task at `sort_order` in `column_id`.
///
/// The target column must be on the task's board. Siblings in both columns are renumbered in
/// the same transaction.
#[instrument(skip(state, task, board, user), fields(task_id = %task.id))]
pub async fn move_task(
    Extension(task): Extension<Task>,
    Extension(board): Extension<Board>,
    Extension(user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Json(payload): Json<MoveTask>,
) -> Result<ResponseJson<ApiResponse<Task>>, ApiError> {
    let (target, target_board) = column_for_user(state.pool(), payload.column_id, &user).await?;
    if target_board.id != board.id {
        return Err(ApiError::BadRequest(
            "Tasks can only move between columns of the same board".to_string(),
        ));
    }

    if task.column_id == target.id && task.sort_order == payload.sort_order {
        return Ok(ResponseJson(ApiResponse::success(task)));
    }

    let moved = Task::move_to(state.pool(), task.id, target.id, payload.sort_order)
        .await
        .failed_to("move the task")?;

    tracing::debug!(
        from_column = %task.column_id,
        to_column = %moved.column_id,
        sort_order = moved.sort_order,
        "Task moved"
    );
    record_activity(
        &state,
        board.id,
        &user.id,
        CreateActivity::new(
            "moved",
            "task",
            task.id,
            json!({
                "title": moved.title,
                "from_column_id": task.column_id,
                "to_column_id": moved.column_id,
                "to_column": target.title,
                "sort_order": moved.sort_order,
            }),
        ),
    )
    .await;

    Ok(ResponseJson(ApiResponse::success(moved)))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let task_router = Router::new()
        .route("/", get(get_task).put(update_task).delete(delete_task))
        .route("/move", post(move_task))
        .merge(tags::task_routes())
        .merge(checklists::task_routes())
        .merge(comments::task_routes())
        .merge(time_entries::task_routes())
        .merge(custom_fields::task_routes())
        .merge(recurring_tasks::task_routes())
        .merge(task_relations::task_routes())
        .merge(attachments::task_routes(state))
        .layer(from_fn_with_state(state.clone(), load_task_middleware));

    let inner = Router::new()
        .route("/", post(create_task))
        .nest("/{task_id}", task_router);

    Router::new().nest("/tasks", inner)
}
