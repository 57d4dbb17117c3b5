use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{delete, get, put},
};
use db::{
    models::{
        board::Board,
        tag::{CreateTag, Tag, TaskTag},
        task::Task,
    },
    validation::validate_not_blank,
};
use services::services::friendly_errors::Feature;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{
    AppState,
    auth::CurrentUser,
    error::{ApiError, DbResultExt},
    middleware::board_for_user,
};

pub async fn list_board_tags(
    Extension(board): Extension<Board>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<Tag>>>, ApiError> {
    let tags = Tag::find_by_board(state.pool(), board.id)
        .await
        .feature_failed_to(Feature::Tags, "load tags")?;
    Ok(ResponseJson(ApiResponse::success(tags)))
}

pub async fn create_tag(
    Extension(board): Extension<Board>,
    Extension(user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Json(payload): Json<CreateTag>,
) -> Result<ResponseJson<ApiResponse<Tag>>, ApiError> {
    validate_not_blank("Tag name", &payload.name)?;
    let tag = Tag::create(state.pool(), board.id, &user.id, &payload)
        .await
        .feature_failed_to(Feature::Tags, "create the tag")?;
    Ok(ResponseJson(ApiResponse::success(tag)))
}

pub async fn delete_tag(
    Extension(user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(tag_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let pool = state.pool();
    let tag = Tag::find_by_id(pool, tag_id)
        .await
        .feature_failed_to(Feature::Tags, "load the tag")?
        .ok_or_else(|| ApiError::NotFound("Tag not found".to_string()))?;
    board_for_user(pool, tag.board_id, &user)
        .await
        .map_err(|_| ApiError::NotFound("Tag not found".to_string()))?;

    Tag::delete(pool, tag.id)
        .await
        .feature_failed_to(Feature::Tags, "delete the tag")?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub async fn list_task_tags(
    Extension(task): Extension<Task>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<Tag>>>, ApiError> {
    let tags = Tag::find_by_task(state.pool(), task.id)
        .await
        .feature_failed_to(Feature::Tags, "load tags")?;
    Ok(ResponseJson(ApiResponse::success(tags)))
}

/// PUT /api/tasks/{task_id}/tags/{tag_id} - only tags of the task's own board
pub async fn attach_tag(
    Extension(task): Extension<Task>,
    Extension(board): Extension<Board>,
    State(state): State<AppState>,
    Path((_, tag_id)): Path<(Uuid, Uuid)>,
) -> Result<ResponseJson<ApiResponse<TaskTag>>, ApiError> {
    let pool = state.pool();
    let tag = Tag::find_by_id(pool, tag_id)
        .await
        .feature_failed_to(Feature::Tags, "load the tag")?
        .filter(|tag| tag.board_id == board.id)
        .ok_or_else(|| ApiError::NotFound("Tag not found".to_string()))?;

    let link = Tag::attach_to_task(pool, task.id, tag.id)
        .await
        .feature_failed_to(Feature::Tags, "tag the task")?;
    Ok(ResponseJson(ApiResponse::success(link)))
}

pub async fn detach_tag(
    Extension(task): Extension<Task>,
    State(state): State<AppState>,
    Path((_, tag_id)): Path<(Uuid, Uuid)>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    Tag::detach_from_task(state.pool(), task.id, tag_id)
        .await
        .feature_failed_to(Feature::Tags, "untag the task")?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn board_routes() -> Router<AppState> {
    Router::new().route("/tags", get(list_board_tags).post(create_tag))
}

pub fn task_routes() -> Router<AppState> {
    Router::new()
        .route("/tags", get(list_task_tags))
        .route("/tags/{tag_id}", put(attach_tag).delete(detach_tag))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/tags/{tag_id}", delete(delete_tag))
}
