use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{get, put},
};
use db::{
    models::{
        activity::CreateActivity,
        board::Board,
        comment::{Comment, CreateComment, UpdateComment},
        task::Task,
    },
    validation::validate_not_blank,
};
use serde_json::json;
use services::services::friendly_errors::Feature;
use sqlx::SqlitePool;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{
    AppState,
    auth::CurrentUser,
    error::{ApiError, DbResultExt},
    middleware::task_for_user,
    routes::activities::record_activity,
};

/// Load a comment the caller wrote. Comments on foreign boards are "not found", comments by
/// somebody else on the caller's board are forbidden.
async fn own_comment(
    pool: &SqlitePool,
    comment_id: Uuid,
    user: &CurrentUser,
) -> Result<Comment, ApiError> {
    let comment = Comment::find_by_id(pool, comment_id)
        .await
        .feature_failed_to(Feature::Comments, "load the comment")?
        .ok_or_else(|| ApiError::NotFound("Comment not found".to_string()))?;
    task_for_user(pool, comment.task_id, user)
        .await
        .map_err(|_| ApiError::NotFound("Comment not found".to_string()))?;
    if comment.user_id != user.id {
        return Err(ApiError::Forbidden(
            "Only the author can change a comment".to_string(),
        ));
    }
    Ok(comment)
}

/// GET /api/tasks/{task_id}/comments - oldest first
pub async fn list_comments(
    Extension(task): Extension<Task>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<Comment>>>, ApiError> {
    let comments = Comment::find_by_task(state.pool(), task.id)
        .await
        .feature_failed_to(Feature::Comments, "load comments")?;
    Ok(ResponseJson(ApiResponse::success(comments)))
}

pub async fn create_comment(
    Extension(task): Extension<Task>,
    Extension(board): Extension<Board>,
    Extension(user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Json(payload): Json<CreateComment>,
) -> Result<ResponseJson<ApiResponse<Comment>>, ApiError> {
    validate_not_blank("Comment", &payload.content)?;
    let comment = Comment::create(state.pool(), task.id, &user.id, &payload)
        .await
        .feature_failed_to(Feature::Comments, "add the comment")?;

    record_activity(
        &state,
        board.id,
        &user.id,
        CreateActivity::new(
            "commented",
            "task",
            task.id,
            json!({ "title": task.title, "comment_id": comment.id }),
        ),
    )
    .await;

    Ok(ResponseJson(ApiResponse::success(comment)))
}

pub async fn update_comment(
    Extension(user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(comment_id): Path<Uuid>,
    Json(payload): Json<UpdateComment>,
) -> Result<ResponseJson<ApiResponse<Comment>>, ApiError> {
    validate_not_blank("Comment", &payload.content)?;
    let comment = own_comment(state.pool(), comment_id, &user).await?;
    let updated = Comment::update_content(state.pool(), comment.id, &payload.content)
        .await
        .feature_failed_to(Feature::Comments, "edit the comment")?;
    Ok(ResponseJson(ApiResponse::success(updated)))
}

pub async fn delete_comment(
    Extension(user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(comment_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let comment = own_comment(state.pool(), comment_id, &user).await?;
    Comment::delete(state.pool(), comment.id)
        .await
        .feature_failed_to(Feature::Comments, "delete the comment")?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn task_routes() -> Router<AppState> {
    Router::new().route("/comments", get(list_comments).post(create_comment))
}

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/comments/{comment_id}",
        put(update_comment).delete(delete_comment),
    )
}
