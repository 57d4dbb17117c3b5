use axum::{
    Extension, Router,
    extract::{DefaultBodyLimit, Multipart, Query, State},
    response::Json as ResponseJson,
    routing::get,
};
use db::models::{board::Board, task::Task};
use serde::Deserialize;
use services::services::storage::{Attachment, format_file_size};
use ts_rs::TS;
use utils::response::ApiResponse;

use crate::{AppState, auth::CurrentUser, error::ApiError};

#[derive(Debug, Deserialize, TS)]
pub struct AttachmentKeyQuery {
    pub key: String,
}

pub async fn list_attachments(
    Extension(task): Extension<Task>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<Attachment>>>, ApiError> {
    let attachments = state.attachments.list(task.id).await?;
    Ok(ResponseJson(ApiResponse::success(attachments)))
}

/// POST /api/tasks/{task_id}/attachments - multipart with a single `file` field
pub async fn upload_attachment(
    Extension(task): Extension<Task>,
    Extension(board): Extension<Board>,
    Extension(user): Extension<CurrentUser>,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<ResponseJson<ApiResponse<Attachment>>, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("file").to_string();
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await?;

        let attachment = state
            .attachments
            .upload(task.id, &file_name, content_type.as_deref(), &data)
            .await?;
        tracing::info!(
            board_id = %board.id,
            task_id = %task.id,
            user_id = %user.id,
            size = %format_file_size(attachment.size),
            "Attachment stored"
        );
        return Ok(ResponseJson(ApiResponse::success(attachment)));
    }
    Err(ApiError::BadRequest("No file provided".to_string()))
}

/// DELETE /api/tasks/{task_id}/attachments?key=... - the key must belong to this task
pub async fn delete_attachment(
    Extension(task): Extension<Task>,
    State(state): State<AppState>,
    Query(query): Query<AttachmentKeyQuery>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    if !query.key.starts_with(&format!("{}/", task.id)) {
        return Err(ApiError::NotFound("Attachment not found".to_string()));
    }
    state.attachments.delete(&query.key).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn task_routes(state: &AppState) -> Router<AppState> {
    let max_bytes = usize::try_from(state.config().uploads.max_bytes).unwrap_or(usize::MAX);
    Router::new().route(
        "/attachments",
        get(list_attachments)
            .post(upload_attachment)
            .delete(delete_attachment)
            .layer(DefaultBodyLimit::max(max_bytes)),
    )
}
