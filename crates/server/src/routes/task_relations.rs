use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{delete, get},
};
use db::{
    models::{
        board::Board,
        task::Task,
        task_relation::{CreateTaskRelation, TaskRelation},
    },
    validation::{ValidationError, validate_relation_type},
};
use services::services::friendly_errors::Feature;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{
    AppState,
    auth::CurrentUser,
    error::{ApiError, DbResultExt},
    middleware::task_for_user,
};

/// GET /api/tasks/{task_id}/relations - links where the task is on either side
pub async fn list_relations(
    Extension(task): Extension<Task>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<TaskRelation>>>, ApiError> {
    let relations = TaskRelation::find_for_task(state.pool(), task.id)
        .await
        .feature_failed_to(Feature::TaskRelations, "load task relations")?;
    Ok(ResponseJson(ApiResponse::success(relations)))
}

pub async fn create_relation(
    Extension(task): Extension<Task>,
    Extension(board): Extension<Board>,
    Extension(user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Json(payload): Json<CreateTaskRelation>,
) -> Result<ResponseJson<ApiResponse<TaskRelation>>, ApiError> {
    validate_relation_type(&payload.relation_type)?;
    if payload.related_task_id == task.id {
        return Err(ValidationError::SelfRelation.into());
    }

    let (_, related_board) = task_for_user(state.pool(), payload.related_task_id, &user)
        .await
        .map_err(|_| ApiError::NotFound("Related task not found".to_string()))?;
    if related_board.id != board.id {
        return Err(ApiError::BadRequest(
            "Related task must be on the same board".to_string(),
        ));
    }

    let relation = TaskRelation::create(state.pool(), task.id, &payload)
        .await
        .feature_failed_to(Feature::TaskRelations, "link the tasks")?;
    Ok(ResponseJson(ApiResponse::success(relation)))
}

pub async fn delete_relation(
    Extension(user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(relation_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let pool = state.pool();
    let relation = TaskRelation::find_by_id(pool, relation_id)
        .await
        .feature_failed_to(Feature::TaskRelations, "load the task relation")?
        .ok_or_else(|| ApiError::NotFound("Task relation not found".to_string()))?;
    task_for_user(pool, relation.task_id, &user)
        .await
        .map_err(|_| ApiError::NotFound("Task relation not found".to_string()))?;

    TaskRelation::delete(pool, relation.id)
        .await
        .feature_failed_to(Feature::TaskRelations, "unlink the tasks")?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn task_routes() -> Router<AppState> {
    Router::new().route("/relations", get(list_relations).post(create_relation))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/task-relations/{relation_id}", delete(delete_relation))
}
