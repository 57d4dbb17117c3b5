use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{delete, get, post, put},
};
use db::{
    models::{
        checklist::{
            Checklist, ChecklistItem, ChecklistWithItems, CreateChecklist, CreateChecklistItem,
            UpdateChecklistItem,
        },
        task::Task,
    },
    validation::validate_not_blank,
};
use futures_util::future::try_join_all;
use services::services::friendly_errors::Feature;
use sqlx::SqlitePool;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{
    AppState,
    auth::CurrentUser,
    error::{ApiError, DbResultExt},
    middleware::task_for_user,
};

async fn checklist_for_user(
    pool: &SqlitePool,
    checklist_id: Uuid,
    user: &CurrentUser,
) -> Result<Checklist, ApiError> {
    let checklist = Checklist::find_by_id(pool, checklist_id)
        .await
        .feature_failed_to(Feature::Checklists, "load the checklist")?
        .ok_or_else(|| ApiError::NotFound("Checklist not found".to_string()))?;
    task_for_user(pool, checklist.task_id, user)
        .await
        .map_err(|_| ApiError::NotFound("Checklist not found".to_string()))?;
    Ok(checklist)
}

async fn item_for_user(
    pool: &SqlitePool,
    item_id: Uuid,
    user: &CurrentUser,
) -> Result<ChecklistItem, ApiError> {
    let item = ChecklistItem::find_by_id(pool, item_id)
        .await
        .feature_failed_to(Feature::Checklists, "load the checklist item")?
        .ok_or_else(|| ApiError::NotFound("Checklist item not found".to_string()))?;
    checklist_for_user(pool, item.checklist_id, user)
        .await
        .map_err(|_| ApiError::NotFound("Checklist item not found".to_string()))?;
    Ok(item)
}

/// GET /api/tasks/{task_id}/checklists - every checklist of the task with its items
pub async fn list_checklists(
    Extension(task): Extension<Task>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<ChecklistWithItems>>>, ApiError> {
    let pool = state.pool();
    let checklists = Checklist::find_by_task(pool, task.id)
        .await
        .feature_failed_to(Feature::Checklists, "load checklists")?;

    let with_items = try_join_all(checklists.into_iter().map(|checklist| async move {
        let items = ChecklistItem::find_by_checklist(pool, checklist.id).await?;
        Ok::<_, sqlx::Error>(ChecklistWithItems { checklist, items })
    }))
    .await
    .feature_failed_to(Feature::Checklists, "load checklist items")?;

    Ok(ResponseJson(ApiResponse::success(with_items)))
}

pub async fn create_checklist(
    Extension(task): Extension<Task>,
    State(state): State<AppState>,
    Json(payload): Json<CreateChecklist>,
) -> Result<ResponseJson<ApiResponse<Checklist>>, ApiError> {
    validate_not_blank("Checklist title", &payload.title)?;
    let checklist = Checklist::create(state.pool(), task.id, &payload)
        .await
        .feature_failed_to(Feature::Checklists, "create the checklist")?;
    Ok(ResponseJson(ApiResponse::success(checklist)))
}

pub async fn delete_checklist(
    Extension(user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(checklist_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let checklist = checklist_for_user(state.pool(), checklist_id, &user).await?;
    Checklist::delete(state.pool(), checklist.id)
        .await
        .feature_failed_to(Feature::Checklists, "delete the checklist")?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub async fn create_item(
    Extension(user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(checklist_id): Path<Uuid>,
    Json(payload): Json<CreateChecklistItem>,
) -> Result<ResponseJson<ApiResponse<ChecklistItem>>, ApiError> {
    validate_not_blank("Item title", &payload.title)?;
    let checklist = checklist_for_user(state.pool(), checklist_id, &user).await?;
    let item = ChecklistItem::create(state.pool(), checklist.id, &payload)
        .await
        .feature_failed_to(Feature::Checklists, "add the checklist item")?;
    Ok(ResponseJson(ApiResponse::success(item)))
}

/// PUT /api/checklist-items/{item_id} - rename, tick or reorder
pub async fn update_item(
    Extension(user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
    Json(payload): Json<UpdateChecklistItem>,
) -> Result<ResponseJson<ApiResponse<ChecklistItem>>, ApiError> {
    if let Some(title) = &payload.title {
        validate_not_blank("Item title", title)?;
    }
    let item = item_for_user(state.pool(), item_id, &user).await?;
    let updated = ChecklistItem::update(state.pool(), item.id, &payload)
        .await
        .feature_failed_to(Feature::Checklists, "update the checklist item")?;
    Ok(ResponseJson(ApiResponse::success(updated)))
}

pub async fn delete_item(
    Extension(user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(item_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let item = item_for_user(state.pool(), item_id, &user).await?;
    ChecklistItem::delete(state.pool(), item.id)
        .await
        .feature_failed_to(Feature::Checklists, "delete the checklist item")?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn task_routes() -> Router<AppState> {
    Router::new().route("/checklists", get(list_checklists).post(create_checklist))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/checklists/{checklist_id}", delete(delete_checklist))
        .route("/checklists/{checklist_id}/items", post(create_item))
        .route(
            "/checklist-items/{item_id}",
            put(update_item).delete(delete_item),
        )
}
