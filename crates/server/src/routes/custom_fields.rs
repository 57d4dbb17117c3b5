use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{delete, get, put},
};
use db::{
    models::{
        board::Board,
        custom_field::{CreateCustomField, CustomField, SetFieldValue, TaskCustomFieldValue},
        task::Task,
    },
    validation::{validate_field_type, validate_not_blank},
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

pub async fn list_fields(
    Extension(board): Extension<Board>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<CustomField>>>, ApiError> {
    let fields = CustomField::find_by_board(state.pool(), board.id)
        .await
        .feature_failed_to(Feature::CustomFields, "load custom fields")?;
    Ok(ResponseJson(ApiResponse::success(fields)))
}

pub async fn create_field(
    Extension(board): Extension<Board>,
    Extension(user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Json(payload): Json<CreateCustomField>,
) -> Result<ResponseJson<ApiResponse<CustomField>>, ApiError> {
    validate_not_blank("Field name", &payload.name)?;
    validate_field_type(&payload.field_type)?;
    let field = CustomField::create(state.pool(), board.id, &user.id, &payload)
        .await
        .feature_failed_to(Feature::CustomFields, "create the custom field")?;
    Ok(ResponseJson(ApiResponse::success(field)))
}

/// DELETE /api/custom-fields/{field_id} - values on tasks go with it
pub async fn delete_field(
    Extension(user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(field_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let pool = state.pool();
    let field = CustomField::find_by_id(pool, field_id)
        .await
        .feature_failed_to(Feature::CustomFields, "load the custom field")?
        .ok_or_else(|| ApiError::NotFound("Custom field not found".to_string()))?;
    board_for_user(pool, field.board_id, &user)
        .await
        .map_err(|_| ApiError::NotFound("Custom field not found".to_string()))?;

    CustomField::delete(pool, field.id)
        .await
        .feature_failed_to(Feature::CustomFields, "delete the custom field")?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub async fn list_values(
    Extension(task): Extension<Task>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<TaskCustomFieldValue>>>, ApiError> {
    let values = CustomField::values_for_task(state.pool(), task.id)
        .await
        .feature_failed_to(Feature::CustomFields, "load custom field values")?;
    Ok(ResponseJson(ApiResponse::success(values)))
}

/// PUT /api/tasks/{task_id}/custom-fields/{field_id} - `null` clears the value
pub async fn set_value(
    Extension(task): Extension<Task>,
    Extension(board): Extension<Board>,
    State(state): State<AppState>,
    Path((_, field_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<SetFieldValue>,
) -> Result<ResponseJson<ApiResponse<TaskCustomFieldValue>>, ApiError> {
    let pool = state.pool();
    let field = CustomField::find_by_id(pool, field_id)
        .await
        .feature_failed_to(Feature::CustomFields, "load the custom field")?
        .filter(|field| field.board_id == board.id)
        .ok_or_else(|| ApiError::NotFound("Custom field not found".to_string()))?;

    let value = CustomField::set_value(pool, task.id, field.id, payload.value.as_deref())
        .await
        .feature_failed_to(Feature::CustomFields, "save the custom field value")?;
    Ok(ResponseJson(ApiResponse::success(value)))
}

pub fn board_routes() -> Router<AppState> {
    Router::new().route("/custom-fields", get(list_fields).post(create_field))
}

pub fn task_routes() -> Router<AppState> {
    Router::new()
        .route("/custom-fields", get(list_values))
        .route("/custom-fields/{field_id}", put(set_value))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/custom-fields/{field_id}", delete(delete_field))
}
