use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{get, post, put},
};
use db::{
    models::{
        board::Board,
        milestone::{CreateMilestone, Milestone, UpdateMilestone},
    },
    validation::validate_not_blank,
};
use services::services::friendly_errors::Feature;
use sqlx::SqlitePool;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{
    AppState,
    auth::CurrentUser,
    error::{ApiError, DbResultExt},
    middleware::board_for_user,
};

async fn milestone_for_user(
    pool: &SqlitePool,
    milestone_id: Uuid,
    user: &CurrentUser,
) -> Result<Milestone, ApiError> {
    let milestone = Milestone::find_by_id(pool, milestone_id)
        .await
        .feature_failed_to(Feature::Milestones, "load the milestone")?
        .ok_or_else(|| ApiError::NotFound("Milestone not found".to_string()))?;
    board_for_user(pool, milestone.board_id, user)
        .await
        .map_err(|_| ApiError::NotFound("Milestone not found".to_string()))?;
    Ok(milestone)
}

/// GET /api/boards/{board_id}/milestones - by due date, undated last
pub async fn list_milestones(
    Extension(board): Extension<Board>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<Milestone>>>, ApiError> {
    let milestones = Milestone::find_by_board(state.pool(), board.id)
        .await
        .feature_failed_to(Feature::Milestones, "load milestones")?;
    Ok(ResponseJson(ApiResponse::success(milestones)))
}

pub async fn create_milestone(
    Extension(board): Extension<Board>,
    State(state): State<AppState>,
    Json(payload): Json<CreateMilestone>,
) -> Result<ResponseJson<ApiResponse<Milestone>>, ApiError> {
    validate_not_blank("Milestone name", &payload.name)?;
    let milestone = Milestone::create(state.pool(), board.id, &payload)
        .await
        .feature_failed_to(Feature::Milestones, "create the milestone")?;
    Ok(ResponseJson(ApiResponse::success(milestone)))
}

pub async fn update_milestone(
    Extension(user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(milestone_id): Path<Uuid>,
    Json(payload): Json<UpdateMilestone>,
) -> Result<ResponseJson<ApiResponse<Milestone>>, ApiError> {
    if let Some(name) = &payload.name {
        validate_not_blank("Milestone name", name)?;
    }
    let milestone = milestone_for_user(state.pool(), milestone_id, &user).await?;
    let updated = Milestone::update(state.pool(), milestone.id, &payload)
        .await
        .feature_failed_to(Feature::Milestones, "update the milestone")?;
    Ok(ResponseJson(ApiResponse::success(updated)))
}

/// POST /api/milestones/{milestone_id}/toggle - flip `is_completed`
pub async fn toggle_milestone(
    Extension(user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(milestone_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<Milestone>>, ApiError> {
    let milestone = milestone_for_user(state.pool(), milestone_id, &user).await?;
    let toggled = Milestone::set_completed(state.pool(), milestone.id, !milestone.is_completed)
        .await
        .feature_failed_to(Feature::Milestones, "update the milestone")?;
    Ok(ResponseJson(ApiResponse::success(toggled)))
}

pub async fn delete_milestone(
    Extension(user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(milestone_id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let milestone = milestone_for_user(state.pool(), milestone_id, &user).await?;
    Milestone::delete(state.pool(), milestone.id)
        .await
        .feature_failed_to(Feature::Milestones, "delete the milestone")?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn board_routes() -> Router<AppState> {
    Router::new().route("/milestones", get(list_milestones).post(create_milestone))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/milestones/{milestone_id}",
            put(update_milestone).delete(delete_milestone),
        )
        .route("/milestones/{milestone_id}/toggle", post(toggle_milestone))
}
