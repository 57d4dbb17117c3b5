use axum::{
    Extension, Json, Router,
    extract::State,
    response::Json as ResponseJson,
    routing::{get, post},
};
use services::services::demo::{DemoAction, DemoState};
use utils::response::ApiResponse;

use crate::{AppState, auth::CurrentUser, error::ApiError};

/// GET /api/demo - the caller's sandbox workspace, seeded on first access
pub async fn get_demo(
    Extension(user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> ResponseJson<ApiResponse<DemoState>> {
    ResponseJson(ApiResponse::success(state.demo.state(&user.id)))
}

/// POST /api/demo/actions - apply one action and return the resulting state
pub async fn dispatch_action(
    Extension(user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Json(action): Json<DemoAction>,
) -> Result<ResponseJson<ApiResponse<DemoState>>, ApiError> {
    let next = state.demo.dispatch(&user.id, action)?;
    Ok(ResponseJson(ApiResponse::success(next)))
}

pub async fn reset_demo(
    Extension(user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> ResponseJson<ApiResponse<DemoState>> {
    tracing::debug!(user_id = %user.id, sessions = state.demo.len(), "Demo workspace reset");
    ResponseJson(ApiResponse::success(state.demo.reset(&user.id)))
}

pub fn router() -> Router<AppState> {
    let inner = Router::new()
        .route("/", get(get_demo))
        .route("/actions", post(dispatch_action))
        .route("/reset", post(reset_demo));

    Router::new().nest("/demo", inner)
}
