use axum::{
    Extension, Json, Router,
    extract::State,
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::get,
};
use db::{
    models::{
        activity::CreateActivity,
        board::Board,
        column::{Column, ColumnWithTasks, CreateColumn, UpdateColumn},
        task::Task,
    },
    validation::validate_not_blank,
};
use serde::Deserialize;
use serde_json::json;
use ts_rs::TS;
use utils::response::ApiResponse;

use crate::{
    AppState,
    auth::CurrentUser,
    error::{ApiError, DbResultExt},
    middleware::load_column_middleware,
    routes::activities::record_activity,
};

/// Body of `POST /boards/{board_id}/columns`; the board comes from the path.
#[derive(Debug, Deserialize, TS)]
pub struct CreateColumnRequest {
    pub title: String,
    pub sort_order: Option<i64>,
}

pub async fn list_columns(
    Extension(board): Extension<Board>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<Column>>>, ApiError> {
    let columns = Column::find_by_board(state.pool(), board.id)
        .await
        .failed_to("load columns")?;
    Ok(ResponseJson(ApiResponse::success(columns)))
}

pub async fn create_column(
    Extension(board): Extension<Board>,
    Extension(user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Json(payload): Json<CreateColumnRequest>,
) -> Result<ResponseJson<ApiResponse<Column>>, ApiError> {
    validate_not_blank("Title", &payload.title)?;
    let data = CreateColumn {
        board_id: board.id,
        title: payload.title.trim().to_string(),
        sort_order: payload.sort_order,
    };
    let column = Column::create(state.pool(), &data, &user.id)
        .await
        .failed_to("create the column")?;

    record_activity(
        &state,
        board.id,
        &user.id,
        CreateActivity::new("created", "column", column.id, json!({ "title": column.title })),
    )
    .await;

    Ok(ResponseJson(ApiResponse::success(column)))
}

/// GET /api/columns/{column_id} - the column and its tasks in order
pub async fn get_column(
    Extension(column): Extension<Column>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<ColumnWithTasks>>, ApiError> {
    let tasks = Task::find_by_column(state.pool(), column.id)
        .await
        .failed_to("load tasks")?;
    Ok(ResponseJson(ApiResponse::success(ColumnWithTasks {
        column,
        tasks,
    })))
}

pub async fn update_column(
    Extension(column): Extension<Column>,
    Extension(user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateColumn>,
) -> Result<ResponseJson<ApiResponse<Column>>, ApiError> {
    validate_not_blank("Title", &payload.title)?;
    let updated = Column::update_title(state.pool(), column.id, payload.title.trim())
        .await
        .failed_to("rename the column")?;

    record_activity(
        &state,
        column.board_id,
        &user.id,
        CreateActivity::new(
            "updated",
            "column",
            column.id,
            json!({ "from": column.title, "to": updated.title }),
        ),
    )
    .await;

    Ok(ResponseJson(ApiResponse::success(updated)))
}

pub fn board_routes() -> Router<AppState> {
    Router::new().route("/columns", get(list_columns).post(create_column))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let column_router = Router::new()
        .route("/", get(get_column).put(update_column))
        .layer(from_fn_with_state(state.clone(), load_column_middleware));

    Router::new().nest("/columns/{column_id}", column_router)
}
