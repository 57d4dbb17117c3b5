use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::get,
};
use db::{
    models::{
        activity::CreateActivity,
        board::{Board, CreateBoard, UpdateBoard},
        tag::Tag,
        task::Task,
    },
    validation::validate_not_blank,
};
use serde_json::json;
use services::services::{
    board_data::{BoardWithColumns, create_board_with_default_columns, get_board_with_columns},
    filter::{TaskFilter, TaskFilterQuery, tags_by_task},
    friendly_errors::{BOARD_TITLE_TAKEN, DbErrorKind, Feature, classify},
};
use tracing::instrument;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{
    AppState,
    auth::CurrentUser,
    error::{ApiError, DbResultExt},
    middleware::load_board_middleware,
    routes::{activities, columns, custom_fields, messages, milestones, tags, tasks},
};

/// A duplicate `(user_id, title)` gets its own message; everything else is generic.
fn board_write_error(err: sqlx::Error, operation: &'static str) -> ApiError {
    match classify(&err) {
        DbErrorKind::UniqueViolation => ApiError::Conflict(BOARD_TITLE_TAKEN.to_string()),
        _ => ApiError::Operation {
            operation,
            feature: None,
            source: err,
        },
    }
}

/// GET /api/boards - the caller's boards, newest first
pub async fn list_boards(
    Extension(user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Vec<Board>>>, ApiError> {
    let boards = Board::find_by_user(state.pool(), &user.id)
        .await
        .failed_to("load boards")?;
    Ok(ResponseJson(ApiResponse::success(boards)))
}

/// POST /api/boards - create a board with the default columns
#[instrument(skip(state, payload), fields(user_id = %user.id))]
pub async fn create_board(
    Extension(user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Json(mut payload): Json<CreateBoard>,
) -> Result<ResponseJson<ApiResponse<BoardWithColumns>>, ApiError> {
    validate_not_blank("Title", &payload.title)?;
    if payload.color.is_none() {
        payload.color = Some(state.config().default_board_color.clone());
    }

    let created = create_board_with_default_columns(state.pool(), &payload, &user.id)
        .await
        .map_err(|e| board_write_error(e, "create the board"))?;

    activities::record_activity(
        &state,
        created.board.id,
        &user.id,
        CreateActivity::new(
            "created",
            "board",
            created.board.id,
            json!({ "title": created.board.title }),
        ),
    )
    .await;

    Ok(ResponseJson(ApiResponse::success(created)))
}

/// GET /api/boards/{board_id} - board, columns and tasks; query parameters filter the tasks
#[instrument(skip(state, board, query), fields(board_id = %board.id))]
pub async fn get_board(
    Extension(board): Extension<Board>,
    State(state): State<AppState>,
    Query(query): Query<TaskFilterQuery>,
) -> Result<ResponseJson<ApiResponse<BoardWithColumns>>, ApiError> {
    let filter = TaskFilter::try_from(query)?;
    let mut view = get_board_with_columns(state.pool(), board.id).await?;

    if !filter.is_empty() {
        let tags = if filter.tags.is_empty() {
            Default::default()
        } else {
            tags_by_task(
                Tag::task_tag_names_for_board(state.pool(), board.id)
                    .await
                    .feature_failed_to(Feature::Tags, "load tags")?,
            )
        };
        view.columns = filter.apply(view.columns, &tags);
    }

    Ok(ResponseJson(ApiResponse::success(view)))
}

/// PUT /api/boards/{board_id}
pub async fn update_board(
    Extension(board): Extension<Board>,
    Extension(user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateBoard>,
) -> Result<ResponseJson<ApiResponse<Board>>, ApiError> {
    if let Some(title) = &payload.title {
        validate_not_blank("Title", title)?;
    }
    let updated = Board::update(state.pool(), board.id, &payload)
        .await
        .map_err(|e| board_write_error(e, "update the board"))?;

    activities::record_activity(
        &state,
        board.id,
        &user.id,
        CreateActivity::new("updated", "board", board.id, json!({ "title": updated.title })),
    )
    .await;

    Ok(ResponseJson(ApiResponse::success(updated)))
}

/// DELETE /api/boards/{board_id} - cascades to columns, tasks and everything below
pub async fn delete_board(
    Extension(board): Extension<Board>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let task_ids: Vec<Uuid> = Task::find_by_board(state.pool(), board.id)
        .await
        .failed_to("load the board's tasks")?
        .into_iter()
        .map(|task| task.id)
        .collect();
    let rows_affected = Board::delete(state.pool(), board.id)
        .await
        .failed_to("delete the board")?;
    if rows_affected == 0 {
        return Err(ApiError::NotFound("Board not found".to_string()));
    }
    tasks::remove_attachments(&state, &task_ids).await;
    tracing::info!(board_id = %board.id, tasks = task_ids.len(), "Deleted board");
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let board_router = Router::new()
        .route("/", get(get_board).put(update_board).delete(delete_board))
        .merge(columns::board_routes())
        .merge(messages::board_routes())
        .merge(activities::board_routes())
        .merge(tags::board_routes())
        .merge(custom_fields::board_routes())
        .merge(milestones::board_routes())
        .layer(from_fn_with_state(state.clone(), load_board_middleware));

    let inner = Router::new()
        .route("/", get(list_boards).post(create_board))
        .nest("/{board_id}", board_router);

    Router::new().nest("/boards", inner)
}
