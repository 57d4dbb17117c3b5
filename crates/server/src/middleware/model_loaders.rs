//! Load the model named in the path, check it belongs to the signed-in user and hand it to
//! the handler as a request extension.
//!
//! Boards are private to their owner; columns and tasks inherit their board's owner. A row
//! owned by somebody else is reported exactly like a missing one.

use axum::{
    extract::{Path, Request, State},
    middleware::Next,
    response::Response,
};
use db::models::{board::Board, column::Column, task::Task};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    AppState,
    auth::CurrentUser,
    error::{ApiError, DbResultExt},
};

/// Pick `name` out of the matched path parameters.
fn path_uuid(params: &[(String, String)], name: &str) -> Result<Uuid, ApiError> {
    let raw = params
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
        .ok_or_else(|| ApiError::BadRequest(format!("Missing path parameter {name}")))?;
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("Invalid {name}: {raw}")))
}

fn current_user(request: &Request) -> Result<CurrentUser, ApiError> {
    request
        .extensions()
        .get::<CurrentUser>()
        .cloned()
        .ok_or(ApiError::Auth(crate::auth::AuthError::MissingToken))
}

pub async fn board_for_user(
    pool: &SqlitePool,
    board_id: Uuid,
    user: &CurrentUser,
) -> Result<Board, ApiError> {
    match Board::find_by_id(pool, board_id)
        .await
        .failed_to("load the board")?
    {
        Some(board) if board.user_id == user.id => Ok(board),
        Some(_) => {
            tracing::warn!(%board_id, user_id = %user.id, "Board belongs to another user");
            Err(ApiError::NotFound("Board not found".to_string()))
        }
        None => Err(ApiError::NotFound("Board not found".to_string())),
    }
}

pub async fn column_for_user(
    pool: &SqlitePool,
    column_id: Uuid,
    user: &CurrentUser,
) -> Result<(Column, Board), ApiError> {
    let column = Column::find_by_id(pool, column_id)
        .await
        .failed_to("load the column")?
        .ok_or_else(|| ApiError::NotFound("Column not found".to_string()))?;
    let board = board_for_user(pool, column.board_id, user)
        .await
        .map_err(|_| ApiError::NotFound("Column not found".to_string()))?;
    Ok((column, board))
}

pub async fn task_for_user(
    pool: &SqlitePool,
    task_id: Uuid,
    user: &CurrentUser,
) -> Result<(Task, Board), ApiError> {
    let task = Task::find_by_id(pool, task_id)
        .await
        .failed_to("load the task")?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;
    let (_, board) = column_for_user(pool, task.column_id, user)
        .await
        .map_err(|_| ApiError::NotFound("Task not found".to_string()))?;
    Ok((task, board))
}

pub async fn load_board_middleware(
    State(state): State<AppState>,
    Path(params): Path<Vec<(String, String)>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let board_id = path_uuid(&params, "board_id")?;
    let user = current_user(&request)?;
    let board = board_for_user(state.pool(), board_id, &user).await?;

    request.extensions_mut().insert(board);
    Ok(next.run(request).await)
}

pub async fn load_column_middleware(
    State(state): State<AppState>,
    Path(params): Path<Vec<(String, String)>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let column_id = path_uuid(&params, "column_id")?;
    let user = current_user(&request)?;
    let (column, board) = column_for_user(state.pool(), column_id, &user).await?;

    request.extensions_mut().insert(column);
    request.extensions_mut().insert(board);
    Ok(next.run(request).await)
}

/// Inserts both the [`Task`] and its [`Board`].
pub async fn load_task_middleware(
    State(state): State<AppState>,
    Path(params): Path<Vec<(String, String)>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let task_id = path_uuid(&params, "task_id")?;
    let user = current_user(&request)?;
    let (task, board) = task_for_user(state.pool(), task_id, &user).await?;

    request.extensions_mut().insert(task);
    request.extensions_mut().insert(board);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_uuid_finds_the_named_parameter() {
        let id = Uuid::new_v4();
        let params = vec![
            ("task_id".to_string(), id.to_string()),
            ("tag_id".to_string(), Uuid::nil().to_string()),
        ];
        assert_eq!(path_uuid(&params, "task_id").unwrap(), id);
        assert!(matches!(
            path_uuid(&params, "board_id"),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn path_uuid_rejects_garbage() {
        let params = vec![("task_id".to_string(), "nope".to_string())];
        assert!(matches!(
            path_uuid(&params, "task_id"),
            Err(ApiError::BadRequest(_))
        ));
    }
}
