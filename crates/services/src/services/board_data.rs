//! Board aggregation: a board with its columns and their tasks in display order.

use db::models::{
    board::{Board, CreateBoard},
    column::{Column, ColumnWithTasks, CreateColumn, DEFAULT_COLUMN_TITLES},
    task::Task,
};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum BoardDataError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("Board not found")]
    BoardNotFound,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, PartialEq)]
pub struct BoardWithColumns {
    #[serde(flatten)]
    #[ts(flatten)]
    pub board: Board,
    pub columns: Vec<ColumnWithTasks>,
}

/// Load a board, its columns and all of its tasks.
///
/// The board row and the column list are fetched concurrently.
pub async fn get_board_with_columns(
    pool: &sqlx::SqlitePool,
    board_id: Uuid,
) -> Result<BoardWithColumns, BoardDataError> {
    let (board, columns) = tokio::try_join!(
        Board::find_by_id(pool, board_id),
        Column::find_by_board(pool, board_id)
    )?;
    let board = board.ok_or(BoardDataError::BoardNotFound)?;

    let tasks = Task::find_by_board(pool, board_id).await?;
    tracing::debug!(
        board_id = %board_id,
        columns = columns.len(),
        tasks = tasks.len(),
        "Loaded board"
    );

    Ok(BoardWithColumns {
        board,
        columns: group_tasks(columns, tasks),
    })
}

/// Attach each task to its column, ordered by `sort_order`. Tasks whose column is not in
/// `columns` are dropped.
pub fn group_tasks(columns: Vec<Column>, mut tasks: Vec<Task>) -> Vec<ColumnWithTasks> {
    tasks.sort_by_key(|t| t.sort_order);

    let mut grouped: Vec<ColumnWithTasks> = columns
        .into_iter()
        .map(|column| ColumnWithTasks {
            column,
            tasks: Vec::new(),
        })
        .collect();

    for task in tasks {
        if let Some(column) = grouped.iter_mut().find(|c| c.column.id == task.column_id) {
            column.tasks.push(task);
        }
    }

    grouped
}

/// Create a board followed by the default columns.
///
/// The column inserts run concurrently and are not wrapped in a transaction: if one fails the
/// board and any columns already written are left in place.
pub async fn create_board_with_default_columns(
    pool: &sqlx::SqlitePool,
    data: &CreateBoard,
    user_id: &str,
) -> Result<BoardWithColumns, sqlx::Error> {
    let board = Board::create(pool, data, user_id).await?;

    let inserts = DEFAULT_COLUMN_TITLES
        .iter()
        .enumerate()
        .map(|(idx, title)| {
            let data = CreateColumn {
                board_id: board.id,
                title: title.to_string(),
                sort_order: Some(idx as i64),
            };
            async move { Column::create(pool, &data, user_id).await }
        });
    let mut columns = try_join_all(inserts).await?;
    columns.sort_by_key(|c| c.sort_order);

    tracing::info!(board_id = %board.id, user_id, "Created board with default columns");

    Ok(BoardWithColumns {
        board,
        columns: columns
            .into_iter()
            .map(|column| ColumnWithTasks {
                column,
                tasks: Vec::new(),
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use db::models::task::TaskPriority;

    use super::*;

    fn column(sort_order: i64) -> Column {
        Column {
            id: Uuid::new_v4(),
            board_id: Uuid::nil(),
            title: format!("Column {sort_order}"),
            sort_order,
            user_id: "user-1".to_string(),
            created_at: Utc::now(),
        }
    }

    fn task(column_id: Uuid, title: &str, sort_order: i64) -> Task {
        let now = Utc::now();
        Task {
            id: Uuid::new_v4(),
            column_id,
            title: title.to_string(),
            description: None,
            assignee: None,
            due_date: None,
            priority: TaskPriority::Medium,
            sort_order,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn group_tasks_orders_within_each_column() {
        let (a, b) = (column(0), column(1));
        let tasks = vec![
            task(a.id, "a2", 1),
            task(b.id, "b1", 0),
            task(a.id, "a1", 0),
            task(Uuid::new_v4(), "orphan", 0),
        ];

        let grouped = group_tasks(vec![a, b], tasks);

        let titles: Vec<Vec<&str>> = grouped
            .iter()
            .map(|c| c.tasks.iter().map(|t| t.title.as_str()).collect())
            .collect();
        assert_eq!(titles, vec![vec!["a1", "a2"], vec!["b1"]]);
    }
}
