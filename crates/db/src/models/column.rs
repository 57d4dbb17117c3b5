use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

use super::task::Task;
use crate::retry::{RetryConfig, with_retry};

const COLUMN_COLUMNS: &str = "id, board_id, title, sort_order, user_id, created_at";

/// Titles of the columns every new board starts with, in display order.
pub const DEFAULT_COLUMN_TITLES: [&str; 4] = ["To Do", "In Progress", "Review", "Done"];

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS, PartialEq)]
pub struct Column {
    pub id: Uuid,
    pub board_id: Uuid,
    pub title: String,
    pub sort_order: i64,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

/// A column together with its tasks, ordered by `sort_order`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, PartialEq)]
pub struct ColumnWithTasks {
    #[serde(flatten)]
    #[ts(flatten)]
    pub column: Column,
    pub tasks: Vec<Task>,
}

impl std::ops::Deref for ColumnWithTasks {
    type Target = Column;
    fn deref(&self) -> &Self::Target {
        &self.column
    }
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct CreateColumn {
    pub board_id: Uuid,
    pub title: String,
    /// Appended after the existing columns when omitted
    pub sort_order: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct UpdateColumn {
    pub title: String,
}

impl Column {
    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Column>(&format!(
            "SELECT {COLUMN_COLUMNS} FROM columns WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_board(pool: &SqlitePool, board_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Column>(&format!(
            "SELECT {COLUMN_COLUMNS} FROM columns WHERE board_id = $1 ORDER BY sort_order ASC"
        ))
        .bind(board_id)
        .fetch_all(pool)
        .await
    }

    pub async fn count_for_board(pool: &SqlitePool, board_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM columns WHERE board_id = $1")
            .bind(board_id)
            .fetch_one(pool)
            .await
    }

    /// Insert a column. Without an explicit `sort_order` it is appended; with one the
    /// value is kept, and when another column of the board already holds it, that column
    /// and every one after it shift up by one.
    pub async fn create(
        pool: &SqlitePool,
        data: &CreateColumn,
        user_id: &str,
    ) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        with_retry(&RetryConfig::default(), "create_column", || async move {
            let mut tx = pool.begin().await?;
            let sort_order = match data.sort_order {
                Some(order) => {
                    let order = order.max(0);
                    sqlx::query(
                        "UPDATE columns SET sort_order = sort_order + 1
                         WHERE board_id = $1 AND sort_order >= $2
                           AND EXISTS (SELECT 1 FROM columns WHERE board_id = $1 AND sort_order = $2)",
                    )
                    .bind(data.board_id)
                    .bind(order)
                    .execute(&mut *tx)
                    .await?;
                    order
                }
                None => {
                    sqlx::query_scalar(
                        "SELECT COALESCE(MAX(sort_order) + 1, 0) FROM columns WHERE board_id = $1",
                    )
                    .bind(data.board_id)
                    .fetch_one(&mut *tx)
                    .await?
                }
            };

            let column = sqlx::query_as::<_, Column>(&format!(
                "INSERT INTO columns (id, board_id, title, sort_order, user_id)
                 VALUES ($1, $2, $3, $4, $5)
                 RETURNING {COLUMN_COLUMNS}"
            ))
            .bind(id)
            .bind(data.board_id)
            .bind(&data.title)
            .bind(sort_order)
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;
            tx.commit().await?;
            Ok(column)
        })
        .await
    }

    pub async fn update_title(
        pool: &SqlitePool,
        id: Uuid,
        title: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Column>(&format!(
            "UPDATE columns SET title = $2 WHERE id = $1 RETURNING {COLUMN_COLUMNS}"
        ))
        .bind(id)
        .bind(title)
        .fetch_one(pool)
        .await
    }
}
