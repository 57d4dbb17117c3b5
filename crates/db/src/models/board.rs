use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

pub const DEFAULT_BOARD_COLOR: &str = "bg-blue-500";

const BOARD_COLUMNS: &str = "id, title, description, color, user_id, created_at, updated_at";

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS, PartialEq)]
pub struct Board {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    /// Tailwind background class, e.g. `bg-blue-500`
    pub color: String,
    /// Owner, as issued by the identity provider
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct CreateBoard {
    pub title: String,
    pub description: Option<String>,
    /// Falls back to the configured default board color
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct UpdateBoard {
    pub title: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
}

impl Board {
    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Board>(&format!("SELECT {BOARD_COLUMNS} FROM boards WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Boards owned by `user_id`, newest first.
    pub async fn find_by_user(pool: &SqlitePool, user_id: &str) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Board>(&format!(
            "SELECT {BOARD_COLUMNS} FROM boards WHERE user_id = $1 ORDER BY created_at DESC, rowid DESC"
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        data: &CreateBoard,
        user_id: &str,
    ) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        let color = data.color.as_deref().unwrap_or(DEFAULT_BOARD_COLOR);
        sqlx::query_as::<_, Board>(&format!(
            "INSERT INTO boards (id, title, description, color, user_id)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {BOARD_COLUMNS}"
        ))
        .bind(id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(color)
        .bind(user_id)
        .fetch_one(pool)
        .await
    }

    /// Partial update; unset fields keep their value. Always bumps `updated_at`.
    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        data: &UpdateBoard,
    ) -> Result<Self, sqlx::Error> {
        let existing = Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;

        let title = data.title.as_ref().unwrap_or(&existing.title);
        let description = data.description.as_ref().or(existing.description.as_ref());
        let color = data.color.as_ref().unwrap_or(&existing.color);

        sqlx::query_as::<_, Board>(&format!(
            "UPDATE boards
             SET title = $2, description = $3, color = $4, updated_at = datetime('now', 'subsec')
             WHERE id = $1
             RETURNING {BOARD_COLUMNS}"
        ))
        .bind(id)
        .bind(title)
        .bind(description)
        .bind(color)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM boards WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
