use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

const MILESTONE_COLUMNS: &str =
    "id, name, description, due_date, board_id, is_completed, color, created_at";

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS, PartialEq)]
pub struct Milestone {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[ts(type = "Date | null")]
    pub due_date: Option<DateTime<Utc>>,
    pub board_id: Uuid,
    pub is_completed: bool,
    pub color: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct CreateMilestone {
    pub name: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default = "default_color")]
    pub color: String,
}

fn default_color() -> String {
    "bg-purple-500".to_string()
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct UpdateMilestone {
    pub name: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub is_completed: Option<bool>,
    pub color: Option<String>,
}

impl Milestone {
    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Milestone>(&format!(
            "SELECT {MILESTONE_COLUMNS} FROM milestones WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Milestones by due date; undated ones last.
    pub async fn find_by_board(pool: &SqlitePool, board_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Milestone>(&format!(
            "SELECT {MILESTONE_COLUMNS} FROM milestones
             WHERE board_id = $1
             ORDER BY due_date IS NULL, due_date ASC, created_at ASC"
        ))
        .bind(board_id)
        .fetch_all(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        board_id: Uuid,
        data: &CreateMilestone,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Milestone>(&format!(
            "INSERT INTO milestones (id, name, description, due_date, board_id, color)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {MILESTONE_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.due_date)
        .bind(board_id)
        .bind(&data.color)
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        data: &UpdateMilestone,
    ) -> Result<Self, sqlx::Error> {
        let existing = Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;

        sqlx::query_as::<_, Milestone>(&format!(
            "UPDATE milestones
             SET name = $2, description = $3, due_date = $4, is_completed = $5, color = $6
             WHERE id = $1
             RETURNING {MILESTONE_COLUMNS}"
        ))
        .bind(id)
        .bind(data.name.as_ref().unwrap_or(&existing.name))
        .bind(data.description.as_ref().or(existing.description.as_ref()))
        .bind(data.due_date.or(existing.due_date))
        .bind(data.is_completed.unwrap_or(existing.is_completed))
        .bind(data.color.as_ref().unwrap_or(&existing.color))
        .fetch_one(pool)
        .await
    }

    pub async fn set_completed(
        pool: &SqlitePool,
        id: Uuid,
        is_completed: bool,
    ) -> Result<Self, sqlx::Error> {
        Self::update(
            pool,
            id,
            &UpdateMilestone {
                is_completed: Some(is_completed),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM milestones WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
