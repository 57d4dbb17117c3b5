use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

const TAG_COLUMNS: &str = "id, name, color, board_id, user_id, created_at";

/// A board-scoped label that can be attached to any task on the board
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS, PartialEq)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub color: String,
    pub board_id: Uuid,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct CreateTag {
    pub name: String,
    #[serde(default = "default_color")]
    pub color: String,
}

fn default_color() -> String {
    "bg-blue-500".to_string()
}

/// Junction table entry for task-tag relationships
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS, PartialEq)]
pub struct TaskTag {
    pub task_id: Uuid,
    pub tag_id: Uuid,
}

/// A tag name attached to a task, used when filtering a whole board.
#[derive(Debug, Clone, FromRow, PartialEq)]
pub struct TaskTagName {
    pub task_id: Uuid,
    pub name: String,
}

impl Tag {
    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Tag>(&format!("SELECT {TAG_COLUMNS} FROM tags WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_board(pool: &SqlitePool, board_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Tag>(&format!(
            "SELECT {TAG_COLUMNS} FROM tags WHERE board_id = $1 ORDER BY name ASC"
        ))
        .bind(board_id)
        .fetch_all(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        board_id: Uuid,
        user_id: &str,
        data: &CreateTag,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Tag>(&format!(
            "INSERT INTO tags (id, name, color, board_id, user_id)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {TAG_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&data.name)
        .bind(&data.color)
        .bind(board_id)
        .bind(user_id)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tags WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Attach a tag to a task. Attaching twice is a no-op.
    pub async fn attach_to_task(
        pool: &SqlitePool,
        task_id: Uuid,
        tag_id: Uuid,
    ) -> Result<TaskTag, sqlx::Error> {
        sqlx::query("INSERT OR IGNORE INTO task_tags (task_id, tag_id) VALUES ($1, $2)")
            .bind(task_id)
            .bind(tag_id)
            .execute(pool)
            .await?;
        Ok(TaskTag { task_id, tag_id })
    }

    pub async fn detach_from_task(
        pool: &SqlitePool,
        task_id: Uuid,
        tag_id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM task_tags WHERE task_id = $1 AND tag_id = $2")
            .bind(task_id)
            .bind(tag_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn find_by_task(pool: &SqlitePool, task_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Tag>(
            "SELECT t.id, t.name, t.color, t.board_id, t.user_id, t.created_at
             FROM tags t
             INNER JOIN task_tags tt ON t.id = tt.tag_id
             WHERE tt.task_id = $1
             ORDER BY t.name ASC",
        )
        .bind(task_id)
        .fetch_all(pool)
        .await
    }

    /// Every (task, tag name) pair on a board.
    pub async fn task_tag_names_for_board(
        pool: &SqlitePool,
        board_id: Uuid,
    ) -> Result<Vec<TaskTagName>, sqlx::Error> {
        sqlx::query_as::<_, TaskTagName>(
            "SELECT tt.task_id, t.name
             FROM task_tags tt
             INNER JOIN tags t ON t.id = tt.tag_id
             WHERE t.board_id = $1",
        )
        .bind(board_id)
        .fetch_all(pool)
        .await
    }
}
