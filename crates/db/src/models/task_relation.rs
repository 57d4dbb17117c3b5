use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

const RELATION_COLUMNS: &str = "id, task_id, related_task_id, relation_type, created_at";

/// Directed link between two tasks.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS, PartialEq)]
pub struct TaskRelation {
    pub id: Uuid,
    pub task_id: Uuid,
    pub related_task_id: Uuid,
    /// One of `blocks`, `blocked_by`, `relates_to`, `duplicates`
    pub relation_type: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct CreateTaskRelation {
    pub related_task_id: Uuid,
    pub relation_type: String,
}

impl TaskRelation {
    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, TaskRelation>(&format!(
            "SELECT {RELATION_COLUMNS} FROM task_relations WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Relations where the task appears on either side.
    pub async fn find_for_task(pool: &SqlitePool, task_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, TaskRelation>(&format!(
            "SELECT {RELATION_COLUMNS} FROM task_relations
             WHERE task_id = $1 OR related_task_id = $1
             ORDER BY created_at ASC"
        ))
        .bind(task_id)
        .fetch_all(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        task_id: Uuid,
        data: &CreateTaskRelation,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, TaskRelation>(&format!(
            "INSERT INTO task_relations (id, task_id, related_task_id, relation_type)
             VALUES ($1, $2, $3, $4)
             RETURNING {RELATION_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(task_id)
        .bind(data.related_task_id)
        .bind(&data.relation_type)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM task_relations WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
