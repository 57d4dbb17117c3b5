use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

const CHECKLIST_COLUMNS: &str = "id, title, task_id, sort_order, created_at";
const ITEM_COLUMNS: &str =
    "id, title, is_completed, checklist_id, sort_order, created_at, updated_at";

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS, PartialEq)]
pub struct Checklist {
    pub id: Uuid,
    pub title: String,
    pub task_id: Uuid,
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS, PartialEq)]
pub struct ChecklistItem {
    pub id: Uuid,
    pub title: String,
    pub is_completed: bool,
    pub checklist_id: Uuid,
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Checklist with its items, as shown in the task dialog.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ChecklistWithItems {
    #[serde(flatten)]
    #[ts(flatten)]
    pub checklist: Checklist,
    pub items: Vec<ChecklistItem>,
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct CreateChecklist {
    pub title: String,
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct CreateChecklistItem {
    pub title: String,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct UpdateChecklistItem {
    pub title: Option<String>,
    pub is_completed: Option<bool>,
    pub sort_order: Option<i64>,
}

impl Checklist {
    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Checklist>(&format!(
            "SELECT {CHECKLIST_COLUMNS} FROM checklists WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_task(pool: &SqlitePool, task_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Checklist>(&format!(
            "SELECT {CHECKLIST_COLUMNS} FROM checklists WHERE task_id = $1 ORDER BY sort_order ASC"
        ))
        .bind(task_id)
        .fetch_all(pool)
        .await
    }

    /// New checklists go after the task's existing ones.
    pub async fn create(
        pool: &SqlitePool,
        task_id: Uuid,
        data: &CreateChecklist,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Checklist>(&format!(
            "INSERT INTO checklists (id, title, task_id, sort_order)
             VALUES ($1, $2, $3, (SELECT COUNT(*) FROM checklists WHERE task_id = $3))
             RETURNING {CHECKLIST_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&data.title)
        .bind(task_id)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM checklists WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

impl ChecklistItem {
    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ChecklistItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM checklist_items WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_checklist(
        pool: &SqlitePool,
        checklist_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, ChecklistItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM checklist_items WHERE checklist_id = $1
             ORDER BY sort_order ASC"
        ))
        .bind(checklist_id)
        .fetch_all(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        checklist_id: Uuid,
        data: &CreateChecklistItem,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, ChecklistItem>(&format!(
            "INSERT INTO checklist_items (id, title, checklist_id, sort_order)
             VALUES ($1, $2, $3, (SELECT COUNT(*) FROM checklist_items WHERE checklist_id = $3))
             RETURNING {ITEM_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&data.title)
        .bind(checklist_id)
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        data: &UpdateChecklistItem,
    ) -> Result<Self, sqlx::Error> {
        let existing = Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;

        sqlx::query_as::<_, ChecklistItem>(&format!(
            "UPDATE checklist_items
             SET title = $2, is_completed = $3, sort_order = $4,
                 updated_at = datetime('now', 'subsec')
             WHERE id = $1
             RETURNING {ITEM_COLUMNS}"
        ))
        .bind(id)
        .bind(data.title.as_ref().unwrap_or(&existing.title))
        .bind(data.is_completed.unwrap_or(existing.is_completed))
        .bind(data.sort_order.unwrap_or(existing.sort_order))
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM checklist_items WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
