use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, types::Json};
use ts_rs::TS;
use uuid::Uuid;

const FIELD_COLUMNS: &str = "id, name, field_type, options, board_id, user_id, created_at";

/// A board-level field definition; tasks carry one value per field.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS, PartialEq)]
pub struct CustomField {
    pub id: Uuid,
    pub name: String,
    /// One of `text`, `number`, `date`, `select`, `checkbox`
    pub field_type: String,
    /// Field configuration, e.g. the choices of a `select`
    #[sqlx(json)]
    #[ts(type = "unknown")]
    pub options: serde_json::Value,
    pub board_id: Uuid,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct CreateCustomField {
    pub name: String,
    pub field_type: String,
    #[serde(default)]
    #[ts(type = "unknown")]
    pub options: serde_json::Value,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS, PartialEq)]
pub struct TaskCustomFieldValue {
    pub task_id: Uuid,
    pub custom_field_id: Uuid,
    pub value: Option<String>,
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct SetFieldValue {
    pub value: Option<String>,
}

impl CustomField {
    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, CustomField>(&format!(
            "SELECT {FIELD_COLUMNS} FROM custom_fields WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_board(pool: &SqlitePool, board_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, CustomField>(&format!(
            "SELECT {FIELD_COLUMNS} FROM custom_fields WHERE board_id = $1 ORDER BY created_at ASC, rowid ASC"
        ))
        .bind(board_id)
        .fetch_all(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        board_id: Uuid,
        user_id: &str,
        data: &CreateCustomField,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, CustomField>(&format!(
            "INSERT INTO custom_fields (id, name, field_type, options, board_id, user_id)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {FIELD_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&data.name)
        .bind(&data.field_type)
        .bind(Json(&data.options))
        .bind(board_id)
        .bind(user_id)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM custom_fields WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn values_for_task(
        pool: &SqlitePool,
        task_id: Uuid,
    ) -> Result<Vec<TaskCustomFieldValue>, sqlx::Error> {
        sqlx::query_as::<_, TaskCustomFieldValue>(
            "SELECT task_id, custom_field_id, value FROM task_custom_field_values
             WHERE task_id = $1",
        )
        .bind(task_id)
        .fetch_all(pool)
        .await
    }

    /// Insert or replace the task's value for this field.
    pub async fn set_value(
        pool: &SqlitePool,
        task_id: Uuid,
        custom_field_id: Uuid,
        value: Option<&str>,
    ) -> Result<TaskCustomFieldValue, sqlx::Error> {
        sqlx::query_as::<_, TaskCustomFieldValue>(
            "INSERT INTO task_custom_field_values (task_id, custom_field_id, value)
             VALUES ($1, $2, $3)
             ON CONFLICT (task_id, custom_field_id) DO UPDATE SET value = excluded.value
             RETURNING task_id, custom_field_id, value",
        )
        .bind(task_id)
        .bind(custom_field_id)
        .bind(value)
        .fetch_one(pool)
        .await
    }
}
