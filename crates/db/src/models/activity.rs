use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, types::Json};
use ts_rs::TS;
use uuid::Uuid;

const ACTIVITY_COLUMNS: &str =
    "id, action, entity_type, entity_id, user_id, board_id, details, created_at";

/// Number of activities returned when the caller does not ask for a limit.
pub const DEFAULT_ACTIVITY_LIMIT: i64 = 50;

/// A single entry in a board's activity feed.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS, PartialEq)]
pub struct Activity {
    pub id: Uuid,
    /// Verb, e.g. `created`, `moved`, `commented`
    pub action: String,
    /// Kind of entity acted on, e.g. `task`, `comment`
    pub entity_type: String,
    pub entity_id: Uuid,
    pub user_id: String,
    pub board_id: Uuid,
    #[sqlx(json)]
    #[ts(type = "Record<string, unknown>")]
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateActivity {
    pub action: String,
    pub entity_type: String,
    pub entity_id: Uuid,
    #[serde(default = "empty_details")]
    #[ts(type = "Record<string, unknown>")]
    pub details: serde_json::Value,
}

fn empty_details() -> serde_json::Value {
    serde_json::Value::Object(Default::default())
}

impl CreateActivity {
    pub fn new(
        action: impl Into<String>,
        entity_type: impl Into<String>,
        entity_id: Uuid,
        details: serde_json::Value,
    ) -> Self {
        Self {
            action: action.into(),
            entity_type: entity_type.into(),
            entity_id,
            details,
        }
    }
}

impl Activity {
    /// Most recent activities on a board, newest first.
    pub async fn find_by_board(
        pool: &SqlitePool,
        board_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Activity>(&format!(
            "SELECT {ACTIVITY_COLUMNS} FROM activities
             WHERE board_id = $1
             ORDER BY created_at DESC, rowid DESC
             LIMIT $2"
        ))
        .bind(board_id)
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        board_id: Uuid,
        user_id: &str,
        data: &CreateActivity,
    ) -> Result<Self, sqlx::Error> {
        let details = if data.details.is_null() {
            empty_details()
        } else {
            data.details.clone()
        };
        sqlx::query_as::<_, Activity>(&format!(
            "INSERT INTO activities (id, action, entity_type, entity_id, user_id, board_id, details)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {ACTIVITY_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&data.action)
        .bind(&data.entity_type)
        .bind(data.entity_id)
        .bind(user_id)
        .bind(board_id)
        .bind(Json(details))
        .fetch_one(pool)
        .await
    }
}
