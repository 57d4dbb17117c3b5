use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

const TIME_ENTRY_COLUMNS: &str = "id, task_id, user_id, start_time, end_time, duration, \
                                  description, created_at, updated_at";

/// A tracked span of work on a task. Running while `end_time` is NULL.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS, PartialEq)]
pub struct TimeEntry {
    pub id: Uuid,
    pub task_id: Uuid,
    pub user_id: String,
    pub start_time: DateTime<Utc>,
    #[ts(type = "Date | null")]
    pub end_time: Option<DateTime<Utc>>,
    /// Whole seconds between start and end, set when the timer stops
    pub duration: Option<i64>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct StartTimer {
    pub description: Option<String>,
}

impl TimeEntry {
    pub fn is_running(&self) -> bool {
        self.end_time.is_none()
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, TimeEntry>(&format!(
            "SELECT {TIME_ENTRY_COLUMNS} FROM time_entries WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Entries for a task, most recently started first.
    pub async fn find_by_task(pool: &SqlitePool, task_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, TimeEntry>(&format!(
            "SELECT {TIME_ENTRY_COLUMNS} FROM time_entries
             WHERE task_id = $1
             ORDER BY start_time DESC"
        ))
        .bind(task_id)
        .fetch_all(pool)
        .await
    }

    /// The user's running timer, if any.
    pub async fn find_active_for_user(
        pool: &SqlitePool,
        user_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, TimeEntry>(&format!(
            "SELECT {TIME_ENTRY_COLUMNS} FROM time_entries
             WHERE user_id = $1 AND end_time IS NULL
             ORDER BY start_time DESC
             LIMIT 1"
        ))
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn start(
        pool: &SqlitePool,
        task_id: Uuid,
        user_id: &str,
        data: &StartTimer,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, TimeEntry>(&format!(
            "INSERT INTO time_entries (id, task_id, user_id, description)
             VALUES ($1, $2, $3, $4)
             RETURNING {TIME_ENTRY_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(task_id)
        .bind(user_id)
        .bind(&data.description)
        .fetch_one(pool)
        .await
    }

    /// Stop a running entry: `end_time` becomes now and `duration` the whole seconds
    /// elapsed since `start_time` (rounded down). Stopping a stopped entry returns it
    /// unchanged.
    pub async fn stop(pool: &SqlitePool, id: Uuid) -> Result<Self, sqlx::Error> {
        let stopped = sqlx::query_as::<_, TimeEntry>(&format!(
            "UPDATE time_entries
             SET end_time = datetime('now', 'subsec'),
                 duration = CAST(ROUND((julianday('now') - julianday(start_time)) * 86400000) AS INTEGER) / 1000,
                 updated_at = datetime('now', 'subsec')
             WHERE id = $1 AND end_time IS NULL
             RETURNING {TIME_ENTRY_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        match stopped {
            Some(entry) => Ok(entry),
            None => Self::find_by_id(pool, id)
                .await?
                .ok_or(sqlx::Error::RowNotFound),
        }
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM time_entries WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Sum of all recorded durations on a task, in seconds. Running entries count as 0.
    pub async fn total_duration_for_task(
        pool: &SqlitePool,
        task_id: Uuid,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COALESCE(SUM(duration), 0) FROM time_entries
             WHERE task_id = $1 AND duration IS NOT NULL",
        )
        .bind(task_id)
        .fetch_one(pool)
        .await
    }
}
