use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, types::Json};
use ts_rs::TS;
use uuid::Uuid;

const RECURRING_COLUMNS: &str = "id, task_id, frequency, interval, days_of_week, day_of_month, \
                                 end_date, last_run, next_run, created_at";

/// Recurrence rule attached to a task. A task has at most one.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS, PartialEq)]
pub struct RecurringTask {
    pub id: Uuid,
    pub task_id: Uuid,
    /// One of `daily`, `weekly`, `monthly`, `yearly`
    pub frequency: String,
    pub interval: i64,
    /// Weekdays for weekly rules, 0 = Sunday
    #[sqlx(json)]
    pub days_of_week: Option<Vec<u32>>,
    pub day_of_month: Option<i64>,
    #[ts(type = "Date | null")]
    pub end_date: Option<DateTime<Utc>>,
    #[ts(type = "Date | null")]
    pub last_run: Option<DateTime<Utc>>,
    #[ts(type = "Date | null")]
    pub next_run: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Serialize, TS)]
pub struct CreateRecurringTask {
    pub frequency: String,
    #[serde(default = "default_interval")]
    pub interval: i64,
    pub days_of_week: Option<Vec<u32>>,
    pub day_of_month: Option<i64>,
    pub end_date: Option<DateTime<Utc>>,
}

fn default_interval() -> i64 {
    1
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct UpdateRecurringTask {
    pub frequency: Option<String>,
    pub interval: Option<i64>,
    pub days_of_week: Option<Vec<u32>>,
    pub day_of_month: Option<i64>,
    pub end_date: Option<DateTime<Utc>>,
}

impl RecurringTask {
    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, RecurringTask>(&format!(
            "SELECT {RECURRING_COLUMNS} FROM recurring_tasks WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// The task's recurrence rule. Absence is not an error.
    pub async fn find_by_task(
        pool: &SqlitePool,
        task_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, RecurringTask>(&format!(
            "SELECT {RECURRING_COLUMNS} FROM recurring_tasks WHERE task_id = $1"
        ))
        .bind(task_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        task_id: Uuid,
        data: &CreateRecurringTask,
        next_run: Option<DateTime<Utc>>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, RecurringTask>(&format!(
            "INSERT INTO recurring_tasks
                (id, task_id, frequency, interval, days_of_week, day_of_month, end_date, next_run)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {RECURRING_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(task_id)
        .bind(&data.frequency)
        .bind(data.interval)
        .bind(Json(&data.days_of_week))
        .bind(data.day_of_month)
        .bind(data.end_date)
        .bind(next_run)
        .fetch_one(pool)
        .await
    }

    /// Merge `data` into the stored rule. `next_run` is recomputed by the caller.
    pub fn merged(&self, data: &UpdateRecurringTask) -> RecurringTask {
        RecurringTask {
            frequency: data.frequency.clone().unwrap_or_else(|| self.frequency.clone()),
            interval: data.interval.unwrap_or(self.interval),
            days_of_week: data.days_of_week.clone().or_else(|| self.days_of_week.clone()),
            day_of_month: data.day_of_month.or(self.day_of_month),
            end_date: data.end_date.or(self.end_date),
            ..self.clone()
        }
    }

    /// Persist the schedule fields of `rule` (as produced by [`RecurringTask::merged`]).
    pub async fn update(
        pool: &SqlitePool,
        rule: &RecurringTask,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, RecurringTask>(&format!(
            "UPDATE recurring_tasks
             SET frequency = $2, interval = $3, days_of_week = $4, day_of_month = $5,
                 end_date = $6, last_run = $7, next_run = $8
             WHERE id = $1
             RETURNING {RECURRING_COLUMNS}"
        ))
        .bind(rule.id)
        .bind(&rule.frequency)
        .bind(rule.interval)
        .bind(Json(&rule.days_of_week))
        .bind(rule.day_of_month)
        .bind(rule.end_date)
        .bind(rule.last_run)
        .bind(rule.next_run)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM recurring_tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
