use db::models::time_entry::{StartTimer, TimeEntry};
use sqlx::SqlitePool;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum TimerError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("A timer is already running")]
    AlreadyRunning { entry_id: Option<Uuid> },
    #[error("Time entry not found")]
    NotFound,
}

/// Start a timer on `task_id` for `user_id`. A user has at most one running timer.
pub async fn start_timer(
    pool: &SqlitePool,
    task_id: Uuid,
    user_id: &str,
    data: &StartTimer,
) -> Result<TimeEntry, TimerError> {
    if let Some(active) = TimeEntry::find_active_for_user(pool, user_id).await? {
        return Err(TimerError::AlreadyRunning {
            entry_id: Some(active.id),
        });
    }

    // The partial unique index on running entries catches a concurrent start.
    match TimeEntry::start(pool, task_id, user_id, data).await {
        Ok(entry) => {
            tracing::debug!(entry_id = %entry.id, %task_id, user_id, "Timer started");
            Ok(entry)
        }
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Err(TimerError::AlreadyRunning { entry_id: None })
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn stop_timer(pool: &SqlitePool, entry_id: Uuid) -> Result<TimeEntry, TimerError> {
    match TimeEntry::stop(pool, entry_id).await {
        Ok(entry) => Ok(entry),
        Err(sqlx::Error::RowNotFound) => Err(TimerError::NotFound),
        Err(e) => Err(e.into()),
    }
}

/// `HH:MM:SS`; an absent or empty duration renders as `0:00:00`.
pub fn format_duration(seconds: Option<i64>) -> String {
    let seconds = match seconds {
        Some(seconds) if seconds > 0 => seconds,
        _ => return "0:00:00".to_string(),
    };
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_durations() {
        assert_eq!(format_duration(None), "0:00:00");
        assert_eq!(format_duration(Some(0)), "0:00:00");
        assert_eq!(format_duration(Some(-4)), "0:00:00");
        assert_eq!(format_duration(Some(59)), "00:00:59");
        assert_eq!(format_duration(Some(3661)), "01:01:01");
        assert_eq!(format_duration(Some(36_000 + 125)), "10:02:05");
    }
}
