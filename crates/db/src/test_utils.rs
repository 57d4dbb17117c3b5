//! Test utilities for database tests.
//!
//! Migrations are applied once to a template database; every test gets its own
//! copy of the template file.

use std::{str::FromStr, sync::OnceLock, time::Duration};

use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
};
use tempfile::TempDir;
use tokio::sync::OnceCell;

use crate::models::{
    board::{Board, CreateBoard},
    column::{Column, CreateColumn},
    task::{CreateTask, Task},
};

static TEMPLATE_DIR: OnceLock<TempDir> = OnceLock::new();
static TEMPLATE_READY: OnceCell<()> = OnceCell::const_new();

fn get_template_dir() -> &'static TempDir {
    TEMPLATE_DIR.get_or_init(|| TempDir::new().expect("Failed to create template temp dir"))
}

async fn ensure_template_ready() {
    TEMPLATE_READY
        .get_or_init(|| async {
            let template_path = get_template_dir().path().join("template.db");

            // DELETE journal mode so the template is a single self-contained file
            let options =
                SqliteConnectOptions::from_str(&format!("sqlite://{}", template_path.display()))
                    .expect("Invalid template database URL")
                    .create_if_missing(true)
                    .journal_mode(SqliteJournalMode::Delete);

            let pool = SqlitePoolOptions::new()
                .min_connections(0)
                .max_connections(1)
                .connect_with(options)
                .await
                .expect("Failed to create template pool");

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .expect("Failed to run migrations on template");

            pool.close().await;

            tracing::debug!("Template database ready at {:?}", template_path);
        })
        .await;
}

/// Create a test database pool with migrations applied.
///
/// Returns the pool and a TempDir that must be kept alive for the duration of the test.
pub async fn create_test_pool() -> (SqlitePool, TempDir) {
    ensure_template_ready().await;

    let temp_dir = TempDir::new().expect("Failed to create test temp dir");
    let db_path = temp_dir.path().join("test.db");

    let template_path = get_template_dir().path().join("template.db");
    std::fs::copy(&template_path, &db_path).expect("Failed to copy template database");

    let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", db_path.display()))
        .expect("Invalid test database URL")
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(5))
        .connect_with(options)
        .await
        .expect("Failed to create test pool");

    (pool, temp_dir)
}

/// Insert a board owned by `user_id` with the given column titles (in order).
pub async fn seed_board(
    pool: &SqlitePool,
    user_id: &str,
    title: &str,
    column_titles: &[&str],
) -> (Board, Vec<Column>) {
    let board = Board::create(
        pool,
        &CreateBoard {
            title: title.to_string(),
            description: None,
            color: None,
        },
        user_id,
    )
    .await
    .expect("Failed to create test board");

    let mut columns = Vec::with_capacity(column_titles.len());
    for (i, column_title) in column_titles.iter().enumerate() {
        let column = Column::create(
            pool,
            &CreateColumn {
                board_id: board.id,
                title: column_title.to_string(),
                sort_order: Some(i as i64),
            },
            user_id,
        )
        .await
        .expect("Failed to create test column");
        columns.push(column);
    }

    (board, columns)
}

/// Append a task titled `title` to `column_id`.
pub async fn seed_task(pool: &SqlitePool, column_id: uuid::Uuid, title: &str) -> Task {
    Task::create(pool, &CreateTask::with_title(column_id, title))
        .await
        .expect("Failed to create test task")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_test_pool() {
        let (pool, _temp_dir) = create_test_pool().await;

        let result: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tasks")
            .fetch_one(&pool)
            .await
            .expect("Failed to query tasks table");

        assert_eq!(result.0, 0);
    }

    #[tokio::test]
    async fn test_template_copies_are_isolated() {
        let (pool1, _temp1) = create_test_pool().await;
        let (pool2, _temp2) = create_test_pool().await;

        seed_board(&pool1, "user-1", "Only in pool 1", &[]).await;

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM boards")
            .fetch_one(&pool2)
            .await
            .expect("Pool 2 should work");
        assert_eq!(count, 0);
    }
}
