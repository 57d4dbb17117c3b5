//! Integration tests for `Task::move_to`.
//!
//! Every move must leave both affected columns with dense `sort_order` values
//! matching the spliced lists.

use std::str::FromStr;

use db::models::{
    board::{Board, CreateBoard},
    column::{Column, CreateColumn},
    task::{CreateTask, Task},
};
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode},
};
use tempfile::TempDir;
use uuid::Uuid;

async fn setup_test_pool() -> (SqlitePool, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");

    let options =
        SqliteConnectOptions::from_str(&format!("sqlite://{}", db_path.to_string_lossy()))
            .expect("Invalid database URL")
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePool::connect_with(options)
        .await
        .expect("Failed to create pool");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    (pool, temp_dir)
}

async fn create_columns(pool: &SqlitePool, titles: &[&str]) -> Vec<Column> {
    let board = Board::create(
        pool,
        &CreateBoard {
            title: "Moves".to_string(),
            description: None,
            color: None,
        },
        "user-1",
    )
    .await
    .expect("Failed to create board");

    let mut columns = Vec::new();
    for title in titles {
        let column = Column::create(
            pool,
            &CreateColumn {
                board_id: board.id,
                title: title.to_string(),
                sort_order: None,
            },
            "user-1",
        )
        .await
        .expect("Failed to create column");
        columns.push(column);
    }
    columns
}

async fn create_task(pool: &SqlitePool, column_id: Uuid, title: &str) -> Task {
    Task::create(pool, &CreateTask::with_title(column_id, title))
        .await
        .expect("Failed to create task")
}

/// Titles in display order, asserting the stored order is dense.
async fn titles(pool: &SqlitePool, column_id: Uuid) -> Vec<String> {
    let tasks = Task::find_by_column(pool, column_id).await.unwrap();
    for (i, task) in tasks.iter().enumerate() {
        assert_eq!(task.sort_order, i as i64, "sort_order of {}", task.title);
    }
    tasks.into_iter().map(|t| t.title).collect()
}

#[tokio::test]
async fn test_create_appends_to_column() {
    let (pool, _temp_dir) = setup_test_pool().await;
    let columns = create_columns(&pool, &["To Do"]).await;

    let first = create_task(&pool, columns[0].id, "first").await;
    let second = create_task(&pool, columns[0].id, "second").await;

    assert_eq!(first.sort_order, 0);
    assert_eq!(second.sort_order, 1);
    assert_eq!(Task::count_in_column(&pool, columns[0].id).await.unwrap(), 2);
}

#[tokio::test]
async fn test_create_at_position_shifts_siblings() {
    let (pool, _temp_dir) = setup_test_pool().await;
    let columns = create_columns(&pool, &["To Do"]).await;
    let column_id = columns[0].id;

    create_task(&pool, column_id, "A").await;
    create_task(&pool, column_id, "B").await;

    let mut data = CreateTask::with_title(column_id, "New");
    data.sort_order = Some(0);
    let created = Task::create(&pool, &data).await.unwrap();
    assert_eq!(created.sort_order, 0);
    assert_eq!(titles(&pool, column_id).await, vec!["New", "A", "B"]);

    data.title = "Middle".to_string();
    data.sort_order = Some(2);
    Task::create(&pool, &data).await.unwrap();
    assert_eq!(titles(&pool, column_id).await, vec!["New", "A", "Middle", "B"]);
}

#[tokio::test]
async fn test_create_position_is_clamped() {
    let (pool, _temp_dir) = setup_test_pool().await;
    let columns = create_columns(&pool, &["To Do"]).await;
    let column_id = columns[0].id;

    create_task(&pool, column_id, "A").await;

    let mut data = CreateTask::with_title(column_id, "Last");
    data.sort_order = Some(42);
    let created = Task::create(&pool, &data).await.unwrap();
    assert_eq!(created.sort_order, 1);

    data.title = "First".to_string();
    data.sort_order = Some(-3);
    let created = Task::create(&pool, &data).await.unwrap();
    assert_eq!(created.sort_order, 0);
    assert_eq!(titles(&pool, column_id).await, vec!["First", "A", "Last"]);
}

#[tokio::test]
async fn test_move_into_other_column_at_index() {
    let (pool, _temp_dir) = setup_test_pool().await;
    let columns = create_columns(&pool, &["A", "B"]).await;
    let (a, b) = (columns[0].id, columns[1].id);

    let t1 = create_task(&pool, a, "T1").await;
    create_task(&pool, b, "T3").await;

    let moved = Task::move_to(&pool, t1.id, b, 1).await.unwrap();

    assert_eq!(moved.column_id, b);
    assert_eq!(moved.sort_order, 1);
    assert!(titles(&pool, a).await.is_empty());
    assert_eq!(titles(&pool, b).await, vec!["T3", "T1"]);
}

#[tokio::test]
async fn test_move_within_column_reorders_siblings() {
    let (pool, _temp_dir) = setup_test_pool().await;
    let columns = create_columns(&pool, &["A"]).await;
    let a = columns[0].id;

    let t1 = create_task(&pool, a, "T1").await;
    create_task(&pool, a, "T2").await;
    create_task(&pool, a, "T3").await;

    Task::move_to(&pool, t1.id, a, 2).await.unwrap();
    assert_eq!(titles(&pool, a).await, vec!["T2", "T3", "T1"]);

    Task::move_to(&pool, t1.id, a, 0).await.unwrap();
    assert_eq!(titles(&pool, a).await, vec!["T1", "T2", "T3"]);
}

#[tokio::test]
async fn test_move_closes_gap_in_source_column() {
    let (pool, _temp_dir) = setup_test_pool().await;
    let columns = create_columns(&pool, &["A", "B"]).await;
    let (a, b) = (columns[0].id, columns[1].id);

    create_task(&pool, a, "T1").await;
    let t2 = create_task(&pool, a, "T2").await;
    create_task(&pool, a, "T3").await;
    create_task(&pool, b, "T4").await;

    Task::move_to(&pool, t2.id, b, 0).await.unwrap();

    assert_eq!(titles(&pool, a).await, vec!["T1", "T3"]);
    assert_eq!(titles(&pool, b).await, vec!["T2", "T4"]);
}

#[tokio::test]
async fn test_move_index_is_clamped() {
    let (pool, _temp_dir) = setup_test_pool().await;
    let columns = create_columns(&pool, &["A", "B"]).await;
    let (a, b) = (columns[0].id, columns[1].id);

    let t1 = create_task(&pool, a, "T1").await;
    create_task(&pool, b, "T2").await;

    let moved = Task::move_to(&pool, t1.id, b, 99).await.unwrap();
    assert_eq!(moved.sort_order, 1);

    let moved = Task::move_to(&pool, t1.id, b, -5).await.unwrap();
    assert_eq!(moved.sort_order, 0);
    assert_eq!(titles(&pool, b).await, vec!["T1", "T2"]);
}

#[tokio::test]
async fn test_move_missing_task_is_not_found() {
    let (pool, _temp_dir) = setup_test_pool().await;
    let columns = create_columns(&pool, &["A"]).await;

    let result = Task::move_to(&pool, Uuid::new_v4(), columns[0].id, 0).await;
    assert!(matches!(result, Err(sqlx::Error::RowNotFound)));
}
