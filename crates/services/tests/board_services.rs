//! Service-level tests that need a migrated database.

use db::{
    models::{
        board::CreateBoard,
        tag::{CreateTag, Tag},
        task::{Task, TaskPriority, UpdateTask},
        time_entry::StartTimer,
    },
    test_utils::{create_test_pool, seed_board, seed_task},
};
use services::services::{
    board_data::{BoardDataError, create_board_with_default_columns, get_board_with_columns},
    filter::{TaskFilter, tags_by_task},
    friendly_errors::{DbErrorKind, classify},
    time_tracking::{TimerError, start_timer, stop_timer},
};
use uuid::Uuid;

const USER: &str = "user_2abc";

#[tokio::test]
async fn new_boards_get_the_default_columns() {
    let (pool, _dir) = create_test_pool().await;

    let created = create_board_with_default_columns(
        &pool,
        &CreateBoard {
            title: "Launch".to_string(),
            description: Some("Q3 launch".to_string()),
            color: None,
        },
        USER,
    )
    .await
    .unwrap();

    let titles: Vec<&str> = created.columns.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(titles, vec!["To Do", "In Progress", "Review", "Done"]);
    let orders: Vec<i64> = created.columns.iter().map(|c| c.sort_order).collect();
    assert_eq!(orders, vec![0, 1, 2, 3]);

    let loaded = get_board_with_columns(&pool, created.board.id).await.unwrap();
    assert_eq!(loaded, created);
}

#[tokio::test]
async fn board_view_groups_tasks_by_column() {
    let (pool, _dir) = create_test_pool().await;
    let (board, columns) = seed_board(&pool, USER, "Sprint", &["A", "B"]).await;
    seed_task(&pool, columns[0].id, "T1").await;
    seed_task(&pool, columns[1].id, "T3").await;
    seed_task(&pool, columns[0].id, "T2").await;

    let view = get_board_with_columns(&pool, board.id).await.unwrap();

    let titles: Vec<Vec<&str>> = view
        .columns
        .iter()
        .map(|c| c.tasks.iter().map(|t| t.title.as_str()).collect())
        .collect();
    assert_eq!(titles, vec![vec!["T1", "T2"], vec!["T3"]]);
}

#[tokio::test]
async fn missing_board_is_reported() {
    let (pool, _dir) = create_test_pool().await;
    let err = get_board_with_columns(&pool, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, BoardDataError::BoardNotFound));
    assert_eq!(err.to_string(), "Board not found");
}

#[tokio::test]
async fn board_filter_uses_stored_tags_and_priority() {
    let (pool, _dir) = create_test_pool().await;
    let (board, columns) = seed_board(&pool, USER, "Filtered", &["C"]).await;
    let t1 = seed_task(&pool, columns[0].id, "T1").await;
    let t2 = seed_task(&pool, columns[0].id, "T2").await;
    Task::update(
        &pool,
        t1.id,
        &UpdateTask {
            priority: Some(TaskPriority::High),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    Task::update(
        &pool,
        t2.id,
        &UpdateTask {
            priority: Some(TaskPriority::Low),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    let tag = Tag::create(
        &pool,
        board.id,
        USER,
        &CreateTag {
            name: "backend".to_string(),
            color: "bg-emerald-500".to_string(),
        },
    )
    .await
    .unwrap();
    Tag::attach_to_task(&pool, t2.id, tag.id).await.unwrap();

    let view = get_board_with_columns(&pool, board.id).await.unwrap();
    let tags = tags_by_task(Tag::task_tag_names_for_board(&pool, board.id).await.unwrap());

    let by_priority = TaskFilter {
        priorities: vec![TaskPriority::High],
        ..Default::default()
    }
    .apply(view.columns.clone(), &tags);
    assert_eq!(by_priority[0].tasks.len(), 1);
    assert_eq!(by_priority[0].tasks[0].title, "T1");

    let by_tag = TaskFilter {
        tags: vec!["backend".to_string()],
        ..Default::default()
    }
    .apply(view.columns, &tags);
    assert_eq!(by_tag[0].tasks.len(), 1);
    assert_eq!(by_tag[0].tasks[0].title, "T2");
}

#[tokio::test]
async fn only_one_timer_runs_per_user() {
    let (pool, _dir) = create_test_pool().await;
    let (_board, columns) = seed_board(&pool, USER, "Timers", &["C"]).await;
    let task = seed_task(&pool, columns[0].id, "Tracked").await;

    let running = start_timer(&pool, task.id, USER, &StartTimer::default())
        .await
        .unwrap();
    assert!(running.is_running());

    let err = start_timer(&pool, task.id, USER, &StartTimer::default())
        .await
        .unwrap_err();
    assert!(matches!(err, TimerError::AlreadyRunning { .. }));
    assert_eq!(err.to_string(), "A timer is already running");

    // Someone else can still start one.
    start_timer(&pool, task.id, "user_other", &StartTimer::default())
        .await
        .unwrap();

    let stopped = stop_timer(&pool, running.id).await.unwrap();
    assert!(!stopped.is_running());
    assert!(stopped.duration.unwrap() >= 0);

    start_timer(&pool, task.id, USER, &StartTimer::default())
        .await
        .unwrap();

    assert!(matches!(
        stop_timer(&pool, Uuid::new_v4()).await,
        Err(TimerError::NotFound)
    ));
}

#[tokio::test]
async fn database_errors_are_classified() {
    let (pool, _dir) = create_test_pool().await;
    seed_board(&pool, USER, "Same", &[]).await;

    let duplicate = db::models::board::Board::create(
        &pool,
        &CreateBoard {
            title: "Same".to_string(),
            description: None,
            color: None,
        },
        USER,
    )
    .await
    .unwrap_err();
    assert_eq!(classify(&duplicate), DbErrorKind::UniqueViolation);

    sqlx::query("DROP TABLE task_relations")
        .execute(&pool)
        .await
        .unwrap();
    let missing = db::models::task_relation::TaskRelation::find_for_task(&pool, Uuid::new_v4())
        .await
        .unwrap_err();
    assert_eq!(classify(&missing), DbErrorKind::MissingTable);
}
