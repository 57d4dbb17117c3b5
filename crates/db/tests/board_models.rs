//! Integration tests for boards and the entities hanging off them.

use std::str::FromStr;

use db::models::{
    activity::{Activity, CreateActivity},
    board::{Board, CreateBoard, DEFAULT_BOARD_COLOR, UpdateBoard},
    checklist::{Checklist, ChecklistItem, CreateChecklist, CreateChecklistItem, UpdateChecklistItem},
    column::{Column, CreateColumn},
    comment::{Comment, CreateComment},
    custom_field::{CreateCustomField, CustomField},
    message::{CreateMessage, Message},
    milestone::{CreateMilestone, Milestone},
    recurring_task::{CreateRecurringTask, RecurringTask},
    tag::{CreateTag, Tag},
    task::{CreateTask, Task},
    task_relation::{CreateTaskRelation, TaskRelation},
    time_entry::{StartTimer, TimeEntry},
};
use serde_json::json;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode},
};
use tempfile::TempDir;

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

fn new_board(title: &str) -> CreateBoard {
    CreateBoard {
        title: title.to_string(),
        description: None,
        color: None,
    }
}

async fn board_with_task(pool: &SqlitePool) -> (Board, Column, Task) {
    let board = Board::create(pool, &new_board("Roadmap"), "user-1").await.unwrap();
    let column = Column::create(
        pool,
        &CreateColumn {
            board_id: board.id,
            title: "To Do".to_string(),
            sort_order: None,
        },
        "user-1",
    )
    .await
    .unwrap();
    let task = Task::create(pool, &CreateTask::with_title(column.id, "Write docs"))
        .await
        .unwrap();
    (board, column, task)
}

#[tokio::test]
async fn test_board_defaults_and_update() {
    let (pool, _temp_dir) = setup_test_pool().await;

    let board = Board::create(&pool, &new_board("Roadmap"), "user-1").await.unwrap();
    assert_eq!(board.color, DEFAULT_BOARD_COLOR);
    assert_eq!(board.user_id, "user-1");

    let updated = Board::update(
        &pool,
        board.id,
        &UpdateBoard {
            description: Some("Q3 plans".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(updated.title, "Roadmap");
    assert_eq!(updated.description.as_deref(), Some("Q3 plans"));
    assert!(updated.updated_at >= board.updated_at);
}

#[tokio::test]
async fn test_board_title_unique_per_user() {
    let (pool, _temp_dir) = setup_test_pool().await;

    Board::create(&pool, &new_board("Roadmap"), "user-1").await.unwrap();
    Board::create(&pool, &new_board("Roadmap"), "user-2")
        .await
        .expect("other users may reuse the title");

    let err = Board::create(&pool, &new_board("Roadmap"), "user-1")
        .await
        .unwrap_err();
    let db_err = err.as_database_error().expect("database error");
    assert!(db_err.is_unique_violation());
}

#[tokio::test]
async fn test_boards_listed_newest_first_per_user() {
    let (pool, _temp_dir) = setup_test_pool().await;

    let first = Board::create(&pool, &new_board("First"), "user-1").await.unwrap();
    let second = Board::create(&pool, &new_board("Second"), "user-1").await.unwrap();
    Board::create(&pool, &new_board("Not mine"), "user-2").await.unwrap();

    let boards = Board::find_by_user(&pool, "user-1").await.unwrap();
    let ids: Vec<_> = boards.iter().map(|b| b.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
}

#[tokio::test]
async fn test_deleting_board_cascades() {
    let (pool, _temp_dir) = setup_test_pool().await;
    let (board, column, task) = board_with_task(&pool).await;

    Comment::create(
        &pool,
        task.id,
        "user-1",
        &CreateComment {
            content: "hi".to_string(),
        },
    )
    .await
    .unwrap();

    assert_eq!(Board::delete(&pool, board.id).await.unwrap(), 1);
    assert!(Column::find_by_id(&pool, column.id).await.unwrap().is_none());
    assert!(Task::find_by_id(&pool, task.id).await.unwrap().is_none());
    assert!(Comment::find_by_task(&pool, task.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_column_at_taken_position_shifts_the_rest() {
    let (pool, _temp_dir) = setup_test_pool().await;
    let board = Board::create(&pool, &new_board("Pipeline"), "user-1").await.unwrap();

    for title in ["Backlog", "Doing", "Done"] {
        Column::create(
            &pool,
            &CreateColumn {
                board_id: board.id,
                title: title.to_string(),
                sort_order: None,
            },
            "user-1",
        )
        .await
        .unwrap();
    }

    let review = Column::create(
        &pool,
        &CreateColumn {
            board_id: board.id,
            title: "Review".to_string(),
            sort_order: Some(2),
        },
        "user-1",
    )
    .await
    .unwrap();
    assert_eq!(review.sort_order, 2);

    let columns = Column::find_by_board(&pool, board.id).await.unwrap();
    let layout: Vec<(&str, i64)> = columns
        .iter()
        .map(|c| (c.title.as_str(), c.sort_order))
        .collect();
    assert_eq!(
        layout,
        vec![("Backlog", 0), ("Doing", 1), ("Review", 2), ("Done", 3)]
    );
    assert_eq!(Column::count_for_board(&pool, board.id).await.unwrap(), 4);

    // A free position is taken as given.
    let archive = Column::create(
        &pool,
        &CreateColumn {
            board_id: board.id,
            title: "Archive".to_string(),
            sort_order: Some(10),
        },
        "user-1",
    )
    .await
    .unwrap();
    assert_eq!(archive.sort_order, 10);
}

#[tokio::test]
async fn test_tasks_for_board_span_columns() {
    let (pool, _temp_dir) = setup_test_pool().await;
    let (board, _column, task) = board_with_task(&pool).await;

    let done = Column::create(
        &pool,
        &CreateColumn {
            board_id: board.id,
            title: "Done".to_string(),
            sort_order: None,
        },
        "user-1",
    )
    .await
    .unwrap();
    assert_eq!(done.sort_order, 1);
    Task::create(&pool, &CreateTask::with_title(done.id, "Ship")).await.unwrap();

    let tasks = Task::find_by_board(&pool, board.id).await.unwrap();
    assert_eq!(tasks.len(), 2);
    assert!(tasks.iter().any(|t| t.id == task.id));
}

#[tokio::test]
async fn test_comment_edit_marks_edited() {
    let (pool, _temp_dir) = setup_test_pool().await;
    let (_board, _column, task) = board_with_task(&pool).await;

    let comment = Comment::create(
        &pool,
        task.id,
        "user-1",
        &CreateComment {
            content: "first draft".to_string(),
        },
    )
    .await
    .unwrap();
    assert!(!comment.is_edited);

    let edited = Comment::update_content(&pool, comment.id, "final").await.unwrap();
    assert!(edited.is_edited);
    assert_eq!(edited.content, "final");
}

#[tokio::test]
async fn test_tags_attach_idempotently() {
    let (pool, _temp_dir) = setup_test_pool().await;
    let (board, _column, task) = board_with_task(&pool).await;

    let tag = Tag::create(
        &pool,
        board.id,
        "user-1",
        &CreateTag {
            name: "bug".to_string(),
            color: "bg-red-500".to_string(),
        },
    )
    .await
    .unwrap();

    Tag::attach_to_task(&pool, task.id, tag.id).await.unwrap();
    Tag::attach_to_task(&pool, task.id, tag.id).await.unwrap();
    assert_eq!(Tag::find_by_task(&pool, task.id).await.unwrap().len(), 1);

    let names = Tag::task_tag_names_for_board(&pool, board.id).await.unwrap();
    assert_eq!(names.len(), 1);
    assert_eq!(names[0].name, "bug");

    assert_eq!(Tag::detach_from_task(&pool, task.id, tag.id).await.unwrap(), 1);
    assert!(Tag::find_by_task(&pool, task.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_checklist_items_append_and_toggle() {
    let (pool, _temp_dir) = setup_test_pool().await;
    let (_board, _column, task) = board_with_task(&pool).await;

    let checklist = Checklist::create(
        &pool,
        task.id,
        &CreateChecklist {
            title: "Release".to_string(),
        },
    )
    .await
    .unwrap();

    let first = ChecklistItem::create(
        &pool,
        checklist.id,
        &CreateChecklistItem {
            title: "Tag".to_string(),
        },
    )
    .await
    .unwrap();
    let second = ChecklistItem::create(
        &pool,
        checklist.id,
        &CreateChecklistItem {
            title: "Publish".to_string(),
        },
    )
    .await
    .unwrap();
    assert_eq!((first.sort_order, second.sort_order), (0, 1));

    let done = ChecklistItem::update(
        &pool,
        first.id,
        &UpdateChecklistItem {
            is_completed: Some(true),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert!(done.is_completed);
    assert_eq!(done.title, "Tag");
}

#[tokio::test]
async fn test_activities_newest_first_with_limit() {
    let (pool, _temp_dir) = setup_test_pool().await;
    let (board, _column, task) = board_with_task(&pool).await;

    for action in ["created", "updated", "moved"] {
        Activity::create(
            &pool,
            board.id,
            "user-1",
            &CreateActivity::new(action, "task", task.id, json!({ "title": task.title })),
        )
        .await
        .unwrap();
    }

    let recent = Activity::find_by_board(&pool, board.id, 2).await.unwrap();
    let actions: Vec<_> = recent.iter().map(|a| a.action.as_str()).collect();
    assert_eq!(actions, vec!["moved", "updated"]);
    assert_eq!(recent[0].details["title"], "Write docs");
}

#[tokio::test]
async fn test_messages_oldest_first() {
    let (pool, _temp_dir) = setup_test_pool().await;
    let (board, _column, _task) = board_with_task(&pool).await;

    for content in ["one", "two"] {
        Message::create(
            &pool,
            board.id,
            "user-1",
            &CreateMessage {
                content: content.to_string(),
            },
        )
        .await
        .unwrap();
    }

    let messages = Message::find_by_board(&pool, board.id).await.unwrap();
    let contents: Vec<_> = messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["one", "two"]);
}

#[tokio::test]
async fn test_timer_stop_records_whole_seconds() {
    let (pool, _temp_dir) = setup_test_pool().await;
    let (_board, _column, task) = board_with_task(&pool).await;

    let entry = TimeEntry::start(&pool, task.id, "user-1", &StartTimer::default())
        .await
        .unwrap();
    assert!(entry.is_running());
    assert_eq!(
        TimeEntry::find_active_for_user(&pool, "user-1")
            .await
            .unwrap()
            .map(|e| e.id),
        Some(entry.id)
    );

    let stopped = TimeEntry::stop(&pool, entry.id).await.unwrap();
    assert!(!stopped.is_running());
    assert!(stopped.duration.unwrap() >= 0);
    assert!(TimeEntry::find_active_for_user(&pool, "user-1").await.unwrap().is_none());

    // Stopping again is a no-op
    let again = TimeEntry::stop(&pool, entry.id).await.unwrap();
    assert_eq!(again.end_time, stopped.end_time);

    sqlx::query("UPDATE time_entries SET duration = 90 WHERE id = $1")
        .bind(entry.id)
        .execute(&pool)
        .await
        .unwrap();
    TimeEntry::start(&pool, task.id, "user-1", &StartTimer::default())
        .await
        .unwrap();
    assert_eq!(TimeEntry::total_duration_for_task(&pool, task.id).await.unwrap(), 90);
}

#[tokio::test]
async fn test_custom_field_value_upsert() {
    let (pool, _temp_dir) = setup_test_pool().await;
    let (board, _column, task) = board_with_task(&pool).await;

    let field = CustomField::create(
        &pool,
        board.id,
        "user-1",
        &CreateCustomField {
            name: "Estimate".to_string(),
            field_type: "number".to_string(),
            options: serde_json::Value::Null,
        },
    )
    .await
    .unwrap();

    CustomField::set_value(&pool, task.id, field.id, Some("3")).await.unwrap();
    let value = CustomField::set_value(&pool, task.id, field.id, Some("5")).await.unwrap();
    assert_eq!(value.value.as_deref(), Some("5"));

    let values = CustomField::values_for_task(&pool, task.id).await.unwrap();
    assert_eq!(values.len(), 1);
}

#[tokio::test]
async fn test_milestones_undated_last() {
    let (pool, _temp_dir) = setup_test_pool().await;
    let (board, _column, _task) = board_with_task(&pool).await;

    let create = |name: &str, due: Option<&str>| CreateMilestone {
        name: name.to_string(),
        description: None,
        due_date: due.map(|d| d.parse().unwrap()),
        color: "bg-purple-500".to_string(),
    };

    Milestone::create(&pool, board.id, &create("Someday", None)).await.unwrap();
    Milestone::create(&pool, board.id, &create("Beta", Some("2026-06-01T00:00:00Z")))
        .await
        .unwrap();
    let alpha = Milestone::create(&pool, board.id, &create("Alpha", Some("2026-03-01T00:00:00Z")))
        .await
        .unwrap();

    let names: Vec<_> = Milestone::find_by_board(&pool, board.id)
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.name)
        .collect();
    assert_eq!(names, vec!["Alpha", "Beta", "Someday"]);

    let done = Milestone::set_completed(&pool, alpha.id, true).await.unwrap();
    assert!(done.is_completed);
    assert_eq!(done.name, "Alpha");
}

#[tokio::test]
async fn test_relations_found_from_either_side() {
    let (pool, _temp_dir) = setup_test_pool().await;
    let (_board, column, task) = board_with_task(&pool).await;
    let other = Task::create(&pool, &CreateTask::with_title(column.id, "Review docs"))
        .await
        .unwrap();

    TaskRelation::create(
        &pool,
        task.id,
        &CreateTaskRelation {
            related_task_id: other.id,
            relation_type: "blocks".to_string(),
        },
    )
    .await
    .unwrap();

    assert_eq!(TaskRelation::find_for_task(&pool, task.id).await.unwrap().len(), 1);
    assert_eq!(TaskRelation::find_for_task(&pool, other.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_recurring_rule_absent_is_none() {
    let (pool, _temp_dir) = setup_test_pool().await;
    let (_board, _column, task) = board_with_task(&pool).await;

    assert!(RecurringTask::find_by_task(&pool, task.id).await.unwrap().is_none());

    let rule = RecurringTask::create(
        &pool,
        task.id,
        &CreateRecurringTask {
            frequency: "weekly".to_string(),
            interval: 1,
            days_of_week: Some(vec![1, 3]),
            day_of_month: None,
            end_date: None,
        },
        None,
    )
    .await
    .unwrap();

    let found = RecurringTask::find_by_task(&pool, task.id).await.unwrap().unwrap();
    assert_eq!(found.id, rule.id);
    assert_eq!(found.days_of_week, Some(vec![1, 3]));
}
