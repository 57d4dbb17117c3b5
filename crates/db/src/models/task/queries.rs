//! CRUD and move queries for tasks.

use sqlx::{Executor, Sqlite, SqliteConnection, SqlitePool};
use uuid::Uuid;

use super::{CreateTask, Task, UpdateTask};
use crate::retry::{RetryConfig, with_retry};

const TASK_COLUMNS: &str = "id, column_id, title, description, assignee, due_date, priority, \
                            sort_order, created_at, updated_at";

impl Task {
    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All tasks on a board, ordered by `sort_order`.
    pub async fn find_by_board(pool: &SqlitePool, board_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            "SELECT t.id, t.column_id, t.title, t.description, t.assignee, t.due_date,
                    t.priority, t.sort_order, t.created_at, t.updated_at
             FROM tasks t
             INNER JOIN columns c ON c.id = t.column_id
             WHERE c.board_id = $1
             ORDER BY t.sort_order ASC, t.created_at ASC",
        )
        .bind(board_id)
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_column(
        pool: &SqlitePool,
        column_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE column_id = $1
             ORDER BY sort_order ASC, created_at ASC"
        ))
        .bind(column_id)
        .fetch_all(pool)
        .await
    }

    pub async fn count_in_column<'e, E>(executor: E, column_id: Uuid) -> Result<i64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE column_id = $1")
            .bind(column_id)
            .fetch_one(executor)
            .await
    }

    /// Insert a task. Without an explicit `sort_order` it goes to the end of its column;
    /// with one it is spliced in at that index (clamped to the column length) and the
    /// siblings after it move down, so positions within a column stay unique.
    pub async fn create(pool: &SqlitePool, data: &CreateTask) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        with_retry(&RetryConfig::default(), "create_task", || async move {
            let mut tx = pool.begin().await?;
            let count = Self::count_in_column(&mut *tx, data.column_id).await?;

            sqlx::query(
                "INSERT INTO tasks (id, column_id, title, description, assignee, due_date, priority, sort_order)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            )
            .bind(id)
            .bind(data.column_id)
            .bind(&data.title)
            .bind(&data.description)
            .bind(&data.assignee)
            .bind(data.due_date)
            .bind(data.priority)
            .bind(count)
            .execute(&mut *tx)
            .await?;

            if let Some(index) = data.sort_order.filter(|index| *index < count) {
                Self::move_in_tx(&mut tx, id, data.column_id, index).await?;
            }

            let task = sqlx::query_as::<_, Task>(&format!(
                "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"
            ))
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
            tx.commit().await?;
            Ok(task)
        })
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        id: Uuid,
        data: &UpdateTask,
    ) -> Result<Self, sqlx::Error> {
        let existing = Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;

        let title = data.title.as_ref().unwrap_or(&existing.title);
        let description = data.description.clone().unwrap_or(existing.description);
        let assignee = data.assignee.clone().unwrap_or(existing.assignee);
        let due_date = data.due_date.unwrap_or(existing.due_date);
        let priority = data.priority.unwrap_or(existing.priority);

        sqlx::query_as::<_, Task>(&format!(
            "UPDATE tasks
             SET title = $2, description = $3, assignee = $4, due_date = $5, priority = $6,
                 updated_at = datetime('now', 'subsec')
             WHERE id = $1
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(id)
        .bind(title)
        .bind(description)
        .bind(assignee)
        .bind(due_date)
        .bind(priority)
        .fetch_one(pool)
        .await
    }

    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected())
    }

    /// Move a task to `target_column_id` at `target_index`.
    ///
    /// The task is spliced out of its current column and inserted into the target
    /// column at the index (clamped to the column length). Every task whose position
    /// changed gets its `sort_order` rewritten in the same transaction. Busy/locked
    /// errors are retried.
    pub async fn move_to(
        pool: &SqlitePool,
        id: Uuid,
        target_column_id: Uuid,
        target_index: i64,
    ) -> Result<Self, sqlx::Error> {
        with_retry(&RetryConfig::default(), "move_task", || async move {
            let mut tx = pool.begin().await?;
            Self::move_in_tx(&mut tx, id, target_column_id, target_index).await?;
            let moved = sqlx::query_as::<_, Task>(&format!(
                "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"
            ))
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
            tx.commit().await?;
            Ok(moved)
        })
        .await
    }

    async fn move_in_tx(
        conn: &mut SqliteConnection,
        id: Uuid,
        target_column_id: Uuid,
        target_index: i64,
    ) -> Result<(), sqlx::Error> {
        let source_column_id: Uuid = sqlx::query_scalar("SELECT column_id FROM tasks WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;

        let mut source = Self::column_order(&mut *conn, source_column_id).await?;
        source.retain(|(task_id, _)| *task_id != id);

        let mut target = if source_column_id == target_column_id {
            std::mem::take(&mut source)
        } else {
            Self::column_order(&mut *conn, target_column_id).await?
        };

        let index = target_index.clamp(0, target.len() as i64) as usize;
        target.insert(index, (id, -1));

        sqlx::query(
            "UPDATE tasks
             SET column_id = $2, sort_order = $3, updated_at = datetime('now', 'subsec')
             WHERE id = $1",
        )
        .bind(id)
        .bind(target_column_id)
        .bind(index as i64)
        .execute(&mut *conn)
        .await?;

        for list in [&source, &target] {
            for (position, (task_id, stored)) in list.iter().enumerate() {
                if *task_id == id || *stored == position as i64 {
                    continue;
                }
                sqlx::query("UPDATE tasks SET sort_order = $2 WHERE id = $1")
                    .bind(task_id)
                    .bind(position as i64)
                    .execute(&mut *conn)
                    .await?;
            }
        }

        Ok(())
    }

    /// `(id, sort_order)` of every task in a column, in display order.
    async fn column_order(
        conn: &mut SqliteConnection,
        column_id: Uuid,
    ) -> Result<Vec<(Uuid, i64)>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, sort_order FROM tasks WHERE column_id = $1
             ORDER BY sort_order ASC, created_at ASC",
        )
        .bind(column_id)
        .fetch_all(conn)
        .await
    }
}
