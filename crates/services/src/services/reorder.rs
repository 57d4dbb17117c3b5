//! Drag-and-drop reordering over in-memory column lists.
//!
//! The same splice is used by the board view returned from the REST API and by the demo
//! workspace, so it is written against the [`TaskList`] trait rather than a concrete type.

use db::models::{column::ColumnWithTasks, task::Task};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReorderError {
    #[error("Task not found in any column")]
    TaskNotFound,
    #[error("Target column not found")]
    ColumnNotFound,
}

/// Something with a stable identity.
pub trait Keyed {
    type Key: PartialEq + Clone + std::fmt::Debug;
    fn key(&self) -> &Self::Key;
}

/// An ordered list of items owned by a keyed container, e.g. a column of tasks.
pub trait TaskList {
    type Item: Keyed;

    fn list_key(&self) -> &<Self::Item as Keyed>::Key;
    fn items(&self) -> &[Self::Item];
    fn items_mut(&mut self) -> &mut Vec<Self::Item>;
}

impl Keyed for Task {
    type Key = Uuid;
    fn key(&self) -> &Uuid {
        &self.id
    }
}

impl TaskList for ColumnWithTasks {
    type Item = Task;

    fn list_key(&self) -> &Uuid {
        &self.column.id
    }

    fn items(&self) -> &[Task] {
        &self.tasks
    }

    fn items_mut(&mut self) -> &mut Vec<Task> {
        &mut self.tasks
    }
}

/// Where a dragged item was released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget<K> {
    /// Empty space inside a column
    Column(K),
    /// On top of another item
    Item(K),
    /// Outside any droppable area
    Nothing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved {
        from_list: usize,
        from_index: usize,
        to_list: usize,
        to_index: usize,
    },
    /// Dropped back onto its own position
    Unchanged,
}

/// `(list index, item index)` of the item with `key`.
pub fn locate<L: TaskList>(
    lists: &[L],
    key: &<L::Item as Keyed>::Key,
) -> Option<(usize, usize)> {
    lists.iter().enumerate().find_map(|(list_idx, list)| {
        list.items()
            .iter()
            .position(|item| item.key() == key)
            .map(|item_idx| (list_idx, item_idx))
    })
}

/// Remove the item from its list and insert it into the target list at `target_index`,
/// clamped to the target list's length.
pub fn move_item<L: TaskList>(
    lists: &mut [L],
    key: &<L::Item as Keyed>::Key,
    target_list: &<L::Item as Keyed>::Key,
    target_index: usize,
) -> Result<MoveOutcome, ReorderError> {
    let (from_list, from_index) = locate(lists, key).ok_or(ReorderError::TaskNotFound)?;
    let to_list = lists
        .iter()
        .position(|list| list.list_key() == target_list)
        .ok_or(ReorderError::ColumnNotFound)?;

    if from_list == to_list {
        let last = lists[to_list].items().len() - 1;
        let to_index = target_index.min(last);
        if to_index == from_index {
            return Ok(MoveOutcome::Unchanged);
        }
        let items = lists[to_list].items_mut();
        let item = items.remove(from_index);
        items.insert(to_index, item);
        return Ok(MoveOutcome::Moved {
            from_list,
            from_index,
            to_list,
            to_index,
        });
    }

    let item = lists[from_list].items_mut().remove(from_index);
    let target = lists[to_list].items_mut();
    let to_index = target_index.min(target.len());
    target.insert(to_index, item);

    Ok(MoveOutcome::Moved {
        from_list,
        from_index,
        to_list,
        to_index,
    })
}

/// Turn a drop event into `(target list key, target index)`, or `None` when the drop is a no-op.
///
/// Dropping on a column appends to it when it is not the source column. Dropping on another
/// item takes that item's index.
pub fn resolve_drop<L: TaskList>(
    lists: &[L],
    active: &<L::Item as Keyed>::Key,
    target: &DropTarget<<L::Item as Keyed>::Key>,
) -> Option<(<L::Item as Keyed>::Key, usize)> {
    let (source_list, _) = locate(lists, active)?;

    match target {
        DropTarget::Nothing => None,
        DropTarget::Column(column_key) => {
            let list = lists.iter().find(|list| list.list_key() == column_key)?;
            if list.list_key() == lists[source_list].list_key() {
                return None;
            }
            Some((column_key.clone(), list.items().len()))
        }
        DropTarget::Item(item_key) => {
            if item_key == active {
                return None;
            }
            let (list_idx, item_idx) = locate(lists, item_key)?;
            Some((lists[list_idx].list_key().clone(), item_idx))
        }
    }
}

/// Move a task between board columns and renumber `sort_order` so it matches list position.
///
/// Returns the moved task with its new column and position, or `None` for a no-op drop.
pub fn move_task(
    columns: &mut [ColumnWithTasks],
    task_id: Uuid,
    target_column_id: Uuid,
    target_index: usize,
) -> Result<Option<Task>, ReorderError> {
    let outcome = move_item(columns, &task_id, &target_column_id, target_index)?;
    let MoveOutcome::Moved {
        from_list,
        to_list,
        to_index,
        ..
    } = outcome
    else {
        return Ok(None);
    };

    renumber(&mut columns[from_list]);
    if to_list != from_list {
        renumber(&mut columns[to_list]);
    }

    let moved = &mut columns[to_list].tasks[to_index];
    moved.column_id = target_column_id;
    Ok(Some(moved.clone()))
}

fn renumber(column: &mut ColumnWithTasks) {
    let column_id = column.column.id;
    for (idx, task) in column.tasks.iter_mut().enumerate() {
        task.sort_order = idx as i64;
        task.column_id = column_id;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use chrono::Utc;
    use db::models::{column::Column, task::TaskPriority};

    use super::*;

    fn column(title: &str, task_titles: &[&str]) -> ColumnWithTasks {
        let board_id = Uuid::nil();
        let id = Uuid::new_v4();
        let now = Utc::now();
        ColumnWithTasks {
            column: Column {
                id,
                board_id,
                title: title.to_string(),
                sort_order: 0,
                user_id: "user-1".to_string(),
                created_at: now,
            },
            tasks: task_titles
                .iter()
                .enumerate()
                .map(|(idx, title)| Task {
                    id: Uuid::new_v4(),
                    column_id: id,
                    title: title.to_string(),
                    description: None,
                    assignee: None,
                    due_date: None,
                    priority: TaskPriority::Medium,
                    sort_order: idx as i64,
                    created_at: now,
                    updated_at: now,
                })
                .collect(),
        }
    }

    fn titles(column: &ColumnWithTasks) -> Vec<&str> {
        column.tasks.iter().map(|t| t.title.as_str()).collect()
    }

    #[test]
    fn cross_column_move_inserts_at_index() {
        let mut columns = vec![column("A", &["T1"]), column("B", &["T3"])];
        let t1 = columns[0].tasks[0].id;
        let b = columns[1].id;

        let moved = move_task(&mut columns, t1, b, 1).unwrap().unwrap();

        assert!(columns[0].tasks.is_empty());
        assert_eq!(titles(&columns[1]), vec!["T3", "T1"]);
        assert_eq!(moved.column_id, b);
        assert_eq!(moved.sort_order, 1);
    }

    #[test]
    fn same_column_reorder_keeps_the_set_of_ids() {
        let mut columns = vec![column("A", &["T1", "T2", "T3", "T4"])];
        let before: HashSet<Uuid> = columns[0].tasks.iter().map(|t| t.id).collect();
        let t1 = columns[0].tasks[0].id;
        let a = columns[0].id;

        move_task(&mut columns, t1, a, 2).unwrap();

        assert_eq!(titles(&columns[0]), vec!["T2", "T3", "T1", "T4"]);
        let after: HashSet<Uuid> = columns[0].tasks.iter().map(|t| t.id).collect();
        assert_eq!(before, after);
        let orders: Vec<i64> = columns[0].tasks.iter().map(|t| t.sort_order).collect();
        assert_eq!(orders, vec![0, 1, 2, 3]);
    }

    #[test]
    fn dropping_onto_own_position_is_a_noop() {
        let mut columns = vec![column("A", &["T1", "T2"])];
        let t2 = columns[0].tasks[1].id;
        let a = columns[0].id;

        assert_eq!(move_task(&mut columns, t2, a, 1).unwrap(), None);
        // Past the end clamps to the last slot, which is where T2 already is.
        assert_eq!(move_task(&mut columns, t2, a, 99).unwrap(), None);
        assert_eq!(titles(&columns[0]), vec!["T1", "T2"]);
    }

    #[test]
    fn target_index_is_clamped() {
        let mut columns = vec![column("A", &["T1"]), column("B", &["T2", "T3"])];
        let t1 = columns[0].tasks[0].id;
        let b = columns[1].id;

        let moved = move_task(&mut columns, t1, b, 50).unwrap().unwrap();
        assert_eq!(moved.sort_order, 2);
        assert_eq!(titles(&columns[1]), vec!["T2", "T3", "T1"]);
    }

    #[test]
    fn unknown_ids_are_errors() {
        let mut columns = vec![column("A", &["T1"])];
        let t1 = columns[0].tasks[0].id;
        let a = columns[0].id;

        assert_eq!(
            move_task(&mut columns, Uuid::new_v4(), a, 0),
            Err(ReorderError::TaskNotFound)
        );
        assert_eq!(
            move_task(&mut columns, t1, Uuid::new_v4(), 0),
            Err(ReorderError::ColumnNotFound)
        );
    }

    #[test]
    fn resolve_drop_on_column_appends_unless_source() {
        let columns = vec![column("A", &["T1"]), column("B", &["T2", "T3"])];
        let t1 = columns[0].tasks[0].id;
        let a = columns[0].id;
        let b = columns[1].id;

        assert_eq!(
            resolve_drop(&columns, &t1, &DropTarget::Column(b)),
            Some((b, 2))
        );
        assert_eq!(resolve_drop(&columns, &t1, &DropTarget::Column(a)), None);
        assert_eq!(resolve_drop(&columns, &t1, &DropTarget::Nothing), None);
    }

    #[test]
    fn resolve_drop_on_task_takes_its_index() {
        let columns = vec![column("A", &["T1"]), column("B", &["T2", "T3"])];
        let t1 = columns[0].tasks[0].id;
        let t3 = columns[1].tasks[1].id;
        let b = columns[1].id;

        assert_eq!(
            resolve_drop(&columns, &t1, &DropTarget::Item(t3)),
            Some((b, 1))
        );
        assert_eq!(resolve_drop(&columns, &t1, &DropTarget::Item(t1)), None);
    }
}
