//! Self-contained demo workspace.
//!
//! Each signed-in user gets an in-memory copy of a seeded dataset that is changed through
//! [`DemoAction`]s. Data changes are undoable: the whole workspace is snapshotted before every
//! change, see [`History`].

mod seed;

use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashMap;
use db::models::task::TaskPriority;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use thiserror::Error;
use ts_rs::TS;
use uuid::Uuid;

use crate::services::{
    filter::{TaskFilter, TaskFilterPatch, TaskView},
    history::History,
    reorder::{Keyed, MoveOutcome, TaskList, move_item},
};

pub use seed::seeded_workspace;

/// Most recent activities kept in the feed.
pub const ACTIVITY_FEED_LIMIT: usize = 100;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DemoError {
    #[error("Project not found: {0}")]
    ProjectNotFound(String),
    #[error("Board not found: {0}")]
    BoardNotFound(String),
    #[error("Column not found: {0}")]
    ColumnNotFound(String),
    #[error("Task not found: {0}")]
    TaskNotFound(String),
    #[error("Subtask not found: {0}")]
    SubtaskNotFound(String),
    #[error("Column limit reached: {column} holds at most {limit} tasks")]
    ColumnFull { column: String, limit: usize },
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, PartialEq)]
pub struct DemoUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, PartialEq)]
pub struct DemoTag {
    pub id: String,
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, PartialEq)]
pub struct DemoProject {
    pub id: String,
    pub name: String,
    pub description: String,
    pub color: String,
    pub starred: bool,
    pub archived: bool,
    pub members: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, PartialEq)]
pub struct Subtask {
    pub id: String,
    pub title: String,
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, PartialEq)]
pub struct DemoTask {
    pub id: String,
    pub title: String,
    pub description: String,
    pub priority: TaskPriority,
    pub due_date: Option<NaiveDate>,
    /// User ids
    pub assignees: Vec<String>,
    /// Tag names
    pub tags: Vec<String>,
    pub subtasks: Vec<Subtask>,
    pub completed_subtasks: usize,
    /// Comment count
    pub comments: u32,
    pub attachments: u32,
    /// Seconds
    pub time_tracked: u64,
    pub recurrence: Option<String>,
    pub created_at: NaiveDate,
}

impl DemoTask {
    fn view(&self) -> TaskView<'_> {
        TaskView {
            title: &self.title,
            description: Some(&self.description),
            priority: self.priority,
            assignees: self.assignees.iter().map(String::as_str).collect(),
            tags: self.tags.iter().map(String::as_str).collect(),
            due_date: self.due_date,
        }
    }

    fn recount_subtasks(&mut self) {
        self.completed_subtasks = self.subtasks.iter().filter(|s| s.completed).count();
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, PartialEq)]
pub struct DemoColumn {
    pub id: String,
    pub name: String,
    pub color: String,
    /// Work-in-progress limit; `None` is unlimited
    pub limit: Option<usize>,
    pub tasks: Vec<DemoTask>,
}

impl DemoColumn {
    fn is_full(&self) -> bool {
        self.limit.is_some_and(|limit| self.tasks.len() >= limit)
    }

    fn full_error(&self) -> DemoError {
        DemoError::ColumnFull {
            column: self.name.clone(),
            limit: self.limit.unwrap_or_default(),
        }
    }
}

impl Keyed for DemoTask {
    type Key = String;
    fn key(&self) -> &String {
        &self.id
    }
}

impl TaskList for DemoColumn {
    type Item = DemoTask;

    fn list_key(&self) -> &String {
        &self.id
    }

    fn items(&self) -> &[DemoTask] {
        &self.tasks
    }

    fn items_mut(&mut self) -> &mut Vec<DemoTask> {
        &mut self.tasks
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, PartialEq)]
pub struct DemoBoard {
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub columns: Vec<DemoColumn>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, PartialEq)]
pub struct DemoComment {
    pub id: String,
    pub task_id: String,
    pub user_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, PartialEq)]
pub struct DemoActivity {
    pub id: String,
    pub user_id: String,
    pub action: String,
    pub entity_type: Option<String>,
    pub entity_name: String,
    pub project_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, TS, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum View {
    #[default]
    Board,
    List,
    Calendar,
    Timeline,
    Analytics,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, PartialEq)]
pub struct Workspace {
    pub projects: Vec<DemoProject>,
    pub boards: Vec<DemoBoard>,
    pub users: Vec<DemoUser>,
    pub tags: Vec<DemoTag>,
    pub comments: Vec<DemoComment>,
    /// Newest first
    pub activities: Vec<DemoActivity>,
    pub current_project: String,
    pub current_board: String,
    pub current_view: View,
    pub search_query: String,
    pub filters: TaskFilter,
    /// Task ids picked for bulk actions
    pub bulk_selection: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct NewDemoTask {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: TaskPriority,
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub assignees: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct DemoTaskChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<NaiveDate>,
    pub assignees: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
    pub recurrence: Option<String>,
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct NewDemoProject {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub color: String,
    /// User ids
    #[serde(default)]
    pub members: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct NewDemoActivity {
    pub action: String,
    pub entity_type: Option<String>,
    pub entity_name: String,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum DemoAction {
    SetView(View),
    SetProject(String),
    SetBoard(String),
    SetSearch(String),
    /// Replaces the dimensions it names, see [`TaskFilterPatch`]
    SetFilters(TaskFilterPatch),
    ClearFilters,
    ToggleProjectStar(String),
    AddProject(NewDemoProject),
    /// Removes the project together with its boards
    DeleteProject(String),
    AddTask {
        column_id: String,
        task: NewDemoTask,
    },
    UpdateTask {
        task_id: String,
        changes: DemoTaskChanges,
    },
    DeleteTask {
        task_id: String,
    },
    MoveTask {
        task_id: String,
        source_column_id: String,
        dest_column_id: String,
        new_index: usize,
    },
    AddSubtask {
        task_id: String,
        title: String,
    },
    ToggleSubtask {
        task_id: String,
        subtask_id: String,
    },
    AddComment {
        task_id: String,
        content: String,
    },
    AddActivity(NewDemoActivity),
    ToggleBulkSelect(String),
    ClearBulkSelect,
    /// Add seconds to a task's tracked time
    UpdateTaskTime {
        task_id: String,
        seconds: u64,
    },
    Undo,
    Redo,
}

impl DemoAction {
    /// Whether the action changes workspace data and is therefore recorded for undo.
    pub fn is_undoable(&self) -> bool {
        matches!(
            self,
            DemoAction::ToggleProjectStar(_)
                | DemoAction::AddProject(_)
                | DemoAction::DeleteProject(_)
                | DemoAction::AddTask { .. }
                | DemoAction::UpdateTask { .. }
                | DemoAction::DeleteTask { .. }
                | DemoAction::MoveTask { .. }
                | DemoAction::AddSubtask { .. }
                | DemoAction::ToggleSubtask { .. }
                | DemoAction::AddComment { .. }
                | DemoAction::UpdateTaskTime { .. }
        )
    }
}

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

impl Workspace {
    pub fn board(&self, board_id: &str) -> Option<&DemoBoard> {
        self.boards.iter().find(|b| b.id == board_id)
    }

    pub fn current_board(&self) -> Option<&DemoBoard> {
        self.board(&self.current_board)
    }

    fn current_board_mut(&mut self) -> Result<&mut DemoBoard, DemoError> {
        let id = self.current_board.clone();
        self.boards
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or(DemoError::BoardNotFound(id))
    }

    pub fn find_task(&self, task_id: &str) -> Option<&DemoTask> {
        self.boards
            .iter()
            .flat_map(|b| &b.columns)
            .flat_map(|c| &c.tasks)
            .find(|t| t.id == task_id)
    }

    fn find_task_mut(&mut self, task_id: &str) -> Result<&mut DemoTask, DemoError> {
        self.boards
            .iter_mut()
            .flat_map(|b| b.columns.iter_mut())
            .flat_map(|c| c.tasks.iter_mut())
            .find(|t| t.id == task_id)
            .ok_or_else(|| DemoError::TaskNotFound(task_id.to_string()))
    }

    /// Tasks of the current board that pass the search box and the active filters.
    pub fn visible_tasks(&self) -> Vec<&DemoTask> {
        let mut filter = self.filters.clone();
        if !self.search_query.trim().is_empty() {
            filter.search = Some(self.search_query.clone());
        }
        self.current_board()
            .into_iter()
            .flat_map(|b| &b.columns)
            .flat_map(|c| &c.tasks)
            .filter(|t| filter.matches(&t.view()))
            .collect()
    }

    fn log_activity(&mut self, user_id: &str, activity: NewDemoActivity) {
        self.activities.insert(
            0,
            DemoActivity {
                id: new_id(),
                user_id: user_id.to_string(),
                action: activity.action,
                entity_type: activity.entity_type,
                entity_name: activity.entity_name,
                project_id: self.current_project.clone(),
                created_at: Utc::now(),
            },
        );
        self.activities.truncate(ACTIVITY_FEED_LIMIT);
    }

    /// Drop a project and its boards. Selections pointing into them move to the first
    /// remaining project, or are emptied when none is left.
    fn delete_project(&mut self, project_id: &str) -> Result<(), DemoError> {
        let idx = self
            .projects
            .iter()
            .position(|p| p.id == project_id)
            .ok_or_else(|| DemoError::ProjectNotFound(project_id.to_string()))?;
        self.projects.remove(idx);

        let (removed, kept): (Vec<DemoBoard>, Vec<DemoBoard>) = std::mem::take(&mut self.boards)
            .into_iter()
            .partition(|b| b.project_id == project_id);
        self.boards = kept;

        let removed_tasks: Vec<&str> = removed
            .iter()
            .flat_map(|b| &b.columns)
            .flat_map(|c| &c.tasks)
            .map(|t| t.id.as_str())
            .collect();
        self.bulk_selection
            .retain(|id| !removed_tasks.contains(&id.as_str()));

        if self.current_project == project_id || self.current_board().is_none() {
            self.current_project = self
                .projects
                .first()
                .map(|p| p.id.clone())
                .unwrap_or_default();
            self.current_board = self
                .boards
                .iter()
                .find(|b| b.project_id == self.current_project)
                .map(|b| b.id.clone())
                .unwrap_or_default();
        }
        Ok(())
    }

    /// Apply one non-history action. Returns `false` when nothing changed.
    fn apply(&mut self, action: DemoAction, user_id: &str) -> Result<bool, DemoError> {
        match action {
            DemoAction::SetView(view) => self.current_view = view,
            DemoAction::SetProject(project_id) => {
                if !self.projects.iter().any(|p| p.id == project_id) {
                    return Err(DemoError::ProjectNotFound(project_id));
                }
                if let Some(board) = self.boards.iter().find(|b| b.project_id == project_id) {
                    self.current_board = board.id.clone();
                }
                self.current_project = project_id;
            }
            DemoAction::SetBoard(board_id) => {
                let project_id = self
                    .board(&board_id)
                    .map(|b| b.project_id.clone())
                    .ok_or_else(|| DemoError::BoardNotFound(board_id.clone()))?;
                self.current_project = project_id;
                self.current_board = board_id;
            }
            DemoAction::SetSearch(query) => self.search_query = query,
            DemoAction::SetFilters(patch) => self.filters.apply_patch(patch),
            DemoAction::ClearFilters => self.filters = TaskFilter::default(),
            DemoAction::ToggleProjectStar(project_id) => {
                let project = self
                    .projects
                    .iter_mut()
                    .find(|p| p.id == project_id)
                    .ok_or(DemoError::ProjectNotFound(project_id))?;
                project.starred = !project.starred;
            }
            DemoAction::AddProject(project) => self.projects.push(DemoProject {
                id: new_id(),
                name: project.name,
                description: project.description,
                color: project.color,
                starred: false,
                archived: false,
                members: project.members,
            }),
            DemoAction::DeleteProject(project_id) => self.delete_project(&project_id)?,
            DemoAction::AddTask { column_id, task } => {
                let column = self
                    .current_board_mut()?
                    .columns
                    .iter_mut()
                    .find(|c| c.id == column_id)
                    .ok_or(DemoError::ColumnNotFound(column_id))?;
                if column.is_full() {
                    return Err(column.full_error());
                }
                let title = task.title.clone();
                column.tasks.push(DemoTask {
                    id: new_id(),
                    title: task.title,
                    description: task.description,
                    priority: task.priority,
                    due_date: task.due_date,
                    assignees: task.assignees,
                    tags: task.tags,
                    subtasks: Vec::new(),
                    completed_subtasks: 0,
                    comments: 0,
                    attachments: 0,
                    time_tracked: 0,
                    recurrence: None,
                    created_at: Utc::now().date_naive(),
                });
                self.log_activity(
                    user_id,
                    NewDemoActivity {
                        action: "created".to_string(),
                        entity_type: Some("task".to_string()),
                        entity_name: title,
                    },
                );
            }
            DemoAction::UpdateTask { task_id, changes } => {
                let task = self.find_task_mut(&task_id)?;
                if let Some(title) = changes.title {
                    task.title = title;
                }
                if let Some(description) = changes.description {
                    task.description = description;
                }
                if let Some(priority) = changes.priority {
                    task.priority = priority;
                }
                if changes.due_date.is_some() {
                    task.due_date = changes.due_date;
                }
                if let Some(assignees) = changes.assignees {
                    task.assignees = assignees;
                }
                if let Some(tags) = changes.tags {
                    task.tags = tags;
                }
                if changes.recurrence.is_some() {
                    task.recurrence = changes.recurrence;
                }
            }
            DemoAction::DeleteTask { task_id } => {
                let removed = self
                    .boards
                    .iter_mut()
                    .flat_map(|b| b.columns.iter_mut())
                    .find_map(|c| {
                        c.tasks
                            .iter()
                            .position(|t| t.id == task_id)
                            .map(|idx| c.tasks.remove(idx))
                    })
                    .ok_or_else(|| DemoError::TaskNotFound(task_id.clone()))?;
                self.bulk_selection.retain(|id| *id != task_id);
                self.log_activity(
                    user_id,
                    NewDemoActivity {
                        action: "deleted".to_string(),
                        entity_type: Some("task".to_string()),
                        entity_name: removed.title,
                    },
                );
            }
            DemoAction::MoveTask {
                task_id,
                source_column_id,
                dest_column_id,
                new_index,
            } => {
                let board = self.current_board_mut()?;
                let source = board
                    .columns
                    .iter()
                    .find(|c| c.id == source_column_id)
                    .ok_or_else(|| DemoError::ColumnNotFound(source_column_id.clone()))?;
                if !source.tasks.iter().any(|t| t.id == task_id) {
                    return Err(DemoError::TaskNotFound(task_id));
                }
                let dest = board
                    .columns
                    .iter()
                    .find(|c| c.id == dest_column_id)
                    .ok_or_else(|| DemoError::ColumnNotFound(dest_column_id.clone()))?;
                if dest_column_id != source_column_id && dest.is_full() {
                    return Err(dest.full_error());
                }

                let outcome = move_item(&mut board.columns, &task_id, &dest_column_id, new_index)
                    .map_err(|_| DemoError::TaskNotFound(task_id.clone()))?;
                return Ok(outcome != MoveOutcome::Unchanged);
            }
            DemoAction::AddSubtask { task_id, title } => {
                let task = self.find_task_mut(&task_id)?;
                task.subtasks.push(Subtask {
                    id: new_id(),
                    title,
                    completed: false,
                });
                task.recount_subtasks();
            }
            DemoAction::ToggleSubtask {
                task_id,
                subtask_id,
            } => {
                let task = self.find_task_mut(&task_id)?;
                let subtask = task
                    .subtasks
                    .iter_mut()
                    .find(|s| s.id == subtask_id)
                    .ok_or(DemoError::SubtaskNotFound(subtask_id))?;
                subtask.completed = !subtask.completed;
                task.recount_subtasks();
            }
            DemoAction::AddComment { task_id, content } => {
                let task = self.find_task_mut(&task_id)?;
                task.comments += 1;
                let title = task.title.clone();
                self.comments.push(DemoComment {
                    id: new_id(),
                    task_id,
                    user_id: user_id.to_string(),
                    content,
                    created_at: Utc::now(),
                });
                self.log_activity(
                    user_id,
                    NewDemoActivity {
                        action: "commented on".to_string(),
                        entity_type: Some("task".to_string()),
                        entity_name: title,
                    },
                );
            }
            DemoAction::AddActivity(activity) => self.log_activity(user_id, activity),
            DemoAction::ToggleBulkSelect(task_id) => {
                if let Some(idx) = self.bulk_selection.iter().position(|id| *id == task_id) {
                    self.bulk_selection.remove(idx);
                } else {
                    self.bulk_selection.push(task_id);
                }
            }
            DemoAction::ClearBulkSelect => self.bulk_selection.clear(),
            DemoAction::UpdateTaskTime { task_id, seconds } => {
                let task = self.find_task_mut(&task_id)?;
                task.time_tracked += seconds;
            }
            // Handled by the session, which owns the history.
            DemoAction::Undo | DemoAction::Redo => return Ok(false),
        }
        Ok(true)
    }
}

/// One user's workspace plus its undo/redo stacks.
#[derive(Debug, Clone)]
pub struct DemoSession {
    workspace: Workspace,
    history: History<Workspace>,
}

/// What clients see after each dispatch.
#[derive(Debug, Clone, Serialize, TS)]
pub struct DemoState {
    #[serde(flatten)]
    #[ts(flatten)]
    pub workspace: Workspace,
    pub can_undo: bool,
    pub can_redo: bool,
}

impl DemoSession {
    pub fn new(history_limit: usize) -> Self {
        Self {
            workspace: seeded_workspace(),
            history: History::new(history_limit),
        }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn state(&self) -> DemoState {
        DemoState {
            workspace: self.workspace.clone(),
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
        }
    }

    pub fn dispatch(&mut self, action: DemoAction, user_id: &str) -> Result<(), DemoError> {
        match action {
            DemoAction::Undo => {
                let current = std::mem::take(&mut self.workspace);
                self.workspace = self.history.undo(current).unwrap_or_else(|same| same);
                Ok(())
            }
            DemoAction::Redo => {
                let current = std::mem::take(&mut self.workspace);
                self.workspace = self.history.redo(current).unwrap_or_else(|same| same);
                Ok(())
            }
            action if action.is_undoable() => {
                let mut next = self.workspace.clone();
                if next.apply(action, user_id)? {
                    let previous = std::mem::replace(&mut self.workspace, next);
                    self.history.record(previous);
                }
                Ok(())
            }
            action => self.workspace.apply(action, user_id).map(|_| ()),
        }
    }
}

/// Demo sessions keyed by user id, created on first access.
pub struct DemoSessions {
    sessions: DashMap<String, DemoSession>,
    history_limit: usize,
}

impl DemoSessions {
    pub fn new(history_limit: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            history_limit,
        }
    }

    pub fn state(&self, user_id: &str) -> DemoState {
        self.sessions
            .entry(user_id.to_string())
            .or_insert_with(|| DemoSession::new(self.history_limit))
            .state()
    }

    pub fn dispatch(&self, user_id: &str, action: DemoAction) -> Result<DemoState, DemoError> {
        let mut session = self
            .sessions
            .entry(user_id.to_string())
            .or_insert_with(|| DemoSession::new(self.history_limit));
        session.dispatch(action, user_id)?;
        Ok(session.state())
    }

    /// Throw away the user's changes and start from the seed again.
    pub fn reset(&self, user_id: &str) -> DemoState {
        let session = DemoSession::new(self.history_limit);
        let state = session.state();
        self.sessions.insert(user_id.to_string(), session);
        state
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
