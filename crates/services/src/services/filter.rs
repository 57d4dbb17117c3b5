use std::{collections::HashMap, str::FromStr};

use chrono::NaiveDate;
use db::models::{
    column::ColumnWithTasks,
    tag::TaskTagName,
    task::{Task, TaskPriority},
};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("Unknown priority: {0}")]
    UnknownPriority(String),
}

/// Active board filters. Values inside one dimension are OR-ed, dimensions are AND-ed, and an
/// empty dimension matches everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
pub struct TaskFilter {
    #[serde(default)]
    pub priorities: Vec<TaskPriority>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub assignees: Vec<String>,
    /// Calendar day (UTC) the task must be due on
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub search: Option<String>,
}

/// Partial filter change. Absent keys leave a dimension alone; present keys replace it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, TS)]
pub struct TaskFilterPatch {
    pub priorities: Option<Vec<TaskPriority>>,
    pub tags: Option<Vec<String>>,
    pub assignees: Option<Vec<String>>,
    #[serde(default, deserialize_with = "present")]
    #[ts(type = "string | null")]
    pub due_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "present")]
    #[ts(type = "string | null")]
    pub search: Option<Option<String>>,
}

fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// The fields a filter looks at, borrowed from whatever task representation is at hand.
#[derive(Debug, Clone)]
pub struct TaskView<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub priority: TaskPriority,
    pub assignees: Vec<&'a str>,
    pub tags: Vec<&'a str>,
    pub due_date: Option<NaiveDate>,
}

impl<'a> TaskView<'a> {
    pub fn from_task(task: &'a Task, tags: &'a [String]) -> Self {
        Self {
            title: &task.title,
            description: task.description.as_deref(),
            priority: task.priority,
            assignees: task.assignee.as_deref().into_iter().collect(),
            tags: tags.iter().map(String::as_str).collect(),
            due_date: task.due_date.map(|d| d.date_naive()),
        }
    }
}

impl TaskFilter {
    pub fn is_empty(&self) -> bool {
        self.priorities.is_empty()
            && self.tags.is_empty()
            && self.assignees.is_empty()
            && self.due_date.is_none()
            && self.search.as_deref().is_none_or(|s| s.trim().is_empty())
    }

    /// Replace every dimension present in `patch`, keep the rest. A present but empty
    /// dimension (`[]` or `null`) is cleared.
    pub fn apply_patch(&mut self, patch: TaskFilterPatch) {
        if let Some(priorities) = patch.priorities {
            self.priorities = priorities;
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
        if let Some(assignees) = patch.assignees {
            self.assignees = assignees;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        if let Some(search) = patch.search {
            self.search = search;
        }
    }

    pub fn matches(&self, task: &TaskView<'_>) -> bool {
        if !self.priorities.is_empty() && !self.priorities.contains(&task.priority) {
            return false;
        }

        if !self.tags.is_empty() && !task.tags.iter().any(|t| self.tags.iter().any(|f| f == t)) {
            return false;
        }

        if !self.assignees.is_empty()
            && !task
                .assignees
                .iter()
                .any(|a| self.assignees.iter().any(|f| f == a))
        {
            return false;
        }

        if let Some(day) = self.due_date
            && task.due_date != Some(day)
        {
            return false;
        }

        if let Some(query) = self.search.as_deref().map(str::trim)
            && !query.is_empty()
        {
            let query = query.to_lowercase();
            let in_title = task.title.to_lowercase().contains(&query);
            let in_description = task
                .description
                .is_some_and(|d| d.to_lowercase().contains(&query));
            if !in_title && !in_description {
                return false;
            }
        }

        true
    }

    /// Filter the tasks of every column; the column list itself is unchanged.
    pub fn apply(
        &self,
        columns: Vec<ColumnWithTasks>,
        task_tags: &HashMap<Uuid, Vec<String>>,
    ) -> Vec<ColumnWithTasks> {
        if self.is_empty() {
            return columns;
        }

        columns
            .into_iter()
            .map(|mut column| {
                column.tasks.retain(|task| {
                    let tags = task_tags.get(&task.id).map(Vec::as_slice).unwrap_or(&[]);
                    self.matches(&TaskView::from_task(task, tags))
                });
                column
            })
            .collect()
    }
}

/// Group `(task_id, tag name)` rows by task.
pub fn tags_by_task(rows: Vec<TaskTagName>) -> HashMap<Uuid, Vec<String>> {
    let mut grouped: HashMap<Uuid, Vec<String>> = HashMap::new();
    for row in rows {
        grouped.entry(row.task_id).or_default().push(row.name);
    }
    grouped
}

/// Query-string form of [`TaskFilter`]; list dimensions are comma separated.
#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct TaskFilterQuery {
    pub priority: Option<String>,
    pub tags: Option<String>,
    pub assignees: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub search: Option<String>,
}

fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

impl TryFrom<TaskFilterQuery> for TaskFilter {
    type Error = FilterError;

    fn try_from(query: TaskFilterQuery) -> Result<Self, Self::Error> {
        let priorities = split_list(query.priority.as_deref())
            .into_iter()
            .map(|p| TaskPriority::from_str(&p).map_err(|_| FilterError::UnknownPriority(p)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            priorities,
            tags: split_list(query.tags.as_deref()),
            assignees: split_list(query.assignees.as_deref()),
            due_date: query.due_date,
            search: query.search.filter(|s| !s.trim().is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use db::models::column::Column;

    use super::*;

    fn task(title: &str, priority: TaskPriority) -> Task {
        let now = Utc::now();
        Task {
            id: Uuid::new_v4(),
            column_id: Uuid::nil(),
            title: title.to_string(),
            description: None,
            assignee: None,
            due_date: None,
            priority,
            sort_order: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn view(task: &Task) -> TaskView<'_> {
        TaskView::from_task(task, &[])
    }

    #[test]
    fn priority_filter_keeps_matching_tasks() {
        let column = ColumnWithTasks {
            column: Column {
                id: Uuid::new_v4(),
                board_id: Uuid::nil(),
                title: "C".to_string(),
                sort_order: 0,
                user_id: "user-1".to_string(),
                created_at: Utc::now(),
            },
            tasks: vec![
                task("T1", TaskPriority::High),
                task("T2", TaskPriority::Low),
            ],
        };
        let filter = TaskFilter {
            priorities: vec![TaskPriority::High],
            ..Default::default()
        };

        let filtered = filter.apply(vec![column], &HashMap::new());
        assert_eq!(filtered.len(), 1);
        let titles: Vec<_> = filtered[0].tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["T1"]);
    }

    #[test]
    fn dimensions_are_anded_values_ored() {
        let mut t = task("Ship API", TaskPriority::High);
        t.assignee = Some("sarah".to_string());
        let tags = vec!["backend".to_string()];
        let view = TaskView::from_task(&t, &tags);

        let filter = TaskFilter {
            priorities: vec![TaskPriority::High, TaskPriority::Low],
            tags: vec!["frontend".to_string(), "backend".to_string()],
            assignees: vec!["sarah".to_string()],
            ..Default::default()
        };
        assert!(filter.matches(&view));

        let filter = TaskFilter {
            priorities: vec![TaskPriority::High],
            tags: vec!["frontend".to_string()],
            ..Default::default()
        };
        assert!(!filter.matches(&view));
    }

    #[test]
    fn due_date_compares_calendar_days() {
        let mut t = task("Release", TaskPriority::Medium);
        t.due_date = Some(Utc.with_ymd_and_hms(2026, 3, 14, 18, 30, 0).unwrap());
        let undated = task("Someday", TaskPriority::Medium);

        let filter = TaskFilter {
            due_date: NaiveDate::from_ymd_opt(2026, 3, 14),
            ..Default::default()
        };
        assert!(filter.matches(&view(&t)));
        assert!(!filter.matches(&view(&undated)));

        let filter = TaskFilter {
            due_date: NaiveDate::from_ymd_opt(2026, 3, 15),
            ..Default::default()
        };
        assert!(!filter.matches(&view(&t)));
    }

    #[test]
    fn search_is_case_insensitive_over_title_and_description() {
        let mut t = task("Landing page", TaskPriority::Medium);
        t.description = Some("Hero section with CTA".to_string());

        let by_title = TaskFilter {
            search: Some("LANDING".to_string()),
            ..Default::default()
        };
        let by_description = TaskFilter {
            search: Some("cta".to_string()),
            ..Default::default()
        };
        let miss = TaskFilter {
            search: Some("footer".to_string()),
            ..Default::default()
        };
        assert!(by_title.matches(&view(&t)));
        assert!(by_description.matches(&view(&t)));
        assert!(!miss.matches(&view(&t)));
    }

    #[test]
    fn query_parses_comma_lists() {
        let query = TaskFilterQuery {
            priority: Some("high, low".to_string()),
            tags: Some("design,,ux".to_string()),
            search: Some("  ".to_string()),
            ..Default::default()
        };
        let filter = TaskFilter::try_from(query).unwrap();
        assert_eq!(filter.priorities, vec![TaskPriority::High, TaskPriority::Low]);
        assert_eq!(filter.tags, vec!["design", "ux"]);
        assert_eq!(filter.search, None);

        let bad = TaskFilterQuery {
            priority: Some("urgent".to_string()),
            ..Default::default()
        };
        assert_eq!(
            TaskFilter::try_from(bad),
            Err(FilterError::UnknownPriority("urgent".to_string()))
        );
    }

    #[test]
    fn patch_replaces_only_present_dimensions() {
        let mut filter = TaskFilter {
            priorities: vec![TaskPriority::High],
            tags: vec!["design".to_string()],
            search: Some("login".to_string()),
            ..Default::default()
        };
        filter.apply_patch(TaskFilterPatch {
            tags: Some(vec!["ux".to_string()]),
            ..Default::default()
        });
        assert_eq!(filter.priorities, vec![TaskPriority::High]);
        assert_eq!(filter.tags, vec!["ux"]);
        assert_eq!(filter.search.as_deref(), Some("login"));
    }

    #[test]
    fn present_empty_dimensions_are_cleared() {
        let mut filter = TaskFilter {
            priorities: vec![TaskPriority::Low],
            assignees: vec!["u2".to_string()],
            due_date: NaiveDate::from_ymd_opt(2024, 3, 1),
            ..Default::default()
        };

        let patch: TaskFilterPatch =
            serde_json::from_str(r#"{"priorities":[],"due_date":null}"#).unwrap();
        assert_eq!(patch.priorities, Some(vec![]));
        assert_eq!(patch.due_date, Some(None));
        assert_eq!(patch.tags, None);

        filter.apply_patch(patch);
        assert!(filter.priorities.is_empty());
        assert_eq!(filter.due_date, None);
        assert_eq!(filter.assignees, vec!["u2"]);
    }
}
