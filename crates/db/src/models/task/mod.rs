//! Task model.
//!
//! A task lives in exactly one column; its position within the column is the
//! `sort_order` value, dense from zero after every move.

mod queries;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::{FromRow, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

#[derive(
    Debug,
    Clone,
    Copy,
    Type,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    TS,
    EnumString,
    Display,
    Default,
)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS, PartialEq)]
pub struct Task {
    pub id: Uuid,
    pub column_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    /// Free-form assignee name
    pub assignee: Option<String>,
    #[ts(type = "Date | null")]
    pub due_date: Option<DateTime<Utc>>,
    pub priority: TaskPriority,
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateTask {
    pub column_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub assignee: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub priority: TaskPriority,
    /// Appended to the end of the column when omitted
    pub sort_order: Option<i64>,
}

impl CreateTask {
    pub fn with_title(column_id: Uuid, title: impl Into<String>) -> Self {
        Self {
            column_id,
            title: title.into(),
            description: None,
            assignee: None,
            due_date: None,
            priority: TaskPriority::default(),
            sort_order: None,
        }
    }
}

/// Partial update. For the nullable fields an explicit `null` clears the value,
/// an absent key leaves it untouched.
#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct UpdateTask {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "present")]
    #[ts(type = "string | null")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[ts(type = "string | null")]
    pub assignee: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    #[ts(type = "Date | null")]
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub priority: Option<TaskPriority>,
}

fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Deserialize, Serialize, TS)]
pub struct MoveTask {
    pub column_id: Uuid,
    /// Index in the target column, clamped to its length
    pub sort_order: i64,
}
