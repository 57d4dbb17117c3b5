//! Classification of database failures into the messages shown to users.

use strum_macros::Display;

pub const BOARD_TITLE_TAKEN: &str = "A board with this title already exists.";

/// Optional tables added after the core board schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Feature {
    Messages,
    Tags,
    Checklists,
    Comments,
    Activities,
    #[strum(serialize = "Time tracking")]
    TimeTracking,
    #[strum(serialize = "Custom fields")]
    CustomFields,
    Milestones,
    #[strum(serialize = "Recurring tasks")]
    RecurringTasks,
    #[strum(serialize = "Task relations")]
    TaskRelations,
    Attachments,
}

impl Feature {
    pub fn requires_migration_message(&self) -> String {
        format!("{self} feature requires database migration")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbErrorKind {
    MissingTable,
    UniqueViolation,
    ForeignKeyViolation,
    CheckViolation,
    NotFound,
    Other,
}

pub fn classify(err: &sqlx::Error) -> DbErrorKind {
    match err {
        sqlx::Error::RowNotFound => DbErrorKind::NotFound,
        sqlx::Error::Database(db_err) => {
            if db_err.is_unique_violation() {
                DbErrorKind::UniqueViolation
            } else if db_err.is_foreign_key_violation() {
                DbErrorKind::ForeignKeyViolation
            } else if db_err.is_check_violation() {
                DbErrorKind::CheckViolation
            } else if db_err.message().contains("no such table") {
                DbErrorKind::MissingTable
            } else {
                DbErrorKind::Other
            }
        }
        _ => DbErrorKind::Other,
    }
}
