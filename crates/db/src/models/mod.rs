//! Database models, one module per table family.

pub mod activity;
pub mod board;
pub mod checklist;
pub mod column;
pub mod comment;
pub mod custom_field;
pub mod message;
pub mod milestone;
pub mod recurring_task;
pub mod tag;
pub mod task;
pub mod task_relation;
pub mod time_entry;
