//! Service modules for Taskboard.
//!
//! Pure board logic ([`reorder`], [`filter`], [`history`], [`recurrence`]) has no I/O and is
//! shared by the REST handlers and the in-memory [`demo`] workspace.

pub mod board_data;
pub mod config;
pub mod demo;
pub mod feed;
pub mod filter;
pub mod friendly_errors;
pub mod history;
pub mod recurrence;
pub mod reorder;
pub mod storage;
pub mod time_tracking;
