//! Validation for free-form string enums stored in TEXT columns.
//!
//! Custom field types, relation types and recurrence frequencies are plain
//! strings in the schema; requests are checked against these lists before insert.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Invalid field type: '{0}'. Valid values: text, number, date, select, checkbox")]
    InvalidFieldType(String),

    #[error(
        "Invalid relation type: '{0}'. Valid values: blocks, blocked_by, relates_to, duplicates"
    )]
    InvalidRelationType(String),

    #[error("Invalid frequency: '{0}'. Valid values: daily, weekly, monthly, yearly")]
    InvalidFrequency(String),

    #[error("Interval must be at least 1, got {0}")]
    InvalidInterval(i64),

    #[error("A task cannot be related to itself")]
    SelfRelation,

    #[error("{0} must not be empty")]
    Empty(&'static str),
}

pub const VALID_FIELD_TYPES: &[&str] = &["text", "number", "date", "select", "checkbox"];

pub const VALID_RELATION_TYPES: &[&str] = &["blocks", "blocked_by", "relates_to", "duplicates"];

pub const VALID_FREQUENCIES: &[&str] = &["daily", "weekly", "monthly", "yearly"];

/// Validate a custom field type
///
/// # Examples
/// ```
/// use db::validation::validate_field_type;
///
/// assert!(validate_field_type("select").is_ok());
/// assert!(validate_field_type("dropdown").is_err());
/// ```
pub fn validate_field_type(field_type: &str) -> Result<(), ValidationError> {
    if VALID_FIELD_TYPES.contains(&field_type) {
        Ok(())
    } else {
        Err(ValidationError::InvalidFieldType(field_type.to_string()))
    }
}

pub fn validate_relation_type(relation_type: &str) -> Result<(), ValidationError> {
    if VALID_RELATION_TYPES.contains(&relation_type) {
        Ok(())
    } else {
        Err(ValidationError::InvalidRelationType(
            relation_type.to_string(),
        ))
    }
}

pub fn validate_frequency(frequency: &str) -> Result<(), ValidationError> {
    if VALID_FREQUENCIES.contains(&frequency) {
        Ok(())
    } else {
        Err(ValidationError::InvalidFrequency(frequency.to_string()))
    }
}

pub fn validate_interval(interval: i64) -> Result<(), ValidationError> {
    if interval >= 1 {
        Ok(())
    } else {
        Err(ValidationError::InvalidInterval(interval))
    }
}

/// Reject blank titles, names and message bodies.
pub fn validate_not_blank(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::Empty(field))
    } else {
        Ok(())
    }
}
