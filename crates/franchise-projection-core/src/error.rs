use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ProjectionError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Length mismatch: {field} must have exactly {expected} values, got {actual}")]
    LengthMismatch {
        field: String,
        expected: usize,
        actual: usize,
    },

    #[error("Item 7 range violation on startup cost '{item}': low {low} exceeds high {high}")]
    RangeViolation { item: String, low: i64, high: i64 },

    #[error("Duplicate startup cost sort_order {sort_order}")]
    DuplicateSortOrder { sort_order: u32 },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for ProjectionError {
    fn from(e: serde_json::Error) -> Self {
        ProjectionError::SerializationError(e.to_string())
    }
}
