use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Duplicate variable name: {0}")]
    DuplicateVariable(String),
    #[error("Duplicate constraint name: {0}")]
    DuplicateConstraint(String),
    #[error("Unknown variable index {index} (problem has {count} variables)")]
    UnknownVariable { index: usize, count: usize },
    #[error("Invalid bounds for {name}: lower bound {lower} exceeds upper bound {upper}")]
    InvalidBounds { name: String, lower: i64, upper: i64 },
    #[error("Expected {expected} values but got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}
