use quboform_model::ModelError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConvertError {
    #[error("Unsupported constraint {constraint}: {reason}")]
    UnsupportedConstraint { constraint: String, reason: String },
    #[error("Invalid penalty factor {0}: must be finite and greater than zero")]
    InvalidPenaltyFactor(f64),
    #[error(
        "Infeasible bounds in constraint {constraint}: left-hand side ranges over [{lower}, {upper}] but must reach {rhs}"
    )]
    InfeasibleBounds {
        constraint: String,
        lower: f64,
        upper: f64,
        rhs: f64,
    },
    #[error("Interpretation mismatch at stage {stage}: expected {expected} values but got {actual}")]
    InterpretationMismatch {
        stage: usize,
        expected: usize,
        actual: usize,
    },
    #[error(transparent)]
    Model(#[from] ModelError),
}
