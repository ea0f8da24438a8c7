mod display;
mod error;
mod expression;
mod problem;
mod variable;
mod violation;

pub use error::ModelError;
pub use expression::{LinearExpression, QuadraticExpression};
pub use problem::{Constraint, ConstraintSense, Objective, Problem, Sense};
pub use variable::{Domain, Variable};
pub use violation::ConstraintViolation;

/// Tolerance used when comparing constraint sides and domain values.
pub const DEFAULT_TOLERANCE: f64 = 1e-9;
