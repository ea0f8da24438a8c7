use crate::problem::{Constraint, ConstraintSense};
use crate::variable::{Domain, Variable};

/// Information about a violated constraint or variable domain
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintViolation {
    /// Constraint name, or variable name for domain violations
    pub constraint: String,
    /// Required value (constraint RHS or the nearest admissible value)
    pub required: f64,
    /// Actual value achieved
    pub actual: f64,
    /// How much the constraint is violated by
    pub violation_amount: f64,
    /// Human-readable description of what's wrong
    pub description: String,
}

impl ConstraintViolation {
    pub(crate) fn constraint(c: &Constraint, lhs: f64, amount: f64) -> Self {
        let description = match c.sense {
            ConstraintSense::Le => format!("{} exceeds maximum of {} by {}", c.name, c.rhs, amount),
            ConstraintSense::Ge => format!("{} is below minimum of {} by {}", c.name, c.rhs, amount),
            ConstraintSense::Eq => format!("{} requires exactly {} but got {}", c.name, c.rhs, lhs),
        };
        Self {
            constraint: c.name.clone(),
            required: c.rhs,
            actual: lhs,
            violation_amount: amount,
            description,
        }
    }

    pub(crate) fn domain(var: &Variable, value: f64) -> Self {
        let lower = var.domain.lower() as f64;
        let upper = var.domain.upper() as f64;
        let required = value.round().clamp(lower, upper);
        let description = match var.domain {
            Domain::Binary => format!("{} must be 0 or 1 but got {}", var.name, value),
            Domain::Integer { lower, upper } => {
                format!("{} must be an integer in [{}, {}] but got {}", var.name, lower, upper, value)
            }
        };
        Self {
            constraint: var.name.clone(),
            required,
            actual: value,
            violation_amount: (value - required).abs(),
            description,
        }
    }
}
