use std::fmt;

/// The set of values a variable may take
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    /// {0, 1}
    Binary,
    /// Integers in the closed range [lower, upper]
    Integer { lower: i64, upper: i64 },
}

impl Domain {
    pub fn is_binary(&self) -> bool {
        matches!(self, Domain::Binary)
    }

    pub fn lower(&self) -> i64 {
        match self {
            Domain::Binary => 0,
            Domain::Integer { lower, .. } => *lower,
        }
    }

    pub fn upper(&self) -> i64 {
        match self {
            Domain::Binary => 1,
            Domain::Integer { upper, .. } => *upper,
        }
    }

    /// Largest absolute value a variable of this domain can take
    pub fn magnitude(&self) -> f64 {
        self.lower().unsigned_abs().max(self.upper().unsigned_abs()) as f64
    }

    /// Whether `value` is an admissible assignment (integral and in range)
    pub fn contains(&self, value: f64, tolerance: f64) -> bool {
        let rounded = value.round();
        (value - rounded).abs() <= tolerance
            && rounded >= self.lower() as f64
            && rounded <= self.upper() as f64
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Domain::Binary => write!(f, "binary"),
            Domain::Integer { .. } => write!(f, "integer"),
        }
    }
}

/// A decision variable of a [`crate::Problem`]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    /// Unique name within the problem
    pub name: String,
    pub domain: Domain,
    /// Position in coefficient and solution vectors
    pub index: usize,
}

impl Variable {
    pub fn is_binary(&self) -> bool {
        self.domain.is_binary()
    }
}
