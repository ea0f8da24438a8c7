use quboform_model::{Constraint, ConstraintSense, Problem};

/// Shape of a linear inequality over binary variables
///
/// Every shape except [`ConstraintShape::Generic`] has a closed-form penalty
/// (see [`crate::synthesize`]).
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintShape {
    /// `x <= y`, written `x - y <= 0`
    ImplicationLe { x: usize, y: usize },
    /// `x >= y`, written `x - y >= 0`
    ImplicationGe { x: usize, y: usize },
    /// `Σxᵢ <= 1` with at least two variables
    AtMostOne { variables: Vec<usize> },
    /// `Σxᵢ >= n - 1` with `n >= 2` variables
    AtLeastNMinusOne { variables: Vec<usize> },
    Generic,
}

/// Match a constraint against the closed-form shapes
///
/// Equalities, quadratic constraints and constraints over non-binary
/// variables never match and come back as [`ConstraintShape::Generic`].
pub fn classify(problem: &Problem, constraint: &Constraint) -> ConstraintShape {
    if constraint.sense == ConstraintSense::Eq || !constraint.is_linear() {
        return ConstraintShape::Generic;
    }
    let all_binary = constraint
        .linear
        .variables()
        .all(|i| problem.variable(i).is_some_and(|v| v.is_binary()));
    if !all_binary {
        return ConstraintShape::Generic;
    }

    if let Some(shape) = match_implication(constraint) {
        return shape;
    }
    match_cardinality(constraint).unwrap_or(ConstraintShape::Generic)
}

fn match_implication(constraint: &Constraint) -> Option<ConstraintShape> {
    if constraint.linear.len() != 2 || constraint.rhs != 0.0 {
        return None;
    }
    let mut x = None;
    let mut y = None;
    for (index, coef) in constraint.linear.iter() {
        if coef == 1.0 {
            x = Some(index);
        } else if coef == -1.0 {
            y = Some(index);
        }
    }
    let (x, y) = (x?, y?);
    match constraint.sense {
        ConstraintSense::Le => Some(ConstraintShape::ImplicationLe { x, y }),
        ConstraintSense::Ge => Some(ConstraintShape::ImplicationGe { x, y }),
        ConstraintSense::Eq => None,
    }
}

fn match_cardinality(constraint: &Constraint) -> Option<ConstraintShape> {
    let n = constraint.linear.len();
    if n < 2 {
        return None;
    }
    let (_, first) = constraint.linear.iter().next()?;
    if (first != 1.0 && first != -1.0) || constraint.linear.iter().any(|(_, c)| c != first) {
        return None;
    }

    // Negate both sides of `-Σx (<=|>=) b` to get `Σx (>=|<=) -b`.
    let (sense, rhs) = if first < 0.0 {
        let flipped = match constraint.sense {
            ConstraintSense::Le => ConstraintSense::Ge,
            ConstraintSense::Ge => ConstraintSense::Le,
            ConstraintSense::Eq => ConstraintSense::Eq,
        };
        (flipped, -constraint.rhs)
    } else {
        (constraint.sense, constraint.rhs)
    };

    let variables: Vec<usize> = constraint.linear.variables().collect();
    match sense {
        ConstraintSense::Le if rhs == 1.0 => Some(ConstraintShape::AtMostOne { variables }),
        ConstraintSense::Ge if rhs == (n - 1) as f64 => {
            Some(ConstraintShape::AtLeastNMinusOne { variables })
        }
        _ => None,
    }
}
