use quboform_model::{ConstraintSense, Problem};
use tracing::debug;

use super::copy_variables;
use crate::error::ConvertError;
use crate::estimator::resolve_penalty;
use crate::penalty::squared_deviation;
use crate::record::{ConversionRecord, Stage};

/// Fold every linear equality into the objective as `±P·(lhs − rhs)²`
///
/// The output problem has no constraints. Inequalities must have been
/// rewritten first, and every constrained variable must be binary.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LinearEqualityToPenalty {
    /// Estimated from the problem when `None`
    pub penalty: Option<f64>,
}

impl LinearEqualityToPenalty {
    pub fn new(penalty: Option<f64>) -> Self {
        Self { penalty }
    }

    pub fn convert(&self, problem: &Problem) -> Result<(Problem, ConversionRecord), ConvertError> {
        let penalty = resolve_penalty(self.penalty, problem)?;

        for c in problem.constraints() {
            let unsupported = |reason: &str| ConvertError::UnsupportedConstraint {
                constraint: c.name.clone(),
                reason: reason.to_string(),
            };
            if c.sense != ConstraintSense::Eq {
                return Err(unsupported("inequality constraints must be rewritten as equalities first"));
            }
            if !c.is_linear() {
                return Err(unsupported("quadratic constraints cannot be squared into a quadratic penalty"));
            }
            if let Some(var) = c
                .linear
                .variables()
                .filter_map(|i| problem.variable(i))
                .find(|v| !v.is_binary())
            {
                return Err(unsupported(&format!(
                    "variable {} is not binary; convert integers to binary first",
                    var.name
                )));
            }
        }

        let sign = problem.objective().sense.sign();
        let mut objective = problem.objective().clone();
        for c in problem.constraints() {
            debug!(constraint = %c.name, penalty, "folded equality into objective");
            squared_deviation(&c.linear, c.rhs, penalty).add_to(&mut objective, sign);
        }

        let mut dst = copy_variables(problem)?;
        dst.set_objective(objective)?;
        let record = ConversionRecord::identity(Stage::LinearEqualityToPenalty, problem.num_variables());
        Ok((dst, record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quboform_model::{LinearExpression, QuadraticExpression};

    fn problem() -> Problem {
        let mut problem = Problem::new("p");
        let x = problem.binary_var("x").unwrap();
        let y = problem.binary_var("y").unwrap();
        problem
            .minimize(0.0, LinearExpression::from_terms([(x, 1.0), (y, 2.0)]), QuadraticExpression::new())
            .unwrap();
        problem
            .linear_constraint(
                "one",
                LinearExpression::from_terms([(x, 1.0), (y, 1.0)]),
                ConstraintSense::Eq,
                1.0,
            )
            .unwrap();
        problem
    }

    #[test]
    fn test_equality_folded() {
        let (converted, record) = LinearEqualityToPenalty::new(Some(10.0)).convert(&problem()).unwrap();
        assert!(converted.is_qubo());
        assert_eq!(record, ConversionRecord::identity(Stage::LinearEqualityToPenalty, 2));

        // x + 2y + 10(x + y − 1)²
        let value = |x: f64, y: f64| converted.evaluate_objective(&[x, y]).unwrap();
        assert_eq!(value(0.0, 0.0), 10.0);
        assert_eq!(value(1.0, 0.0), 1.0);
        assert_eq!(value(0.0, 1.0), 2.0);
        assert_eq!(value(1.0, 1.0), 13.0);
    }

    #[test]
    fn test_estimated_penalty() {
        // |1| + |2| + margin = 4
        let (converted, _) = LinearEqualityToPenalty::default().convert(&problem()).unwrap();
        assert_eq!(converted.evaluate_objective(&[0.0, 0.0]).unwrap(), 4.0);
    }

    #[test]
    fn test_inequality_rejected() {
        let mut p = problem();
        p.linear_constraint("le", LinearExpression::from_terms([(0, 1.0)]), ConstraintSense::Le, 1.0)
            .unwrap();
        let err = LinearEqualityToPenalty::new(Some(1.0)).convert(&p).unwrap_err();
        assert!(matches!(err, ConvertError::UnsupportedConstraint { ref constraint, .. } if constraint == "le"));
    }

    #[test]
    fn test_integer_variable_rejected() {
        let mut p = problem();
        let n = p.integer_var("n", 0, 2).unwrap();
        p.linear_constraint("int", LinearExpression::from_terms([(n, 1.0)]), ConstraintSense::Eq, 1.0)
            .unwrap();
        let err = LinearEqualityToPenalty::new(Some(1.0)).convert(&p).unwrap_err();
        match err {
            ConvertError::UnsupportedConstraint { constraint, reason } => {
                assert_eq!(constraint, "int");
                assert!(reason.contains("n is not binary"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_penalty_checked_before_constraints() {
        let err = LinearEqualityToPenalty::new(Some(-3.0)).convert(&problem()).unwrap_err();
        assert_eq!(err, ConvertError::InvalidPenaltyFactor(-3.0));
    }
}
