use quboform_model::{LinearExpression, Objective, QuadraticExpression};

use crate::classifier::ConstraintShape;

/// Quadratic expression folded into an objective in place of a constraint
///
/// Evaluates to zero on every assignment that satisfies the constraint and to
/// at least the penalty factor on every assignment that violates it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PenaltyTerm {
    pub constant: f64,
    pub linear: LinearExpression,
    pub quadratic: QuadraticExpression,
}

impl PenaltyTerm {
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.constant + self.linear.evaluate(values) + self.quadratic.evaluate(values)
    }

    /// Add `sign * self` to an objective
    pub fn add_to(&self, objective: &mut Objective, sign: f64) {
        objective.constant += sign * self.constant;
        objective.linear.add(&self.linear.scaled(sign));
        objective.quadratic.add(&self.quadratic.scaled(sign));
    }
}

/// Closed-form penalty for a classified constraint
///
/// Returns `None` for [`ConstraintShape::Generic`], which has to go through
/// slack introduction and [`squared_deviation`] instead.
pub fn synthesize(shape: &ConstraintShape, penalty: f64) -> Option<PenaltyTerm> {
    let mut term = PenaltyTerm::default();
    match shape {
        // P·(x − x·y)
        ConstraintShape::ImplicationLe { x, y } => {
            term.linear.add_term(*x, penalty);
            term.quadratic.add_term(*x, *y, -penalty);
        }
        // P·(y − x·y)
        ConstraintShape::ImplicationGe { x, y } => {
            term.linear.add_term(*y, penalty);
            term.quadratic.add_term(*x, *y, -penalty);
        }
        // P·Σ_{i<j} xᵢ·xⱼ
        ConstraintShape::AtMostOne { variables } => {
            for (k, &i) in variables.iter().enumerate() {
                for &j in &variables[k + 1..] {
                    term.quadratic.add_term(i, j, penalty);
                }
            }
        }
        // P·Σ_{i<j} (1 − xᵢ)(1 − xⱼ)
        ConstraintShape::AtLeastNMinusOne { variables } => {
            for (k, &i) in variables.iter().enumerate() {
                for &j in &variables[k + 1..] {
                    term.constant += penalty;
                    term.linear.add_term(i, -penalty);
                    term.linear.add_term(j, -penalty);
                    term.quadratic.add_term(i, j, penalty);
                }
            }
        }
        ConstraintShape::Generic => return None,
    }
    Some(term)
}

/// `P·(Σaᵢxᵢ − b)²`, the penalty of the equality `Σaᵢxᵢ = b`
pub fn squared_deviation(linear: &LinearExpression, rhs: f64, penalty: f64) -> PenaltyTerm {
    let terms: Vec<(usize, f64)> = linear.iter().collect();
    let mut term = PenaltyTerm {
        constant: penalty * rhs * rhs,
        ..PenaltyTerm::default()
    };
    for (k, &(i, a)) in terms.iter().enumerate() {
        term.linear.add_term(i, -2.0 * penalty * rhs * a);
        term.quadratic.add_term(i, i, penalty * a * a);
        for &(j, b) in &terms[k + 1..] {
            term.quadratic.add_term(i, j, 2.0 * penalty * a * b);
        }
    }
    term
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn assignments(n: usize) -> impl Iterator<Item = Vec<f64>> {
        (0..1u32 << n).map(move |bits| (0..n).map(|i| ((bits >> i) & 1) as f64).collect())
    }

    #[test]
    fn test_implication_scenario() {
        // x <= y with P = 5 is 5x − 5xy
        let term = synthesize(&ConstraintShape::ImplicationLe { x: 0, y: 1 }, 5.0).unwrap();
        assert_eq!(term.linear, LinearExpression::from_terms([(0, 5.0)]));
        assert_eq!(term.quadratic, QuadraticExpression::from_terms([(0, 1, -5.0)]));
        assert_eq!(term.evaluate(&[0.0, 0.0]), 0.0);
        assert_eq!(term.evaluate(&[0.0, 1.0]), 0.0);
        assert_eq!(term.evaluate(&[1.0, 1.0]), 0.0);
        assert_eq!(term.evaluate(&[1.0, 0.0]), 5.0);
    }

    #[test]
    fn test_implication_ge() {
        let term = synthesize(&ConstraintShape::ImplicationGe { x: 0, y: 1 }, 3.0).unwrap();
        assert_eq!(term.evaluate(&[0.0, 1.0]), 3.0);
        assert_eq!(term.evaluate(&[1.0, 0.0]), 0.0);
        assert_eq!(term.evaluate(&[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_at_most_one_scenario() {
        let shape = ConstraintShape::AtMostOne { variables: vec![0, 1, 2] };
        let term = synthesize(&shape, 2.0).unwrap();
        assert_eq!(
            term.quadratic,
            QuadraticExpression::from_terms([(0, 1, 2.0), (0, 2, 2.0), (1, 2, 2.0)])
        );
        assert!(term.linear.is_empty());
        assert_eq!(term.evaluate(&[1.0, 0.0, 0.0]), 0.0);
        assert_eq!(term.evaluate(&[1.0, 1.0, 0.0]), 2.0);
        assert_eq!(term.evaluate(&[1.0, 1.0, 1.0]), 6.0);
    }

    #[test]
    fn test_at_least_one_of_two_scenario() {
        let shape = ConstraintShape::AtLeastNMinusOne { variables: vec![0, 1] };
        let term = synthesize(&shape, 7.0).unwrap();
        assert_eq!(term.evaluate(&[1.0, 0.0]), 0.0);
        assert_eq!(term.evaluate(&[0.0, 1.0]), 0.0);
        assert_eq!(term.evaluate(&[1.0, 1.0]), 0.0);
        assert_eq!(term.evaluate(&[0.0, 0.0]), 7.0);
    }

    #[test]
    fn test_generic_has_no_closed_form() {
        assert_eq!(synthesize(&ConstraintShape::Generic, 1.0), None);
    }

    #[test]
    fn test_squared_deviation_expansion() {
        // 2·(x + 2y − 2)²
        let term = squared_deviation(&LinearExpression::from_terms([(0, 1.0), (1, 2.0)]), 2.0, 2.0);
        assert_eq!(term.constant, 8.0);
        assert_eq!(term.linear, LinearExpression::from_terms([(0, -8.0), (1, -16.0)]));
        assert_eq!(
            term.quadratic,
            QuadraticExpression::from_terms([(0, 0, 2.0), (0, 1, 8.0), (1, 1, 8.0)])
        );
        for x in assignments(2) {
            let deviation = x[0] + 2.0 * x[1] - 2.0;
            assert_eq!(term.evaluate(&x), 2.0 * deviation * deviation);
        }
    }

    #[test]
    fn test_add_to_objective_with_sign() {
        let term = synthesize(&ConstraintShape::ImplicationLe { x: 0, y: 1 }, 5.0).unwrap();
        let mut objective = Objective::default();
        objective.linear.add_term(0, 5.0);
        term.add_to(&mut objective, -1.0);
        assert!(objective.linear.is_empty());
        assert_eq!(objective.quadratic.coefficient(0, 1), 5.0);
    }

    proptest! {
        #[test]
        fn prop_implication_penalty_zero_iff_feasible(
            less_equal in any::<bool>(),
            penalty in 0.5f64..100.0,
        ) {
            let shape = if less_equal {
                ConstraintShape::ImplicationLe { x: 0, y: 1 }
            } else {
                ConstraintShape::ImplicationGe { x: 0, y: 1 }
            };
            let term = synthesize(&shape, penalty).unwrap();
            for x in assignments(2) {
                let feasible = if less_equal { x[0] <= x[1] } else { x[0] >= x[1] };
                let value = term.evaluate(&x);
                if feasible {
                    prop_assert_eq!(value, 0.0);
                } else {
                    prop_assert!(value >= penalty - 1e-9);
                }
            }
        }

        #[test]
        fn prop_cardinality_penalty_zero_iff_feasible(
            n in 2usize..7,
            penalty in 0.5f64..100.0,
            at_most_one in any::<bool>(),
        ) {
            let variables: Vec<usize> = (0..n).collect();
            let shape = if at_most_one {
                ConstraintShape::AtMostOne { variables }
            } else {
                ConstraintShape::AtLeastNMinusOne { variables }
            };
            let term = synthesize(&shape, penalty).unwrap();
            for x in assignments(n) {
                let total: f64 = x.iter().sum();
                let feasible = if at_most_one { total <= 1.0 } else { total >= (n - 1) as f64 };
                let value = term.evaluate(&x);
                if feasible {
                    prop_assert!(value.abs() < 1e-9, "value {} on feasible {:?}", value, x);
                } else {
                    prop_assert!(value >= penalty - 1e-9, "value {} on infeasible {:?}", value, x);
                }
            }
        }

        #[test]
        fn prop_squared_deviation_matches_definition(
            coefs in proptest::collection::vec(-5i32..=5, 1..5),
            rhs in -6i32..=6,
            penalty in 0.5f64..10.0,
        ) {
            let linear = LinearExpression::from_terms(
                coefs.iter().enumerate().map(|(i, &c)| (i, c as f64)),
            );
            let term = squared_deviation(&linear, rhs as f64, penalty);
            for x in assignments(coefs.len()) {
                let deviation = linear.evaluate(&x) - rhs as f64;
                let expected = penalty * deviation * deviation;
                prop_assert!((term.evaluate(&x) - expected).abs() < 1e-6);
                if deviation != 0.0 {
                    prop_assert!(term.evaluate(&x) >= penalty - 1e-6);
                }
            }
        }
    }
}
