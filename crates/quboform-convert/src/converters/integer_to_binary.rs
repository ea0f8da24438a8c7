use quboform_model::{Constraint, Domain, LinearExpression, Objective, Problem, QuadraticExpression};
use tracing::debug;

use crate::error::ConvertError;
use crate::record::{ConversionRecord, Stage, VariableMapping};

/// Replace every bounded integer variable with binary variables
///
/// An integer `n` in `[lb, ub]` becomes `lb + Σ cₖ·n@k` with the bounded
/// coefficients `1, 2, …, 2^(m−1), r − (2^m − 1)` where `r = ub − lb` and
/// `m = ⌊log₂ r⌋`. Every value of the range is reachable and none outside it.
/// A fixed variable (`lb == ub`) is replaced by its constant value.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IntegerToBinary;

impl IntegerToBinary {
    pub fn new() -> Self {
        Self
    }

    pub fn convert(&self, problem: &Problem) -> Result<(Problem, ConversionRecord), ConvertError> {
        let mut dst = Problem::new(problem.name());
        let mut mappings = Vec::with_capacity(problem.num_variables());

        for var in problem.variables() {
            match var.domain {
                Domain::Binary => {
                    let index = dst.binary_var(var.name.clone())?;
                    mappings.push(VariableMapping::Identity(index));
                }
                Domain::Integer { lower, upper } => {
                    let mut terms = Vec::new();
                    for (k, coef) in bounded_coefficients(upper.abs_diff(lower)).into_iter().enumerate() {
                        let index = dst.binary_var(format!("{}@{}", var.name, k))?;
                        terms.push((index, coef as f64));
                    }
                    debug!(variable = %var.name, lower, upper, bits = terms.len(), "encoded integer variable");
                    mappings.push(VariableMapping::Affine {
                        offset: lower as f64,
                        terms,
                    });
                }
            }
        }

        let substitution = Substitution { mappings: &mappings };
        dst.set_objective(substitution.objective(problem.objective()))?;
        for c in problem.constraints() {
            dst.add_constraint(substitution.constraint(c))?;
        }

        let record = ConversionRecord {
            stage: Stage::IntegerToBinary,
            source_len: problem.num_variables(),
            target_len: dst.num_variables(),
            mappings,
            auxiliary: Vec::new(),
            objective: Default::default(),
        };
        Ok((dst, record))
    }
}

/// Coefficients of the binary expansion of a range `[0, range]`
fn bounded_coefficients(range: u64) -> Vec<u64> {
    if range == 0 {
        return Vec::new();
    }
    let power = range.ilog2();
    let mut coefficients: Vec<u64> = (0..power).map(|k| 1u64 << k).collect();
    coefficients.push(range - ((1u64 << power) - 1));
    coefficients
}

/// Rewrites expressions over source variables into expressions over target
/// variables given one affine mapping per source variable
struct Substitution<'a> {
    mappings: &'a [VariableMapping],
}

impl Substitution<'_> {
    fn expand(&self, index: usize) -> (f64, Vec<(usize, f64)>) {
        match &self.mappings[index] {
            VariableMapping::Identity(target) => (0.0, vec![(*target, 1.0)]),
            VariableMapping::Affine { offset, terms } => (*offset, terms.clone()),
        }
    }

    /// Returns `(constant, linear, quadratic)` of the substituted expression
    fn expression(
        &self,
        linear: &LinearExpression,
        quadratic: &QuadraticExpression,
    ) -> (f64, LinearExpression, QuadraticExpression) {
        let mut constant = 0.0;
        let mut lin = LinearExpression::new();
        let mut quad = QuadraticExpression::new();

        for (i, coef) in linear.iter() {
            let (offset, terms) = self.expand(i);
            constant += coef * offset;
            for (t, c) in terms {
                lin.add_term(t, coef * c);
            }
        }

        // q·(oᵢ + Σ cₖbₖ)·(oⱼ + Σ dₗbₗ)
        for (i, j, coef) in quadratic.iter() {
            let (oi, ti) = self.expand(i);
            let (oj, tj) = self.expand(j);
            constant += coef * oi * oj;
            for &(t, c) in &tj {
                lin.add_term(t, coef * oi * c);
            }
            for &(t, c) in &ti {
                lin.add_term(t, coef * oj * c);
            }
            for &(s, c) in &ti {
                for &(t, d) in &tj {
                    quad.add_term(s, t, coef * c * d);
                }
            }
        }

        (constant, lin, quad)
    }

    fn objective(&self, objective: &Objective) -> Objective {
        let (constant, linear, quadratic) = self.expression(&objective.linear, &objective.quadratic);
        Objective {
            sense: objective.sense,
            constant: objective.constant + constant,
            linear,
            quadratic,
        }
    }

    fn constraint(&self, c: &Constraint) -> Constraint {
        let (constant, linear, quadratic) = self.expression(&c.linear, &c.quadratic);
        Constraint {
            name: c.name.clone(),
            linear,
            quadratic,
            sense: c.sense,
            rhs: c.rhs - constant,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quboform_model::ConstraintSense;

    #[test]
    fn test_bounded_coefficients() {
        assert_eq!(bounded_coefficients(0), Vec::<u64>::new());
        assert_eq!(bounded_coefficients(1), vec![1]);
        assert_eq!(bounded_coefficients(4), vec![1, 2, 1]);
        assert_eq!(bounded_coefficients(5), vec![1, 2, 2]);
        assert_eq!(bounded_coefficients(7), vec![1, 2, 4]);
        assert_eq!(bounded_coefficients(8), vec![1, 2, 4, 1]);
    }

    #[test]
    fn test_encoding_covers_range_exactly() {
        for range in 1..40u64 {
            let coefficients = bounded_coefficients(range);
            let mut reachable = std::collections::BTreeSet::new();
            for bits in 0..1u64 << coefficients.len() {
                let value: u64 = coefficients
                    .iter()
                    .enumerate()
                    .filter(|&(k, _)| (bits >> k) & 1 == 1)
                    .map(|(_, c)| c)
                    .sum();
                reachable.insert(value);
            }
            assert_eq!(reachable, (0..=range).collect::<std::collections::BTreeSet<u64>>(), "range {}", range);
        }
    }

    fn problem() -> Problem {
        // minimize 2x + n + x·n subject to x + n <= 4, n in [1, 6]
        let mut problem = Problem::new("p");
        let x = problem.binary_var("x").unwrap();
        let n = problem.integer_var("n", 1, 6).unwrap();
        problem
            .minimize(
                0.5,
                LinearExpression::from_terms([(x, 2.0), (n, 1.0)]),
                QuadraticExpression::from_terms([(x, n, 1.0)]),
            )
            .unwrap();
        problem
            .linear_constraint(
                "cap",
                LinearExpression::from_terms([(x, 1.0), (n, 1.0)]),
                ConstraintSense::Le,
                4.0,
            )
            .unwrap();
        problem
    }

    #[test]
    fn test_variables_expanded() {
        let (converted, record) = IntegerToBinary.convert(&problem()).unwrap();
        let names: Vec<String> = converted.variable_names();
        assert_eq!(names, vec!["x", "n@0", "n@1", "n@2"]);
        assert!(converted.variables().iter().all(|v| v.is_binary()));
        assert_eq!(record.source_len, 2);
        assert_eq!(record.target_len, 4);
        assert_eq!(
            record.mappings[1],
            VariableMapping::Affine {
                offset: 1.0,
                terms: vec![(1, 1.0), (2, 2.0), (3, 2.0)]
            }
        );
    }

    #[test]
    fn test_substitution_preserves_values() {
        let source = problem();
        let (converted, record) = IntegerToBinary.convert(&source).unwrap();

        for bits in 0..16u32 {
            let target: Vec<f64> = (0..4).map(|k| ((bits >> k) & 1) as f64).collect();
            let original = record.interpret(&target, 0).unwrap();
            assert_eq!(
                converted.evaluate_objective(&target).unwrap(),
                source.evaluate_objective(&original).unwrap()
            );
            let lhs = converted.constraints()[0].evaluate(&target) - converted.constraints()[0].rhs;
            let original_lhs = source.constraints()[0].evaluate(&original) - source.constraints()[0].rhs;
            assert_eq!(lhs, original_lhs);
        }
    }

    #[test]
    fn test_full_i64_range() {
        let mut problem = Problem::new("p");
        problem.integer_var("n", i64::MIN, i64::MAX).unwrap();

        let (converted, record) = IntegerToBinary.convert(&problem).unwrap();
        assert_eq!(converted.num_variables(), 64);
        assert_eq!(bounded_coefficients(u64::MAX).iter().map(|&c| c as u128).sum::<u128>(), u64::MAX as u128);
        match &record.mappings[0] {
            VariableMapping::Affine { offset, terms } => {
                assert_eq!(*offset, i64::MIN as f64);
                assert_eq!(terms.len(), 64);
                assert_eq!(terms[63].1, 2f64.powi(63));
            }
            other => panic!("unexpected mapping: {other:?}"),
        }
    }

    #[test]
    fn test_fixed_integer_becomes_constant() {
        let mut problem = Problem::new("p");
        let n = problem.integer_var("n", 3, 3).unwrap();
        problem
            .minimize(0.0, LinearExpression::from_terms([(n, 2.0)]), QuadraticExpression::new())
            .unwrap();

        let (converted, record) = IntegerToBinary.convert(&problem).unwrap();
        assert_eq!(converted.num_variables(), 0);
        assert_eq!(converted.objective().constant, 6.0);
        assert_eq!(record.interpret(&[], 0).unwrap(), vec![3.0]);
    }
}
