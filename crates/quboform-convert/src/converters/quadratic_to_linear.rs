use std::collections::BTreeMap;

use quboform_model::{
    Constraint, ConstraintSense, LinearExpression, Objective, Problem, QuadraticExpression,
};
use tracing::debug;

use super::copy_variables;
use crate::error::ConvertError;
use crate::record::{ConversionRecord, Stage, VariableMapping};

/// Replace products of binary variables with new binary variables
///
/// Each product `x·y` becomes a variable `_and_x_y` tied to it by
///
/// ```text
/// _and_x_y <= x
/// _and_x_y <= y
/// _and_x_y >= x + y - 1
/// ```
///
/// Squares `x·x` of binary variables become `x`. Products involving integer
/// variables stay quadratic.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct QuadraticToLinear;

impl QuadraticToLinear {
    pub fn new() -> Self {
        Self
    }

    pub fn convert(&self, problem: &Problem) -> Result<(Problem, ConversionRecord), ConvertError> {
        let mut dst = copy_variables(problem)?;
        let mut products: BTreeMap<(usize, usize), usize> = BTreeMap::new();

        let quadratics = std::iter::once(&problem.objective().quadratic)
            .chain(problem.constraints().iter().map(|c| &c.quadratic));
        for quadratic in quadratics {
            for (i, j, _) in quadratic.iter() {
                if i == j || !is_binary(problem, i) || !is_binary(problem, j) {
                    continue;
                }
                if products.contains_key(&(i, j)) {
                    continue;
                }
                let name = format!("_and_{}_{}", var_name(problem, i), var_name(problem, j));
                let index = dst.binary_var(name)?;
                products.insert((i, j), index);
            }
        }

        for (&(x, y), &z) in &products {
            let name = dst.variables()[z].name.clone();
            let terms = [
                (format!("{}_1", name), vec![(z, 1.0), (x, -1.0)], ConstraintSense::Le, 0.0),
                (format!("{}_2", name), vec![(z, 1.0), (y, -1.0)], ConstraintSense::Le, 0.0),
                (
                    format!("{}_3", name),
                    vec![(z, 1.0), (x, -1.0), (y, -1.0)],
                    ConstraintSense::Ge,
                    -1.0,
                ),
            ];
            for (name, linear, sense, rhs) in terms {
                dst.linear_constraint(name, LinearExpression::from_terms(linear), sense, rhs)?;
            }
        }
        debug!(problem = problem.name(), products = products.len(), "linearized binary products");

        let linearize = |linear: &LinearExpression, quadratic: &QuadraticExpression| {
            let mut lin = linear.clone();
            let mut quad = QuadraticExpression::new();
            for (i, j, coef) in quadratic.iter() {
                if let Some(&z) = products.get(&(i, j)) {
                    lin.add_term(z, coef);
                } else if i == j && is_binary(problem, i) {
                    lin.add_term(i, coef);
                } else {
                    quad.add_term(i, j, coef);
                }
            }
            (lin, quad)
        };

        let objective = problem.objective();
        let (linear, quadratic) = linearize(&objective.linear, &objective.quadratic);
        dst.set_objective(Objective {
            sense: objective.sense,
            constant: objective.constant,
            linear,
            quadratic,
        })?;
        for c in problem.constraints() {
            let (linear, quadratic) = linearize(&c.linear, &c.quadratic);
            dst.add_constraint(Constraint {
                name: c.name.clone(),
                linear,
                quadratic,
                sense: c.sense,
                rhs: c.rhs,
            })?;
        }

        let n = problem.num_variables();
        let record = ConversionRecord {
            stage: Stage::QuadraticToLinear,
            source_len: n,
            target_len: dst.num_variables(),
            mappings: (0..n).map(VariableMapping::Identity).collect(),
            auxiliary: products.values().copied().collect(),
            objective: Default::default(),
        };
        Ok((dst, record))
    }
}

fn is_binary(problem: &Problem, index: usize) -> bool {
    problem.variable(index).is_some_and(|v| v.is_binary())
}

fn var_name(problem: &Problem, index: usize) -> &str {
    problem.variable(index).map(|v| v.name.as_str()).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn problem() -> Problem {
        // minimize 2·x·y − 3·y·z + x² + n·x
        let mut problem = Problem::new("p");
        let x = problem.binary_var("x").unwrap();
        let y = problem.binary_var("y").unwrap();
        let z = problem.binary_var("z").unwrap();
        let n = problem.integer_var("n", 0, 2).unwrap();
        problem
            .minimize(
                0.0,
                LinearExpression::new(),
                QuadraticExpression::from_terms([(x, y, 2.0), (y, z, -3.0), (x, x, 1.0), (n, x, 1.0)]),
            )
            .unwrap();
        problem
            .add_constraint(Constraint {
                name: "quad".to_string(),
                linear: LinearExpression::from_terms([(z, 1.0)]),
                quadratic: QuadraticExpression::from_terms([(x, y, 1.0)]),
                sense: ConstraintSense::Le,
                rhs: 1.0,
            })
            .unwrap();
        problem
    }

    #[test]
    fn test_products_replaced() {
        let (converted, record) = QuadraticToLinear.convert(&problem()).unwrap();
        let names = converted.variable_names();
        assert_eq!(names[4..], ["_and_x_y", "_and_y_z"]);
        assert_eq!(record.auxiliary, vec![4, 5]);

        let objective = converted.objective();
        assert_eq!(objective.linear, LinearExpression::from_terms([(0, 1.0), (4, 2.0), (5, -3.0)]));
        assert_eq!(objective.quadratic, QuadraticExpression::from_terms([(0, 3, 1.0)]));

        let c = converted.constraint("quad").unwrap();
        assert!(c.is_linear());
        assert_eq!(c.linear, LinearExpression::from_terms([(2, 1.0), (4, 1.0)]));
        assert_eq!(converted.num_constraints(), 7);
    }

    #[test]
    fn test_mccormick_constraints_force_product() {
        let (converted, _) = QuadraticToLinear.convert(&problem()).unwrap();
        let mccormick: Vec<&Constraint> = converted
            .constraints()
            .iter()
            .filter(|c| c.name.starts_with("_and_x_y"))
            .collect();
        assert_eq!(mccormick.len(), 3);

        for bits in 0..8u32 {
            let x = (bits & 1) as f64;
            let y = ((bits >> 1) & 1) as f64;
            let and = ((bits >> 2) & 1) as f64;
            let values = [x, y, 0.0, 0.0, and, 0.0];
            let satisfied = mccormick.iter().all(|c| c.is_satisfied(&values, 1e-9));
            assert_eq!(satisfied, and == x * y, "x={} y={} and={}", x, y, and);
        }
    }
}
