use quboform_model::{Constraint, ConstraintSense, Problem};
use tracing::debug;

use super::copy_variables;

/// Largest integer every `f64` below it represents exactly (2^53)
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;
use crate::error::ConvertError;
use crate::record::{ConversionRecord, Stage, VariableMapping};

/// Rewrite `<=` and `>=` constraints as equalities with a bounded integer slack
///
/// Slack bounds are the tightest that keep every feasible assignment
/// reachable:
///
/// * coefficients are divided by their gcd and the right-hand side is rounded
///   towards feasibility (down for `<=`, up for `>=`);
/// * for `lhs <= rhs` the slack ranges over `[0, rhs - min(lhs)]`, for
///   `lhs >= rhs` over `[0, max(lhs) - rhs]`;
/// * a constraint that no assignment can violate is dropped, and one with an
///   empty slack range becomes a plain equality.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InequalityToEquality;

impl InequalityToEquality {
    pub fn new() -> Self {
        Self
    }

    pub fn convert(&self, problem: &Problem) -> Result<(Problem, ConversionRecord), ConvertError> {
        let n = problem.num_variables();
        let mut dst = copy_variables(problem)?;
        dst.set_objective(problem.objective().clone())?;

        let mut auxiliary = Vec::new();
        for c in problem.constraints() {
            if c.sense == ConstraintSense::Eq {
                dst.add_constraint(c.clone())?;
                continue;
            }
            let Some(slack) = slack_for(problem, c)? else {
                debug!(constraint = %c.name, "dropping redundant constraint");
                continue;
            };

            let mut equality = Constraint {
                name: c.name.clone(),
                linear: c.linear.scaled(1.0 / slack.divisor),
                quadratic: c.quadratic.scaled(1.0 / slack.divisor),
                sense: ConstraintSense::Eq,
                rhs: slack.rhs,
            };
            if slack.upper > 0 {
                let index = dst.integer_var(format!("{}@int_slack", c.name), 0, slack.upper)?;
                equality.linear.add_term(index, slack.sign);
                auxiliary.push(index);
                debug!(constraint = %c.name, upper = slack.upper, "added slack variable");
            }
            dst.add_constraint(equality)?;
        }

        let record = ConversionRecord {
            stage: Stage::InequalityToEquality,
            source_len: n,
            target_len: dst.num_variables(),
            mappings: (0..n).map(VariableMapping::Identity).collect(),
            auxiliary,
            objective: Default::default(),
        };
        Ok((dst, record))
    }
}

struct Slack {
    /// gcd the constraint is divided by
    divisor: f64,
    /// right-hand side after division and rounding
    rhs: f64,
    upper: i64,
    /// `1.0` for `<=`, `-1.0` for `>=`
    sign: f64,
}

/// Slack range for a `<=` or `>=` constraint, or `None` when it is redundant
fn slack_for(problem: &Problem, c: &Constraint) -> Result<Option<Slack>, ConvertError> {
    let coefficients: Vec<f64> = c
        .linear
        .iter()
        .map(|(_, coef)| coef)
        .chain(c.quadratic.iter().map(|(_, _, coef)| coef))
        .collect();
    let unsupported = |reason: &str| ConvertError::UnsupportedConstraint {
        constraint: c.name.clone(),
        reason: reason.to_string(),
    };
    if coefficients.iter().any(|coef| coef.fract() != 0.0) {
        return Err(unsupported("slack variables require integral coefficients"));
    }
    if coefficients.iter().any(|coef| coef.abs() > MAX_EXACT_INTEGER) {
        return Err(unsupported("coefficient too large for an exact integer slack"));
    }

    let divisor = coefficients
        .iter()
        .fold(0u64, |g, &coef| gcd(g, coef.abs() as u64))
        .max(1) as f64;
    let (lower, upper) = lhs_range(problem, c);
    let (lower, upper) = (lower / divisor, upper / divisor);

    let infeasible = || ConvertError::InfeasibleBounds {
        constraint: c.name.clone(),
        lower,
        upper,
        rhs: c.rhs / divisor,
    };
    let slack_upper = |range: f64| {
        if range > MAX_EXACT_INTEGER {
            Err(unsupported("slack range too wide for an exact integer slack"))
        } else {
            Ok(range as i64)
        }
    };
    let slack = if c.sense == ConstraintSense::Ge {
        let rhs = (c.rhs / divisor).ceil();
        if rhs > upper {
            return Err(infeasible());
        }
        if lower >= rhs {
            return Ok(None);
        }
        Slack { divisor, rhs, upper: slack_upper(upper - rhs)?, sign: -1.0 }
    } else {
        let rhs = (c.rhs / divisor).floor();
        if rhs < lower {
            return Err(infeasible());
        }
        if upper <= rhs {
            return Ok(None);
        }
        Slack { divisor, rhs, upper: slack_upper(rhs - lower)?, sign: 1.0 }
    };
    Ok(Some(slack))
}

/// Smallest and largest value of the left-hand side over the variable bounds
fn lhs_range(problem: &Problem, c: &Constraint) -> (f64, f64) {
    let bounds = |index: usize| {
        problem
            .variable(index)
            .map(|v| (v.domain.lower() as f64, v.domain.upper() as f64))
            .unwrap_or((0.0, 0.0))
    };

    let mut lower = 0.0;
    let mut upper = 0.0;
    for (index, coef) in c.linear.iter() {
        let (lb, ub) = bounds(index);
        lower += (coef * lb).min(coef * ub);
        upper += (coef * lb).max(coef * ub);
    }
    for (i, j, coef) in c.quadratic.iter() {
        let (li, ui) = bounds(i);
        let products = if i == j {
            let low = if li <= 0.0 && ui >= 0.0 { 0.0 } else { (li * li).min(ui * ui) };
            [low, (li * li).max(ui * ui), low, low]
        } else {
            let (lj, uj) = bounds(j);
            [li * lj, li * uj, ui * lj, ui * uj]
        };
        let scaled = products.map(|p| coef * p);
        lower += scaled.iter().copied().fold(f64::INFINITY, f64::min);
        upper += scaled.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    }
    (lower, upper)
}

fn gcd(a: u64, b: u64) -> u64 {
    if b == 0 { a } else { gcd(b, a % b) }
}
