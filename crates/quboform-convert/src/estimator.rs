use quboform_model::Problem;
use tracing::warn;

use crate::error::ConvertError;

/// Added on top of the objective bound so the penalty strictly exceeds it
pub const PENALTY_MARGIN: f64 = 1.0;

/// Used when constraint data is fractional and the smallest violation is unknown
pub const DEFAULT_PENALTY: f64 = 1e5;

/// Penalty factor large enough that no violation pays for itself
///
/// Bounds the largest possible change of the objective by summing the
/// absolute coefficients, each weighted by the largest magnitude its
/// variables can take, and adds [`PENALTY_MARGIN`]. A zero objective gives
/// `PENALTY_MARGIN`. The bound is sufficient, not tight.
///
/// With fractional constraint data the smallest violation is unknown, so the
/// factor is raised to at least [`DEFAULT_PENALTY`].
pub fn estimate_penalty(problem: &Problem) -> f64 {
    let magnitude = |index: usize| {
        problem
            .variable(index)
            .map(|v| v.domain.magnitude())
            .unwrap_or(1.0)
    };
    let objective = problem.objective();
    let linear: f64 = objective
        .linear
        .iter()
        .map(|(i, coef)| coef.abs() * magnitude(i))
        .sum();
    let quadratic: f64 = objective
        .quadratic
        .iter()
        .map(|(i, j, coef)| coef.abs() * magnitude(i) * magnitude(j))
        .sum();
    let bound = linear + quadratic + PENALTY_MARGIN;

    let fractional = problem.constraints().iter().any(|c| {
        !is_integral(c.rhs)
            || c.linear.iter().any(|(_, coef)| !is_integral(coef))
            || c.quadratic.iter().any(|(_, _, coef)| !is_integral(coef))
    });
    if fractional && bound < DEFAULT_PENALTY {
        warn!(
            problem = problem.name(),
            bound,
            penalty = DEFAULT_PENALTY,
            "fractional constraint coefficient, raising penalty to the default; set one explicitly if it is too small"
        );
        return DEFAULT_PENALTY;
    }
    bound
}

/// Reject penalty factors that are not finite and strictly positive
pub fn validate_penalty(penalty: f64) -> Result<f64, ConvertError> {
    if penalty.is_finite() && penalty > 0.0 {
        Ok(penalty)
    } else {
        Err(ConvertError::InvalidPenaltyFactor(penalty))
    }
}

/// Explicit factor when given (validated), estimated otherwise
pub(crate) fn resolve_penalty(penalty: Option<f64>, problem: &Problem) -> Result<f64, ConvertError> {
    match penalty {
        Some(p) => validate_penalty(p),
        None => Ok(estimate_penalty(problem)),
    }
}

fn is_integral(value: f64) -> bool {
    value.fract() == 0.0
}
