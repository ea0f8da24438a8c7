use quboform_model::{Problem, Sense};
use tracing::debug;

use super::copy_variables;
use crate::error::ConvertError;
use crate::record::{ConversionRecord, ObjectiveMapping, Stage};

/// Turn a maximization into the equivalent minimization of the negated objective
///
/// Minimization problems pass through unchanged. The solution vector is not
/// affected; only the objective value is re-negated on interpretation.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MaximizeToMinimize;

impl MaximizeToMinimize {
    pub fn new() -> Self {
        Self
    }

    pub fn convert(&self, problem: &Problem) -> Result<(Problem, ConversionRecord), ConvertError> {
        flip_to(problem, Sense::Minimize, Stage::MaximizeToMinimize)
    }
}

/// Turn a minimization into the equivalent maximization of the negated objective
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MinimizeToMaximize;

impl MinimizeToMaximize {
    pub fn new() -> Self {
        Self
    }

    pub fn convert(&self, problem: &Problem) -> Result<(Problem, ConversionRecord), ConvertError> {
        flip_to(problem, Sense::Maximize, Stage::MinimizeToMaximize)
    }
}

fn flip_to(problem: &Problem, target: Sense, stage: Stage) -> Result<(Problem, ConversionRecord), ConvertError> {
    let mut record = ConversionRecord::identity(stage, problem.num_variables());
    let mut dst = copy_variables(problem)?;

    if problem.objective().sense == target {
        dst.set_objective(problem.objective().clone())?;
    } else {
        debug!(problem = problem.name(), sense = ?target, "negating objective");
        dst.set_objective(problem.objective().negated())?;
        record.objective = ObjectiveMapping::Negated;
    }
    for c in problem.constraints() {
        dst.add_constraint(c.clone())?;
    }
    Ok((dst, record))
}
