use quboform_model::Problem;
use tracing::debug;

use super::copy_variables;
use crate::classifier::classify;
use crate::error::ConvertError;
use crate::estimator::resolve_penalty;
use crate::penalty::synthesize;
use crate::record::{ConversionRecord, Stage};

/// Fold inequalities with a closed-form penalty into the objective
///
/// Implications (`x <= y`, `x >= y`), at-most-one and at-least-n-minus-one
/// constraints over binary variables become penalty terms without any slack
/// variable. Every other constraint is kept for the following stages.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LinearInequalityToPenalty {
    /// Estimated from the problem when `None`
    pub penalty: Option<f64>,
}

impl LinearInequalityToPenalty {
    pub fn new(penalty: Option<f64>) -> Self {
        Self { penalty }
    }

    pub fn convert(&self, problem: &Problem) -> Result<(Problem, ConversionRecord), ConvertError> {
        let penalty = resolve_penalty(self.penalty, problem)?;
        let sign = problem.objective().sense.sign();

        let mut dst = copy_variables(problem)?;
        let mut objective = problem.objective().clone();
        let mut kept = Vec::new();
        for c in problem.constraints() {
            let shape = classify(problem, c);
            match synthesize(&shape, penalty) {
                Some(term) => {
                    debug!(constraint = %c.name, shape = ?shape, penalty, "folded inequality into objective");
                    term.add_to(&mut objective, sign);
                }
                None => kept.push(c.clone()),
            }
        }

        dst.set_objective(objective)?;
        for c in kept {
            dst.add_constraint(c)?;
        }
        let record = ConversionRecord::identity(Stage::LinearInequalityToPenalty, problem.num_variables());
        Ok((dst, record))
    }
}
