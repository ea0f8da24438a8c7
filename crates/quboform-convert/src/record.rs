use std::fmt;

use crate::error::ConvertError;

/// Which converter produced a [`ConversionRecord`]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    LinearInequalityToPenalty,
    InequalityToEquality,
    IntegerToBinary,
    LinearEqualityToPenalty,
    MaximizeToMinimize,
    MinimizeToMaximize,
    QuadraticToLinear,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::LinearInequalityToPenalty => "linear-inequality-to-penalty",
            Stage::InequalityToEquality => "inequality-to-equality",
            Stage::IntegerToBinary => "integer-to-binary",
            Stage::LinearEqualityToPenalty => "linear-equality-to-penalty",
            Stage::MaximizeToMinimize => "maximize-to-minimize",
            Stage::MinimizeToMaximize => "minimize-to-maximize",
            Stage::QuadraticToLinear => "quadratic-to-linear",
        };
        write!(f, "{}", name)
    }
}

/// How one input variable of a stage is recovered from the stage's output vector
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, PartialEq)]
pub enum VariableMapping {
    /// Copied from the output variable at this index
    Identity(usize),
    /// `offset + Σ coef·x[index]`
    Affine { offset: f64, terms: Vec<(usize, f64)> },
}

impl VariableMapping {
    fn apply(&self, values: &[f64]) -> f64 {
        match self {
            VariableMapping::Identity(index) => values[*index],
            VariableMapping::Affine { offset, terms } => {
                offset + terms.iter().map(|&(index, coef)| coef * values[index]).sum::<f64>()
            }
        }
    }

    fn max_index(&self) -> Option<usize> {
        match self {
            VariableMapping::Identity(index) => Some(*index),
            VariableMapping::Affine { terms, .. } => terms.iter().map(|&(index, _)| index).max(),
        }
    }
}

/// How a stage changed the objective value
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ObjectiveMapping {
    #[default]
    Unchanged,
    Negated,
}

/// Inverse of one converter application
///
/// `mappings` holds one entry per variable of the stage's input problem.
/// Output variables listed in `auxiliary` were introduced by the stage (slack
/// or product variables) and have no counterpart in the input; interpretation
/// drops them.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRecord {
    pub stage: Stage,
    pub source_len: usize,
    pub target_len: usize,
    pub mappings: Vec<VariableMapping>,
    pub auxiliary: Vec<usize>,
    pub objective: ObjectiveMapping,
}

impl ConversionRecord {
    /// Record of a stage that kept every variable in place
    pub fn identity(stage: Stage, len: usize) -> Self {
        Self {
            stage,
            source_len: len,
            target_len: len,
            mappings: (0..len).map(VariableMapping::Identity).collect(),
            auxiliary: Vec::new(),
            objective: ObjectiveMapping::Unchanged,
        }
    }

    /// Map a vector over the stage's output variables to its input variables
    ///
    /// `position` identifies the record in its log for error reporting.
    pub fn interpret(&self, values: &[f64], position: usize) -> Result<Vec<f64>, ConvertError> {
        if values.len() != self.target_len {
            return Err(ConvertError::InterpretationMismatch {
                stage: position,
                expected: self.target_len,
                actual: values.len(),
            });
        }
        let out_of_range = self
            .mappings
            .iter()
            .filter_map(VariableMapping::max_index)
            .any(|index| index >= self.target_len);
        if self.mappings.len() != self.source_len || out_of_range {
            return Err(ConvertError::InterpretationMismatch {
                stage: position,
                expected: self.source_len,
                actual: self.mappings.len(),
            });
        }
        Ok(self.mappings.iter().map(|m| m.apply(values)).collect())
    }

    pub fn interpret_objective(&self, value: f64) -> f64 {
        match self.objective {
            ObjectiveMapping::Unchanged => value,
            ObjectiveMapping::Negated => -value,
        }
    }
}
