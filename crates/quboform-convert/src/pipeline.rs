use quboform_model::Problem;
use tracing::{debug, info};

use crate::converters::{
    Converter, InequalityToEquality, IntegerToBinary, LinearEqualityToPenalty,
    LinearInequalityToPenalty, MaximizeToMinimize,
};
use crate::error::ConvertError;
use crate::record::ConversionRecord;

/// Ordered sequence of converters applied one after another
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pipeline {
    converters: Vec<Converter>,
}

/// Output of [`Pipeline::convert`]: the final problem and one record per stage
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub problem: Problem,
    pub records: Vec<ConversionRecord>,
}

impl Conversion {
    pub fn interpret(&self, values: &[f64]) -> Result<Vec<f64>, ConvertError> {
        interpret(values, &self.records)
    }

    pub fn interpret_objective(&self, value: f64) -> f64 {
        interpret_objective(value, &self.records)
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage
    pub fn with(mut self, converter: impl Into<Converter>) -> Self {
        self.converters.push(converter.into());
        self
    }

    /// The standard QUBO pipeline
    ///
    /// Closed-form inequalities are folded first, remaining inequalities get
    /// slack variables, integers are binarized, equalities are folded, and the
    /// sense is normalized to minimization.
    pub fn qubo(penalty: Option<f64>) -> Self {
        Self::new()
            .with(LinearInequalityToPenalty::new(penalty))
            .with(InequalityToEquality::new())
            .with(IntegerToBinary::new())
            .with(LinearEqualityToPenalty::new(penalty))
            .with(MaximizeToMinimize::new())
    }

    pub fn converters(&self) -> &[Converter] {
        &self.converters
    }

    pub fn convert(&self, problem: &Problem) -> Result<Conversion, ConvertError> {
        convert(problem, &self.converters)
    }
}

/// Run `converters` in order, threading each output problem into the next stage
///
/// Explicit penalty factors are validated before any stage runs. The input
/// problem is never modified.
pub fn convert(problem: &Problem, converters: &[Converter]) -> Result<Conversion, ConvertError> {
    for converter in converters {
        converter.validate()?;
    }

    let mut current = problem.clone();
    let mut records = Vec::with_capacity(converters.len());
    for converter in converters {
        let (next, record) = converter.convert(&current)?;
        debug!(
            stage = %converter.stage(),
            variables = next.num_variables(),
            constraints = next.num_constraints(),
            "stage complete"
        );
        records.push(record);
        current = next;
    }

    info!(
        problem = problem.name(),
        stages = records.len(),
        variables = current.num_variables(),
        qubo = current.is_qubo(),
        "conversion complete"
    );
    Ok(Conversion {
        problem: current,
        records,
    })
}

/// Map a solution of the final problem back to the original variables
///
/// `values` is indexed by the final problem's variables. Records are applied
/// last to first; the log must be a consistent chain and `values` must match
/// the last record's output size.
pub fn interpret(values: &[f64], records: &[ConversionRecord]) -> Result<Vec<f64>, ConvertError> {
    for (position, pair) in records.windows(2).enumerate() {
        if pair[0].target_len != pair[1].source_len {
            return Err(ConvertError::InterpretationMismatch {
                stage: position + 1,
                expected: pair[0].target_len,
                actual: pair[1].source_len,
            });
        }
    }

    let mut current = values.to_vec();
    for (position, record) in records.iter().enumerate().rev() {
        current = record.interpret(&current, position)?;
    }
    Ok(current)
}

/// Map an objective value of the final problem back to the original sense
pub fn interpret_objective(value: f64, records: &[ConversionRecord]) -> f64 {
    records
        .iter()
        .rev()
        .fold(value, |value, record| record.interpret_objective(value))
}
