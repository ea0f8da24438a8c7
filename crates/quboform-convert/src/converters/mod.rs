mod inequality_to_equality;
mod integer_to_binary;
mod linear_equality_to_penalty;
mod linear_inequality_to_penalty;
mod quadratic_to_linear;
mod sense;

pub use inequality_to_equality::InequalityToEquality;
pub use integer_to_binary::IntegerToBinary;
pub use linear_equality_to_penalty::LinearEqualityToPenalty;
pub use linear_inequality_to_penalty::LinearInequalityToPenalty;
pub use quadratic_to_linear::QuadraticToLinear;
pub use sense::{MaximizeToMinimize, MinimizeToMaximize};

use quboform_model::Problem;

use crate::error::ConvertError;
use crate::estimator::validate_penalty;
use crate::record::{ConversionRecord, Stage};

/// One stage of a [`crate::Pipeline`]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "stage", rename_all = "snake_case"))]
#[derive(Debug, Clone, PartialEq)]
pub enum Converter {
    LinearInequalityToPenalty(LinearInequalityToPenalty),
    InequalityToEquality(InequalityToEquality),
    IntegerToBinary(IntegerToBinary),
    LinearEqualityToPenalty(LinearEqualityToPenalty),
    MaximizeToMinimize(MaximizeToMinimize),
    MinimizeToMaximize(MinimizeToMaximize),
    QuadraticToLinear(QuadraticToLinear),
}

impl Converter {
    /// Produce a new problem and the record that maps its variables back
    pub fn convert(&self, problem: &Problem) -> Result<(Problem, ConversionRecord), ConvertError> {
        match self {
            Converter::LinearInequalityToPenalty(c) => c.convert(problem),
            Converter::InequalityToEquality(c) => c.convert(problem),
            Converter::IntegerToBinary(c) => c.convert(problem),
            Converter::LinearEqualityToPenalty(c) => c.convert(problem),
            Converter::MaximizeToMinimize(c) => c.convert(problem),
            Converter::MinimizeToMaximize(c) => c.convert(problem),
            Converter::QuadraticToLinear(c) => c.convert(problem),
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            Converter::LinearInequalityToPenalty(_) => Stage::LinearInequalityToPenalty,
            Converter::InequalityToEquality(_) => Stage::InequalityToEquality,
            Converter::IntegerToBinary(_) => Stage::IntegerToBinary,
            Converter::LinearEqualityToPenalty(_) => Stage::LinearEqualityToPenalty,
            Converter::MaximizeToMinimize(_) => Stage::MaximizeToMinimize,
            Converter::MinimizeToMaximize(_) => Stage::MinimizeToMaximize,
            Converter::QuadraticToLinear(_) => Stage::QuadraticToLinear,
        }
    }

    /// Reject an explicit penalty factor that is not finite and positive
    pub fn validate(&self) -> Result<(), ConvertError> {
        let penalty = match self {
            Converter::LinearInequalityToPenalty(c) => c.penalty,
            Converter::LinearEqualityToPenalty(c) => c.penalty,
            _ => None,
        };
        if let Some(p) = penalty {
            validate_penalty(p)?;
        }
        Ok(())
    }
}

macro_rules! impl_from_converter {
    ($($ty:ident),* $(,)?) => {
        $(
            impl From<$ty> for Converter {
                fn from(converter: $ty) -> Self {
                    Converter::$ty(converter)
                }
            }
        )*
    };
}

impl_from_converter!(
    LinearInequalityToPenalty,
    InequalityToEquality,
    IntegerToBinary,
    LinearEqualityToPenalty,
    MaximizeToMinimize,
    MinimizeToMaximize,
    QuadraticToLinear,
);

/// New problem with the same name and variables, no objective and no constraints
fn copy_variables(problem: &Problem) -> Result<Problem, ConvertError> {
    let mut dst = Problem::new(problem.name());
    for var in problem.variables() {
        dst.add_variable(var.name.clone(), var.domain)?;
    }
    Ok(dst)
}
