//! Conversion of constrained binary/integer problems into QUBO form.
//!
//! A [`Pipeline`] runs an ordered list of [`Converter`]s. Each stage produces a
//! new [`Problem`](quboform_model::Problem) and a [`ConversionRecord`] that maps
//! its output variables back to its input variables, so a solver's raw binary
//! assignment can be [`interpret`]ed in the original variable space.

mod classifier;
mod converters;
mod error;
mod estimator;
mod penalty;
mod pipeline;
mod record;

pub use classifier::{ConstraintShape, classify};
pub use converters::{
    Converter, InequalityToEquality, IntegerToBinary, LinearEqualityToPenalty,
    LinearInequalityToPenalty, MaximizeToMinimize, MinimizeToMaximize, QuadraticToLinear,
};
pub use error::ConvertError;
pub use estimator::{DEFAULT_PENALTY, PENALTY_MARGIN, estimate_penalty, validate_penalty};
pub use penalty::{PenaltyTerm, squared_deviation, synthesize};
pub use pipeline::{Conversion, Pipeline, convert, interpret, interpret_objective};
pub use record::{ConversionRecord, ObjectiveMapping, Stage, VariableMapping};
