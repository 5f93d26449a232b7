//! Core runtime: the model resource abstraction, the evaluator capability
//! (with the declarative decision-tree implementation), and the host-facing
//! scalar-function adapter with its field mapping resolver.

pub mod model;
pub mod resource;
pub mod udf;

// test
#[cfg(test)]
pub(crate) mod test_fixtures;

pub use model::{
    DataType, EvaluationError, InputField, ModelEvaluator, ModelLoadError, ModelValue, OutputField,
    Prediction, ResultValue, TargetField, TreeModel, VerifyError,
};
pub use resource::{EmbeddedResource, FileResource, Resource, ResourceError};
pub use udf::{EvaluatorFn, NegotiateError, ScalarFunction, UdfError};
