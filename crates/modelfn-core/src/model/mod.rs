pub mod tree;

use crate::resource::ResourceError;
use derive_more::Display;
use modelfn_schema::{HostValue, Primitive};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};
use thiserror::Error as ThisError;

pub use tree::TreeModel;

///
/// DataType
/// Closed enumeration of model-declared field types. Only the first five
/// have a host primitive counterpart; the temporal types are declarable on
/// inputs but unsupported as result fields.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[remain::sorted]
pub enum DataType {
    Boolean,
    Date,
    DateTime,
    Double,
    Float,
    Integer,
    String,
    Time,
}

impl DataType {
    /// The fixed, total result-type mapping. `None` marks a `DataType`
    /// that cannot appear in an output schema.
    #[must_use]
    pub const fn host_primitive(self) -> Option<Primitive> {
        match self {
            Self::Boolean => Some(Primitive::Bool),
            Self::Double => Some(Primitive::Float64),
            Self::Float => Some(Primitive::Float32),
            Self::Integer => Some(Primitive::Int32),
            Self::String => Some(Primitive::Text),
            Self::Date | Self::DateTime | Self::Time => None,
        }
    }

    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Double | Self::Float | Self::Integer)
    }
}

///
/// ModelValue
/// A model-native value, produced by input preparation and by evaluation.
///

#[derive(Clone, Debug, PartialEq)]
pub enum ModelValue {
    Bool(bool),
    Double(f64),
    Float(f32),
    Int(i32),
    Text(String),
}

impl ModelValue {
    /// Short label for error messages.
    #[must_use]
    pub const fn type_label(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Double(_) => "double",
            Self::Float(_) => "float",
            Self::Int(_) => "integer",
            Self::Text(_) => "string",
        }
    }

    /// Numeric view used by split predicates.
    #[must_use]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Double(v) => Some(*v),
            Self::Float(v) => Some(*v as f64),
            Self::Int(v) => Some(*v as f64),
            Self::Bool(_) | Self::Text(_) => None,
        }
    }
}

impl fmt::Display for ModelValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v}"),
        }
    }
}

///
/// InputField
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct InputField {
    pub name: String,
    pub data_type: DataType,
}

impl InputField {
    /// Coerce a host slot value into this field's model-native
    /// representation. Decimal widening happens before this step, in the
    /// adapter's row decode.
    pub fn prepare(&self, value: HostValue) -> Result<ModelValue, EvaluationError> {
        let mismatch = |actual: &HostValue| EvaluationError::TypeMismatch {
            field: self.name.clone(),
            expected: self.data_type,
            actual: actual.type_label(),
        };

        if value.is_null() {
            return Err(EvaluationError::NullArgument {
                field: self.name.clone(),
            });
        }

        match self.data_type {
            DataType::String => match value {
                HostValue::Text(v) => Ok(ModelValue::Text(v)),
                other => Err(mismatch(&other)),
            },
            DataType::Integer => match value {
                HostValue::Int32(v) => Ok(ModelValue::Int(v)),
                HostValue::Int64(v) => {
                    i32::try_from(v)
                        .map(ModelValue::Int)
                        .map_err(|_| EvaluationError::IntOutOfRange {
                            field: self.name.clone(),
                            value: v,
                        })
                }
                other => Err(mismatch(&other)),
            },
            DataType::Float => match value {
                HostValue::Float32(v) => Ok(ModelValue::Float(v)),
                HostValue::Int32(v) => Ok(ModelValue::Float(v as f32)),
                other => Err(mismatch(&other)),
            },
            DataType::Double => match value {
                HostValue::Float64(v) => Ok(ModelValue::Double(v)),
                HostValue::Float32(v) => Ok(ModelValue::Double(f64::from(v))),
                HostValue::Int32(v) => Ok(ModelValue::Double(f64::from(v))),
                #[allow(clippy::cast_precision_loss)]
                HostValue::Int64(v) => Ok(ModelValue::Double(v as f64)),
                other => Err(mismatch(&other)),
            },
            DataType::Boolean => match value {
                HostValue::Bool(v) => Ok(ModelValue::Bool(v)),
                other => Err(mismatch(&other)),
            },
            DataType::Date | DataType::DateTime | DataType::Time => Err(mismatch(&value)),
        }
    }
}

///
/// TargetField
/// A model-predicted primary output; its raw result is a [`Prediction`]
/// that needs an extra decode step before exposure.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TargetField {
    pub name: String,
    pub data_type: DataType,
}

///
/// OutputField
/// An auxiliary computed value, exposed unchanged.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OutputField {
    pub name: String,
    pub data_type: DataType,
}

///
/// Prediction
/// Rich target result: the predicted value plus the entity (tree node)
/// that produced it.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Prediction {
    pub value: ModelValue,
    pub entity_id: Option<String>,
}

impl Prediction {
    /// The target decode step: extract the plain predicted value.
    #[must_use]
    pub fn decode(self) -> ModelValue {
        self.value
    }
}

///
/// ResultValue
///

#[derive(Clone, Debug, PartialEq)]
pub enum ResultValue {
    Prediction(Prediction),
    Value(ModelValue),
}

impl ResultValue {
    /// Decode a target result; plain values pass through unchanged.
    #[must_use]
    pub fn decode(self) -> ModelValue {
        match self {
            Self::Prediction(prediction) => prediction.decode(),
            Self::Value(value) => value,
        }
    }
}

/// Name→value argument map handed to a single-row evaluation.
pub type ArgumentMap = BTreeMap<String, ModelValue>;

/// Name→result map produced by a single-row evaluation.
pub type ResultMap = BTreeMap<String, ResultValue>;

///
/// ModelEvaluator
/// Opaque evaluation capability: loads a model definition once and then
/// computes outputs from named inputs one row at a time. Read-only after
/// construction; evaluation is a pure function of its argument map.
///

pub trait ModelEvaluator: Send + Sync {
    fn model_name(&self) -> &str;

    fn input_fields(&self) -> &[InputField];

    fn target_fields(&self) -> &[TargetField];

    fn output_fields(&self) -> &[OutputField];

    fn evaluate(&self, arguments: &ArgumentMap) -> Result<ResultMap, EvaluationError>;

    /// Self-test against the definition's embedded verification records.
    fn verify(&self) -> Result<(), VerifyError>;
}

///
/// EvaluationError
/// Per-row evaluation failures. Fatal for the row's plan; never skipped.
///

#[derive(Debug, ThisError)]
pub enum EvaluationError {
    #[error("input field {field} has no argument value")]
    MissingArgument { field: String },

    #[error("input field {field} is null")]
    NullArgument { field: String },

    #[error("input field {field} expects {expected}, found {actual}")]
    TypeMismatch {
        field: String,
        expected: DataType,
        actual: &'static str,
    },

    #[error("input field {field} value {value} does not fit a 32-bit integer")]
    IntOutOfRange { field: String, value: i64 },

    #[error("split on field {field} requires a numeric argument")]
    NonNumericArgument { field: String },

    #[error("no tree node matched the argument map (root {node})")]
    NoMatchingNode { node: String },

    #[error("tree walk ended at node {node} without a score")]
    NoScore { node: String },
}

///
/// VerifyError
///

#[derive(Debug, ThisError)]
pub enum VerifyError {
    #[error("verification record {index} is malformed: {message}")]
    Record { index: usize, message: String },

    #[error("verification record {index} failed to evaluate")]
    Evaluation {
        index: usize,
        #[source]
        source: EvaluationError,
    },

    #[error("verification record {index}, field {field}: expected {expected}, found {actual}")]
    Mismatch {
        index: usize,
        field: String,
        expected: String,
        actual: String,
    },
}

///
/// ModelLoadError
/// The model definition could not be read, parsed, or verified.
///

#[derive(Debug, ThisError)]
pub enum ModelLoadError {
    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error("model {name} could not be read: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("model {name} could not be parsed: {source}")]
    Parse {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("model {name} declaration is invalid: {message}")]
    Declaration { name: String, message: String },

    #[error("model {name} failed self-verification")]
    Verify {
        name: String,
        #[source]
        source: VerifyError,
    },
}

///
/// TESTS
///
