use derive_more::Display;
use modelfn_build::{ArchiveError, BuildError, CompileError};
use modelfn_core::{
    EvaluationError, ModelLoadError, NegotiateError, ResourceError, UdfError,
};
use modelfn_schema::SchemaError;
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// Error
/// Public error type with a stable kind + origin taxonomy.
///

#[derive(Debug, Deserialize, Serialize, ThisError)]
#[error("{message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            kind,
            origin,
            message: message.into(),
        }
    }
}

///
/// ErrorKind
/// Public error taxonomy for callers and host interfaces.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ErrorKind {
    /// Wrong number of arguments at negotiation time.
    ArgumentCount,

    /// An argument is not a flat struct of primitives.
    ArgumentType,

    /// A required field mapping could not be established.
    Argument,

    /// The model definition could not be read, parsed, or verified.
    ModelLoad,

    /// A specific row failed to evaluate.
    Evaluation,

    /// Artifact synthesis failed to produce compiled code.
    Compilation,

    /// Artifact synthesis failed to persist the archive.
    ArchiveWrite,

    /// Resource access failed.
    Io,
}

///
/// ErrorOrigin
/// Public origin taxonomy for callers and host interfaces.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum ErrorOrigin {
    Archive,
    Build,
    Function,
    Mapping,
    Model,
    Resource,
    Schema,
}

impl From<NegotiateError> for Error {
    fn from(err: NegotiateError) -> Self {
        match err {
            NegotiateError::ArgumentCount { .. } => Self::new(
                ErrorKind::ArgumentCount,
                ErrorOrigin::Mapping,
                err.to_string(),
            ),

            NegotiateError::ArgumentType { .. } => Self::new(
                ErrorKind::ArgumentType,
                ErrorOrigin::Mapping,
                err.to_string(),
            ),

            NegotiateError::MissingInputField { .. }
            | NegotiateError::UnsupportedOutputType { .. }
            | NegotiateError::DuplicateResultName { .. } => {
                Self::new(ErrorKind::Argument, ErrorOrigin::Mapping, err.to_string())
            }

            NegotiateError::AlreadyNegotiated => {
                Self::new(ErrorKind::Argument, ErrorOrigin::Function, err.to_string())
            }

            NegotiateError::Model(err) => err.into(),

            NegotiateError::Schema(err) => err.into(),
        }
    }
}

impl From<ModelLoadError> for Error {
    fn from(err: ModelLoadError) -> Self {
        match err {
            ModelLoadError::Resource(err) => err.into(),

            ModelLoadError::Io { .. }
            | ModelLoadError::Parse { .. }
            | ModelLoadError::Declaration { .. }
            | ModelLoadError::Verify { .. } => {
                Self::new(ErrorKind::ModelLoad, ErrorOrigin::Model, err.to_string())
            }
        }
    }
}

impl From<UdfError> for Error {
    fn from(err: UdfError) -> Self {
        match err {
            UdfError::NotNegotiated
            | UdfError::RowArity { .. }
            | UdfError::DecimalWiden { .. }
            | UdfError::Encode { .. } => {
                Self::new(ErrorKind::Evaluation, ErrorOrigin::Function, err.to_string())
            }

            UdfError::Model(err) => err.into(),

            UdfError::Evaluation(err) => err.into(),
        }
    }
}

impl From<EvaluationError> for Error {
    fn from(err: EvaluationError) -> Self {
        Self::new(ErrorKind::Evaluation, ErrorOrigin::Model, err.to_string())
    }
}

impl From<ResourceError> for Error {
    fn from(err: ResourceError) -> Self {
        Self::new(ErrorKind::Io, ErrorOrigin::Resource, err.to_string())
    }
}

impl From<SchemaError> for Error {
    fn from(err: SchemaError) -> Self {
        Self::new(ErrorKind::Argument, ErrorOrigin::Schema, err.to_string())
    }
}

impl From<BuildError> for Error {
    fn from(err: BuildError) -> Self {
        match err {
            BuildError::InvalidTypeName { .. } => {
                Self::new(ErrorKind::Compilation, ErrorOrigin::Build, err.to_string())
            }

            BuildError::InvalidModelPath { .. } | BuildError::ModelRead { .. } => {
                Self::new(ErrorKind::Io, ErrorOrigin::Build, err.to_string())
            }

            BuildError::Compile(err) => err.into(),

            BuildError::Archive(err) => err.into(),
        }
    }
}

impl From<CompileError> for Error {
    fn from(err: CompileError) -> Self {
        Self::new(ErrorKind::Compilation, ErrorOrigin::Build, err.to_string())
    }
}

impl From<ArchiveError> for Error {
    fn from(err: ArchiveError) -> Self {
        Self::new(ErrorKind::ArchiveWrite, ErrorOrigin::Archive, err.to_string())
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use modelfn_core::DataType;

    #[test]
    fn negotiation_errors_map_to_argument_kinds() {
        let err: Error = NegotiateError::ArgumentCount {
            expected: 1,
            found: 3,
        }
        .into();
        assert_eq!(err.kind, ErrorKind::ArgumentCount);
        assert_eq!(err.origin, ErrorOrigin::Mapping);

        let err: Error = NegotiateError::UnsupportedOutputType {
            name: "when".to_string(),
            data_type: DataType::Date,
        }
        .into();
        assert_eq!(err.kind, ErrorKind::Argument);
    }

    #[test]
    fn model_load_errors_keep_their_resource_origin() {
        let err: Error = ModelLoadError::Io {
            name: "iris.json".to_string(),
            source: std::io::Error::other("truncated"),
        }
        .into();
        assert_eq!(err.kind, ErrorKind::ModelLoad);
        assert_eq!(err.origin, ErrorOrigin::Model);
    }

    #[test]
    fn row_time_errors_are_evaluation_kind() {
        let err: Error = UdfError::NotNegotiated.into();
        assert_eq!(err.kind, ErrorKind::Evaluation);
        assert_eq!(err.origin, ErrorOrigin::Function);

        let err: Error = EvaluationError::MissingArgument {
            field: "Petal_Length".to_string(),
        }
        .into();
        assert_eq!(err.origin, ErrorOrigin::Model);
    }

    #[test]
    fn build_errors_split_compilation_from_archiving() {
        let err: Error = BuildError::InvalidTypeName {
            name: "1Foo".to_string(),
        }
        .into();
        assert_eq!(err.kind, ErrorKind::Compilation);

        let err: Error = CompileError::Rustc {
            status: "exit status: 1".to_string(),
            stderr: String::new(),
        }
        .into();
        assert_eq!(err.kind, ErrorKind::Compilation);
        assert_eq!(err.origin, ErrorOrigin::Build);
    }
}
