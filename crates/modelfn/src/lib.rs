//! ## Crate layout
//! - `build`: artifact synthesis — generated units, compiler capability,
//!   service descriptors, and archive assembly.
//! - `core`: runtime — model resources, the evaluator capability, and the
//!   scalar-function adapter with its mapping resolver.
//! - `error`: public kind + origin error taxonomy over the internal enums.
//! - `schema`: the host record schema model (primitives, structs, values).
//!
//! The `prelude` mirrors the surface a host integration touches.

pub use modelfn_build as build;
pub use modelfn_core as core;
pub use modelfn_schema as schema;

mod error;

pub use error::{Error, ErrorKind, ErrorOrigin};

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

///
/// Prelude
/// using _ brings traits into scope and avoids name conflicts
///

pub mod prelude {
    pub use crate::{
        core::{
            EmbeddedResource, EvaluatorFn, FileResource, ModelEvaluator as _, Resource as _,
            ScalarFunction as _, TreeModel,
        },
        error::{Error, ErrorKind, ErrorOrigin},
        schema::{FieldDef, HostValue, Primitive, RecordSchema, StructSchema},
    };
}
