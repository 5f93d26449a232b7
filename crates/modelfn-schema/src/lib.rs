//! Host-side record schema model: the type-inspector surface a query engine
//! presents to a scalar function, abstracted as plain data so the mapping
//! and adapter layers do not depend on any particular engine's object model.

pub mod record;
pub mod types;
pub mod value;

pub use record::{FieldDef, RecordSchema, SchemaError, StructSchema};
pub use types::Primitive;
pub use value::HostValue;

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        record::{FieldDef, RecordSchema, SchemaError, StructSchema},
        types::Primitive,
        value::HostValue,
    };
}
