use derive_more::Display;
use serde::{Deserialize, Serialize};

///
/// Primitive
/// Closed enumeration of host-side primitive slot types.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
#[remain::sorted]
pub enum Primitive {
    Bool,
    Decimal,
    Float32,
    Float64,
    Int32,
    Int64,
    Text,
}

impl Primitive {
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::Decimal | Self::Float32 | Self::Float64 | Self::Int32 | Self::Int64
        )
    }

    #[must_use]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    #[must_use]
    pub const fn is_int(self) -> bool {
        matches!(self, Self::Int32 | Self::Int64)
    }
}

///
/// TESTS
///
