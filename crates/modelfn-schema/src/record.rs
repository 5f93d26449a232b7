use crate::types::Primitive;
use serde::Serialize;
use thiserror::Error as ThisError;

///
/// SchemaError
/// Construction-time invariant violations.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum SchemaError {
    #[error("duplicate struct member name: {name}")]
    DuplicateField { name: String },
}

///
/// RecordSchema
/// One structured value as the host describes it: a primitive slot, an
/// ordered struct of named members, or a homogeneous list.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub enum RecordSchema {
    List(Box<RecordSchema>),
    Primitive(Primitive),
    Struct(StructSchema),
}

impl RecordSchema {
    #[must_use]
    pub const fn as_struct(&self) -> Option<&StructSchema> {
        match self {
            Self::Struct(schema) => Some(schema),
            Self::List(_) | Self::Primitive(_) => None,
        }
    }

    #[must_use]
    pub const fn as_primitive(&self) -> Option<Primitive> {
        match self {
            Self::Primitive(primitive) => Some(*primitive),
            Self::List(_) | Self::Struct(_) => None,
        }
    }

    /// Succeeds only for a struct whose every member is a primitive slot.
    #[must_use]
    pub fn as_struct_of_primitives(&self) -> Option<&StructSchema> {
        let schema = self.as_struct()?;

        schema
            .fields()
            .iter()
            .all(|field| field.schema.as_primitive().is_some())
            .then_some(schema)
    }

    /// Short label for error messages.
    #[must_use]
    pub fn type_label(&self) -> String {
        match self {
            Self::List(inner) => format!("list<{}>", inner.type_label()),
            Self::Primitive(primitive) => primitive.to_string(),
            Self::Struct(schema) => format!("struct[{}]", schema.len()),
        }
    }
}

///
/// FieldDef
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct FieldDef {
    pub name: String,
    pub schema: RecordSchema,
}

impl FieldDef {
    #[must_use]
    pub fn primitive(name: impl Into<String>, primitive: Primitive) -> Self {
        Self {
            name: name.into(),
            schema: RecordSchema::Primitive(primitive),
        }
    }
}

///
/// StructSchema
/// Ordered, uniquely named member list. Member order is positional and
/// stable; slot indexes hand out positions into a matching host row.
///

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct StructSchema {
    fields: Vec<FieldDef>,
}

impl StructSchema {
    pub fn new(fields: Vec<FieldDef>) -> Result<Self, SchemaError> {
        for (i, field) in fields.iter().enumerate() {
            if fields[..i].iter().any(|prior| prior.name == field.name) {
                return Err(SchemaError::DuplicateField {
                    name: field.name.clone(),
                });
            }
        }

        Ok(Self { fields })
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    #[must_use]
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|field| field.name == name)
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    fn iris_struct() -> StructSchema {
        StructSchema::new(vec![
            FieldDef::primitive("Sepal_Length", Primitive::Float64),
            FieldDef::primitive("Sepal_Width", Primitive::Float64),
            FieldDef::primitive("Petal_Length", Primitive::Float64),
            FieldDef::primitive("Petal_Width", Primitive::Float64),
        ])
        .unwrap()
    }

    #[test]
    fn struct_rejects_duplicate_member_names() {
        let err = StructSchema::new(vec![
            FieldDef::primitive("species", Primitive::Text),
            FieldDef::primitive("species", Primitive::Text),
        ])
        .unwrap_err();

        assert_eq!(
            err,
            SchemaError::DuplicateField {
                name: "species".to_string()
            }
        );
    }

    #[test]
    fn field_index_matches_declaration_order() {
        let schema = iris_struct();

        assert_eq!(schema.field_index("Sepal_Length"), Some(0));
        assert_eq!(schema.field_index("Petal_Width"), Some(3));
        assert_eq!(schema.field_index("Species"), None);
    }

    #[test]
    fn struct_of_primitives_rejects_nested_members() {
        let nested = RecordSchema::Struct(
            StructSchema::new(vec![
                FieldDef::primitive("a", Primitive::Int32),
                FieldDef {
                    name: "b".to_string(),
                    schema: RecordSchema::List(Box::new(RecordSchema::Primitive(Primitive::Text))),
                },
            ])
            .unwrap(),
        );

        assert!(nested.as_struct_of_primitives().is_none());
        assert!(
            RecordSchema::Struct(iris_struct())
                .as_struct_of_primitives()
                .is_some()
        );
    }

    #[test]
    fn primitive_is_not_a_struct() {
        let schema = RecordSchema::Primitive(Primitive::Float64);

        assert!(schema.as_struct().is_none());
        assert_eq!(schema.as_primitive(), Some(Primitive::Float64));
        assert_eq!(schema.type_label(), "Float64");
    }
}
