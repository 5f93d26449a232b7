use crate::model::{DataType, InputField, ModelLoadError, OutputField, TargetField};
use modelfn_schema::{FieldDef, Primitive, RecordSchema, SchemaError, StructSchema};
use thiserror::Error as ThisError;

///
/// NegotiateError
/// Schema-negotiation failures. Raised exactly once, before any row is
/// processed; fatal for the query plan.
///

#[derive(Debug, ThisError)]
pub enum NegotiateError {
    #[error("expected {expected} argument(s), found {found}")]
    ArgumentCount { expected: usize, found: usize },

    #[error("argument {position} must be a struct of primitive members, found {found}")]
    ArgumentType { position: usize, found: String },

    #[error("input field {name} does not have a struct member mapping")]
    MissingInputField { name: String },

    #[error("result field {name} has unsupported output type {data_type}")]
    UnsupportedOutputType { name: String, data_type: DataType },

    #[error("duplicate result field name: {name}")]
    DuplicateResultName { name: String },

    #[error("function is already negotiated")]
    AlreadyNegotiated,

    #[error(transparent)]
    Model(#[from] ModelLoadError),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

///
/// FieldSlot
/// A host-side struct member position: index into the positional row,
/// member name, and primitive slot type.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldSlot {
    pub index: usize,
    pub name: String,
    pub primitive: Primitive,
}

///
/// Mapping
/// Immutable pairing of a model field with a host field slot. Established
/// once during negotiation and reused for every row; never recomputed.
///

#[derive(Clone, Debug)]
pub struct Mapping<F> {
    pub field: F,
    pub slot: FieldSlot,
}

///
/// ResultField
/// A result column: a target (needing the extra decode step) or a plain
/// output, in targets-then-outputs concatenation order.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ResultField {
    Output(OutputField),
    Target(TargetField),
}

impl ResultField {
    #[must_use]
    pub const fn name(&self) -> &String {
        match self {
            Self::Output(field) => &field.name,
            Self::Target(field) => &field.name,
        }
    }

    #[must_use]
    pub const fn data_type(&self) -> DataType {
        match self {
            Self::Output(field) => field.data_type,
            Self::Target(field) => field.data_type,
        }
    }

    #[must_use]
    pub const fn is_target(&self) -> bool {
        matches!(self, Self::Target(_))
    }
}

/// Match every model input field against the single struct argument by
/// exact name. The returned table preserves the model's input-field order,
/// not the host schema's.
pub fn resolve_inputs(
    input_fields: &[InputField],
    args: &[RecordSchema],
) -> Result<Vec<Mapping<InputField>>, NegotiateError> {
    let [arg] = args else {
        return Err(NegotiateError::ArgumentCount {
            expected: 1,
            found: args.len(),
        });
    };

    let schema = arg
        .as_struct_of_primitives()
        .ok_or_else(|| NegotiateError::ArgumentType {
            position: 0,
            found: arg.type_label(),
        })?;

    let mut mappings = Vec::with_capacity(input_fields.len());

    for field in input_fields {
        let slot = struct_slot(schema, &field.name).ok_or_else(|| {
            NegotiateError::MissingInputField {
                name: field.name.clone(),
            }
        })?;

        mappings.push(Mapping {
            field: field.clone(),
            slot,
        });
    }

    Ok(mappings)
}

/// Derive the output schema and its mapping table from targets ++ outputs,
/// in that concatenation order. Duplicate result names are rejected here
/// rather than deferred to the schema builder.
pub fn resolve_outputs(
    target_fields: &[TargetField],
    output_fields: &[OutputField],
) -> Result<(StructSchema, Vec<Mapping<ResultField>>), NegotiateError> {
    let result_fields: Vec<ResultField> = target_fields
        .iter()
        .cloned()
        .map(ResultField::Target)
        .chain(output_fields.iter().cloned().map(ResultField::Output))
        .collect();

    for (i, field) in result_fields.iter().enumerate() {
        if result_fields[..i].iter().any(|prior| prior.name() == field.name()) {
            return Err(NegotiateError::DuplicateResultName {
                name: field.name().clone(),
            });
        }
    }

    let mut defs = Vec::with_capacity(result_fields.len());

    for field in &result_fields {
        let primitive = field.data_type().host_primitive().ok_or_else(|| {
            NegotiateError::UnsupportedOutputType {
                name: field.name().clone(),
                data_type: field.data_type(),
            }
        })?;

        defs.push(FieldDef::primitive(field.name().clone(), primitive));
    }

    let schema = StructSchema::new(defs)?;

    let mappings = result_fields
        .into_iter()
        .enumerate()
        .map(|(index, field)| {
            let def = &schema.fields()[index];
            let slot = FieldSlot {
                index,
                name: def.name.clone(),
                // every member was built from host_primitive above
                primitive: def.schema.as_primitive().unwrap_or(Primitive::Text),
            };

            Mapping { field, slot }
        })
        .collect();

    Ok((schema, mappings))
}

fn struct_slot(schema: &StructSchema, name: &str) -> Option<FieldSlot> {
    let index = schema.field_index(name)?;
    let primitive = schema.fields()[index].schema.as_primitive()?;

    Some(FieldSlot {
        index,
        name: name.to_string(),
        primitive,
    })
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn input(name: &str, data_type: DataType) -> InputField {
        InputField {
            name: name.to_string(),
            data_type,
        }
    }

    fn target(name: &str, data_type: DataType) -> TargetField {
        TargetField {
            name: name.to_string(),
            data_type,
        }
    }

    fn output(name: &str, data_type: DataType) -> OutputField {
        OutputField {
            name: name.to_string(),
            data_type,
        }
    }

    fn host_struct(names: &[&str]) -> RecordSchema {
        RecordSchema::Struct(
            StructSchema::new(
                names
                    .iter()
                    .map(|name| FieldDef::primitive(*name, Primitive::Float64))
                    .collect(),
            )
            .unwrap(),
        )
    }

    #[test]
    fn input_mappings_preserve_model_field_order() {
        // host declares members in the reverse order of the model
        let args = [host_struct(&["b", "a"])];
        let inputs = [input("a", DataType::Double), input("b", DataType::Double)];

        let mappings = resolve_inputs(&inputs, &args).unwrap();

        assert_eq!(mappings.len(), 2);
        assert_eq!(mappings[0].field.name, "a");
        assert_eq!(mappings[0].slot.index, 1);
        assert_eq!(mappings[1].field.name, "b");
        assert_eq!(mappings[1].slot.index, 0);
    }

    #[test]
    fn wrong_argument_count_is_rejected() {
        let inputs = [input("a", DataType::Double)];

        let err = resolve_inputs(&inputs, &[]).unwrap_err();
        assert!(matches!(
            err,
            NegotiateError::ArgumentCount {
                expected: 1,
                found: 0
            }
        ));

        let args = [host_struct(&["a"]), host_struct(&["a"])];
        let err = resolve_inputs(&inputs, &args).unwrap_err();
        assert!(matches!(
            err,
            NegotiateError::ArgumentCount {
                expected: 1,
                found: 2
            }
        ));
    }

    #[test]
    fn non_struct_argument_names_the_position() {
        let inputs = [input("a", DataType::Double)];
        let args = [RecordSchema::Primitive(Primitive::Float64)];

        let err = resolve_inputs(&inputs, &args).unwrap_err();
        assert!(matches!(err, NegotiateError::ArgumentType { position: 0, .. }));
    }

    #[test]
    fn struct_with_nested_member_is_rejected() {
        let inputs = [input("a", DataType::Double)];
        let nested = RecordSchema::Struct(
            StructSchema::new(vec![FieldDef {
                name: "a".to_string(),
                schema: RecordSchema::List(Box::new(RecordSchema::Primitive(Primitive::Float64))),
            }])
            .unwrap(),
        );

        let err = resolve_inputs(&inputs, &[nested]).unwrap_err();
        assert!(matches!(err, NegotiateError::ArgumentType { position: 0, .. }));
    }

    #[test]
    fn missing_member_names_the_input_field() {
        let inputs = [input("Petal_Length", DataType::Double)];
        let args = [host_struct(&["Sepal_Length"])];

        let err = resolve_inputs(&inputs, &args).unwrap_err();
        assert!(matches!(
            err,
            NegotiateError::MissingInputField { ref name } if name == "Petal_Length"
        ));
    }

    #[test]
    fn output_schema_concatenates_targets_then_outputs() {
        let targets = [target("species", DataType::String)];
        let outputs = [
            output("node_id", DataType::String),
            output("confidence", DataType::Double),
        ];

        let (schema, mappings) = resolve_outputs(&targets, &outputs).unwrap();

        let names: Vec<_> = schema.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["species", "node_id", "confidence"]);

        assert_eq!(mappings.len(), 3);
        assert!(mappings[0].field.is_target());
        assert!(!mappings[1].field.is_target());
        for (index, mapping) in mappings.iter().enumerate() {
            assert_eq!(mapping.slot.index, index);
            assert_eq!(mapping.slot.name, schema.fields()[index].name);
        }

        assert_eq!(schema.fields()[2].schema.as_primitive(), Some(Primitive::Float64));
    }

    #[test]
    fn unsupported_output_type_fails_before_schema_construction() {
        let targets = [target("when", DataType::DateTime)];

        let err = resolve_outputs(&targets, &[]).unwrap_err();
        assert!(matches!(
            err,
            NegotiateError::UnsupportedOutputType {
                ref name,
                data_type: DataType::DateTime,
            } if name == "when"
        ));
    }

    #[test]
    fn duplicate_result_names_are_rejected_at_negotiation() {
        let targets = [target("species", DataType::String)];
        let outputs = [output("species", DataType::String)];

        let err = resolve_outputs(&targets, &outputs).unwrap_err();
        assert!(matches!(
            err,
            NegotiateError::DuplicateResultName { ref name } if name == "species"
        ));
    }

    proptest! {
        /// Every valid input-field set maps completely: one mapping per
        /// model field, pairing distinct fields with distinct slots.
        #[test]
        fn resolved_inputs_are_complete_and_distinct(
            names in proptest::collection::btree_set("[A-Za-z_][A-Za-z0-9_]{0,12}", 1..8)
        ) {
            let names: Vec<String> = names.into_iter().collect();
            let inputs: Vec<InputField> = names
                .iter()
                .map(|name| input(name, DataType::Double))
                .collect();
            // host declares the same members in reverse order
            let mut reversed: Vec<&str> = names.iter().map(String::as_str).collect();
            reversed.reverse();
            let args = [host_struct(&reversed)];

            let mappings = resolve_inputs(&inputs, &args).unwrap();

            prop_assert_eq!(mappings.len(), inputs.len());

            let mut slots: Vec<usize> = mappings.iter().map(|m| m.slot.index).collect();
            slots.sort_unstable();
            slots.dedup();
            prop_assert_eq!(slots.len(), mappings.len());

            for (field, mapping) in inputs.iter().zip(&mappings) {
                prop_assert_eq!(&field.name, &mapping.slot.name);
            }
        }
    }
}
