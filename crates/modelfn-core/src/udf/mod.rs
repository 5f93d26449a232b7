pub mod mapping;


use crate::{
    model::{
        ArgumentMap, EvaluationError, InputField, ModelEvaluator, ModelLoadError, ModelValue,
        ResultMap, ResultValue, TreeModel,
    },
    resource::Resource,
    udf::mapping::{Mapping, ResultField, resolve_inputs, resolve_outputs},
};
use modelfn_schema::{HostValue, Primitive, RecordSchema, StructSchema};
use rust_decimal::prelude::ToPrimitive;
use std::sync::{Arc, Mutex, OnceLock};
use thiserror::Error as ThisError;

pub use mapping::NegotiateError;

///
/// UdfError
/// Row-time failures. Fatal for the row's plan; rows are never skipped.
///

#[derive(Debug, ThisError)]
pub enum UdfError {
    #[error("function is not negotiated; schema negotiation must precede evaluation")]
    NotNegotiated,

    #[error("row has {found} slot(s), expected {expected}")]
    RowArity { expected: usize, found: usize },

    #[error("decimal value for input field {field} does not fit a 64-bit float")]
    DecimalWiden { field: String },

    #[error("output field {field}: cannot encode {actual} as {expected}")]
    Encode {
        field: String,
        expected: Primitive,
        actual: String,
    },

    #[error(transparent)]
    Model(#[from] ModelLoadError),

    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
}

///
/// ScalarFunction
/// The host-facing plugin contract: negotiate a result schema once per
/// plan, then evaluate rows against it. Implementations must tolerate
/// concurrent `evaluate` calls once negotiation has completed.
///

pub trait ScalarFunction: Send + Sync {
    /// Registered function name.
    fn func_name(&self) -> &str;

    /// Human-readable call rendering for plans and logs.
    fn display_string(&self, children: &[String]) -> String {
        format!("{}({})", self.func_name(), children.join(", "))
    }

    fn negotiate(&self, args: &[RecordSchema]) -> Result<RecordSchema, NegotiateError>;

    fn evaluate(&self, row: &[HostValue]) -> Result<Vec<HostValue>, UdfError>;
}

///
/// Plan
/// The per-query mapping tables, fixed at negotiation time.
///

#[derive(Debug)]
struct Plan {
    input_arity: usize,
    input_mappings: Vec<Mapping<InputField>>,
    output_schema: StructSchema,
    output_mappings: Vec<Mapping<ResultField>>,
}

///
/// EvaluatorFn
/// The base evaluation adapter: owns the model resource, constructs the
/// evaluator lazily exactly once (verified before caching), and translates
/// host rows to model arguments and back through the negotiated plan.
///

pub struct EvaluatorFn {
    resource: Box<dyn Resource>,
    evaluator: OnceLock<Arc<dyn ModelEvaluator>>,
    init: Mutex<()>,
    plan: OnceLock<Plan>,
}

impl EvaluatorFn {
    #[must_use]
    pub fn new(resource: impl Resource + 'static) -> Self {
        Self {
            resource: Box::new(resource),
            evaluator: OnceLock::new(),
            init: Mutex::new(()),
            plan: OnceLock::new(),
        }
    }

    #[must_use]
    pub fn resource(&self) -> &dyn Resource {
        self.resource.as_ref()
    }

    /// Construct-once-then-cache. A failed construction (including a
    /// failed self-verification) publishes nothing; the next caller
    /// retries from scratch. Single-winner under concurrent first use.
    pub fn ensure_evaluator(&self) -> Result<Arc<dyn ModelEvaluator>, ModelLoadError> {
        if let Some(evaluator) = self.evaluator.get() {
            return Ok(evaluator.clone());
        }

        let _guard = self.init.lock().expect("evaluator init lock poisoned");

        // lost the race: the winner has already published
        if let Some(evaluator) = self.evaluator.get() {
            return Ok(evaluator.clone());
        }

        let model = TreeModel::from_resource(self.resource.as_ref())?;

        model.verify().map_err(|source| ModelLoadError::Verify {
            name: model.model_name().to_string(),
            source,
        })?;

        let evaluator: Arc<dyn ModelEvaluator> = Arc::new(model);
        self.evaluator.set(evaluator.clone()).ok();

        Ok(evaluator)
    }

    /// The negotiated output schema, if negotiation has run.
    #[must_use]
    pub fn output_schema(&self) -> Option<&StructSchema> {
        self.plan.get().map(|plan| &plan.output_schema)
    }

    fn decode_input(plan: &Plan, row: &[HostValue]) -> Result<ArgumentMap, UdfError> {
        if row.len() != plan.input_arity {
            return Err(UdfError::RowArity {
                expected: plan.input_arity,
                found: row.len(),
            });
        }

        let mut arguments = ArgumentMap::new();

        for mapping in &plan.input_mappings {
            let mut value = row[mapping.slot.index].clone();

            // numeric-precision compromise: decimals are widened to the
            // closest 64-bit float before they reach the model
            if let HostValue::Decimal(decimal) = value {
                let widened = decimal.to_f64().ok_or_else(|| UdfError::DecimalWiden {
                    field: mapping.field.name.clone(),
                })?;
                value = HostValue::Float64(widened);
            }

            let prepared = mapping.field.prepare(value)?;
            arguments.insert(mapping.field.name.clone(), prepared);
        }

        Ok(arguments)
    }

    fn encode_output(plan: &Plan, mut results: ResultMap) -> Result<Vec<HostValue>, UdfError> {
        let mut row = Vec::with_capacity(plan.output_mappings.len());

        for mapping in &plan.output_mappings {
            let name = mapping.field.name();

            let Some(result) = results.remove(name) else {
                row.push(HostValue::Null);
                continue;
            };

            let value = if mapping.field.is_target() {
                result.decode()
            } else {
                match result {
                    ResultValue::Value(value) => value,
                    ResultValue::Prediction(_) => {
                        return Err(UdfError::Encode {
                            field: name.clone(),
                            expected: mapping.slot.primitive,
                            actual: "prediction wrapper".to_string(),
                        });
                    }
                }
            };

            row.push(encode_model_value(value, mapping)?);
        }

        Ok(row)
    }
}

impl ScalarFunction for EvaluatorFn {
    fn func_name(&self) -> &str {
        "MODEL"
    }

    fn negotiate(&self, args: &[RecordSchema]) -> Result<RecordSchema, NegotiateError> {
        let evaluator = self.ensure_evaluator()?;

        let input_mappings = resolve_inputs(evaluator.input_fields(), args)?;
        let input_arity = args[0]
            .as_struct()
            .map_or(0, StructSchema::len);

        let (output_schema, output_mappings) =
            resolve_outputs(evaluator.target_fields(), evaluator.output_fields())?;

        let plan = Plan {
            input_arity,
            input_mappings,
            output_schema: output_schema.clone(),
            output_mappings,
        };

        self.plan
            .set(plan)
            .map_err(|_| NegotiateError::AlreadyNegotiated)?;

        Ok(RecordSchema::Struct(output_schema))
    }

    fn evaluate(&self, row: &[HostValue]) -> Result<Vec<HostValue>, UdfError> {
        let plan = self.plan.get().ok_or(UdfError::NotNegotiated)?;
        let evaluator = self.ensure_evaluator()?;

        let arguments = Self::decode_input(plan, row)?;
        let results = evaluator.evaluate(&arguments)?;

        Self::encode_output(plan, results)
    }
}

fn encode_model_value(
    value: ModelValue,
    mapping: &Mapping<ResultField>,
) -> Result<HostValue, UdfError> {
    let encoded = match (mapping.slot.primitive, &value) {
        (Primitive::Bool, ModelValue::Bool(v)) => HostValue::Bool(*v),
        (Primitive::Float32, ModelValue::Float(v)) => HostValue::Float32(*v),
        (Primitive::Float64, ModelValue::Double(v)) => HostValue::Float64(*v),
        (Primitive::Int32, ModelValue::Int(v)) => HostValue::Int32(*v),
        (Primitive::Text, ModelValue::Text(v)) => HostValue::Text(v.clone()),
        _ => {
            return Err(UdfError::Encode {
                field: mapping.field.name().clone(),
                expected: mapping.slot.primitive,
                actual: value.type_label().to_string(),
            });
        }
    };

    Ok(encoded)
}
