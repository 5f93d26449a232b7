use crate::{
    model::{
        ArgumentMap, DataType, EvaluationError, InputField, ModelEvaluator, ModelLoadError,
        ModelValue, OutputField, Prediction, ResultMap, ResultValue, TargetField, VerifyError,
    },
    resource::Resource,
};
use serde::Deserialize;
use std::{collections::BTreeMap, io::Read};

///
/// ModelDefinition
/// The serialized model document: declared fields, the split tree, and
/// embedded verification records.
///

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ModelDefinition {
    name: String,

    #[serde(default)]
    description: Option<String>,

    inputs: Vec<InputField>,

    targets: Vec<TargetField>,

    #[serde(default)]
    outputs: Vec<OutputDecl>,

    tree: NodeDef,

    #[serde(default)]
    verification: Vec<VerificationRecord>,
}

///
/// OutputDecl
///

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct OutputDecl {
    name: String,
    data_type: DataType,
    feature: OutputFeature,
}

///
/// OutputFeature
/// What an auxiliary output exposes: the predicted value itself, or the
/// identifier of the entity (tree node) that produced it.
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
enum OutputFeature {
    EntityId,
    PredictedValue,
}

///
/// NodeDef
///

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct NodeDef {
    id: String,

    #[serde(default)]
    score: Option<String>,

    #[serde(default)]
    predicate: PredicateDef,

    #[serde(default)]
    children: Vec<NodeDef>,
}

///
/// PredicateDef
///

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", tag = "op")]
enum PredicateDef {
    #[default]
    True,

    #[serde(rename_all = "camelCase")]
    LessThan { field: String, value: f64 },

    #[serde(rename_all = "camelCase")]
    LessOrEqual { field: String, value: f64 },

    #[serde(rename_all = "camelCase")]
    GreaterThan { field: String, value: f64 },

    #[serde(rename_all = "camelCase")]
    GreaterOrEqual { field: String, value: f64 },
}

///
/// VerificationRecord
///

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct VerificationRecord {
    inputs: BTreeMap<String, serde_json::Value>,
    expect: BTreeMap<String, serde_json::Value>,
}

///
/// Node
/// Compiled tree node; scores are coerced to the target type at load.
///

#[derive(Debug)]
struct Node {
    id: String,
    score: Option<ModelValue>,
    predicate: Predicate,
    children: Vec<Node>,
}

///
/// Predicate
///

#[derive(Debug)]
enum Predicate {
    True,
    Compare {
        field: String,
        op: CompareOp,
        value: f64,
    },
}

#[derive(Clone, Copy, Debug)]
enum CompareOp {
    Lt,
    Le,
    Gt,
    Ge,
}

impl Predicate {
    fn matches(&self, arguments: &ArgumentMap) -> Result<bool, EvaluationError> {
        match self {
            Self::True => Ok(true),
            Self::Compare { field, op, value } => {
                let argument =
                    arguments
                        .get(field)
                        .ok_or_else(|| EvaluationError::MissingArgument {
                            field: field.clone(),
                        })?;

                let lhs = argument
                    .as_f64()
                    .ok_or_else(|| EvaluationError::NonNumericArgument {
                        field: field.clone(),
                    })?;

                Ok(match op {
                    CompareOp::Lt => lhs < *value,
                    CompareOp::Le => lhs <= *value,
                    CompareOp::Gt => lhs > *value,
                    CompareOp::Ge => lhs >= *value,
                })
            }
        }
    }
}

///
/// TreeModel
/// Decision-tree [`ModelEvaluator`]: walks the split tree per row, scoring
/// with the deepest matched node that carries a score. Read-only after
/// construction.
///

pub struct TreeModel {
    name: String,
    description: Option<String>,
    inputs: Vec<InputField>,
    targets: Vec<TargetField>,
    outputs: Vec<OutputField>,
    output_features: Vec<OutputFeature>,
    root: Node,
    verification: Vec<VerificationRecord>,
}

impl TreeModel {
    /// Load and compile a model definition from a resource. Verification
    /// is the caller's step; construction alone does not self-test.
    pub fn from_resource(resource: &dyn Resource) -> Result<Self, ModelLoadError> {
        let mut bytes = Vec::new();

        resource
            .open()?
            .read_to_end(&mut bytes)
            .map_err(|source| ModelLoadError::Io {
                name: resource.name().to_string(),
                source,
            })?;

        Self::from_slice(resource.name(), &bytes)
    }

    pub fn from_slice(name: &str, bytes: &[u8]) -> Result<Self, ModelLoadError> {
        let definition: ModelDefinition =
            serde_json::from_slice(bytes).map_err(|source| ModelLoadError::Parse {
                name: name.to_string(),
                source,
            })?;

        Self::compile(definition)
    }

    fn compile(definition: ModelDefinition) -> Result<Self, ModelLoadError> {
        let declaration = |message: String| ModelLoadError::Declaration {
            name: definition.name.clone(),
            message,
        };

        check_unique_names(definition.inputs.iter().map(|f| f.name.as_str()))
            .map_err(|name| declaration(format!("duplicate input field: {name}")))?;

        let [target] = definition.targets.as_slice() else {
            return Err(declaration(format!(
                "tree models declare exactly one target field, found {}",
                definition.targets.len()
            )));
        };

        check_unique_names(
            definition
                .targets
                .iter()
                .map(|f| f.name.as_str())
                .chain(definition.outputs.iter().map(|o| o.name.as_str())),
        )
        .map_err(|name| declaration(format!("duplicate result field: {name}")))?;

        let root = compile_node(&definition.tree, &definition.inputs, target.data_type)
            .map_err(|message| declaration(message))?;

        let outputs = definition
            .outputs
            .iter()
            .map(|decl| OutputField {
                name: decl.name.clone(),
                data_type: decl.data_type,
            })
            .collect();
        let output_features = definition.outputs.iter().map(|decl| decl.feature).collect();

        for decl in &definition.outputs {
            match decl.feature {
                OutputFeature::EntityId if decl.data_type != DataType::String => {
                    return Err(declaration(format!(
                        "output {} exposes an entity id and must be declared string",
                        decl.name
                    )));
                }
                OutputFeature::PredictedValue if decl.data_type != target.data_type => {
                    return Err(declaration(format!(
                        "output {} mirrors the predicted value and must match the target type",
                        decl.name
                    )));
                }
                OutputFeature::EntityId | OutputFeature::PredictedValue => {}
            }
        }

        Ok(Self {
            name: definition.name,
            description: definition.description,
            inputs: definition.inputs,
            targets: definition.targets,
            outputs,
            output_features,
            root,
            verification: definition.verification,
        })
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Walk the tree, returning the scoring node id and its score.
    fn walk(&self, arguments: &ArgumentMap) -> Result<(&str, &ModelValue), EvaluationError> {
        if !self.root.predicate.matches(arguments)? {
            return Err(EvaluationError::NoMatchingNode {
                node: self.root.id.clone(),
            });
        }

        let mut current = &self.root;
        let mut scored: Option<(&str, &ModelValue)> = current
            .score
            .as_ref()
            .map(|score| (current.id.as_str(), score));

        'descend: loop {
            for child in &current.children {
                if child.predicate.matches(arguments)? {
                    current = child;
                    if let Some(score) = &current.score {
                        scored = Some((current.id.as_str(), score));
                    }
                    continue 'descend;
                }
            }
            break;
        }

        scored.ok_or_else(|| EvaluationError::NoScore {
            node: current.id.clone(),
        })
    }
}

impl ModelEvaluator for TreeModel {
    fn model_name(&self) -> &str {
        &self.name
    }

    fn input_fields(&self) -> &[InputField] {
        &self.inputs
    }

    fn target_fields(&self) -> &[TargetField] {
        &self.targets
    }

    fn output_fields(&self) -> &[OutputField] {
        &self.outputs
    }

    fn evaluate(&self, arguments: &ArgumentMap) -> Result<ResultMap, EvaluationError> {
        let (node_id, score) = self.walk(arguments)?;

        let mut results = ResultMap::new();

        let target = &self.targets[0];
        results.insert(
            target.name.clone(),
            ResultValue::Prediction(Prediction {
                value: score.clone(),
                entity_id: Some(node_id.to_string()),
            }),
        );

        for (output, feature) in self.outputs.iter().zip(&self.output_features) {
            let value = match feature {
                OutputFeature::EntityId => ModelValue::Text(node_id.to_string()),
                OutputFeature::PredictedValue => score.clone(),
            };
            results.insert(output.name.clone(), ResultValue::Value(value));
        }

        Ok(results)
    }

    fn verify(&self) -> Result<(), VerifyError> {
        for (index, record) in self.verification.iter().enumerate() {
            let mut arguments = ArgumentMap::new();

            for field in &self.inputs {
                let value = record.inputs.get(&field.name).ok_or_else(|| {
                    VerifyError::Record {
                        index,
                        message: format!("missing input {}", field.name),
                    }
                })?;
                let value = json_to_model_value(value, field.data_type).ok_or_else(|| {
                    VerifyError::Record {
                        index,
                        message: format!("input {} is not a {}", field.name, field.data_type),
                    }
                })?;
                arguments.insert(field.name.clone(), value);
            }

            let results = self
                .evaluate(&arguments)
                .map_err(|source| VerifyError::Evaluation { index, source })?;

            for (field, expected) in &record.expect {
                let data_type = self
                    .result_data_type(field)
                    .ok_or_else(|| VerifyError::Record {
                        index,
                        message: format!("expectation names unknown result field {field}"),
                    })?;
                let expected =
                    json_to_model_value(expected, data_type).ok_or_else(|| VerifyError::Record {
                        index,
                        message: format!("expectation for {field} is not a {data_type}"),
                    })?;

                let actual = results.get(field).cloned().map(ResultValue::decode);
                if actual.as_ref() != Some(&expected) {
                    return Err(VerifyError::Mismatch {
                        index,
                        field: field.clone(),
                        expected: expected.to_string(),
                        actual: actual.map_or_else(|| "<missing>".to_string(), |v| v.to_string()),
                    });
                }
            }
        }

        Ok(())
    }
}

impl TreeModel {
    fn result_data_type(&self, name: &str) -> Option<DataType> {
        self.targets
            .iter()
            .find(|t| t.name == name)
            .map(|t| t.data_type)
            .or_else(|| {
                self.outputs
                    .iter()
                    .find(|o| o.name == name)
                    .map(|o| o.data_type)
            })
    }
}

// load-time helpers

fn check_unique_names<'a>(names: impl Iterator<Item = &'a str>) -> Result<(), String> {
    let mut seen = Vec::new();

    for name in names {
        if seen.contains(&name) {
            return Err(name.to_string());
        }
        seen.push(name);
    }

    Ok(())
}

fn compile_node(
    def: &NodeDef,
    inputs: &[InputField],
    target_type: DataType,
) -> Result<Node, String> {
    let predicate = compile_predicate(&def.predicate, inputs)?;

    let score = def
        .score
        .as_deref()
        .map(|raw| coerce_score(raw, target_type, &def.id))
        .transpose()?;

    let children = def
        .children
        .iter()
        .map(|child| compile_node(child, inputs, target_type))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Node {
        id: def.id.clone(),
        score,
        predicate,
        children,
    })
}

fn compile_predicate(def: &PredicateDef, inputs: &[InputField]) -> Result<Predicate, String> {
    let (field, op, value) = match def {
        PredicateDef::True => return Ok(Predicate::True),
        PredicateDef::LessThan { field, value } => (field, CompareOp::Lt, *value),
        PredicateDef::LessOrEqual { field, value } => (field, CompareOp::Le, *value),
        PredicateDef::GreaterThan { field, value } => (field, CompareOp::Gt, *value),
        PredicateDef::GreaterOrEqual { field, value } => (field, CompareOp::Ge, *value),
    };

    let input = inputs
        .iter()
        .find(|input| &input.name == field)
        .ok_or_else(|| format!("split references undeclared input field {field}"))?;

    if !input.data_type.is_numeric() {
        return Err(format!(
            "split on field {field} requires a numeric input, found {}",
            input.data_type
        ));
    }

    Ok(Predicate::Compare {
        field: field.clone(),
        op,
        value,
    })
}

/// Scores are serialized as strings and coerced by the target type, so a
/// definition stays valid when the target's declared type changes.
fn coerce_score(raw: &str, target_type: DataType, node_id: &str) -> Result<ModelValue, String> {
    let bad = || format!("node {node_id} score {raw:?} is not a valid {target_type}");

    match target_type {
        DataType::String => Ok(ModelValue::Text(raw.to_string())),
        DataType::Integer => raw.parse().map(ModelValue::Int).map_err(|_| bad()),
        DataType::Float => raw.parse().map(ModelValue::Float).map_err(|_| bad()),
        DataType::Double => raw.parse().map(ModelValue::Double).map_err(|_| bad()),
        DataType::Boolean => raw.parse().map(ModelValue::Bool).map_err(|_| bad()),
        DataType::Date | DataType::DateTime | DataType::Time => Err(bad()),
    }
}

fn json_to_model_value(value: &serde_json::Value, data_type: DataType) -> Option<ModelValue> {
    match data_type {
        DataType::String => value.as_str().map(|s| ModelValue::Text(s.to_string())),
        DataType::Boolean => value.as_bool().map(ModelValue::Bool),
        DataType::Integer => value
            .as_i64()
            .and_then(|v| i32::try_from(v).ok())
            .map(ModelValue::Int),
        #[allow(clippy::cast_possible_truncation)]
        DataType::Float => value.as_f64().map(|v| ModelValue::Float(v as f32)),
        DataType::Double => value.as_f64().map(ModelValue::Double),
        DataType::Date | DataType::DateTime | DataType::Time => None,
    }
}

///
/// TESTS
///
