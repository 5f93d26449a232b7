use crate::model::{ArgumentMap, ModelValue};
use modelfn_schema::{FieldDef, HostValue, Primitive, RecordSchema, StructSchema};

/// Reference decision tree over the Iris measurements: `species` target,
/// `node_id` auxiliary output, three embedded verification rows.
pub(crate) const IRIS_MODEL_JSON: &str = r#"{
  "name": "DecisionTreeIris",
  "description": "CART split of the three Iris species",
  "inputs": [
    { "name": "Sepal_Length", "dataType": "double" },
    { "name": "Sepal_Width", "dataType": "double" },
    { "name": "Petal_Length", "dataType": "double" },
    { "name": "Petal_Width", "dataType": "double" }
  ],
  "targets": [
    { "name": "species", "dataType": "string" }
  ],
  "outputs": [
    { "name": "node_id", "dataType": "string", "feature": "entityId" }
  ],
  "tree": {
    "id": "1",
    "children": [
      {
        "id": "2",
        "predicate": { "op": "lessThan", "field": "Petal_Length", "value": 2.45 },
        "score": "setosa"
      },
      {
        "id": "3",
        "predicate": { "op": "greaterOrEqual", "field": "Petal_Length", "value": 2.45 },
        "children": [
          {
            "id": "6",
            "predicate": { "op": "lessThan", "field": "Petal_Width", "value": 1.75 },
            "score": "versicolor"
          },
          {
            "id": "7",
            "predicate": { "op": "greaterOrEqual", "field": "Petal_Width", "value": 1.75 },
            "score": "virginica"
          }
        ]
      }
    ]
  },
  "verification": [
    {
      "inputs": { "Sepal_Length": 5.1, "Sepal_Width": 3.5, "Petal_Length": 1.4, "Petal_Width": 0.2 },
      "expect": { "species": "setosa", "node_id": "2" }
    },
    {
      "inputs": { "Sepal_Length": 7.0, "Sepal_Width": 3.2, "Petal_Length": 4.7, "Petal_Width": 1.4 },
      "expect": { "species": "versicolor", "node_id": "6" }
    },
    {
      "inputs": { "Sepal_Length": 6.3, "Sepal_Width": 3.3, "Petal_Length": 6.0, "Petal_Width": 2.5 },
      "expect": { "species": "virginica", "node_id": "7" }
    }
  ]
}"#;

pub(crate) const IRIS_INPUT_NAMES: [&str; 4] =
    ["Sepal_Length", "Sepal_Width", "Petal_Length", "Petal_Width"];

pub(crate) fn iris_arguments(row: [f64; 4]) -> ArgumentMap {
    IRIS_INPUT_NAMES
        .iter()
        .zip(row)
        .map(|(name, value)| ((*name).to_string(), ModelValue::Double(value)))
        .collect()
}

pub(crate) fn iris_host_schema() -> RecordSchema {
    RecordSchema::Struct(
        StructSchema::new(
            IRIS_INPUT_NAMES
                .iter()
                .map(|name| FieldDef::primitive(*name, Primitive::Float64))
                .collect(),
        )
        .expect("fixture member names are unique"),
    )
}

pub(crate) fn iris_row(row: [f64; 4]) -> Vec<HostValue> {
    row.into_iter().map(HostValue::Float64).collect()
}
