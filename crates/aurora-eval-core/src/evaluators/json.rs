use async_trait::async_trait;
use jsonschema::JSONSchema;
use serde_json::Value;

use crate::error::{EvalError, Result};
use crate::evaluator::{Assessment, Evaluator};
use crate::types::DatasetRecord;

/// Checks the output is valid JSON and, optionally, that it satisfies a JSON schema.
///
/// String outputs are parsed; any other value already is JSON.
pub struct JsonValidityEvaluator {
	schema: Option<JSONSchema>,
}

impl JsonValidityEvaluator {
	pub fn new() -> Self {
		Self { schema: None }
	}

	pub fn with_schema(schema: &Value) -> Result<Self> {
		let compiled = JSONSchema::compile(schema).map_err(|e| EvalError::UnknownEvaluator {
			name: "json_validity".into(),
			reason: format!("invalid JSON schema: {e}"),
		})?;
		Ok(Self { schema: Some(compiled) })
	}

	/// Uses `parameters.schema` when present.
	pub fn from_parameters(parameters: &serde_json::Map<String, Value>) -> Result<Self> {
		match parameters.get("schema") {
			Some(schema) => Self::with_schema(schema),
			None => Ok(Self::new()),
		}
	}
}

impl Default for JsonValidityEvaluator {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl Evaluator for JsonValidityEvaluator {
	fn name(&self) -> &str {
		"json_validity"
	}

	async fn evaluate(&self, _record: &DatasetRecord, actual: &Value) -> Result<Assessment> {
		let parsed = match actual {
			Value::String(s) => match serde_json::from_str::<Value>(s) {
				Ok(v) => v,
				Err(e) => {
					return Ok(Assessment::score(0.0)
						.reasoning("Invalid JSON format.")
						.details(serde_json::json!({ "valid": false, "error": e.to_string() })))
				}
			},
			other => other.clone(),
		};

		if let Some(ref schema) = self.schema {
			if let Err(errors) = schema.validate(&parsed) {
				let error_msgs: Vec<String> = errors
					.map(|e| format!("{}: {}", e.instance_path, e))
					.collect();
				return Ok(Assessment::score(0.0)
					.reasoning("Output does not match JSON schema.")
					.details(serde_json::json!({ "valid": false, "errors": error_msgs })));
			}
		}

		Ok(Assessment::score(1.0)
			.reasoning("Valid JSON.")
			.details(serde_json::json!({ "valid": true })))
	}
}
