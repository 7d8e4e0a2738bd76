use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;

use crate::error::{EvalError, Result};
use crate::evaluator::{text_of, Assessment, Evaluator};
use crate::types::DatasetRecord;

/// Checks the output matches `parameters.pattern`.
pub struct RegexEvaluator {
	pattern: Regex,
}

impl RegexEvaluator {
	pub fn new(name: &str, pattern: &str) -> Result<Self> {
		let pattern = Regex::new(pattern).map_err(|e| EvalError::UnknownEvaluator {
			name: name.to_string(),
			reason: format!("invalid regex: {e}"),
		})?;
		Ok(Self { pattern })
	}

	pub fn from_parameters(name: &str, parameters: &serde_json::Map<String, Value>) -> Result<Self> {
		let pattern = parameters.get("pattern").and_then(|v| v.as_str()).ok_or_else(|| {
			EvalError::UnknownEvaluator {
				name: name.to_string(),
				reason: "regex_match needs a string 'pattern' parameter".into(),
			}
		})?;
		Self::new(name, pattern)
	}
}

#[async_trait]
impl Evaluator for RegexEvaluator {
	fn name(&self) -> &str {
		"regex_match"
	}

	async fn evaluate(&self, _record: &DatasetRecord, actual: &Value) -> Result<Assessment> {
		let output = text_of(actual);
		let matched = self.pattern.find(&output).map(|m| m.as_str().to_string());
		Ok(Assessment::pass_fail(matched.is_some()).details(serde_json::json!({
			"pattern": self.pattern.as_str(),
			"match": matched,
		})))
	}
}
