use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::evaluator::{expected_answer, text_of, Assessment, Evaluator};
use crate::types::DatasetRecord;

/// Trimmed string equality between the actual output and the expected answer.
pub struct ExactMatchEvaluator;

pub(crate) fn exact_match(record: &DatasetRecord, actual: &Value) -> Assessment {
	let Some(expected) = expected_answer(record) else {
		return Assessment::score(0.0).reasoning("No expected value to compare against.");
	};
	let is_match = text_of(actual).trim() == expected.trim();
	Assessment::pass_fail(is_match).reasoning(if is_match {
		"Strings match exactly."
	} else {
		"Strings do not match."
	})
}

#[async_trait]
impl Evaluator for ExactMatchEvaluator {
	fn name(&self) -> &str {
		"exact_match"
	}

	async fn evaluate(&self, record: &DatasetRecord, actual: &Value) -> Result<Assessment> {
		Ok(exact_match(record, actual))
	}
}
