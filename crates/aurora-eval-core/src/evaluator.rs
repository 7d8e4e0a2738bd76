use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::types::DatasetRecord;

/// Raw outcome of one evaluator on one record, before the metric threshold is applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assessment {
    /// `None` means the score is pending.
    pub value: Option<f64>,
    pub reasoning: Option<String>,
    pub details: Option<Value>,
}

impl Assessment {
    pub fn score(value: f64) -> Self {
        Self { value: Some(value), ..Self::default() }
    }

    pub fn pass_fail(passed: bool) -> Self {
        Self::score(if passed { 1.0 } else { 0.0 })
    }

    pub fn pending() -> Self {
        Self::default()
    }

    pub fn reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = Some(reasoning.into());
        self
    }

    pub fn details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

#[async_trait]
pub trait Evaluator: Send + Sync {
    /// Short label for the scoring function, e.g. `exact_match`.
    fn name(&self) -> &str;
    async fn evaluate(&self, record: &DatasetRecord, actual: &Value) -> Result<Assessment>;
}

/// Text form of a value: strings verbatim, `null` as empty, everything else as JSON.
pub(crate) fn text_of(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        _ => v.to_string(),
    }
}

/// The reference answer of a record: `expected.answer` for objects that carry one.
pub(crate) fn expected_answer(record: &DatasetRecord) -> Option<String> {
    let expected = record.expected.as_ref()?;
    match expected.get("answer") {
        Some(answer) => Some(text_of(answer)),
        None => Some(text_of(expected)),
    }
}
