//! Built-in metrics. The vendor evaluation SDK sits behind [`MetricProvider`];
//! [`LexicalMetrics`] covers the metrics that can be computed without a model.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use strsim::normalized_levenshtein;

use crate::error::{EvalError, Result};
use crate::evaluator::{expected_answer, text_of, Assessment, Evaluator};
use crate::evaluators::{exact::exact_match, f1::f1_score};
use crate::types::DatasetRecord;

#[async_trait]
pub trait MetricProvider: Send + Sync {
    fn supports(&self, metric: &str) -> bool;

    async fn score(
        &self,
        metric: &str,
        record: &DatasetRecord,
        actual: &Value,
        parameters: &Map<String, Value>,
    ) -> Result<Assessment>;
}

/// `Similarity`, `ExactMatch` and `F1Score`, matched case-insensitively
/// ignoring spaces, `_` and `-`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LexicalMetrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LexicalMetric {
    Similarity,
    ExactMatch,
    F1Score,
}

fn lexical_metric(metric: &str) -> Option<LexicalMetric> {
    let key: String = metric
        .chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect();
    match key.as_str() {
        "similarity" => Some(LexicalMetric::Similarity),
        "exactmatch" => Some(LexicalMetric::ExactMatch),
        "f1" | "f1score" => Some(LexicalMetric::F1Score),
        _ => None,
    }
}

#[async_trait]
impl MetricProvider for LexicalMetrics {
    fn supports(&self, metric: &str) -> bool {
        lexical_metric(metric).is_some()
    }

    async fn score(
        &self,
        metric: &str,
        record: &DatasetRecord,
        actual: &Value,
        _parameters: &Map<String, Value>,
    ) -> Result<Assessment> {
        match lexical_metric(metric) {
            Some(LexicalMetric::Similarity) => Ok(similarity(record, actual)),
            Some(LexicalMetric::ExactMatch) => Ok(exact_match(record, actual)),
            Some(LexicalMetric::F1Score) => Ok(f1_score(record, actual)),
            None => Err(EvalError::evaluator(metric, "metric not supported by lexical provider")),
        }
    }
}

fn similarity(record: &DatasetRecord, actual: &Value) -> Assessment {
    let Some(expected) = expected_answer(record) else {
        return Assessment::score(0.0).reasoning("No expected value to compare against.");
    };
    let sim = normalized_levenshtein(text_of(actual).trim(), expected.trim());
    Assessment::score(sim).reasoning("Normalized Levenshtein similarity.")
}

/// Evaluator for an `azure-builtin` entry: forwards to the metric provider.
pub struct BuiltinEvaluator {
    metric: String,
    parameters: Map<String, Value>,
    provider: Arc<dyn MetricProvider>,
}

impl BuiltinEvaluator {
    pub fn new(
        name: &str,
        metric: impl Into<String>,
        parameters: Map<String, Value>,
        provider: Arc<dyn MetricProvider>,
    ) -> Result<Self> {
        let metric = metric.into();
        if !provider.supports(&metric) {
            return Err(EvalError::UnknownEvaluator {
                name: name.to_string(),
                reason: format!("built-in metric '{metric}' is not available from the metric provider"),
            });
        }
        Ok(Self { metric, parameters, provider })
    }
}

#[async_trait]
impl Evaluator for BuiltinEvaluator {
    fn name(&self) -> &str {
        &self.metric
    }

    async fn evaluate(&self, record: &DatasetRecord, actual: &Value) -> Result<Assessment> {
        self.provider.score(&self.metric, record, actual, &self.parameters).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn similarity_of_identical_answers() {
        let record = DatasetRecord::with_expected(json!("q"), json!({"answer": "Approved"}));
        let ev = BuiltinEvaluator::new("Similarity", "Similarity", Map::new(), Arc::new(LexicalMetrics)).unwrap();
        let a = ev.evaluate(&record, &json!("Approved")).await.unwrap();
        assert_eq!(a.value, Some(1.0));
    }

    #[tokio::test]
    async fn similarity_is_partial() {
        let record = DatasetRecord::with_expected(json!("q"), json!("kitten"));
        let a = LexicalMetrics.score("similarity", &record, &json!("sitting"), &Map::new()).await.unwrap();
        let v = a.value.unwrap();
        assert!(v > 0.0 && v < 1.0, "{v}");
    }

    #[test]
    fn metric_names_are_normalized() {
        assert!(LexicalMetrics.supports("Exact Match"));
        assert!(LexicalMetrics.supports("f1_score"));
        assert!(!LexicalMetrics.supports("Groundedness"));
    }

    #[test]
    fn unsupported_metric_is_rejected_at_build() {
        let err = BuiltinEvaluator::new("Groundedness", "Groundedness", Map::new(), Arc::new(LexicalMetrics))
            .err()
            .unwrap();
        assert!(matches!(err, EvalError::UnknownEvaluator { .. }));
    }
}
