pub mod builtin;
pub mod custom;
pub mod exact;
pub mod f1;
pub mod human;
pub mod json;
pub mod keyword;
pub mod regex;

use std::sync::Arc;

use serde_json::Value;

use crate::error::{EvalError, Result};
use crate::evaluator::Evaluator;
use crate::types::{
    DatasetRecord, ErrorPolicy, EvaluatorConfig, EvaluatorKind, EvaluatorSuiteConfig, MetricScore,
};

use self::builtin::{BuiltinEvaluator, LexicalMetrics, MetricProvider};
use self::custom::CustomHttpEvaluator;
use self::exact::ExactMatchEvaluator;
use self::f1::F1Evaluator;
use self::human::HumanReviewEvaluator;
use self::json::JsonValidityEvaluator;
use self::keyword::KeywordEvaluator;
use self::regex::RegexEvaluator;

/// Build the evaluator an `EvaluatorConfig` describes.
pub fn build_evaluator(
    config: &EvaluatorConfig,
    provider: Arc<dyn MetricProvider>,
) -> Result<Arc<dyn Evaluator>> {
    let evaluator: Arc<dyn Evaluator> = match config.kind {
        EvaluatorKind::Builtin => Arc::new(BuiltinEvaluator::new(
            &config.name,
            config.target.clone(),
            config.parameters.clone(),
            provider,
        )?),
        EvaluatorKind::CustomService => Arc::new(CustomHttpEvaluator::new(
            config.name.clone(),
            config.target.clone(),
            config.parameters.clone(),
        )?),
        EvaluatorKind::LocalFunction => match config.target.as_str() {
            "exact_match" => Arc::new(ExactMatchEvaluator),
            "f1_score" => Arc::new(F1Evaluator),
            "keyword_check" => Arc::new(KeywordEvaluator::from_parameters(&config.name, &config.parameters)?),
            "json_validity" => Arc::new(JsonValidityEvaluator::from_parameters(&config.parameters)?),
            "regex_match" => Arc::new(RegexEvaluator::from_parameters(&config.name, &config.parameters)?),
            other => {
                return Err(EvalError::UnknownEvaluator {
                    name: config.name.clone(),
                    reason: format!("unknown local function '{other}'"),
                })
            }
        },
        EvaluatorKind::HumanPlaceholder => Arc::new(HumanReviewEvaluator::new(config.target.clone())),
    };
    Ok(evaluator)
}

/// An evaluator bound to the metric name and thresholds it reports under.
#[derive(Clone)]
pub struct SuiteEntry {
    config: EvaluatorConfig,
    evaluator: Arc<dyn Evaluator>,
}

impl SuiteEntry {
    pub fn new(config: EvaluatorConfig, evaluator: Arc<dyn Evaluator>) -> Self {
        Self { config, evaluator }
    }

    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    pub fn metric(&self) -> &str {
        &self.config.name
    }

    /// Run the evaluator and apply the metric threshold to its raw value.
    pub async fn score(&self, record: &DatasetRecord, actual: &Value) -> Result<MetricScore> {
        let assessment = self.evaluator.evaluate(record, actual).await?;
        let mut score = match assessment.value {
            Some(v) if !v.is_finite() => {
                return Err(EvalError::evaluator(&self.config.name, format!("non-finite score {v}")))
            }
            Some(v) => MetricScore::scored(&self.config.name, v, self.config.effective_threshold()),
            None => MetricScore::pending(&self.config.name),
        };
        score.reasoning = assessment.reasoning;
        score.details = assessment.details;
        Ok(score)
    }
}

/// The evaluators of one run together with the run-level policy.
#[derive(Clone)]
pub struct EvaluatorSuite {
    name: String,
    on_error: ErrorPolicy,
    concurrency: usize,
    entries: Vec<SuiteEntry>,
}

impl EvaluatorSuite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            on_error: ErrorPolicy::Abort,
            concurrency: 1,
            entries: Vec::new(),
        }
    }

    /// Built-in metrics resolve against [`LexicalMetrics`].
    pub fn from_config(config: &EvaluatorSuiteConfig) -> Result<Self> {
        Self::from_config_with_provider(config, Arc::new(LexicalMetrics))
    }

    pub fn from_config_with_provider(
        config: &EvaluatorSuiteConfig,
        provider: Arc<dyn MetricProvider>,
    ) -> Result<Self> {
        crate::config::validate_suite(&config.suite_name, config)?;
        let mut suite = Self::new(config.suite_name.clone())
            .on_error(config.on_error)
            .concurrency(config.concurrency);
        for ec in &config.evaluators {
            let evaluator = build_evaluator(ec, provider.clone())?;
            suite.entries.push(SuiteEntry::new(ec.clone(), evaluator));
        }
        Ok(suite)
    }

    pub fn add(mut self, config: EvaluatorConfig, evaluator: Arc<dyn Evaluator>) -> Self {
        self.entries.push(SuiteEntry::new(config, evaluator));
        self
    }

    pub fn on_error(mut self, policy: ErrorPolicy) -> Self {
        self.on_error = policy;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn policy(&self) -> ErrorPolicy {
        self.on_error
    }

    pub fn concurrency_limit(&self) -> usize {
        self.concurrency
    }

    pub fn entries(&self) -> &[SuiteEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn threshold_is_applied_uniformly() {
        let entry = SuiteEntry::new(
            EvaluatorConfig::new("F1", EvaluatorKind::LocalFunction, "f1_score").threshold(0.6),
            Arc::new(F1Evaluator),
        );
        let record = DatasetRecord::with_expected(json!("q"), json!("Paris"));
        let score = entry.score(&record, &json!("Paris is capital")).await.unwrap();
        assert_eq!(score.metric, "F1");
        assert!(!score.passed);

        let score = entry.score(&record, &json!("Paris")).await.unwrap();
        assert!(score.passed);
    }

    #[test]
    fn unknown_local_function_is_rejected() {
        let cfg = EvaluatorConfig::new("Mystery", EvaluatorKind::LocalFunction, "does_not_exist");
        let err = build_evaluator(&cfg, Arc::new(LexicalMetrics)).err().unwrap();
        assert!(err.to_string().contains("unknown local function"));
    }

    #[test]
    fn builds_suite_from_config() {
        let config: EvaluatorSuiteConfig = serde_json::from_value(json!({
            "suite_name": "smoke",
            "on_error": "skip",
            "concurrency": 4,
            "evaluators": [
                {"name": "Similarity", "type": "azure-builtin", "target": "Similarity", "pass_threshold": 0.8},
                {"name": "Keywords", "type": "local-function", "target": "keyword_check",
                 "parameters": {"keywords": ["invoice"]}},
                {"name": "Approval", "type": "custom-service", "target": "http://127.0.0.1:9/eval"},
                {"name": "Review", "type": "human-placeholder", "target": "finance-sme"}
            ]
        }))
        .unwrap();
        let suite = EvaluatorSuite::from_config(&config).unwrap();
        assert_eq!(suite.entries().len(), 4);
        assert_eq!(suite.policy(), ErrorPolicy::Skip);
        assert_eq!(suite.concurrency_limit(), 4);
        assert_eq!(suite.entries()[2].metric(), "Approval");
    }

    #[test]
    fn zero_custom_timeout_is_rejected_when_suite_is_built() {
        let config: EvaluatorSuiteConfig = serde_json::from_value(json!({
            "suite_name": "impatient",
            "evaluators": [
                {"name": "Approval", "type": "custom-service", "target": "http://127.0.0.1:9/eval",
                 "parameters": {"timeout_secs": 0}}
            ]
        }))
        .unwrap();
        match EvaluatorSuite::from_config(&config) {
            Err(EvalError::UnknownEvaluator { name, .. }) => assert_eq!(name, "Approval"),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("zero timeout must not build"),
        }
    }
}
