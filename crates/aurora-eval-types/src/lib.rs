//! Shared data model for aurora-eval: dataset records, configuration shapes,
//! per-metric scores and the run report.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tabled::Tabled;

/// One evaluation case loaded from a dataset file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetRecord {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<String>,
	pub input: Value,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub expected: Option<Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub metadata: Option<BTreeMap<String, Value>>,
}

impl DatasetRecord {
	pub fn new(input: Value) -> Self {
		Self { id: None, input, expected: None, metadata: None }
	}

	pub fn with_expected(input: Value, expected: Value) -> Self {
		Self { id: None, input, expected: Some(expected), metadata: None }
	}

	pub fn id(mut self, id: impl Into<String>) -> Self {
		self.id = Some(id.into());
		self
	}

	pub fn metadata(mut self, key: impl Into<String>, value: Value) -> Self {
		self.metadata.get_or_insert_with(BTreeMap::new).insert(key.into(), value);
		self
	}

	/// Expected value, or `Null` when the record carries none.
	pub fn expected_or_null(&self) -> Value {
		self.expected.clone().unwrap_or(Value::Null)
	}
}

/// Which hosted environment and agent a run targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
	pub env_id: String,
	pub env_version: String,
	pub agent_name: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub api_endpoint: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub timeout_secs: Option<u64>,
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub headers: BTreeMap<String, String>,
	/// Answer locally with canned responses instead of calling the endpoint.
	#[serde(default)]
	pub mock: bool,
}

impl EnvironmentConfig {
	/// Explicit `api_endpoint`, else the gateway URL derived from the env and agent ids.
	pub fn endpoint_url(&self) -> String {
		match &self.api_endpoint {
			Some(url) if !url.trim().is_empty() => url.clone(),
			_ => format!(
				"https://aurora-gateway.microsoft.com/envs/{}/v{}/agents/{}",
				self.env_id, self.env_version, self.agent_name
			),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvaluatorKind {
	#[serde(rename = "azure-builtin")]
	Builtin,
	#[serde(rename = "custom-service", alias = "custom")]
	CustomService,
	#[serde(rename = "local-function")]
	LocalFunction,
	#[serde(rename = "human-placeholder")]
	HumanPlaceholder,
}

impl EvaluatorKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			EvaluatorKind::Builtin => "azure-builtin",
			EvaluatorKind::CustomService => "custom-service",
			EvaluatorKind::LocalFunction => "local-function",
			EvaluatorKind::HumanPlaceholder => "human-placeholder",
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatorConfig {
	/// Metric name reported for this evaluator, e.g. "Groundedness".
	pub name: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub category: Option<String>,
	#[serde(rename = "type")]
	pub kind: EvaluatorKind,
	/// Built-in metric name, custom endpoint URL or local function name.
	pub target: String,
	/// Per-record score a record must reach to pass.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub pass_threshold: Option<f64>,
	/// Fraction of scored records that must pass for the metric to pass.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub min_pass_rate: Option<f64>,
	#[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
	pub parameters: serde_json::Map<String, Value>,
}

impl EvaluatorConfig {
	pub fn new(name: impl Into<String>, kind: EvaluatorKind, target: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			category: None,
			kind,
			target: target.into(),
			pass_threshold: None,
			min_pass_rate: None,
			parameters: serde_json::Map::new(),
		}
	}

	pub fn threshold(mut self, threshold: f64) -> Self {
		self.pass_threshold = Some(threshold);
		self
	}

	pub fn min_pass_rate(mut self, rate: f64) -> Self {
		self.min_pass_rate = Some(rate);
		self
	}

	pub fn parameter(mut self, key: impl Into<String>, value: Value) -> Self {
		self.parameters.insert(key.into(), value);
		self
	}

	pub fn effective_threshold(&self) -> f64 {
		self.pass_threshold.unwrap_or(0.0)
	}

	pub fn effective_min_pass_rate(&self) -> f64 {
		self.min_pass_rate.unwrap_or(1.0)
	}
}

/// What a run does when a record's environment call or evaluator fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
	#[default]
	Abort,
	Skip,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluatorSuiteConfig {
	pub suite_name: String,
	#[serde(default)]
	pub evaluators: Vec<EvaluatorConfig>,
	#[serde(default)]
	pub on_error: ErrorPolicy,
	#[serde(default = "default_concurrency")]
	pub concurrency: usize,
}

fn default_concurrency() -> usize {
	1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricScore {
	pub metric: String,
	/// `None` while the score is pending (human review).
	pub value: Option<f64>,
	pub passed: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub reasoning: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<Value>,
}

impl MetricScore {
	/// A scored result, passing when `value >= threshold`. A threshold of 0.0
	/// (or below) sets no bar, so every value passes.
	pub fn scored(metric: impl Into<String>, value: f64, threshold: f64) -> Self {
		Self {
			metric: metric.into(),
			value: Some(value),
			passed: threshold <= 0.0 || value >= threshold,
			reasoning: None,
			details: None,
		}
	}

	pub fn pending(metric: impl Into<String>) -> Self {
		Self { metric: metric.into(), value: None, passed: false, reasoning: None, details: None }
	}

	pub fn reasoning(mut self, reasoning: impl Into<String>) -> Self {
		self.reasoning = Some(reasoning.into());
		self
	}

	pub fn details(mut self, details: Value) -> Self {
		self.details = Some(details);
		self
	}

	pub fn is_pending(&self) -> bool {
		self.value.is_none()
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordResult {
	pub record: DatasetRecord,
	pub actual: Value,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
	pub scores: Vec<MetricScore>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub latency_ms: Option<u64>,
}

impl RecordResult {
	/// A record passes when it has no error and every non-pending score passed.
	pub fn passed(&self) -> bool {
		self.error.is_none()
			&& self.scores.iter().any(|s| !s.is_pending())
			&& self.scores.iter().filter(|s| !s.is_pending()).all(|s| s.passed)
	}

	pub fn score(&self, metric: &str) -> Option<&MetricScore> {
		self.scores.iter().find(|s| s.metric == metric)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictStatus {
	Passed,
	Failed,
	Pending,
}

impl std::fmt::Display for VerdictStatus {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let s = match self {
			VerdictStatus::Passed => "passed",
			VerdictStatus::Failed => "failed",
			VerdictStatus::Pending => "pending",
		};
		f.write_str(s)
	}
}

/// Aggregate of one metric across all records of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricVerdict {
	pub metric: String,
	pub threshold: f64,
	pub min_pass_rate: f64,
	pub scored: usize,
	pub passed: usize,
	pub pending: usize,
	pub mean: Option<f64>,
	pub min: Option<f64>,
	pub max: Option<f64>,
	pub pass_rate: f64,
	pub status: VerdictStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
	pub total: usize,
	pub passed: usize,
	pub errored: usize,
	pub pass_rate: f64,
	pub avg_score: f64,
}

impl RunSummary {
	pub fn from_records(records: &[RecordResult]) -> Self {
		let total = records.len();
		let mut passed = 0usize;
		let mut errored = 0usize;
		let mut score_sum = 0.0f64;
		let mut score_count = 0usize;

		for rr in records {
			if rr.error.is_some() {
				errored += 1;
			}
			if rr.passed() {
				passed += 1;
			}
			for v in rr.scores.iter().filter_map(|s| s.value) {
				score_sum += v;
				score_count += 1;
			}
		}

		let pass_rate = if total == 0 { 1.0 } else { passed as f64 / total as f64 };
		let avg_score = if score_count == 0 { 0.0 } else { score_sum / score_count as f64 };

		Self { total, passed, errored, pass_rate, avg_score }
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
	pub run_id: String,
	pub suite_name: String,
	pub environment: EnvironmentConfig,
	pub records: Vec<RecordResult>,
	pub verdicts: Vec<MetricVerdict>,
	pub summary: RunSummary,
	pub started_at: DateTime<Utc>,
	pub finished_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Tabled)]
struct RecordRow {
	id: String,
	passed: String,
	input: String,
	actual: String,
	expected: String,
	scores: String,
}

#[derive(Debug, Clone, Tabled)]
struct VerdictRow {
	metric: String,
	status: String,
	threshold: String,
	mean: String,
	pass_rate: String,
	scored: usize,
	pending: usize,
}

impl RunReport {
	/// No metric failed and no record errored. Pending metrics do not decide the run.
	pub fn passed(&self) -> bool {
		self.summary.errored == 0
			&& self.verdicts.iter().all(|v| v.status != VerdictStatus::Failed)
	}

	pub fn verdict(&self, metric: &str) -> Option<&MetricVerdict> {
		self.verdicts.iter().find(|v| v.metric == metric)
	}

	pub fn duration_ms(&self) -> i64 {
		(self.finished_at - self.started_at).num_milliseconds()
	}

	pub fn summary_table(&self) -> String {
		use tabled::Table;

		let records: Vec<RecordRow> = self
			.records
			.iter()
			.enumerate()
			.map(|(idx, rr)| RecordRow {
				id: rr.record.id.clone().unwrap_or_else(|| format!("#{}", idx + 1)),
				passed: if rr.passed() { "✓".to_string() } else if rr.error.is_some() { "!".to_string() } else { " ".to_string() },
				input: truncate(value_preview(&rr.record.input), 48),
				actual: match &rr.error {
					Some(err) => truncate(format!("error: {err}"), 48),
					None => truncate(value_preview(&rr.actual), 48),
				},
				expected: truncate(
					rr.record.expected.as_ref().map(value_preview).unwrap_or_else(|| "-".to_string()),
					48,
				),
				scores: rr
					.scores
					.iter()
					.map(|s| match s.value {
						Some(v) => format!("{}={:.2}", s.metric, v),
						None => format!("{}=pending", s.metric),
					})
					.collect::<Vec<_>>()
					.join(" "),
			})
			.collect();

		let verdicts: Vec<VerdictRow> = self
			.verdicts
			.iter()
			.map(|v| VerdictRow {
				metric: v.metric.clone(),
				status: v.status.to_string(),
				threshold: format!(">= {:.2} @ {:.0}%", v.threshold, v.min_pass_rate * 100.0),
				mean: v.mean.map(|m| format!("{m:.3}")).unwrap_or_else(|| "-".to_string()),
				pass_rate: format!("{:.1}%", v.pass_rate * 100.0),
				scored: v.scored,
				pending: v.pending,
			})
			.collect();

		let summary_text = format!(
			"Suite: {}  Total: {}  Passed: {}  Errored: {}  Pass rate: {:.1}%  Avg score: {:.3}  Verdict: {}",
			self.suite_name,
			self.summary.total,
			self.summary.passed,
			self.summary.errored,
			self.summary.pass_rate * 100.0,
			self.summary.avg_score,
			if self.passed() { "PASS" } else { "FAIL" }
		);

		format!("{}\n\n{}\n\n{}\n", Table::new(records), Table::new(verdicts), summary_text)
	}
}

fn value_preview(v: &Value) -> String {
	match v {
		Value::String(s) => s.clone(),
		_ => v.to_string(),
	}
}

fn truncate(s: String, max_len: usize) -> String {
	if s.chars().count() <= max_len {
		return s;
	}
	let mut truncated = s.chars().take(max_len.saturating_sub(1)).collect::<String>();
	truncated.push('…');
	truncated
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn evaluator_config_accepts_custom_type_alias() {
		let cfg: EvaluatorConfig = serde_json::from_value(json!({
			"name": "Approval",
			"category": "Automated - Rule-based",
			"type": "custom",
			"target": "http://localhost:8000/eval",
			"pass_threshold": 0.8
		}))
		.unwrap();
		assert_eq!(cfg.kind, EvaluatorKind::CustomService);
		assert_eq!(cfg.effective_threshold(), 0.8);
		assert_eq!(cfg.effective_min_pass_rate(), 1.0);
	}

	#[test]
	fn endpoint_falls_back_to_gateway_url() {
		let env: EnvironmentConfig = serde_json::from_value(json!({
			"env_id": "aurora-test-001",
			"env_version": "10.0.38",
			"agent_name": "finance-advisor-bot"
		}))
		.unwrap();
		assert_eq!(
			env.endpoint_url(),
			"https://aurora-gateway.microsoft.com/envs/aurora-test-001/v10.0.38/agents/finance-advisor-bot"
		);
	}

	#[test]
	fn suite_defaults() {
		let suite: EvaluatorSuiteConfig =
			serde_json::from_value(json!({ "suite_name": "smoke" })).unwrap();
		assert_eq!(suite.on_error, ErrorPolicy::Abort);
		assert_eq!(suite.concurrency, 1);
		assert!(suite.evaluators.is_empty());
	}

	#[test]
	fn pending_scores_do_not_decide_record() {
		let rr = RecordResult {
			record: DatasetRecord::new(json!("hi")),
			actual: json!("hello"),
			error: None,
			scores: vec![MetricScore::scored("exact", 1.0, 1.0), MetricScore::pending("Human")],
			latency_ms: None,
		};
		assert!(rr.passed());

		let summary = RunSummary::from_records(&[rr]);
		assert_eq!(summary.passed, 1);
		assert_eq!(summary.avg_score, 1.0);
	}

	#[test]
	fn zero_threshold_sets_no_bar() {
		assert!(MetricScore::scored("custom", -0.25, 0.0).passed);
		assert!(MetricScore::scored("custom", 0.0, 0.0).passed);
		assert!(!MetricScore::scored("custom", 0.49, 0.5).passed);
	}

	#[test]
	fn empty_run_summary_is_vacuously_passing() {
		let summary = RunSummary::from_records(&[]);
		assert_eq!(summary.total, 0);
		assert_eq!(summary.pass_rate, 1.0);
	}
}
