use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::stream::{self, StreamExt, TryStreamExt};
use serde_json::Value;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::aggregate::aggregate;
use crate::datasource::DataSource;
use crate::environment::{self, Environment};
use crate::error::{EvalError, Result};
use crate::evaluators::EvaluatorSuite;
use crate::types::{
	DatasetRecord, EnvironmentConfig, ErrorPolicy, MetricScore, RecordResult, RunReport, RunSummary,
};

pub struct EvalBuilder {
	data_source: Option<Arc<dyn DataSource>>,
	environment_config: Option<EnvironmentConfig>,
	environment: Option<Arc<dyn Environment>>,
	suite: Option<EvaluatorSuite>,
}

impl EvalBuilder {
	pub fn new() -> Self {
		Self {
			data_source: None,
			environment_config: None,
			environment: None,
			suite: None,
		}
	}

	pub fn data_source(mut self, data_source: Arc<dyn DataSource>) -> Self {
		self.data_source = Some(data_source);
		self
	}

	/// The environment the run targets; the client is built from it unless
	/// [`EvalBuilder::environment`] supplies one.
	pub fn environment_config(mut self, config: EnvironmentConfig) -> Self {
		self.environment_config = Some(config);
		self
	}

	pub fn environment(mut self, environment: Arc<dyn Environment>) -> Self {
		self.environment = Some(environment);
		self
	}

	pub fn suite(mut self, suite: EvaluatorSuite) -> Self {
		self.suite = Some(suite);
		self
	}

	pub fn build(self) -> Result<Eval> {
		let environment_config = self
			.environment_config
			.ok_or_else(|| EvalError::config("run", "environment config must be set"))?;
		let environment = match self.environment {
			Some(env) => env,
			None => environment::from_config(&environment_config)?,
		};
		Ok(Eval {
			data_source: self
				.data_source
				.ok_or_else(|| EvalError::config("run", "data_source must be set"))?,
			environment_config,
			environment,
			suite: self.suite.ok_or_else(|| EvalError::config("run", "evaluator suite must be set"))?,
		})
	}
}

impl Default for EvalBuilder {
	fn default() -> Self {
		Self::new()
	}
}

pub struct Eval {
	data_source: Arc<dyn DataSource>,
	environment_config: EnvironmentConfig,
	environment: Arc<dyn Environment>,
	suite: EvaluatorSuite,
}

impl Eval {
	pub fn builder() -> EvalBuilder {
		EvalBuilder::new()
	}

	pub fn suite(&self) -> &EvaluatorSuite {
		&self.suite
	}

	pub async fn run(&self) -> Result<RunReport> {
		let run_id = Uuid::new_v4().to_string();
		let started_at = Utc::now();
		let records = self.data_source.load().await?;
		info!(
			run_id = %run_id,
			suite = %self.suite.name(),
			dataset = %self.data_source.describe(),
			agent = %self.environment_config.agent_name,
			records = records.len(),
			evaluators = self.suite.entries().len(),
			"starting evaluation run"
		);

		let results = self.run_records(records).await?;
		let verdicts = aggregate(self.suite.entries().iter().map(|e| e.config()), &results);
		let summary = RunSummary::from_records(&results);

		let report = RunReport {
			run_id,
			suite_name: self.suite.name().to_string(),
			environment: self.environment_config.clone(),
			records: results,
			verdicts,
			summary,
			started_at,
			finished_at: Utc::now(),
		};
		info!(
			run_id = %report.run_id,
			passed = report.passed(),
			pass_rate = report.summary.pass_rate,
			errored = report.summary.errored,
			"evaluation run finished"
		);
		Ok(report)
	}

	/// Records are processed in file order; with `concurrency > 1` several are
	/// in flight but results keep their order.
	async fn run_records(&self, records: Vec<DatasetRecord>) -> Result<Vec<RecordResult>> {
		let total = records.len();
		stream::iter(records.into_iter().enumerate())
			.map(|(idx, record)| self.run_record(idx, total, record))
			.buffered(self.suite.concurrency_limit())
			.try_collect()
			.await
	}

	async fn run_record(&self, idx: usize, total: usize, record: DatasetRecord) -> Result<RecordResult> {
		debug!(record = idx + 1, total, "processing record");
		let started = Instant::now();
		let actual = match self.environment.invoke(&record.input).await {
			Ok(actual) => actual,
			Err(err) => return self.on_failure(idx, record, Value::Null, Vec::new(), None, err),
		};
		let latency_ms = Some(started.elapsed().as_millis() as u64);

		let mut scores = Vec::with_capacity(self.suite.entries().len());
		for entry in self.suite.entries() {
			match entry.score(&record, &actual).await {
				Ok(score) => scores.push(score),
				Err(err) => return self.on_failure(idx, record, actual, scores, latency_ms, err),
			}
		}

		Ok(RecordResult {
			record,
			actual,
			error: None,
			scores,
			latency_ms,
		})
	}

	fn on_failure(
		&self,
		idx: usize,
		record: DatasetRecord,
		actual: Value,
		scores: Vec<MetricScore>,
		latency_ms: Option<u64>,
		err: EvalError,
	) -> Result<RecordResult> {
		match self.suite.policy() {
			ErrorPolicy::Abort => {
				error!(record = idx + 1, error = %err, "aborting run");
				Err(err)
			}
			ErrorPolicy::Skip => {
				warn!(record = idx + 1, error = %err, "record failed, skipping");
				Ok(RecordResult {
					record,
					actual,
					error: Some(err.to_string()),
					scores,
					latency_ms,
				})
			}
		}
	}
}
