pub use aurora_eval_types::{
	DatasetRecord, EnvironmentConfig, ErrorPolicy, EvaluatorConfig, EvaluatorKind,
	EvaluatorSuiteConfig, MetricScore, MetricVerdict, RecordResult, RunReport, RunSummary,
	VerdictStatus,
};
