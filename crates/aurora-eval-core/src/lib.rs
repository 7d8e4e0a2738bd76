//! aurora-eval-core: offline evaluation of hosted AI agents.
//! Load a dataset, call the configured Aurora environment for every record,
//! score the answers with an evaluator suite and compare metrics to thresholds.

pub mod aggregate;
pub mod config;
pub mod datasource;
pub mod environment;
pub mod error;
pub mod evaluator;
pub mod evaluators;
pub mod report;
pub mod runner;
pub mod testing;
pub mod types;

pub use aggregate::aggregate;
pub use config::{load_environment, load_suite};
pub use datasource::{DataSource, JsonDataSource, JsonlDataSource, VecDataSource};
pub use environment::{from_async_fn, Environment, HttpEnvironment, MockEnvironment};
pub use error::{EvalError, Result};
pub use evaluator::{Assessment, Evaluator};
pub use evaluators::{
    build_evaluator,
    builtin::{BuiltinEvaluator, LexicalMetrics, MetricProvider},
    custom::CustomHttpEvaluator,
    EvaluatorSuite, SuiteEntry,
};
pub use report::generate_html_report;
pub use runner::{Eval, EvalBuilder};
pub use types::{
    DatasetRecord, EnvironmentConfig, ErrorPolicy, EvaluatorConfig, EvaluatorKind,
    EvaluatorSuiteConfig, MetricScore, MetricVerdict, RecordResult, RunReport, RunSummary,
    VerdictStatus,
};
