use crate::error::{EvalError, Result};
use crate::types::{RunReport, VerdictStatus};

/// Helper to assert a whole run passed: no errored record and no failed metric.
///
/// Use this in your `#[tokio::test]` functions.
///
/// # Example
/// ```ignore
/// #[tokio::test]
/// async fn finance_bot_regression() -> Result<()> {
///     let eval = Eval::builder()
///         .data_source(data)
///         .environment_config(env)
///         .suite(suite)
///         .build()?;
///
///     let report = eval.run().await?;
///     assert_run_passed(&report)?;
///     Ok(())
/// }
/// ```
pub fn assert_run_passed(report: &RunReport) -> Result<()> {
    if !report.passed() {
        return Err(failure(format!(
            "evaluation failed: {} of {} metrics failed, {} records errored\n{}",
            report.verdicts.iter().filter(|v| v.status == VerdictStatus::Failed).count(),
            report.verdicts.len(),
            report.summary.errored,
            report.summary_table()
        )));
    }
    Ok(())
}

/// Helper to assert one metric's verdict passed.
pub fn assert_metric_passed(report: &RunReport, metric: &str) -> Result<()> {
    let verdict = report
        .verdict(metric)
        .ok_or_else(|| failure(format!("metric '{metric}' is not part of this run")))?;
    if verdict.status != VerdictStatus::Passed {
        return Err(failure(format!(
            "metric '{}' {}: pass rate {:.1}% (required {:.1}%) at threshold {:.2}\n{}",
            metric,
            verdict.status,
            verdict.pass_rate * 100.0,
            verdict.min_pass_rate * 100.0,
            verdict.threshold,
            report.summary_table()
        )));
    }
    Ok(())
}

/// Helper to assert the record pass rate meets a threshold.
pub fn assert_record_pass_rate(report: &RunReport, min_pass_rate: f64) -> Result<()> {
    if report.summary.pass_rate < min_pass_rate {
        return Err(failure(format!(
            "record pass rate {:.1}% is below threshold {:.1}%\n{}",
            report.summary.pass_rate * 100.0,
            min_pass_rate * 100.0,
            report.summary_table()
        )));
    }
    Ok(())
}

fn failure(message: String) -> EvalError {
    EvalError::Assertion { message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        DatasetRecord, EnvironmentConfig, MetricScore, MetricVerdict, RecordResult, RunSummary,
    };
    use chrono::Utc;
    use serde_json::json;

    fn report(status: VerdictStatus, value: f64) -> RunReport {
        let records = vec![RecordResult {
            record: DatasetRecord::with_expected(json!("q"), json!("a")),
            actual: json!("a"),
            error: None,
            scores: vec![MetricScore::scored("Exact", value, 1.0)],
            latency_ms: Some(3),
        }];
        let environment: EnvironmentConfig = serde_json::from_value(json!({
            "env_id": "aurora-test-001",
            "env_version": "10.0.38",
            "agent_name": "finance-advisor-bot"
        }))
        .unwrap();
        RunReport {
            run_id: "run".into(),
            suite_name: "suite".into(),
            environment,
            summary: RunSummary::from_records(&records),
            records,
            verdicts: vec![MetricVerdict {
                metric: "Exact".into(),
                threshold: 1.0,
                min_pass_rate: 1.0,
                scored: 1,
                passed: usize::from(value >= 1.0),
                pending: 0,
                mean: Some(value),
                min: Some(value),
                max: Some(value),
                pass_rate: if value >= 1.0 { 1.0 } else { 0.0 },
                status,
            }],
            started_at: Utc::now(),
            finished_at: Utc::now(),
        }
    }

    #[test]
    fn passing_run_satisfies_every_helper() {
        let report = report(VerdictStatus::Passed, 1.0);
        assert_run_passed(&report).unwrap();
        assert_metric_passed(&report, "Exact").unwrap();
        assert_record_pass_rate(&report, 1.0).unwrap();
    }

    #[test]
    fn failures_are_assertion_errors() {
        let report = report(VerdictStatus::Failed, 0.0);
        assert!(matches!(assert_run_passed(&report), Err(EvalError::Assertion { .. })));
        assert!(matches!(assert_metric_passed(&report, "Exact"), Err(EvalError::Assertion { .. })));
        assert!(matches!(assert_record_pass_rate(&report, 0.5), Err(EvalError::Assertion { .. })));
        match assert_metric_passed(&report, "Groundedness") {
            Err(EvalError::Assertion { message }) => assert!(message.contains("not part of this run")),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
