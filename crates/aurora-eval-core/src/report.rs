use crate::types::{RunReport, VerdictStatus};

pub fn generate_html_report(report: &RunReport) -> String {
    let mut verdict_rows = String::new();
    for v in &report.verdicts {
        let class = match v.status {
            VerdictStatus::Passed => "pass",
            VerdictStatus::Failed => "fail",
            VerdictStatus::Pending => "pending",
        };
        verdict_rows.push_str(&format!(
            r#"
            <tr class="{}">
                <td>{}</td>
                <td>{}</td>
                <td>&ge; {:.2}</td>
                <td>{:.0}%</td>
                <td>{}</td>
                <td>{:.1}%</td>
                <td>{} / {} / {}</td>
            </tr>"#,
            class,
            html_escape(&v.metric),
            v.status,
            v.threshold,
            v.min_pass_rate * 100.0,
            v.mean.map(|m| format!("{m:.3}")).unwrap_or_else(|| "-".to_string()),
            v.pass_rate * 100.0,
            v.passed,
            v.scored,
            v.pending,
        ));
    }

    let mut record_rows = String::new();
    for (idx, rr) in report.records.iter().enumerate() {
        let id = rr.record.id.clone().unwrap_or_else(|| format!("#{}", idx + 1));
        let (row_class, icon) = if rr.error.is_some() {
            ("error", "!")
        } else if rr.passed() {
            ("pass", "✓")
        } else {
            ("fail", "✗")
        };

        let input_str = serde_json::to_string_pretty(&rr.record.input).unwrap_or_default();
        let expected_str = rr
            .record
            .expected
            .as_ref()
            .map(|e| serde_json::to_string_pretty(e).unwrap_or_default())
            .unwrap_or_else(|| "-".to_string());
        let actual_str = match &rr.error {
            Some(err) => format!("error: {err}"),
            None => serde_json::to_string_pretty(&rr.actual).unwrap_or_default(),
        };

        let mut scores_html = String::new();
        for score in &rr.scores {
            let (class, value) = match score.value {
                Some(v) if score.passed => ("pass", format!("{v:.3}")),
                Some(v) => ("fail", format!("{v:.3}")),
                None => ("pending", "pending".to_string()),
            };
            let title = score.reasoning.as_deref().unwrap_or("");
            scores_html.push_str(&format!(
                r#"<span class="badge {}" title="{}">{}: {}</span>"#,
                class,
                html_escape(title),
                html_escape(&score.metric),
                value
            ));
        }

        let latency = rr.latency_ms.map(|ms| format!("{ms}ms")).unwrap_or_else(|| "-".to_string());

        record_rows.push_str(&format!(
            r#"
            <tr class="{}">
                <td>{}</td>
                <td class="icon">{}</td>
                <td><pre>{}</pre></td>
                <td><pre>{}</pre></td>
                <td><pre>{}</pre></td>
                <td class="scores">{}</td>
                <td>{}</td>
            </tr>"#,
            row_class,
            html_escape(&id),
            icon,
            html_escape(&input_str),
            html_escape(&actual_str),
            html_escape(&expected_str),
            scores_html,
            latency
        ));
    }

    let verdict_class = if report.passed() { "good" } else { "bad" };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{} - Aurora Eval Report</title>
    <style>
        * {{ box-sizing: border-box; }}
        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Arial, sans-serif; margin: 0; padding: 20px; background: #f5f5f5; }}
        .container {{ max-width: 1400px; margin: 0 auto; background: white; padding: 30px; border-radius: 8px; box-shadow: 0 2px 8px rgba(0,0,0,0.1); }}
        h1, h2 {{ color: #333; }}
        .meta {{ color: #6c757d; font-size: 14px; margin-bottom: 20px; }}
        .summary {{ display: flex; gap: 20px; padding: 20px; background: #f8f9fa; border-radius: 6px; }}
        .summary-item {{ flex: 1; }}
        .summary-label {{ font-size: 12px; color: #666; text-transform: uppercase; }}
        .summary-value {{ font-size: 28px; font-weight: 600; color: #333; }}
        .summary-value.good {{ color: #28a745; }}
        .summary-value.bad {{ color: #dc3545; }}
        table {{ width: 100%; border-collapse: collapse; margin-top: 20px; }}
        th {{ background: #343a40; color: white; padding: 10px; text-align: left; font-size: 13px; text-transform: uppercase; }}
        td {{ padding: 10px; border-bottom: 1px solid #dee2e6; vertical-align: top; }}
        tr.pass {{ background: #f0f9f4; }}
        tr.fail, tr.error {{ background: #fef3f2; }}
        tr.pending {{ background: #fff8e1; }}
        .icon {{ text-align: center; font-size: 18px; width: 50px; }}
        pre {{ margin: 0; padding: 8px; background: #f8f9fa; border-radius: 4px; font-size: 12px; max-height: 150px; overflow: auto; white-space: pre-wrap; word-break: break-word; }}
        .scores {{ display: flex; flex-wrap: wrap; gap: 6px; }}
        .badge {{ padding: 4px 8px; border-radius: 4px; font-size: 11px; font-weight: 600; white-space: nowrap; }}
        .badge.pass {{ background: #d4edda; color: #155724; }}
        .badge.fail {{ background: #f8d7da; color: #721c24; }}
        .badge.pending {{ background: #fff3cd; color: #856404; }}
    </style>
</head>
<body>
    <div class="container">
        <h1>{}</h1>
        <div class="meta">Run {} &middot; {} v{} &middot; agent {} &middot; started {} &middot; {}ms</div>

        <div class="summary">
            <div class="summary-item"><div class="summary-label">Records</div><div class="summary-value">{}</div></div>
            <div class="summary-item"><div class="summary-label">Passed</div><div class="summary-value good">{}</div></div>
            <div class="summary-item"><div class="summary-label">Errored</div><div class="summary-value bad">{}</div></div>
            <div class="summary-item"><div class="summary-label">Pass Rate</div><div class="summary-value">{:.1}%</div></div>
            <div class="summary-item"><div class="summary-label">Verdict</div><div class="summary-value {}">{}</div></div>
        </div>

        <h2>Metrics</h2>
        <table>
            <thead>
                <tr><th>Metric</th><th>Status</th><th>Threshold</th><th>Required</th><th>Mean</th><th>Pass Rate</th><th>Passed / Scored / Pending</th></tr>
            </thead>
            <tbody>{}
            </tbody>
        </table>

        <h2>Records</h2>
        <table>
            <thead>
                <tr><th>ID</th><th>Status</th><th>Input</th><th>Actual</th><th>Expected</th><th>Scores</th><th>Latency</th></tr>
            </thead>
            <tbody>{}
            </tbody>
        </table>
    </div>
</body>
</html>"#,
        html_escape(&report.suite_name),
        html_escape(&report.suite_name),
        html_escape(&report.run_id),
        html_escape(&report.environment.env_id),
        html_escape(&report.environment.env_version),
        html_escape(&report.environment.agent_name),
        report.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
        report.duration_ms(),
        report.summary.total,
        report.summary.passed,
        report.summary.errored,
        report.summary.pass_rate * 100.0,
        verdict_class,
        if report.passed() { "PASS" } else { "FAIL" },
        verdict_rows,
        record_rows
    )
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DatasetRecord, MetricScore, MetricVerdict, RecordResult, RunSummary};
    use chrono::Utc;
    use serde_json::json;

    #[test]
    fn renders_verdicts_and_escapes_content() {
        let records = vec![RecordResult {
            record: DatasetRecord::with_expected(json!("<script>"), json!("ok")),
            actual: json!("ok"),
            error: None,
            scores: vec![MetricScore::scored("Exact Match", 1.0, 1.0)],
            latency_ms: Some(12),
        }];
        let summary = RunSummary::from_records(&records);
        let report = RunReport {
            run_id: "run-1".into(),
            suite_name: "Finance & Ops".into(),
            environment: serde_json::from_value(json!({
                "env_id": "fno", "env_version": "1", "agent_name": "bot"
            }))
            .unwrap(),
            records,
            verdicts: vec![MetricVerdict {
                metric: "Exact Match".into(),
                threshold: 1.0,
                min_pass_rate: 1.0,
                scored: 1,
                passed: 1,
                pending: 0,
                mean: Some(1.0),
                min: Some(1.0),
                max: Some(1.0),
                pass_rate: 1.0,
                status: VerdictStatus::Passed,
            }],
            summary,
            started_at: Utc::now(),
            finished_at: Utc::now(),
        };

        let html = generate_html_report(&report);
        assert!(html.contains("Finance &amp; Ops"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("PASS"));
        assert!(html.contains("12ms"));
    }
}
