use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::error::{EvalError, Result};
use crate::evaluator::{Assessment, Evaluator};
use crate::types::DatasetRecord;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Externally hosted evaluator reached over HTTP.
///
/// Request: `POST {"input", "expected", "actual", "metadata", "parameters"}`.
/// Accepted responses: a number, a boolean, a numeric string, or an object with
/// a numeric/boolean `score` plus optional `reasoning` and `details`.
pub struct CustomHttpEvaluator {
    name: String,
    url: String,
    parameters: Map<String, Value>,
    client: reqwest::Client,
}

impl CustomHttpEvaluator {
    /// `parameters.timeout_secs` overrides the default request timeout.
    pub fn new(name: impl Into<String>, url: impl Into<String>, parameters: Map<String, Value>) -> Result<Self> {
        let name = name.into();
        let url = url.into();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(EvalError::UnknownEvaluator {
                name,
                reason: format!("custom evaluator target '{url}' is not an http(s) URL"),
            });
        }
        let timeout = match parameters.get("timeout_secs") {
            None => DEFAULT_TIMEOUT_SECS,
            Some(v) => match v.as_u64() {
                Some(secs) if secs > 0 => secs,
                _ => {
                    return Err(EvalError::UnknownEvaluator {
                        name,
                        reason: format!("'timeout_secs' must be a positive integer, got {v}"),
                    })
                }
            },
        };
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()
            .map_err(|e| EvalError::UnknownEvaluator {
                name: name.clone(),
                reason: format!("cannot build HTTP client: {e}"),
            })?;
        Ok(Self { name, url, parameters, client })
    }
}

#[async_trait]
impl Evaluator for CustomHttpEvaluator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn evaluate(&self, record: &DatasetRecord, actual: &Value) -> Result<Assessment> {
        debug!(evaluator = %self.name, url = %self.url, "calling custom evaluator");
        let body = json!({
            "input": record.input,
            "expected": record.expected,
            "actual": actual,
            "metadata": record.metadata,
            "parameters": self.parameters,
        });

        let resp = self.client.post(&self.url).json(&body).send().await.map_err(|e| {
            let message = if e.is_timeout() {
                format!("request to {} timed out", self.url)
            } else {
                format!("endpoint {} unreachable: {e}", self.url)
            };
            EvalError::evaluator(&self.name, message)
        })?;
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| EvalError::evaluator(&self.name, format!("failed to read response: {e}")))?;
        if !status.is_success() {
            return Err(EvalError::evaluator(
                &self.name,
                format!("HTTP {}: {}", status.as_u16(), preview(&text)),
            ));
        }

        parse_response(&text)
            .ok_or_else(|| EvalError::evaluator(&self.name, format!("unparseable response: {}", preview(&text))))
    }
}

fn parse_response(text: &str) -> Option<Assessment> {
    let value: Value = match serde_json::from_str(text.trim()) {
        Ok(v) => v,
        // Bare bodies such as `0.75` or `true` that are not valid JSON documents on their own.
        Err(_) => return score_of(&Value::String(text.trim().to_string())).map(Assessment::score),
    };
    match &value {
        Value::Object(obj) => {
            let score = score_of(obj.get("score")?)?;
            let mut assessment = Assessment::score(score);
            if let Some(r) = obj.get("reasoning").and_then(|r| r.as_str()) {
                assessment = assessment.reasoning(r);
            }
            if let Some(d) = obj.get("details").filter(|d| !d.is_null()) {
                assessment = assessment.details(d.clone());
            }
            Some(assessment)
        }
        other => score_of(other).map(Assessment::score),
    }
}

fn score_of(v: &Value) -> Option<f64> {
    let score = match v {
        Value::Number(n) => n.as_f64()?,
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => 1.0,
            "false" => 0.0,
            other => other.parse::<f64>().ok()?,
        },
        _ => return None,
    };
    score.is_finite().then_some(score)
}

fn preview(text: &str) -> String {
    const MAX: usize = 200;
    if text.chars().count() <= MAX {
        text.to_string()
    } else {
        let mut s: String = text.chars().take(MAX).collect();
        s.push('…');
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_accepted_shapes() {
        assert_eq!(parse_response("0.75").unwrap().value, Some(0.75));
        assert_eq!(parse_response("true").unwrap().value, Some(1.0));
        assert_eq!(parse_response(r#""0.5""#).unwrap().value, Some(0.5));
        let a = parse_response(r#"{"score": 0.9, "reasoning": "close", "details": {"precision": 1}}"#).unwrap();
        assert_eq!(a.value, Some(0.9));
        assert_eq!(a.reasoning.as_deref(), Some("close"));
        assert!(a.details.is_some());
        assert_eq!(parse_response(r#"{"score": false}"#).unwrap().value, Some(0.0));
    }

    #[test]
    fn rejects_non_numeric_bodies() {
        assert!(parse_response("looks good to me").is_none());
        assert!(parse_response(r#"{"verdict": "ok"}"#).is_none());
        assert!(parse_response(r#"{"score": "high"}"#).is_none());
        assert!(parse_response(r#"{"score": null}"#).is_none());
        assert!(parse_response("[1, 2]").is_none());
        assert!(parse_response("").is_none());
    }

    #[test]
    fn rejects_non_http_targets() {
        assert!(CustomHttpEvaluator::new("Approval", "ApprovalEvaluator", Map::new()).is_err());
    }

    #[test]
    fn rejects_non_positive_timeouts() {
        for bad in [json!(0), json!(-5), json!("soon")] {
            let mut params = Map::new();
            params.insert("timeout_secs".into(), bad.clone());
            match CustomHttpEvaluator::new("Approval", "http://localhost:8000/eval", params) {
                Err(EvalError::UnknownEvaluator { reason, .. }) => assert!(reason.contains("timeout_secs"), "{reason}"),
                Err(other) => panic!("unexpected error for {bad}: {other}"),
                Ok(_) => panic!("timeout {bad} must be rejected"),
            }
        }

        let mut params = Map::new();
        params.insert("timeout_secs".into(), json!(5));
        assert!(CustomHttpEvaluator::new("Approval", "http://localhost:8000/eval", params).is_ok());
    }
}
