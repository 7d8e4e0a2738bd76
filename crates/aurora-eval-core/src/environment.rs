use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::{EvalError, Result};
use crate::types::EnvironmentConfig;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// The AI application under test: turns a record input into its actual output.
#[async_trait]
pub trait Environment: Send + Sync {
	async fn invoke(&self, input: &Value) -> Result<Value>;
}

/// Wrap an async closure as an `Environment`.
pub fn from_async_fn<F, Fut>(f: F) -> Arc<dyn Environment>
where
	F: Send + Sync + 'static + Fn(&Value) -> Fut,
	Fut: Future<Output = Result<Value>> + Send + 'static,
{
	struct ClosureEnvironment<F> {
		f: F,
	}

	#[async_trait]
	impl<F, Fut> Environment for ClosureEnvironment<F>
	where
		F: Send + Sync + 'static + Fn(&Value) -> Fut,
		Fut: Future<Output = Result<Value>> + Send + 'static,
	{
		async fn invoke(&self, input: &Value) -> Result<Value> {
			(self.f)(input).await
		}
	}

	Arc::new(ClosureEnvironment { f })
}

/// Build the environment client a config describes.
pub fn from_config(config: &EnvironmentConfig) -> Result<Arc<dyn Environment>> {
	if config.mock {
		return Ok(Arc::new(MockEnvironment::new(config.agent_name.clone())));
	}
	Ok(Arc::new(HttpEnvironment::new(config)?))
}

/// POSTs `{"input", "agent", "env_id"}` to the resolved agent endpoint.
pub struct HttpEnvironment {
	client: reqwest::Client,
	url: String,
	agent_name: String,
	env_id: String,
	headers: Vec<(String, String)>,
}

impl HttpEnvironment {
	pub fn new(config: &EnvironmentConfig) -> Result<Self> {
		let timeout = Duration::from_secs(config.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));
		let client = reqwest::Client::builder()
			.timeout(timeout)
			.build()
			.map_err(|e| EvalError::config("environment", format!("cannot build HTTP client: {e}")))?;
		Ok(Self {
			client,
			url: config.endpoint_url(),
			agent_name: config.agent_name.clone(),
			env_id: config.env_id.clone(),
			headers: config.headers.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
		})
	}

	pub fn url(&self) -> &str {
		&self.url
	}
}

#[async_trait]
impl Environment for HttpEnvironment {
	async fn invoke(&self, input: &Value) -> Result<Value> {
		debug!(url = %self.url, agent = %self.agent_name, "invoking agent");
		let mut req = self.client.post(&self.url).json(&json!({
			"input": input,
			"agent": self.agent_name,
			"env_id": self.env_id,
		}));
		for (name, value) in &self.headers {
			req = req.header(name.as_str(), value.as_str());
		}

		let resp = req.send().await.map_err(|e| EvalError::from_reqwest(&self.url, e))?;
		let status = resp.status();
		let body = resp.text().await.map_err(|e| EvalError::from_reqwest(&self.url, e))?;
		if !status.is_success() {
			return Err(EvalError::EndpointStatus {
				url: self.url.clone(),
				status: status.as_u16(),
				body,
			});
		}
		Ok(extract_output(&body))
	}
}

/// `{"output": x}` yields `x`; other JSON is returned verbatim; plain text becomes a string.
fn extract_output(body: &str) -> Value {
	match serde_json::from_str::<Value>(body) {
		Ok(Value::Object(mut obj)) if obj.contains_key("output") => {
			obj.remove("output").unwrap_or(Value::Null)
		}
		Ok(v) => v,
		Err(_) => Value::String(body.to_string()),
	}
}

/// Offline stand-in for an agent; answers deterministically without network access.
pub struct MockEnvironment {
	agent_name: String,
}

impl MockEnvironment {
	pub fn new(agent_name: impl Into<String>) -> Self {
		Self { agent_name: agent_name.into() }
	}
}

#[async_trait]
impl Environment for MockEnvironment {
	async fn invoke(&self, input: &Value) -> Result<Value> {
		let answer = match input.get("question") {
			Some(Value::String(q)) => format!("Mock Answer from {} for: {}", self.agent_name, q),
			Some(q) => format!("Mock Answer from {} for: {}", self.agent_name, q),
			None => match input {
				Value::String(s) => format!("Processed: {s}"),
				other => format!("Processed: {other}"),
			},
		};
		Ok(Value::String(answer))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn mock_answers_questions() {
		let env = MockEnvironment::new("finance-advisor-bot");
		let out = env.invoke(&json!({"question": "What is EBITDA?"})).await.unwrap();
		assert_eq!(out, json!("Mock Answer from finance-advisor-bot for: What is EBITDA?"));

		let out = env.invoke(&json!("ping")).await.unwrap();
		assert_eq!(out, json!("Processed: ping"));
	}

	#[tokio::test]
	async fn closure_environment() {
		let env = from_async_fn(|input| {
			let input = input.clone();
			async move { Ok(json!({ "echo": input })) }
		});
		let out = env.invoke(&json!(1)).await.unwrap();
		assert_eq!(out, json!({"echo": 1}));
	}

	#[test]
	fn output_field_is_unwrapped() {
		assert_eq!(extract_output(r#"{"output": "hi", "trace": 1}"#), json!("hi"));
		assert_eq!(extract_output(r#"{"answer": "hi"}"#), json!({"answer": "hi"}));
		assert_eq!(extract_output("plain text"), json!("plain text"));
	}

	#[test]
	fn mock_flag_skips_http_client() {
		let config: EnvironmentConfig = serde_json::from_value(json!({
			"env_id": "e", "env_version": "1", "agent_name": "a", "mock": true
		}))
		.unwrap();
		assert!(from_config(&config).is_ok());
	}
}
