use std::collections::HashSet;
use std::path::Path;

use serde::de::DeserializeOwned;

pub use aurora_eval_types::{
    EnvironmentConfig, ErrorPolicy, EvaluatorConfig, EvaluatorKind, EvaluatorSuiteConfig,
};

use crate::error::{EvalError, Result};

/// Load the environment/agent selection from a JSON (or `.yaml`/`.yml`) file.
pub async fn load_environment(path: impl AsRef<Path>) -> Result<EnvironmentConfig> {
    let path = path.as_ref();
    let content = read_to_string(path).await?;
    let env: EnvironmentConfig = parse_config(path, &content)?;
    validate_environment(&path.display().to_string(), &env)?;
    Ok(env)
}

/// Load the evaluator suite from a JSON (or `.yaml`/`.yml`) file.
pub async fn load_suite(path: impl AsRef<Path>) -> Result<EvaluatorSuiteConfig> {
    let path = path.as_ref();
    let content = read_to_string(path).await?;
    let suite: EvaluatorSuiteConfig = parse_config(path, &content)?;
    validate_suite(&path.display().to_string(), &suite)?;
    Ok(suite)
}

pub fn validate_environment(source_name: &str, env: &EnvironmentConfig) -> Result<()> {
    if env.env_id.trim().is_empty() {
        return Err(EvalError::config(source_name, "'env_id' must not be empty"));
    }
    if env.agent_name.trim().is_empty() {
        return Err(EvalError::config(source_name, "'agent_name' must not be empty"));
    }
    if env.timeout_secs == Some(0) {
        return Err(EvalError::config(source_name, "'timeout_secs' must be positive"));
    }
    Ok(())
}

pub fn validate_suite(source_name: &str, suite: &EvaluatorSuiteConfig) -> Result<()> {
    let mut seen = HashSet::new();
    for e in &suite.evaluators {
        if e.name.trim().is_empty() {
            return Err(EvalError::config(source_name, "evaluator 'name' must not be empty"));
        }
        if !seen.insert(e.name.as_str()) {
            return Err(EvalError::config(
                source_name,
                format!("duplicate evaluator name '{}'", e.name),
            ));
        }
        if e.target.trim().is_empty() {
            return Err(EvalError::config(
                source_name,
                format!("evaluator '{}' has an empty 'target'", e.name),
            ));
        }
        if let Some(t) = e.pass_threshold {
            if !t.is_finite() {
                return Err(EvalError::config(
                    source_name,
                    format!("evaluator '{}' has a non-finite pass_threshold", e.name),
                ));
            }
        }
        if let Some(rate) = e.min_pass_rate {
            if !(0.0..=1.0).contains(&rate) {
                return Err(EvalError::config(
                    source_name,
                    format!("evaluator '{}': min_pass_rate must be within 0.0..=1.0", e.name),
                ));
            }
        }
    }
    if suite.concurrency == 0 {
        return Err(EvalError::config(source_name, "'concurrency' must be at least 1"));
    }
    Ok(())
}

/// Deserialize `content`, choosing YAML for `.yaml`/`.yml` paths and JSON otherwise.
pub fn parse_config<T: DeserializeOwned>(path: &Path, content: &str) -> Result<T> {
    let source_name = path.display().to_string();
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    if is_yaml {
        serde_yaml::from_str(content).map_err(|e| EvalError::config(source_name, e.to_string()))
    } else {
        serde_json::from_str(content).map_err(|e| EvalError::config(source_name, e.to_string()))
    }
}

pub(crate) async fn read_to_string(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path).await.map_err(|source| EvalError::Io {
        path: path.display().to_string(),
        source,
    })
}
