use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::read_to_string;
use crate::error::{EvalError, Result};
use crate::types::DatasetRecord;

#[async_trait]
pub trait DataSource: Send + Sync {
    async fn load(&self) -> Result<Vec<DatasetRecord>>;

    /// Human readable origin, used in logs and run metadata.
    fn describe(&self) -> String;
}

pub struct VecDataSource {
    records: Vec<DatasetRecord>,
}

impl VecDataSource {
    pub fn new(records: Vec<DatasetRecord>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl DataSource for VecDataSource {
    async fn load(&self) -> Result<Vec<DatasetRecord>> {
        for (idx, record) in self.records.iter().enumerate() {
            if is_empty_input(&record.input) {
                return Err(EvalError::config(
                    "in-memory dataset",
                    format!("record {}: 'input' must not be empty", idx + 1),
                ));
            }
        }
        Ok(self.records.clone())
    }

    fn describe(&self) -> String {
        format!("in-memory ({} records)", self.records.len())
    }
}

/// Read a JSON array of records:
/// `[{"id"?: "...", "input": ..., "expected"?: ..., "metadata"?: {...}}, ...]`
pub struct JsonDataSource {
    path: PathBuf,
}

impl JsonDataSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DataSource for JsonDataSource {
    async fn load(&self) -> Result<Vec<DatasetRecord>> {
        let source_name = self.path.display().to_string();
        let content = read_to_string(&self.path).await?;
        let value: Value = serde_json::from_str(&content)
            .map_err(|e| EvalError::config(&source_name, format!("invalid JSON: {e}")))?;
        let items = match value {
            Value::Array(items) => items,
            _ => {
                return Err(EvalError::config(
                    &source_name,
                    "dataset file must contain a list of records",
                ))
            }
        };
        items
            .into_iter()
            .enumerate()
            .map(|(idx, item)| {
                parse_record(item)
                    .map_err(|msg| EvalError::config(&source_name, format!("record {}: {msg}", idx + 1)))
            })
            .collect()
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Read JSONL where each non-blank line is one record object.
pub struct JsonlDataSource {
    path: PathBuf,
}

impl JsonlDataSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DataSource for JsonlDataSource {
    async fn load(&self) -> Result<Vec<DatasetRecord>> {
        let source_name = self.path.display().to_string();
        let content = read_to_string(&self.path).await?;
        let mut records = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let value: Value = serde_json::from_str(line).map_err(|e| {
                EvalError::config(&source_name, format!("line {}: invalid JSON: {e}", idx + 1))
            })?;
            let record = parse_record(value)
                .map_err(|msg| EvalError::config(&source_name, format!("line {}: {msg}", idx + 1)))?;
            records.push(record);
        }
        Ok(records)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Pick a loader from the file extension: `.jsonl` reads lines, anything else a JSON array.
pub fn from_path(path: impl Into<PathBuf>) -> Box<dyn DataSource> {
    let path = path.into();
    match path.extension().and_then(|e| e.to_str()) {
        Some("jsonl") | Some("ndjson") => Box::new(JsonlDataSource::new(path)),
        _ => Box::new(JsonDataSource::new(path)),
    }
}

fn parse_record(value: Value) -> std::result::Result<DatasetRecord, String> {
    let mut obj = match value {
        Value::Object(obj) => obj,
        other => return Err(format!("expected object, found {}", type_name(&other))),
    };

    let input = obj.remove("input").ok_or_else(|| "missing 'input'".to_string())?;
    if is_empty_input(&input) {
        return Err("'input' must not be empty".to_string());
    }

    let expected = match obj.remove("expected") {
        None | Some(Value::Null) => None,
        Some(v) => Some(v),
    };

    let metadata = match obj.remove("metadata") {
        None | Some(Value::Null) => None,
        Some(Value::Object(map)) => {
            let mut out = BTreeMap::new();
            for (key, v) in map {
                match v {
                    Value::String(_) | Value::Number(_) | Value::Bool(_) => {
                        out.insert(key, v);
                    }
                    other => {
                        return Err(format!(
                            "metadata '{key}' must be a string, number or bool, found {}",
                            type_name(&other)
                        ))
                    }
                }
            }
            Some(out)
        }
        Some(other) => return Err(format!("'metadata' must be an object, found {}", type_name(&other))),
    };

    let id = match obj.remove("id") {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };

    Ok(DatasetRecord { id, input, expected, metadata })
}

fn is_empty_input(input: &Value) -> bool {
    match input {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
