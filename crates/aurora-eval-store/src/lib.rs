use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use aurora_eval_types::{EnvironmentConfig, ErrorPolicy, EvaluatorConfig, EvaluatorSuiteConfig, RunReport};

/// SQLite-backed run history plus the registry of named datasets,
/// environments and evaluators.
#[derive(Debug, Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Succeeded,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Succeeded => "succeeded",
            RunStatus::Failed => "failed",
        }
    }

    fn parse(s: &str) -> Result<Self> {
        match s {
            "running" => Ok(RunStatus::Running),
            "succeeded" => Ok(RunStatus::Succeeded),
            "failed" => Ok(RunStatus::Failed),
            other => Err(anyhow!("unknown run status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunEntity {
    pub id: i64,
    pub name: String,
    pub run_uuid: Option<String>,
    pub suite: Option<String>,
    pub environment: String,
    pub agent: String,
    pub dataset: String,
    pub status: RunStatus,
    pub created_at: DateTime<Utc>,
    pub duration_ms: Option<i64>,
    pub total_records: Option<i64>,
    pub passed_records: Option<i64>,
    pub pass_rate: Option<f64>,
    pub passed: Option<bool>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetEntry {
    pub name: String,
    pub description: Option<String>,
    pub file_path: PathBuf,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentEntry {
    pub name: String,
    pub config: EnvironmentConfig,
    pub created_at: DateTime<Utc>,
}

impl Store {
    /// Open a new store at the given path (e.g., "aurora-eval.db")
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_URI,
        )
        .with_context(|| format!("failed to open store at {}", path.display()))?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| anyhow!("store connection lock poisoned"))
    }

    /// Initialize the SQLite schema
    fn init_schema(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS runs (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                run_uuid TEXT,
                suite TEXT,
                environment TEXT NOT NULL,
                agent TEXT NOT NULL,
                dataset TEXT NOT NULL,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL,
                duration_ms INTEGER,
                total_records INTEGER,
                passed_records INTEGER,
                pass_rate REAL,
                passed BOOLEAN,
                error TEXT,
                report TEXT
            );

            CREATE TABLE IF NOT EXISTS results (
                id INTEGER PRIMARY KEY,
                run_id INTEGER NOT NULL,
                position INTEGER NOT NULL,
                record_id TEXT,
                input TEXT NOT NULL,
                expected TEXT,
                actual TEXT NOT NULL,
                error TEXT,
                latency_ms INTEGER,
                FOREIGN KEY(run_id) REFERENCES runs(id)
            );

            CREATE TABLE IF NOT EXISTS scores (
                id INTEGER PRIMARY KEY,
                result_id INTEGER NOT NULL,
                metric TEXT NOT NULL,
                value REAL,
                passed BOOLEAN NOT NULL,
                reasoning TEXT,
                details TEXT,
                FOREIGN KEY(result_id) REFERENCES results(id)
            );

            CREATE TABLE IF NOT EXISTS verdicts (
                id INTEGER PRIMARY KEY,
                run_id INTEGER NOT NULL,
                metric TEXT NOT NULL,
                status TEXT NOT NULL,
                threshold REAL NOT NULL,
                min_pass_rate REAL NOT NULL,
                mean REAL,
                pass_rate REAL NOT NULL,
                scored INTEGER NOT NULL,
                passed INTEGER NOT NULL,
                pending INTEGER NOT NULL,
                FOREIGN KEY(run_id) REFERENCES runs(id)
            );

            CREATE TABLE IF NOT EXISTS datasets (
                name TEXT PRIMARY KEY,
                description TEXT,
                file_path TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS environments (
                name TEXT PRIMARY KEY,
                config TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS evaluators (
                name TEXT PRIMARY KEY,
                config TEXT NOT NULL,
                created_at TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    /// Record a run as `running` before it starts; returns its id.
    pub fn begin_run(&self, name: &str, environment: &EnvironmentConfig, dataset: &str) -> Result<i64> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO runs (name, environment, agent, dataset, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                name,
                environment.env_id,
                environment.agent_name,
                dataset,
                RunStatus::Running.as_str(),
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Mark a run `succeeded` and save its records, scores and verdicts.
    pub fn complete_run(&self, run_id: i64, report: &RunReport) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let updated = tx.execute(
            "UPDATE runs SET run_uuid = ?2, suite = ?3, status = ?4, duration_ms = ?5,
                 total_records = ?6, passed_records = ?7, pass_rate = ?8, passed = ?9, report = ?10
             WHERE id = ?1",
            params![
                run_id,
                report.run_id,
                report.suite_name,
                RunStatus::Succeeded.as_str(),
                report.duration_ms(),
                report.summary.total as i64,
                report.summary.passed as i64,
                report.summary.pass_rate,
                report.passed(),
                serde_json::to_string(report)?
            ],
        )?;
        if updated == 0 {
            return Err(anyhow!("run {run_id} does not exist"));
        }

        for (position, rr) in report.records.iter().enumerate() {
            tx.execute(
                "INSERT INTO results (run_id, position, record_id, input, expected, actual, error, latency_ms)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    run_id,
                    position as i64,
                    rr.record.id,
                    rr.record.input.to_string(),
                    rr.record.expected.as_ref().map(|e| e.to_string()),
                    rr.actual.to_string(),
                    rr.error,
                    rr.latency_ms.map(|ms| ms as i64)
                ],
            )?;
            let result_id = tx.last_insert_rowid();

            for score in &rr.scores {
                tx.execute(
                    "INSERT INTO scores (result_id, metric, value, passed, reasoning, details)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        result_id,
                        score.metric,
                        score.value,
                        score.passed,
                        score.reasoning,
                        score.details.as_ref().map(|d| d.to_string())
                    ],
                )?;
            }
        }

        for v in &report.verdicts {
            tx.execute(
                "INSERT INTO verdicts (run_id, metric, status, threshold, min_pass_rate, mean, pass_rate, scored, passed, pending)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    run_id,
                    v.metric,
                    v.status.to_string(),
                    v.threshold,
                    v.min_pass_rate,
                    v.mean,
                    v.pass_rate,
                    v.scored as i64,
                    v.passed as i64,
                    v.pending as i64
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Mark a run `failed` when it aborted before producing a report.
    pub fn fail_run(&self, run_id: i64, error: &str, duration_ms: i64) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "UPDATE runs SET status = ?2, error = ?3, duration_ms = ?4, passed = 0 WHERE id = ?1",
            params![run_id, RunStatus::Failed.as_str(), error, duration_ms],
        )?;
        Ok(())
    }

    /// Newest first.
    pub fn list_runs(&self) -> Result<Vec<RunEntity>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, run_uuid, suite, environment, agent, dataset, status, created_at,
                    duration_ms, total_records, passed_records, pass_rate, passed, error
             FROM runs ORDER BY created_at DESC, id DESC",
        )?;
        let rows = stmt.query_map([], raw_run)?;
        let mut runs = Vec::new();
        for row in rows {
            runs.push(row?.into_entity()?);
        }
        Ok(runs)
    }

    pub fn get_run(&self, run_id: i64) -> Result<Option<RunEntity>> {
        let conn = self.lock()?;
        let raw = conn
            .query_row(
                "SELECT id, name, run_uuid, suite, environment, agent, dataset, status, created_at,
                        duration_ms, total_records, passed_records, pass_rate, passed, error
                 FROM runs WHERE id = ?1",
                params![run_id],
                raw_run,
            )
            .optional()?;
        raw.map(RawRun::into_entity).transpose()
    }

    /// The full report of a completed run.
    pub fn get_report(&self, run_id: i64) -> Result<Option<RunReport>> {
        let conn = self.lock()?;
        let json: Option<Option<String>> = conn
            .query_row("SELECT report FROM runs WHERE id = ?1", params![run_id], |row| row.get(0))
            .optional()?;
        match json.flatten() {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    pub fn save_dataset(&self, name: &str, description: Option<&str>, file_path: &Path) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO datasets (name, description, file_path, created_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(name) DO UPDATE SET description = excluded.description, file_path = excluded.file_path",
            params![name, description, file_path.to_string_lossy(), Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn get_dataset(&self, name: &str) -> Result<Option<DatasetEntry>> {
        let conn = self.lock()?;
        let raw = conn
            .query_row(
                "SELECT name, description, file_path, created_at FROM datasets WHERE name = ?1",
                params![name],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;
        raw.map(|(name, description, file_path, created_at)| {
            Ok(DatasetEntry {
                name,
                description,
                file_path: PathBuf::from(file_path),
                created_at: parse_time(&created_at)?,
            })
        })
        .transpose()
    }

    pub fn list_datasets(&self) -> Result<Vec<DatasetEntry>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT name, description, file_path, created_at FROM datasets ORDER BY name")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (name, description, file_path, created_at) = row?;
            out.push(DatasetEntry {
                name,
                description,
                file_path: PathBuf::from(file_path),
                created_at: parse_time(&created_at)?,
            });
        }
        Ok(out)
    }

    pub fn save_environment(&self, name: &str, config: &EnvironmentConfig) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO environments (name, config, created_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(name) DO UPDATE SET config = excluded.config",
            params![name, serde_json::to_string(config)?, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn get_environment(&self, name: &str) -> Result<Option<EnvironmentConfig>> {
        let conn = self.lock()?;
        let json: Option<String> = conn
            .query_row("SELECT config FROM environments WHERE name = ?1", params![name], |row| row.get(0))
            .optional()?;
        json.map(|j| serde_json::from_str(&j).map_err(Into::into)).transpose()
    }

    pub fn list_environments(&self) -> Result<Vec<EnvironmentEntry>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT name, config, created_at FROM environments ORDER BY name")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (name, config, created_at) = row?;
            out.push(EnvironmentEntry {
                name,
                config: serde_json::from_str(&config)?,
                created_at: parse_time(&created_at)?,
            });
        }
        Ok(out)
    }

    /// Registers (or replaces) an evaluator under its metric name.
    pub fn save_evaluator(&self, config: &EvaluatorConfig) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO evaluators (name, config, created_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(name) DO UPDATE SET config = excluded.config",
            params![config.name, serde_json::to_string(config)?, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn list_evaluators(&self) -> Result<Vec<EvaluatorConfig>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT config FROM evaluators ORDER BY name")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(serde_json::from_str(&row?)?);
        }
        Ok(out)
    }

    /// Suite made of registered evaluators, in the order they are named.
    /// An empty `names` selects every registered evaluator.
    pub fn evaluator_suite(&self, suite_name: &str, names: &[String]) -> Result<EvaluatorSuiteConfig> {
        let registered = self.list_evaluators()?;
        let evaluators = if names.is_empty() {
            registered
        } else {
            names
                .iter()
                .map(|name| {
                    registered
                        .iter()
                        .find(|config| &config.name == name)
                        .cloned()
                        .ok_or_else(|| anyhow!("evaluator '{name}' is not registered"))
                })
                .collect::<Result<Vec<_>>>()?
        };
        if evaluators.is_empty() {
            return Err(anyhow!("no evaluators are registered"));
        }
        Ok(EvaluatorSuiteConfig {
            suite_name: suite_name.to_string(),
            evaluators,
            on_error: ErrorPolicy::default(),
            concurrency: 1,
        })
    }
}

struct RawRun {
    id: i64,
    name: String,
    run_uuid: Option<String>,
    suite: Option<String>,
    environment: String,
    agent: String,
    dataset: String,
    status: String,
    created_at: String,
    duration_ms: Option<i64>,
    total_records: Option<i64>,
    passed_records: Option<i64>,
    pass_rate: Option<f64>,
    passed: Option<bool>,
    error: Option<String>,
}

fn raw_run(row: &Row<'_>) -> rusqlite::Result<RawRun> {
    Ok(RawRun {
        id: row.get(0)?,
        name: row.get(1)?,
        run_uuid: row.get(2)?,
        suite: row.get(3)?,
        environment: row.get(4)?,
        agent: row.get(5)?,
        dataset: row.get(6)?,
        status: row.get(7)?,
        created_at: row.get(8)?,
        duration_ms: row.get(9)?,
        total_records: row.get(10)?,
        passed_records: row.get(11)?,
        pass_rate: row.get(12)?,
        passed: row.get(13)?,
        error: row.get(14)?,
    })
}

impl RawRun {
    fn into_entity(self) -> Result<RunEntity> {
        Ok(RunEntity {
            id: self.id,
            name: self.name,
            run_uuid: self.run_uuid,
            suite: self.suite,
            environment: self.environment,
            agent: self.agent,
            dataset: self.dataset,
            status: RunStatus::parse(&self.status)?,
            created_at: parse_time(&self.created_at)?,
            duration_ms: self.duration_ms,
            total_records: self.total_records,
            passed_records: self.passed_records,
            pass_rate: self.pass_rate,
            passed: self.passed,
            error: self.error,
        })
    }
}

fn parse_time(s: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)
        .with_context(|| format!("invalid timestamp '{s}'"))?
        .with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use aurora_eval_types::{
        DatasetRecord, EvaluatorKind, MetricScore, MetricVerdict, RecordResult, RunSummary, VerdictStatus,
    };
    use serde_json::json;

    fn env() -> EnvironmentConfig {
        serde_json::from_value(json!({
            "env_id": "aurora-test-001",
            "env_version": "10.0.38",
            "agent_name": "finance-advisor-bot",
            "api_endpoint": "http://mock"
        }))
        .unwrap()
    }

    fn report() -> RunReport {
        let records = vec![
            RecordResult {
                record: DatasetRecord::with_expected(json!({"question": "vat"}), json!("20%")).id("r1"),
                actual: json!("20%"),
                error: None,
                scores: vec![
                    MetricScore::scored("Exact", 1.0, 1.0).reasoning("Strings match exactly."),
                    MetricScore::pending("Review"),
                ],
                latency_ms: Some(40),
            },
            RecordResult {
                record: DatasetRecord::new(json!("ping")),
                actual: json!(null),
                error: Some("Request to http://mock timed out".into()),
                scores: vec![],
                latency_ms: None,
            },
        ];
        let summary = RunSummary::from_records(&records);
        RunReport {
            run_id: "5d0b7c3e".into(),
            suite_name: "smoke".into(),
            environment: env(),
            records,
            verdicts: vec![MetricVerdict {
                metric: "Exact".into(),
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
        }
    }

    #[test]
    fn run_lifecycle_round_trips() {
        let store = Store::open_in_memory().unwrap();
        let id = store.begin_run("nightly", &env(), "sample_records.json").unwrap();
        assert_eq!(store.get_run(id).unwrap().unwrap().status, RunStatus::Running);

        let report = report();
        store.complete_run(id, &report).unwrap();

        let run = store.get_run(id).unwrap().unwrap();
        assert_eq!(run.status, RunStatus::Succeeded);
        assert_eq!(run.run_uuid.as_deref(), Some("5d0b7c3e"));
        assert_eq!(run.total_records, Some(2));
        assert_eq!(run.passed, Some(false));
        assert_eq!(store.get_report(id).unwrap().unwrap(), report);

        let conn = store.lock().unwrap();
        let scores: i64 = conn.query_row("SELECT COUNT(*) FROM scores", [], |r| r.get(0)).unwrap();
        assert_eq!(scores, 2);
        let pending: Option<f64> = conn
            .query_row("SELECT value FROM scores WHERE metric = 'Review'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(pending, None);
    }

    #[test]
    fn failed_runs_keep_their_error() {
        let store = Store::open_in_memory().unwrap();
        let id = store.begin_run("broken", &env(), "d.json").unwrap();
        store.fail_run(id, "Connection to http://mock failed", 12).unwrap();

        let run = store.get_run(id).unwrap().unwrap();
        assert_eq!(run.status, RunStatus::Failed);
        assert_eq!(run.error.as_deref(), Some("Connection to http://mock failed"));
        assert!(store.get_report(id).unwrap().is_none());
    }

    #[test]
    fn lists_runs_newest_first() {
        let store = Store::open_in_memory().unwrap();
        let first = store.begin_run("first", &env(), "d.json").unwrap();
        let second = store.begin_run("second", &env(), "d.json").unwrap();
        let ids: Vec<i64> = store.list_runs().unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![second, first]);
    }

    #[test]
    fn complete_unknown_run_fails() {
        let store = Store::open_in_memory().unwrap();
        assert!(store.complete_run(99, &report()).is_err());
    }

    #[test]
    fn registry_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("aurora-eval.db")).unwrap();

        store.save_environment("Aurora Test Env 001", &env()).unwrap();
        assert_eq!(store.get_environment("Aurora Test Env 001").unwrap(), Some(env()));
        assert!(store.get_environment("missing").unwrap().is_none());
        assert_eq!(store.list_environments().unwrap().len(), 1);

        store
            .save_dataset("Sample Records", Some("Default sample dataset"), Path::new("dataset/sample_records.json"))
            .unwrap();
        let ds = store.get_dataset("Sample Records").unwrap().unwrap();
        assert_eq!(ds.file_path, PathBuf::from("dataset/sample_records.json"));
        assert_eq!(store.list_datasets().unwrap().len(), 1);

        let exact = EvaluatorConfig::new("Exact Match", EvaluatorKind::LocalFunction, "exact_match").threshold(1.0);
        store.save_evaluator(&exact).unwrap();
        store.save_evaluator(&exact.clone().threshold(0.5)).unwrap();
        let evaluators = store.list_evaluators().unwrap();
        assert_eq!(evaluators.len(), 1);
        assert_eq!(evaluators[0].pass_threshold, Some(0.5));
    }

    #[test]
    fn builds_suites_from_registered_evaluators() {
        let store = Store::open_in_memory().unwrap();
        assert!(store.evaluator_suite("registered", &[]).is_err());

        store
            .save_evaluator(&EvaluatorConfig::new("Exact Match", EvaluatorKind::LocalFunction, "exact_match").threshold(1.0))
            .unwrap();
        store
            .save_evaluator(&EvaluatorConfig::new("Token F1", EvaluatorKind::LocalFunction, "f1_score").threshold(0.5))
            .unwrap();
        store
            .save_evaluator(&EvaluatorConfig::new("SME Review", EvaluatorKind::HumanPlaceholder, "finance-sme"))
            .unwrap();

        let all = store.evaluator_suite("registered", &[]).unwrap();
        assert_eq!(all.suite_name, "registered");
        assert_eq!(all.evaluators.len(), 3);
        assert_eq!(all.on_error, ErrorPolicy::Abort);
        assert_eq!(all.concurrency, 1);

        let picked = store
            .evaluator_suite("picked", &["Token F1".to_string(), "Exact Match".to_string()])
            .unwrap();
        let names: Vec<&str> = picked.evaluators.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Token F1", "Exact Match"]);
        assert_eq!(picked.evaluators[0].pass_threshold, Some(0.5));

        let err = store.evaluator_suite("picked", &["Groundedness".to_string()]).unwrap_err();
        assert!(err.to_string().contains("'Groundedness' is not registered"));
    }
}
