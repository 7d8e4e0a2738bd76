use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use aurora_eval_core::config::validate_suite;
use aurora_eval_core::{
	datasource, generate_html_report, load_environment, load_suite, DataSource, EnvironmentConfig, ErrorPolicy,
	Eval, EvaluatorSuite,
};
use aurora_eval_store::Store;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use tabled::{Table, Tabled};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "aurora-eval", version, about = "Run offline evaluations against Aurora environments")]
struct Cli {
	/// Increase log verbosity (-v debug, -vv trace)
	#[arg(short, long, action = ArgAction::Count, global = true)]
	verbose: u8,

	/// SQLite database holding run history and registered configs
	#[arg(long, env = "AURORA_EVAL_DB", default_value = "aurora-eval.db", global = true)]
	db: PathBuf,

	#[command(subcommand)]
	command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
	/// Evaluate a dataset against an environment and compare metrics to thresholds
	Run(RunArgs),
	/// Load and build every config without calling any endpoint
	Validate(ValidateArgs),
	/// Inspect stored runs
	#[command(subcommand)]
	Runs(RunsCommand),
	/// Register environment configs
	#[command(subcommand)]
	Envs(EnvsCommand),
	/// Register datasets
	#[command(subcommand)]
	Datasets(DatasetsCommand),
	/// Register evaluators
	#[command(subcommand)]
	Evaluators(EvaluatorsCommand),
}

#[derive(Debug, Clone, Args)]
struct RunArgs {
	/// Dataset file: JSON array of records, or JSONL
	#[arg(long, required_unless_present = "dataset_name")]
	dataset: Option<PathBuf>,

	/// Registered dataset name
	#[arg(long, conflicts_with = "dataset")]
	dataset_name: Option<String>,

	/// Environment config file
	#[arg(long, required_unless_present = "env_name")]
	env: Option<PathBuf>,

	/// Registered environment name
	#[arg(long, conflicts_with = "env")]
	env_name: Option<String>,

	/// Evaluator suite config file
	#[arg(long, required_unless_present = "evaluators")]
	suite: Option<PathBuf>,

	/// Registered evaluators to run, comma separated; every registered one when no name is given
	#[arg(long, num_args = 0.., value_delimiter = ',', conflicts_with = "suite")]
	evaluators: Option<Vec<String>>,

	/// Override the suite's error policy
	#[arg(long, value_enum)]
	on_error: Option<OnError>,

	/// Override the suite's concurrency (records in flight)
	#[arg(long)]
	concurrency: Option<usize>,

	/// Write the full JSON report to a file
	#[arg(long)]
	json_out: Option<PathBuf>,

	/// Write an HTML report to a file
	#[arg(long)]
	html_out: Option<PathBuf>,

	/// Name stored with the run
	#[arg(long)]
	name: Option<String>,

	/// Answer with canned responses instead of calling the environment
	#[arg(long, action = ArgAction::SetTrue)]
	mock: bool,
}

#[derive(Debug, Clone, Args)]
struct ValidateArgs {
	#[arg(long)]
	dataset: PathBuf,
	#[arg(long)]
	env: PathBuf,
	#[arg(long)]
	suite: PathBuf,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OnError {
	Abort,
	Skip,
}

impl From<OnError> for ErrorPolicy {
	fn from(value: OnError) -> Self {
		match value {
			OnError::Abort => ErrorPolicy::Abort,
			OnError::Skip => ErrorPolicy::Skip,
		}
	}
}

#[derive(Debug, Subcommand)]
enum RunsCommand {
	List,
	/// Print the stored report of one run
	Show {
		id: i64,
		/// Print the raw JSON report instead of tables
		#[arg(long, action = ArgAction::SetTrue)]
		json: bool,
	},
}

#[derive(Debug, Subcommand)]
enum EnvsCommand {
	Add { name: String, file: PathBuf },
	List,
}

#[derive(Debug, Subcommand)]
enum DatasetsCommand {
	Add {
		name: String,
		file: PathBuf,
		#[arg(long)]
		description: Option<String>,
	},
	List,
}

#[derive(Debug, Subcommand)]
enum EvaluatorsCommand {
	/// Register every evaluator of a suite file
	Import { file: PathBuf },
	List,
}

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();
	init_tracing(cli.verbose);

	match cli.command {
		Commands::Run(args) => run(&cli.db, args).await,
		Commands::Validate(args) => validate(args).await,
		Commands::Runs(cmd) => runs(&Store::open(&cli.db)?, cmd),
		Commands::Envs(cmd) => envs(&Store::open(&cli.db)?, cmd).await,
		Commands::Datasets(cmd) => datasets(&Store::open(&cli.db)?, cmd).await,
		Commands::Evaluators(cmd) => evaluators(&Store::open(&cli.db)?, cmd).await,
	}
}

fn init_tracing(verbose: u8) {
	let level = match verbose {
		0 => "info",
		1 => "debug",
		_ => "trace",
	};
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
		EnvFilter::new(format!("aurora_eval={level},aurora_eval_core={level},aurora_eval_cli={level}"))
	});
	tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

async fn run(db: &Path, args: RunArgs) -> Result<()> {
	let store = Store::open(db)?;

	let dataset_path = match (&args.dataset, &args.dataset_name) {
		(Some(path), _) => path.clone(),
		(None, Some(name)) => {
			store
				.get_dataset(name)?
				.with_context(|| format!("dataset '{name}' is not registered"))?
				.file_path
		}
		(None, None) => bail!("either --dataset or --dataset-name is required"),
	};

	let mut env = match (&args.env, &args.env_name) {
		(Some(path), _) => load_environment(path).await?,
		(None, Some(name)) => store
			.get_environment(name)?
			.with_context(|| format!("environment '{name}' is not registered"))?,
		(None, None) => bail!("either --env or --env-name is required"),
	};
	if args.mock {
		env.mock = true;
	}

	let suite_config = match (&args.suite, &args.evaluators) {
		(Some(path), _) => load_suite(path).await?,
		(None, Some(names)) => {
			let config = store.evaluator_suite("registered-evaluators", names)?;
			validate_suite("registered evaluators", &config)?;
			config
		}
		(None, None) => bail!("either --suite or --evaluators is required"),
	};
	let mut suite = EvaluatorSuite::from_config(&suite_config)?;
	if let Some(policy) = args.on_error {
		suite = suite.on_error(policy.into());
	}
	if let Some(n) = args.concurrency {
		if n == 0 {
			bail!("--concurrency must be at least 1");
		}
		suite = suite.concurrency(n);
	}

	let data: Arc<dyn DataSource> = Arc::from(datasource::from_path(&dataset_path));
	let run_name = args
		.name
		.clone()
		.unwrap_or_else(|| format!("{} on {}", suite.name(), env.agent_name));
	let run_id = store.begin_run(&run_name, &env, &dataset_path.display().to_string())?;
	info!(run = run_id, name = %run_name, "stored run");

	let eval = Eval::builder()
		.data_source(data)
		.environment_config(env)
		.suite(suite)
		.build()?;

	let started = Instant::now();
	let report = match eval.run().await {
		Ok(report) => report,
		Err(err) => {
			store.fail_run(run_id, &err.to_string(), started.elapsed().as_millis() as i64)?;
			return Err(err).context(format!("run {run_id} aborted"));
		}
	};
	store.complete_run(run_id, &report)?;

	println!("{}", report.summary_table());

	if let Some(path) = &args.json_out {
		let json = serde_json::to_string_pretty(&report)?;
		tokio::fs::write(path, json)
			.await
			.with_context(|| format!("failed to write {}", path.display()))?;
	}
	if let Some(path) = &args.html_out {
		tokio::fs::write(path, generate_html_report(&report))
			.await
			.with_context(|| format!("failed to write {}", path.display()))?;
	}

	if !report.passed() {
		warn!(run = run_id, errored = report.summary.errored, "evaluation failed");
		bail!("evaluation failed (run {run_id})");
	}
	info!(run = run_id, "evaluation passed");
	Ok(())
}

async fn validate(args: ValidateArgs) -> Result<()> {
	let records = datasource::from_path(&args.dataset).load().await?;
	let env = load_environment(&args.env).await?;
	let suite_config = load_suite(&args.suite).await?;
	let suite = EvaluatorSuite::from_config(&suite_config)?;

	println!("dataset:     {} ({} records)", args.dataset.display(), records.len());
	println!("environment: {} v{} agent {}", env.env_id, env.env_version, env.agent_name);
	println!("endpoint:    {}", endpoint_label(&env));
	println!("suite:       {} ({} evaluators)", suite.name(), suite.entries().len());
	for entry in suite.entries() {
		let config = entry.config();
		println!(
			"  - {} [{}] -> {} (threshold {:.2}, min pass rate {:.2})",
			config.name,
			config.kind.as_str(),
			config.target,
			config.effective_threshold(),
			config.effective_min_pass_rate()
		);
	}
	Ok(())
}

#[derive(Tabled)]
struct RunRow {
	id: i64,
	created: String,
	status: String,
	verdict: String,
	pass_rate: String,
	name: String,
	environment: String,
	agent: String,
}

#[derive(Tabled)]
struct EnvRow {
	name: String,
	env_id: String,
	version: String,
	agent: String,
	endpoint: String,
}

#[derive(Tabled)]
struct DatasetRow {
	name: String,
	file: String,
	description: String,
}

#[derive(Tabled)]
struct EvaluatorRow {
	name: String,
	#[tabled(rename = "type")]
	kind: String,
	target: String,
	threshold: String,
	min_pass_rate: String,
}

fn endpoint_label(env: &EnvironmentConfig) -> String {
	if env.mock {
		"mock".to_string()
	} else {
		env.endpoint_url()
	}
}

fn runs(store: &Store, cmd: RunsCommand) -> Result<()> {
	match cmd {
		RunsCommand::List => {
			println!("{}", runs_table(store)?);
		}
		RunsCommand::Show { id, json } => {
			let run = store.get_run(id)?.with_context(|| format!("run {id} not found"))?;
			match store.get_report(id)? {
				Some(report) if json => println!("{}", serde_json::to_string_pretty(&report)?),
				Some(report) => {
					println!("run {} '{}' ({})", run.id, run.name, report.run_id);
					println!("{}", report.summary_table());
				}
				None => println!(
					"run {} '{}' is {}: {}",
					run.id,
					run.name,
					run.status.as_str(),
					run.error.as_deref().unwrap_or("no report stored")
				),
			}
		}
	}
	Ok(())
}

async fn envs(store: &Store, cmd: EnvsCommand) -> Result<()> {
	match cmd {
		EnvsCommand::Add { name, file } => {
			let env = load_environment(&file).await?;
			store.save_environment(&name, &env)?;
			println!("registered environment '{name}' ({} / {})", env.env_id, env.agent_name);
		}
		EnvsCommand::List => {
			println!("{}", environments_table(store)?);
		}
	}
	Ok(())
}

async fn datasets(store: &Store, cmd: DatasetsCommand) -> Result<()> {
	match cmd {
		DatasetsCommand::Add { name, file, description } => {
			let records = datasource::from_path(&file).load().await?;
			store.save_dataset(&name, description.as_deref(), &file)?;
			println!("registered dataset '{name}' ({} records)", records.len());
		}
		DatasetsCommand::List => {
			println!("{}", datasets_table(store)?);
		}
	}
	Ok(())
}

async fn evaluators(store: &Store, cmd: EvaluatorsCommand) -> Result<()> {
	match cmd {
		EvaluatorsCommand::Import { file } => {
			let suite = load_suite(&file).await?;
			// Build once so unknown targets are rejected before anything is stored.
			EvaluatorSuite::from_config(&suite)?;
			for config in &suite.evaluators {
				store.save_evaluator(config)?;
			}
			println!("imported {} evaluators from '{}'", suite.evaluators.len(), suite.suite_name);
		}
		EvaluatorsCommand::List => {
			println!("{}", evaluators_table(store)?);
		}
	}
	Ok(())
}

fn runs_table(store: &Store) -> Result<String> {
	let rows: Vec<RunRow> = store
		.list_runs()?
		.into_iter()
		.map(|run| RunRow {
			id: run.id,
			created: run.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
			status: run.status.as_str().to_string(),
			verdict: match run.passed {
				Some(true) => "passed".to_string(),
				Some(false) => "failed".to_string(),
				None => "-".to_string(),
			},
			pass_rate: run.pass_rate.map(|r| format!("{:.0}%", r * 100.0)).unwrap_or_else(|| "-".into()),
			name: run.name,
			environment: run.environment,
			agent: run.agent,
		})
		.collect();
	Ok(Table::new(rows).to_string())
}

fn environments_table(store: &Store) -> Result<String> {
	let rows: Vec<EnvRow> = store
		.list_environments()?
		.into_iter()
		.map(|entry| EnvRow {
			endpoint: endpoint_label(&entry.config),
			name: entry.name,
			env_id: entry.config.env_id,
			version: entry.config.env_version,
			agent: entry.config.agent_name,
		})
		.collect();
	Ok(Table::new(rows).to_string())
}

fn datasets_table(store: &Store) -> Result<String> {
	let rows: Vec<DatasetRow> = store
		.list_datasets()?
		.into_iter()
		.map(|ds| DatasetRow {
			file: ds.file_path.display().to_string(),
			name: ds.name,
			description: ds.description.unwrap_or_default(),
		})
		.collect();
	Ok(Table::new(rows).to_string())
}

fn evaluators_table(store: &Store) -> Result<String> {
	let rows: Vec<EvaluatorRow> = store
		.list_evaluators()?
		.into_iter()
		.map(|config| EvaluatorRow {
			kind: config.kind.as_str().to_string(),
			threshold: format!("{:.2}", config.effective_threshold()),
			min_pass_rate: format!("{:.0}%", config.effective_min_pass_rate() * 100.0),
			name: config.name,
			target: config.target,
		})
		.collect();
	Ok(Table::new(rows).to_string())
}
