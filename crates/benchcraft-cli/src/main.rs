mod adapters;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use benchcraft_core::{
	Benchmark, Judge, MarkdownLog, ModelClient, ModelJudge, ObserverSet, RunOptions, TaskSource,
	TracingObserver, YamlDirTaskSource,
};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::adapters::{OllamaClient, OpenAiClient, OLLAMA_API_BASE, OPENAI_API_BASE};

#[derive(Debug, Parser)]
#[command(name = "benchcraft", about = "Benchmark a language model against a directory of tasks")]
struct Cli {
	/// Log at debug level (RUST_LOG overrides)
	#[arg(short, long, global = true, action = ArgAction::SetTrue)]
	verbose: bool,

	#[command(subcommand)]
	command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
	/// Run the benchmark and write a report
	Run(RunArgs),
	/// List the tasks that would run, with their 1-based positions
	List(TasksArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Adapter {
	/// OpenAI-compatible chat completions endpoint
	Openai,
	/// Local Ollama server
	Ollama,
}

#[derive(Debug, Clone, clap::Args)]
struct TasksArgs {
	/// Directory of task YAML files; subdirectories name categories
	#[arg(long, default_value = "tasks")]
	tasks_dir: PathBuf,

	/// Fail on the first malformed task file instead of skipping it
	#[arg(long, action = ArgAction::SetTrue)]
	strict: bool,
}

#[derive(Debug, Clone, clap::Args)]
struct RunArgs {
	#[command(flatten)]
	tasks: TasksArgs,

	/// Which adapter talks to the model under test
	#[arg(long, value_enum, default_value_t = Adapter::Openai)]
	adapter: Adapter,

	/// Base URL of the model API (defaults per adapter)
	#[arg(long, env = "BENCHCRAFT_API_BASE")]
	api_base: Option<String>,

	/// API key for the model under test (required for the openai adapter)
	#[arg(long, env = "BENCHCRAFT_API_KEY", hide_env_values = true)]
	api_key: Option<String>,

	/// Model identifier sent to the API
	#[arg(long, env = "BENCHCRAFT_MODEL", default_value = "gpt-4")]
	model_id: String,

	/// Base URL of the OpenAI-compatible judge API
	#[arg(long, env = "BENCHCRAFT_JUDGE_API_BASE", default_value = OPENAI_API_BASE)]
	judge_api_base: String,

	/// API key for the judge
	#[arg(long, env = "BENCHCRAFT_JUDGE_API_KEY", hide_env_values = true)]
	judge_api_key: Option<String>,

	/// Judge model identifier
	#[arg(long, env = "BENCHCRAFT_JUDGE_MODEL", default_value = "gpt-4o")]
	judge_model: String,

	/// Run without a judge; llm_eval tasks score 0
	#[arg(long, action = ArgAction::SetTrue)]
	no_judge: bool,

	/// Run only the task at this 1-based position (0 runs all)
	#[arg(long, default_value_t = 0)]
	task: usize,

	/// Report one flat average instead of per-category statistics
	#[arg(long, action = ArgAction::SetTrue)]
	no_categories: bool,

	/// Per-request timeout in seconds
	#[arg(long, default_value_t = 60)]
	timeout_secs: u64,

	/// Directory for the markdown run log
	#[arg(long, default_value = "results")]
	results_dir: PathBuf,

	/// Skip writing the markdown run log
	#[arg(long, action = ArgAction::SetTrue)]
	no_log: bool,

	/// Output JSON report to a file
	#[arg(long)]
	json_out: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();

	let default_level = if cli.verbose { "debug" } else { "info" };
	tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
		)
		.with_target(false)
		.init();

	match cli.command {
		Commands::Run(args) => run(args).await?,
		Commands::List(args) => list(args).await?,
	}
	Ok(())
}

fn task_source(args: &TasksArgs) -> Arc<dyn TaskSource> {
	Arc::new(YamlDirTaskSource::new(&args.tasks_dir).strict(args.strict))
}

fn model_client(args: &RunArgs) -> Result<Arc<dyn ModelClient>> {
	let client: Arc<dyn ModelClient> = match args.adapter {
		Adapter::Openai => {
			let Some(key) = args.api_key.as_deref().filter(|k| !k.is_empty()) else {
				bail!("--api-key (or BENCHCRAFT_API_KEY) is required for the openai adapter");
			};
			let base = args.api_base.as_deref().unwrap_or(OPENAI_API_BASE);
			Arc::new(OpenAiClient::new(base, key, &args.model_id, args.timeout_secs)?)
		}
		Adapter::Ollama => {
			let base = args.api_base.as_deref().unwrap_or(OLLAMA_API_BASE);
			Arc::new(OllamaClient::new(base, &args.model_id, args.timeout_secs)?)
		}
	};
	Ok(client)
}

fn judge(args: &RunArgs) -> Result<Option<Arc<dyn Judge>>> {
	if args.no_judge {
		return Ok(None);
	}
	let Some(key) = args.judge_api_key.as_deref().filter(|k| !k.is_empty()) else {
		bail!("--judge-api-key (or BENCHCRAFT_JUDGE_API_KEY) is required unless --no-judge is set");
	};
	let client = OpenAiClient::new(&args.judge_api_base, key, &args.judge_model, args.timeout_secs)?;
	Ok(Some(Arc::new(ModelJudge::new(Arc::new(client)))))
}

async fn run(args: RunArgs) -> Result<()> {
	let model = model_client(&args)?;
	let judge = judge(&args)?;

	let log = Arc::new(MarkdownLog::new());
	let mut observers = ObserverSet::new().with(Arc::new(TracingObserver));
	if !args.no_log {
		observers = observers.with(log.clone());
	}

	let mut builder = Benchmark::builder()
		.model(model)
		.tasks(task_source(&args.tasks))
		.observer(Arc::new(observers))
		.options(RunOptions {
			single_task_index: (args.task > 0).then_some(args.task),
			category_aware: !args.no_categories,
		});
	if let Some(judge) = judge {
		builder = builder.judge(judge);
	}
	let bench = builder.build()?;

	let report = bench.run().await?;
	println!("{}", report.summary_table());

	if !args.no_log {
		tokio::fs::create_dir_all(&args.results_dir)
			.await
			.with_context(|| format!("creating {}", args.results_dir.display()))?;
		let stamp = chrono::Local::now().format("%Y-%m-%d-%H%M%S");
		let path = args.results_dir.join(format!("{stamp}.md"));
		tokio::fs::write(&path, log.contents())
			.await
			.with_context(|| format!("writing {}", path.display()))?;
		info!(path = %path.display(), "run log written");
	}

	if let Some(path) = args.json_out {
		let json = serde_json::to_string_pretty(&report)?;
		tokio::fs::write(&path, json)
			.await
			.with_context(|| format!("writing {}", path.display()))?;
	}

	Ok(())
}

async fn list(args: TasksArgs) -> Result<()> {
	let tasks = task_source(&args).load().await?;
	if tasks.is_empty() {
		warn!(dir = %args.tasks_dir.display(), "no tasks found");
		return Ok(());
	}
	for (i, task) in tasks.iter().enumerate() {
		println!(
			"{:>3}  {:<12} {:<14} {}",
			i + 1,
			task.policy.kind(),
			task.category,
			task.name
		);
	}
	Ok(())
}
