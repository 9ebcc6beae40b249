//! benchcraft-core: a benchmark harness for language models.
//! Load tasks, query the model one task at a time, score each reply by
//! exact match, fill-in answer, or an LLM judge, then summarize by category.
//! See `examples/simple.rs` for a quickstart.

pub mod config;
pub mod judge;
pub mod model;
pub mod observer;
pub mod policy;
pub mod report;
pub mod runner;
pub mod source;
pub mod task;
pub mod testing;
pub mod types;

pub mod scorers {
	pub mod exact;
	pub mod fill_in;
	pub mod normalize;
}

pub use config::{ConfigError, EvaluationConfig, TaskConfig};
pub use judge::{build_judge_prompt, parse_judgment, Judge, JudgeParseError, ModelJudge};
pub use model::{from_async_fn, is_timeout_response, ModelClient, QueryError};
pub use observer::{NoopObserver, ObserverSet, RunObserver, TracingObserver};
pub use policy::{Dispatcher, EvaluationPolicy};
pub use report::{generate_markdown_report, MarkdownLog};
pub use runner::{Benchmark, BenchmarkBuilder, RunOptions};
pub use scorers::{exact::ExactMatchPolicy, fill_in::FillInPolicy};
pub use source::{TaskSource, VecTaskSource, YamlDirTaskSource};
pub use task::Task;
pub use types::{CategoryStats, RunReport, RunSummary, ScoreResult, TaskResult};
