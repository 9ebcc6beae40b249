use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;

use crate::config::ConfigError;
use crate::judge::Judge;
use crate::model::{is_timeout_error, is_timeout_response, ModelClient};
use crate::observer::{NoopObserver, RunObserver};
use crate::policy::Dispatcher;
use crate::source::TaskSource;
use crate::task::Task;
use crate::types::{round2, RunReport, ScoreResult, TaskResult};

pub const TIMEOUT_REASON: &str = "model query timed out; response was not evaluated";

#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
	/// Run only the task at this 1-based position.
	pub single_task_index: Option<usize>,
	/// Break the summary down by category.
	pub category_aware: bool,
}

impl Default for RunOptions {
	fn default() -> Self {
		Self {
			single_task_index: None,
			category_aware: true,
		}
	}
}

pub struct BenchmarkBuilder {
	model: Option<Arc<dyn ModelClient>>,
	tasks: Option<Arc<dyn TaskSource>>,
	judge: Option<Arc<dyn Judge>>,
	observer: Arc<dyn RunObserver>,
	options: RunOptions,
}

impl BenchmarkBuilder {
	pub fn new() -> Self {
		Self {
			model: None,
			tasks: None,
			judge: None,
			observer: Arc::new(NoopObserver),
			options: RunOptions::default(),
		}
	}

	pub fn model(mut self, model: Arc<dyn ModelClient>) -> Self {
		self.model = Some(model);
		self
	}

	pub fn tasks(mut self, tasks: Arc<dyn TaskSource>) -> Self {
		self.tasks = Some(tasks);
		self
	}

	pub fn judge(mut self, judge: Arc<dyn Judge>) -> Self {
		self.judge = Some(judge);
		self
	}

	pub fn observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
		self.observer = observer;
		self
	}

	pub fn options(mut self, options: RunOptions) -> Self {
		self.options = options;
		self
	}

	/// Run only the task at this 1-based position.
	pub fn single_task(mut self, index: usize) -> Self {
		self.options.single_task_index = Some(index);
		self
	}

	pub fn category_aware(mut self, enabled: bool) -> Self {
		self.options.category_aware = enabled;
		self
	}

	pub fn build(self) -> Result<Benchmark> {
		let observer = self.observer;
		Ok(Benchmark {
			model: self.model.ok_or_else(|| anyhow::anyhow!("model must be set"))?,
			tasks: self.tasks.ok_or_else(|| anyhow::anyhow!("tasks must be set"))?,
			dispatcher: Dispatcher::new(self.judge, observer.clone()),
			observer,
			options: self.options,
		})
	}
}

impl Default for BenchmarkBuilder {
	fn default() -> Self {
		Self::new()
	}
}

/// Runs every task against the model one at a time, scores each reply, and
/// summarizes the run.
///
/// A task that times out or fails still produces a zero-score result; the
/// loop always continues to the next task.
pub struct Benchmark {
	model: Arc<dyn ModelClient>,
	tasks: Arc<dyn TaskSource>,
	dispatcher: Dispatcher,
	observer: Arc<dyn RunObserver>,
	options: RunOptions,
}

impl Benchmark {
	pub fn builder() -> BenchmarkBuilder {
		BenchmarkBuilder::new()
	}

	pub async fn run(&self) -> Result<RunReport> {
		let tasks = self.tasks.load().await?;
		let tasks = select_tasks(tasks, self.options.single_task_index)?;
		let model_id = self.model.model_id();

		let run_start = Instant::now();
		self.observer.run_started(model_id, tasks.len());

		let mut results = Vec::with_capacity(tasks.len());
		for (i, task) in tasks.iter().enumerate() {
			self.observer.task_started(i + 1, tasks.len(), task);
			let result = self.run_task(task).await;
			self.observer.task_scored(&result);
			results.push(result);
		}

		let wall_time = run_start.elapsed().as_secs_f64();
		let summary = RunReport::summarize(model_id, &results, self.options.category_aware, wall_time);
		let report = RunReport { results, summary };
		self.observer.run_finished(&report);
		Ok(report)
	}

	async fn run_task(&self, task: &Task) -> TaskResult {
		let start = Instant::now();
		let outcome = self.model.query(&task.prompt).await;
		let elapsed = round2(start.elapsed().as_secs_f64());

		let scored = match outcome {
			Ok(response) if is_timeout_response(&response) => {
				self.observer.query_failed(task, &response, true);
				ScoreResult::zero(TIMEOUT_REASON)
			}
			Ok(response) => {
				self.observer.response_received(task, &response, elapsed);
				self.dispatcher.evaluate(task, &response).await
			}
			Err(err) if is_timeout_error(&err) => {
				self.observer.query_failed(task, &format!("{err:#}"), true);
				ScoreResult::zero(TIMEOUT_REASON)
			}
			Err(err) => {
				let message = format!("{err:#}");
				self.observer.query_failed(task, &message, false);
				ScoreResult::zero(format!("model query failed: {message}"))
			}
		};

		TaskResult {
			task_name: task.name.clone(),
			category: task.category.clone(),
			execution_time_seconds: elapsed,
			score: scored.score,
			reason: scored.reason,
		}
	}
}

fn select_tasks(mut tasks: Vec<Task>, single_task_index: Option<usize>) -> Result<Vec<Task>, ConfigError> {
	let Some(index) = single_task_index else {
		return Ok(tasks);
	};
	if index == 0 || index > tasks.len() {
		return Err(ConfigError::TaskIndexOutOfRange {
			index,
			available: tasks.len(),
		});
	}
	Ok(vec![tasks.swap_remove(index - 1)])
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::policy::EvaluationPolicy;
	use crate::scorers::exact::ExactMatchPolicy;
	use crate::scorers::fill_in::FillInPolicy;
	use crate::source::VecTaskSource;
	use crate::testing::{
		assert_average_at_least, assert_category_average_at_least, ScriptedJudge, ScriptedModel, ScriptedReply,
	};

	fn choice_task(name: &str, category: &str) -> Task {
		let policy = ExactMatchPolicy::new(
			vec![
				("a".to_string(), ScoreResult::new(100.0, "correct")),
				("b".to_string(), ScoreResult::new(20.0, "half right")),
			],
			0.0,
			"wrong",
		)
		.unwrap();
		Task::new(name, format!("prompt for {name}"), EvaluationPolicy::ExactMatch(policy)).with_category(category)
	}

	fn fill_in_task(name: &str, category: &str) -> Task {
		let policy = FillInPolicy::new(["借贷"], 100.0, 0.0, "wrong category").unwrap();
		Task::new(name, format!("prompt for {name}"), EvaluationPolicy::FillIn(policy)).with_category(category)
	}

	fn judged_task(name: &str, category: &str) -> Task {
		Task::new(
			name,
			format!("prompt for {name}"),
			EvaluationPolicy::LlmJudged { standard: "be right".to_string() },
		)
		.with_category(category)
	}

	fn bench(model: Arc<ScriptedModel>, tasks: Vec<Task>) -> BenchmarkBuilder {
		Benchmark::builder().model(model).tasks(Arc::new(VecTaskSource::new(tasks)))
	}

	#[tokio::test]
	async fn test_runs_all_tasks_in_order() {
		let model = Arc::new(ScriptedModel::texts("mock", ["A", "借贷。", "b"]));
		let tasks = vec![
			choice_task("one", "radio"),
			fill_in_task("two", "finance"),
			choice_task("three", "radio"),
		];
		let report = bench(model.clone(), tasks).build().unwrap().run().await.unwrap();

		let scores: Vec<f64> = report.results.iter().map(|r| r.score).collect();
		assert_eq!(scores, vec![100.0, 100.0, 20.0]);
		assert_eq!(model.prompts(), vec!["prompt for one", "prompt for two", "prompt for three"]);
		assert_eq!(report.summary.model_id, "mock");
		assert_eq!(report.summary.total_tasks, 3);
		assert_eq!(report.summary.categories["radio"].average, 60.0);
		assert_eq!(report.summary.categories["finance"].count, 1);
		assert_eq!(report.summary.overall_average, 73.33);
		assert_category_average_at_least(&report, "finance", 100.0).unwrap();
	}

	#[tokio::test]
	async fn test_timeout_does_not_halt_run() {
		let model = Arc::new(ScriptedModel::new(
			"mock",
			vec![
				ScriptedReply::Text("A".into()),
				ScriptedReply::Timeout,
				ScriptedReply::Text("a".into()),
			],
		));
		let tasks = vec![choice_task("one", "x"), choice_task("two", "x"), choice_task("three", "y")];
		let report = bench(model, tasks).build().unwrap().run().await.unwrap();

		assert_eq!(report.results.len(), 3);
		assert_eq!(report.results[0].score, 100.0);
		assert_eq!(report.results[1].score, 0.0);
		assert_eq!(report.results[1].reason, TIMEOUT_REASON);
		assert_eq!(report.results[1].category, "x");
		assert_eq!(report.results[2].score, 100.0);
		assert_eq!(report.summary.categories["x"].average, 50.0);
	}

	#[tokio::test]
	async fn test_timeout_sentinel_text_skips_evaluation() {
		let judge = Arc::new(ScriptedJudge::replies(["Score: 100\nReason: great"]));
		let model = Arc::new(ScriptedModel::texts(
			"mock",
			["Error: HTTPConnectionPool(host='localhost'): Read timed out. (read timeout=60)"],
		));
		let report = bench(model, vec![judged_task("judged", "open")])
			.judge(judge.clone())
			.build()
			.unwrap()
			.run()
			.await
			.unwrap();

		assert_eq!(report.results[0].score, 0.0);
		assert_eq!(report.results[0].reason, TIMEOUT_REASON);
		assert!(judge.prompts().is_empty());
	}

	#[tokio::test]
	async fn test_query_error_scores_zero() {
		let model = Arc::new(ScriptedModel::new(
			"mock",
			vec![ScriptedReply::Fail("Error: server returned status 500: boom".into()), ScriptedReply::Text("a".into())],
		));
		let report = bench(model, vec![choice_task("one", "x"), choice_task("two", "x")])
			.build()
			.unwrap()
			.run()
			.await
			.unwrap();

		assert_eq!(report.results[0].score, 0.0);
		assert!(report.results[0].reason.starts_with("model query failed: "));
		assert!(report.results[0].reason.contains("500"));
		assert_eq!(report.results[1].score, 100.0);
	}

	#[tokio::test]
	async fn test_judged_task_goes_through_judge() {
		let judge = Arc::new(ScriptedJudge::replies(["Score: 70\nReason: diagonal argument"]));
		let model = Arc::new(ScriptedModel::texts("mock", ["No, the diagonal is only 5 m."]));
		let report = bench(model, vec![judged_task("stick", "reasoning")])
			.judge(judge)
			.build()
			.unwrap()
			.run()
			.await
			.unwrap();

		assert_eq!(report.results[0].score, 70.0);
		assert_eq!(report.results[0].reason, "Judge's verdict: diagonal argument");
		assert_average_at_least(&report, 70.0).unwrap();
		assert!(assert_average_at_least(&report, 70.1).is_err());
	}

	#[tokio::test]
	async fn test_single_task_mode() {
		let model = Arc::new(ScriptedModel::texts("mock", ["b"]));
		let tasks = vec![choice_task("one", "x"), choice_task("two", "y"), choice_task("three", "z")];
		let report = bench(model.clone(), tasks).single_task(2).build().unwrap().run().await.unwrap();

		assert_eq!(report.results.len(), 1);
		assert_eq!(report.results[0].task_name, "two");
		assert_eq!(report.results[0].score, 20.0);
		assert_eq!(model.prompts(), vec!["prompt for two"]);
	}

	#[tokio::test]
	async fn test_single_task_out_of_range() {
		let model = Arc::new(ScriptedModel::texts("mock", ["a"]));
		let err = bench(model.clone(), vec![choice_task("one", "x")])
			.single_task(2)
			.build()
			.unwrap()
			.run()
			.await
			.unwrap_err();

		assert!(matches!(
			err.downcast_ref::<ConfigError>(),
			Some(ConfigError::TaskIndexOutOfRange { index: 2, available: 1 })
		));
		assert!(model.prompts().is_empty());
	}

	#[tokio::test]
	async fn test_category_unaware_summary() {
		let model = Arc::new(ScriptedModel::texts("mock", ["a", "c"]));
		let report = bench(model, vec![choice_task("one", "x"), choice_task("two", "y")])
			.category_aware(false)
			.build()
			.unwrap()
			.run()
			.await
			.unwrap();

		assert!(report.summary.categories.is_empty());
		assert_eq!(report.summary.overall_average, 50.0);
	}

	#[test]
	fn test_build_requires_model_and_tasks() {
		assert!(Benchmark::builder().build().is_err());
		let model = Arc::new(ScriptedModel::texts("mock", Vec::<String>::new()));
		assert!(Benchmark::builder().model(model).build().is_err());
	}
}
