//! Reporting hooks for a benchmark run.
//!
//! The run loop and the dispatcher call into a [`RunObserver`] instead of a
//! process-wide logger. Every hook has an empty default so implementations
//! only override what they care about.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::task::Task;
use crate::types::{RunReport, TaskResult};

pub trait RunObserver: Send + Sync {
	fn run_started(&self, _model_id: &str, _total_tasks: usize) {}

	/// `position` is 1-based.
	fn task_started(&self, _position: usize, _total_tasks: usize, _task: &Task) {}

	fn response_received(&self, _task: &Task, _response: &str, _elapsed_seconds: f64) {}

	fn query_failed(&self, _task: &Task, _error: &str, _timed_out: bool) {}

	fn judge_replied(&self, _task: &Task, _raw_judgment: &str) {}

	fn judge_failed(&self, _task: &Task, _reason: &str) {}

	fn task_scored(&self, _result: &TaskResult) {}

	fn run_finished(&self, _report: &RunReport) {}
}

pub struct NoopObserver;

impl RunObserver for NoopObserver {}

/// Emits every hook as a `tracing` event.
pub struct TracingObserver;

impl RunObserver for TracingObserver {
	fn run_started(&self, model_id: &str, total_tasks: usize) {
		info!(model_id, total_tasks, "starting benchmark");
	}

	fn task_started(&self, position: usize, total_tasks: usize, task: &Task) {
		info!(
			position,
			total_tasks,
			task = %task.name,
			category = %task.category,
			"running task"
		);
		debug!(task = %task.name, description = %task.description, prompt = %task.prompt, "task prompt");
	}

	fn response_received(&self, task: &Task, response: &str, elapsed_seconds: f64) {
		debug!(task = %task.name, elapsed_seconds, response, "model responded");
	}

	fn query_failed(&self, task: &Task, error: &str, timed_out: bool) {
		warn!(task = %task.name, timed_out, error, "model query failed");
	}

	fn judge_replied(&self, task: &Task, raw_judgment: &str) {
		debug!(task = %task.name, raw_judgment, "judge replied");
	}

	fn judge_failed(&self, task: &Task, reason: &str) {
		warn!(task = %task.name, reason, "judging failed");
	}

	fn task_scored(&self, result: &TaskResult) {
		info!(
			task = %result.task_name,
			score = result.score,
			execution_time_seconds = result.execution_time_seconds,
			reason = %result.reason,
			"task scored"
		);
	}

	fn run_finished(&self, report: &RunReport) {
		let summary = &report.summary;
		for (category, stats) in &summary.categories {
			info!(category = %category, average = stats.average, count = stats.count, total = stats.total, "category summary");
		}
		info!(
			model_id = %summary.model_id,
			total_tasks = summary.total_tasks,
			overall_average = summary.overall_average,
			total_execution_time = summary.total_execution_time,
			total_benchmark_time = summary.total_benchmark_time,
			"benchmark finished"
		);
	}
}

/// Forwards every hook to each observer in order.
#[derive(Default)]
pub struct ObserverSet {
	observers: Vec<Arc<dyn RunObserver>>,
}

impl ObserverSet {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with(mut self, observer: Arc<dyn RunObserver>) -> Self {
		self.observers.push(observer);
		self
	}
}

impl RunObserver for ObserverSet {
	fn run_started(&self, model_id: &str, total_tasks: usize) {
		self.observers.iter().for_each(|o| o.run_started(model_id, total_tasks));
	}

	fn task_started(&self, position: usize, total_tasks: usize, task: &Task) {
		self.observers.iter().for_each(|o| o.task_started(position, total_tasks, task));
	}

	fn response_received(&self, task: &Task, response: &str, elapsed_seconds: f64) {
		self.observers.iter().for_each(|o| o.response_received(task, response, elapsed_seconds));
	}

	fn query_failed(&self, task: &Task, error: &str, timed_out: bool) {
		self.observers.iter().for_each(|o| o.query_failed(task, error, timed_out));
	}

	fn judge_replied(&self, task: &Task, raw_judgment: &str) {
		self.observers.iter().for_each(|o| o.judge_replied(task, raw_judgment));
	}

	fn judge_failed(&self, task: &Task, reason: &str) {
		self.observers.iter().for_each(|o| o.judge_failed(task, reason));
	}

	fn task_scored(&self, result: &TaskResult) {
		self.observers.iter().for_each(|o| o.task_scored(result));
	}

	fn run_finished(&self, report: &RunReport) {
		self.observers.iter().for_each(|o| o.run_finished(report));
	}
}
