use std::sync::{Mutex, PoisonError};

use crate::observer::RunObserver;
use crate::task::Task;
use crate::types::{RunReport, TaskResult};

pub fn generate_markdown_report(report: &RunReport) -> String {
    let summary = &report.summary;
    let mut out = format!(
        "# Benchmark Report: {}\n\nGenerated: {}\n\n",
        summary.model_id,
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    );

    out.push_str("| Total tasks | Overall average | Task time | Wall time |\n|---|---|---|---|\n");
    out.push_str(&format!(
        "| {} | {:.2} | {:.2}s | {:.2}s |\n",
        summary.total_tasks,
        summary.overall_average,
        summary.total_execution_time,
        summary.total_benchmark_time
    ));

    if !summary.categories.is_empty() {
        out.push_str("\n## Categories\n\n| Category | Count | Total | Average |\n|---|---|---|---|\n");
        for (name, stats) in &summary.categories {
            out.push_str(&format!(
                "| {} | {} | {:.2} | {:.2} |\n",
                md_escape(name),
                stats.count,
                stats.total,
                stats.average
            ));
        }
    }

    out.push_str("\n## Results\n\n| Task | Category | Time (s) | Score | Reason |\n|---|---|---|---|---|\n");
    for r in &report.results {
        out.push_str(&format!(
            "| {} | {} | {:.2} | {} | {} |\n",
            md_escape(&r.task_name),
            md_escape(&r.category),
            r.execution_time_seconds,
            r.score,
            md_escape(&r.reason)
        ));
    }

    out
}

/// Table cells cannot hold pipes or line breaks.
fn md_escape(s: &str) -> String {
    s.replace('|', "\\|").replace("\r\n", "<br>").replace('\n', "<br>")
}

/// Collects a human-readable markdown log of a run as it happens.
///
/// The final report is appended when the run finishes. Callers decide where
/// the text goes; see [`MarkdownLog::contents`].
#[derive(Default)]
pub struct MarkdownLog {
    buf: Mutex<String>,
}

impl MarkdownLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        self.buf.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn append(&self, text: &str) {
        self.buf
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_str(text);
    }
}

impl RunObserver for MarkdownLog {
    fn run_started(&self, model_id: &str, total_tasks: usize) {
        self.append(&format!(
            "# 🚀 Benchmark run for `{model_id}`\n\nTotal tasks to run: {total_tasks}\n\n"
        ));
    }

    fn task_started(&self, position: usize, total_tasks: usize, task: &Task) {
        self.append(&format!(
            "## Task {position}/{total_tasks}: {}\n\n- **Category:** {}\n- **Description:** {}\n\n**Prompt:**\n\n```text\n{}\n```\n\n",
            task.name,
            task.category,
            task.description,
            task.prompt.trim()
        ));
    }

    fn response_received(&self, _task: &Task, response: &str, elapsed_seconds: f64) {
        self.append(&format!(
            "**Model response** (took {elapsed_seconds:.2}s):\n\n```text\n{}\n```\n\n",
            response.trim()
        ));
    }

    fn query_failed(&self, _task: &Task, error: &str, timed_out: bool) {
        let label = if timed_out { "timed out" } else { "failed" };
        self.append(&format!("**Model query {label}:** `{error}`\n\n"));
    }

    fn judge_replied(&self, _task: &Task, raw_judgment: &str) {
        self.append(&format!("**Judge reply:**\n\n```text\n{}\n```\n\n", raw_judgment.trim()));
    }

    fn task_scored(&self, result: &TaskResult) {
        self.append(&format!(
            "📊 **Score:** {}\n\n**Reason:** {}\n\n---\n\n",
            result.score, result.reason
        ));
    }

    fn run_finished(&self, report: &RunReport) {
        self.append(&format!(
            "✅ Benchmark finished in {:.2}s.\n\n",
            report.summary.total_benchmark_time
        ));
        self.append(&generate_markdown_report(report));
    }
}
