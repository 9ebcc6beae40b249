use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tabled::Tabled;

/// Category assigned to tasks that are not grouped under a subdirectory.
pub const DEFAULT_CATEGORY: &str = "unclassified";

/// The atomic output of every evaluation path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub score: f64,
    pub reason: String,
}

impl ScoreResult {
    pub fn new(score: f64, reason: impl Into<String>) -> Self {
        Self {
            score,
            reason: reason.into(),
        }
    }

    /// A zero score carrying the reason the response could not be scored.
    pub fn zero(reason: impl Into<String>) -> Self {
        Self::new(0.0, reason)
    }
}

/// Outcome of running and scoring one task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    pub task_name: String,
    pub category: String,
    /// Model query time in seconds, rounded to two decimals.
    pub execution_time_seconds: f64,
    pub score: f64,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub average: f64,
    pub count: usize,
    pub total: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub model_id: String,
    pub total_tasks: usize,
    /// Per-category figures, keyed and ordered by category name.
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub categories: BTreeMap<String, CategoryStats>,
    pub overall_average: f64,
    /// Sum of the per-task model query times.
    pub total_execution_time: f64,
    /// Wall-clock time of the whole run, including judging.
    pub total_benchmark_time: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub results: Vec<TaskResult>,
    pub summary: RunSummary,
}

#[derive(Debug, Clone, Tabled)]
struct ResultRow {
    task: String,
    category: String,
    #[tabled(rename = "time (s)")]
    time: f64,
    score: f64,
    reason: String,
}

#[derive(Debug, Clone, Tabled)]
struct CategoryRow {
    category: String,
    count: usize,
    total: f64,
    average: f64,
}

impl RunReport {
    pub fn summarize(
        model_id: &str,
        results: &[TaskResult],
        category_aware: bool,
        wall_time_seconds: f64,
    ) -> RunSummary {
        let mut categories: BTreeMap<String, CategoryStats> = BTreeMap::new();
        if category_aware {
            for r in results {
                let stats = categories
                    .entry(r.category.clone())
                    .or_insert(CategoryStats {
                        average: 0.0,
                        count: 0,
                        total: 0.0,
                    });
                stats.count += 1;
                stats.total += r.score;
            }
            for stats in categories.values_mut() {
                stats.average = round2(stats.total / stats.count as f64);
                stats.total = round2(stats.total);
            }
        }

        let score_sum: f64 = results.iter().map(|r| r.score).sum();
        let overall_average = if results.is_empty() {
            0.0
        } else {
            round2(score_sum / results.len() as f64)
        };
        let total_execution_time = round2(results.iter().map(|r| r.execution_time_seconds).sum());

        RunSummary {
            model_id: model_id.to_string(),
            total_tasks: results.len(),
            categories,
            overall_average,
            total_execution_time,
            total_benchmark_time: round2(wall_time_seconds),
        }
    }

    pub fn summary_table(&self) -> String {
        use tabled::Table;

        let rows: Vec<ResultRow> = self
            .results
            .iter()
            .map(|r| ResultRow {
                task: r.task_name.clone(),
                category: r.category.clone(),
                time: r.execution_time_seconds,
                score: r.score,
                reason: truncate(r.reason.clone(), 64),
            })
            .collect();
        let mut out = Table::new(rows).to_string();

        if !self.summary.categories.is_empty() {
            let category_rows: Vec<CategoryRow> = self
                .summary
                .categories
                .iter()
                .map(|(name, stats)| CategoryRow {
                    category: name.clone(),
                    count: stats.count,
                    total: stats.total,
                    average: stats.average,
                })
                .collect();
            out.push_str("\n\n");
            out.push_str(&Table::new(category_rows).to_string());
        }

        let summary_text = format!(
            "Model: {}  Tasks: {}  Overall avg: {:.2}  Task time: {:.2}s  Wall time: {:.2}s",
            self.summary.model_id,
            self.summary.total_tasks,
            self.summary.overall_average,
            self.summary.total_execution_time,
            self.summary.total_benchmark_time
        );

        format!("{}\n\n{}\n", out, summary_text)
    }
}

/// Round to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn truncate(s: String, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s;
    }
    let mut truncated = s.chars().take(max_len.saturating_sub(1)).collect::<String>();
    truncated.push('…');
    truncated
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(category: &str, score: f64, time: f64) -> TaskResult {
        TaskResult {
            task_name: format!("{category}-{score}"),
            category: category.to_string(),
            execution_time_seconds: time,
            score,
            reason: "r".to_string(),
        }
    }

    #[test]
    fn test_summarize_groups_by_category() {
        let results = vec![
            result("A", 100.0, 1.25),
            result("A", 0.0, 0.5),
            result("B", 50.0, 2.0),
        ];
        let summary = RunReport::summarize("m", &results, true, 4.567);

        assert_eq!(
            summary.categories["A"],
            CategoryStats { average: 50.0, count: 2, total: 100.0 }
        );
        assert_eq!(
            summary.categories["B"],
            CategoryStats { average: 50.0, count: 1, total: 50.0 }
        );
        assert_eq!(summary.overall_average, 50.0);
        assert_eq!(summary.total_tasks, 3);
        assert_eq!(summary.total_execution_time, 3.75);
        assert_eq!(summary.total_benchmark_time, 4.57);
        let order: Vec<&str> = summary.categories.keys().map(String::as_str).collect();
        assert_eq!(order, vec!["A", "B"]);
    }

    #[test]
    fn test_summarize_rounds_averages() {
        let results = vec![result("x", 100.0, 0.0), result("x", 0.0, 0.0), result("x", 0.0, 0.0)];
        let summary = RunReport::summarize("m", &results, true, 0.0);
        assert_eq!(summary.categories["x"].average, 33.33);
        assert_eq!(summary.overall_average, 33.33);
    }

    #[test]
    fn test_summarize_without_categories() {
        let results = vec![result("A", 80.0, 0.1), result("B", 40.0, 0.1)];
        let summary = RunReport::summarize("m", &results, false, 0.2);
        assert!(summary.categories.is_empty());
        assert_eq!(summary.overall_average, 60.0);
    }

    #[test]
    fn test_summarize_empty_run() {
        let summary = RunReport::summarize("m", &[], true, 0.0);
        assert_eq!(summary.total_tasks, 0);
        assert_eq!(summary.overall_average, 0.0);
        assert!(summary.categories.is_empty());
    }

    #[test]
    fn test_summary_table_mentions_categories() {
        let results = vec![result("logic", 100.0, 1.0), result("math", 20.0, 1.0)];
        let summary = RunReport::summarize("gpt-test", &results, true, 2.0);
        let report = RunReport { results, summary };
        let table = report.summary_table();
        assert!(table.contains("logic"));
        assert!(table.contains("math"));
        assert!(table.contains("Model: gpt-test"));
        assert!(table.contains("Overall avg: 60.00"));
    }
}
