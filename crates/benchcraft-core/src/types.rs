//! The run data model lives in `benchcraft-types` so report consumers can
//! depend on it without pulling in the runner.

pub use benchcraft_types::{
	round2, CategoryStats, RunReport, RunSummary, ScoreResult, TaskResult, DEFAULT_CATEGORY,
};
