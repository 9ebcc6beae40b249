use std::sync::Arc;

use crate::judge::{build_judge_prompt, parse_judgment, Judge};
use crate::observer::{NoopObserver, RunObserver};
use crate::scorers::exact::ExactMatchPolicy;
use crate::scorers::fill_in::FillInPolicy;
use crate::task::Task;
use crate::types::ScoreResult;

pub const NO_JUDGE_REASON: &str = "no judge available";

/// How a task's response is scored. Adding a method means adding a variant
/// here and an arm in [`Dispatcher::evaluate`].
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationPolicy {
	ExactMatch(ExactMatchPolicy),
	FillIn(FillInPolicy),
	/// Scored by a judge model against a natural-language standard, on the
	/// judge's 0 to 100 scale.
	LlmJudged { standard: String },
}

impl EvaluationPolicy {
	pub fn kind(&self) -> &'static str {
		match self {
			Self::ExactMatch(_) => "exact_match",
			Self::FillIn(_) => "fill_in",
			Self::LlmJudged { .. } => "llm_eval",
		}
	}
}

/// Routes a response to the evaluator for its task's policy.
///
/// Every path ends in a [`ScoreResult`]: judge failures of any kind become a
/// zero score with the cause in the reason.
pub struct Dispatcher {
	judge: Option<Arc<dyn Judge>>,
	observer: Arc<dyn RunObserver>,
}

impl Dispatcher {
	pub fn new(judge: Option<Arc<dyn Judge>>, observer: Arc<dyn RunObserver>) -> Self {
		Self { judge, observer }
	}

	/// A dispatcher with no judge and no observer.
	pub fn rules_only() -> Self {
		Self::new(None, Arc::new(NoopObserver))
	}

	pub async fn evaluate(&self, task: &Task, response: &str) -> ScoreResult {
		match &task.policy {
			EvaluationPolicy::ExactMatch(policy) => policy.evaluate(response),
			EvaluationPolicy::FillIn(policy) => policy.evaluate(response),
			EvaluationPolicy::LlmJudged { standard } => self.judge_response(task, standard, response).await,
		}
	}

	async fn judge_response(&self, task: &Task, standard: &str, response: &str) -> ScoreResult {
		let Some(judge) = &self.judge else {
			self.observer.judge_failed(task, NO_JUDGE_REASON);
			return ScoreResult::zero(NO_JUDGE_REASON);
		};

		let prompt = build_judge_prompt(standard, response);
		let raw = match judge.judge(&prompt).await {
			Ok(raw) => raw,
			Err(err) => {
				let failed = ScoreResult::zero(format!("judging failed: {err:#}"));
				self.observer.judge_failed(task, &failed.reason);
				return failed;
			}
		};
		self.observer.judge_replied(task, &raw);

		match parse_judgment(&raw) {
			Ok(verdict) => ScoreResult::new(verdict.score, format!("Judge's verdict: {}", verdict.reason)),
			Err(err) => {
				let failed = ScoreResult::zero(format!("could not parse judge response: {}", err.raw()));
				self.observer.judge_failed(task, &failed.reason);
				failed
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::ScriptedJudge;

	fn judged_task() -> Task {
		Task::new(
			"Stick Through The Gate",
			"Can a 5.5 m stick pass a 4 m by 3 m gate?",
			EvaluationPolicy::LlmJudged { standard: "100 if it says lay the stick flat".to_string() },
		)
	}

	#[tokio::test]
	async fn test_routes_exact_match() {
		let policy = ExactMatchPolicy::new(vec![("a".to_string(), ScoreResult::new(100.0, "ok"))], 0.0, "miss").unwrap();
		let task = Task::new("q", "p", EvaluationPolicy::ExactMatch(policy));
		let result = Dispatcher::rules_only().evaluate(&task, "A.").await;
		assert_eq!(result, ScoreResult::new(100.0, "ok"));
	}

	#[tokio::test]
	async fn test_routes_fill_in() {
		let policy = FillInPolicy::new(["借贷"], 100.0, 0.0, "miss").unwrap();
		let task = Task::new("q", "p", EvaluationPolicy::FillIn(policy));
		let result = Dispatcher::rules_only().evaluate(&task, "借贷。").await;
		assert_eq!(result.score, 100.0);
	}

	#[tokio::test]
	async fn test_judged_without_judge_scores_zero() {
		let result = Dispatcher::rules_only().evaluate(&judged_task(), "yes").await;
		assert_eq!(result, ScoreResult::zero("no judge available"));
	}

	#[tokio::test]
	async fn test_judged_success() {
		let judge = Arc::new(ScriptedJudge::replies(["Score: 70\nReason: used the diagonal argument"]));
		let dispatcher = Dispatcher::new(Some(judge.clone()), Arc::new(NoopObserver));
		let result = dispatcher.evaluate(&judged_task(), "No, the diagonal is 5 m").await;
		assert_eq!(result, ScoreResult::new(70.0, "Judge's verdict: used the diagonal argument"));

		let prompts = judge.prompts();
		assert_eq!(prompts.len(), 1);
		assert!(prompts[0].contains("100 if it says lay the stick flat"));
		assert!(prompts[0].contains("No, the diagonal is 5 m"));
	}

	#[tokio::test]
	async fn test_judged_unparseable_reply() {
		let judge = Arc::new(ScriptedJudge::replies(["Looks fine to me."]));
		let dispatcher = Dispatcher::new(Some(judge), Arc::new(NoopObserver));
		let result = dispatcher.evaluate(&judged_task(), "yes").await;
		assert_eq!(result.score, 0.0);
		assert!(result.reason.contains("Looks fine to me."));
	}

	#[tokio::test]
	async fn test_judge_error_is_recovered() {
		let judge = Arc::new(ScriptedJudge::failing("connection reset"));
		let dispatcher = Dispatcher::new(Some(judge), Arc::new(NoopObserver));
		let result = dispatcher.evaluate(&judged_task(), "yes").await;
		assert_eq!(result, ScoreResult::zero("judging failed: connection reset"));
	}

	#[test]
	fn test_kind_names_match_config_methods() {
		assert_eq!(judged_task().policy.kind(), "llm_eval");
	}
}
