use crate::config::ConfigError;
use crate::scorers::normalize::normalize_fill_in;
use crate::types::ScoreResult;

/// Scores a response by membership in a set of accepted answers.
///
/// Matching is exact after normalization: case, quotes and one trailing
/// punctuation mark are ignored, internal whitespace is not. There is no
/// numeric tolerance.
#[derive(Debug, Clone, PartialEq)]
pub struct FillInPolicy {
	answers: Vec<String>,
	score_on_match: f64,
	default_score: f64,
	default_reason: String,
}

impl FillInPolicy {
	pub fn new<I, S>(
		answers: I,
		score_on_match: f64,
		default_score: f64,
		default_reason: impl Into<String>,
	) -> Result<Self, ConfigError>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let answers: Vec<String> = answers
			.into_iter()
			.map(|a| normalize_fill_in(a.as_ref()))
			.filter(|a| !a.is_empty())
			.collect();
		if answers.is_empty() {
			return Err(ConfigError::EmptyAnswers);
		}
		Ok(Self {
			answers,
			score_on_match,
			default_score,
			default_reason: default_reason.into(),
		})
	}

	pub fn answers(&self) -> &[String] {
		&self.answers
	}

	pub fn evaluate(&self, response: &str) -> ScoreResult {
		let normalized = normalize_fill_in(response);
		match self.answers.iter().find(|a| **a == normalized) {
			Some(answer) => ScoreResult::new(self.score_on_match, format!("matched accepted answer: {answer}")),
			None => ScoreResult::new(self.default_score, self.default_reason.clone()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn loan() -> FillInPolicy {
		FillInPolicy::new(["借贷"], 100.0, 0.0, "not the expected category").unwrap()
	}

	#[test]
	fn test_trailing_punctuation_and_padding() {
		let policy = loan();
		assert_eq!(policy.evaluate("借贷。").score, 100.0);
		assert_eq!(policy.evaluate(" 借贷 ").score, 100.0);
		assert_eq!(policy.evaluate("\"借贷\"").score, 100.0);
	}

	#[test]
	fn test_internal_whitespace_is_significant() {
		let policy = loan();
		assert_eq!(policy.evaluate("借 贷"), ScoreResult::new(0.0, "not the expected category"));
	}

	#[test]
	fn test_multiple_answers_case_insensitive() {
		let policy = FillInPolicy::new(vec!["Paris", "paris, france"], 50.0, 0.0, "wrong city").unwrap();
		let hit = policy.evaluate("PARIS!");
		assert_eq!(hit.score, 50.0);
		assert_eq!(hit.reason, "matched accepted answer: paris");
		assert_eq!(policy.evaluate("Paris, France.").score, 50.0);
		assert_eq!(policy.evaluate("Paris is the capital").score, 0.0);
	}

	#[test]
	fn test_no_numeric_tolerance() {
		let policy = FillInPolicy::new(["3.14"], 100.0, 0.0, "miss").unwrap();
		assert_eq!(policy.evaluate("3.14").score, 100.0);
		assert_eq!(policy.evaluate("3.140").score, 0.0);
	}

	#[test]
	fn test_empty_answers_rejected() {
		let none: Vec<String> = Vec::new();
		assert!(matches!(FillInPolicy::new(none, 1.0, 0.0, "x"), Err(ConfigError::EmptyAnswers)));
		assert!(matches!(FillInPolicy::new(["  "], 1.0, 0.0, "x"), Err(ConfigError::EmptyAnswers)));
	}

	#[test]
	fn test_answers_normalized_at_construction() {
		let policy = FillInPolicy::new([" 'Paris'. ", "", "借贷。"], 100.0, 0.0, "x").unwrap();
		assert_eq!(policy.answers(), ["paris", "借贷"]);
	}

	#[test]
	fn test_evaluation_is_pure() {
		let policy = loan();
		for response in ["借贷。", "其他"] {
			let first = policy.evaluate(response);
			for _ in 0..3 {
				assert_eq!(policy.evaluate(response), first);
			}
		}
	}
}
