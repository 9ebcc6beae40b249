use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use crate::config::ConfigError;
use crate::scorers::normalize::normalize;
use crate::types::ScoreResult;

/// Scores a response by looking its normalized form up in a fixed table.
///
/// When every key is a single character the table is treated as a
/// multiple-choice question and one letter is pulled out of the response
/// before the lookup, so `"A."`, `"Option A"` and `"选项 A"` all resolve to `a`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExactMatchPolicy {
	mapping: BTreeMap<String, ScoreResult>,
	default_score: f64,
	default_reason: String,
	choice_question: bool,
}

impl ExactMatchPolicy {
	pub fn new<I>(mapping: I, default_score: f64, default_reason: impl Into<String>) -> Result<Self, ConfigError>
	where
		I: IntoIterator<Item = (String, ScoreResult)>,
	{
		let mut table = BTreeMap::new();
		let mut sources: BTreeMap<String, String> = BTreeMap::new();
		for (key, result) in mapping {
			let normalized = normalize(&key);
			match sources.entry(normalized.clone()) {
				Entry::Occupied(first) => {
					return Err(ConfigError::DuplicateMappingKey {
						first: first.get().clone(),
						second: key,
						normalized,
					});
				}
				Entry::Vacant(slot) => {
					slot.insert(key);
				}
			}
			table.insert(normalized, result);
		}
		let mapping = table;
		if mapping.is_empty() {
			return Err(ConfigError::EmptyMapping);
		}
		let choice_question = mapping.keys().all(|k| k.chars().count() == 1);
		Ok(Self {
			mapping,
			default_score,
			default_reason: default_reason.into(),
			choice_question,
		})
	}

	pub fn mapping(&self) -> &BTreeMap<String, ScoreResult> {
		&self.mapping
	}

	pub fn is_choice_question(&self) -> bool {
		self.choice_question
	}

	pub fn evaluate(&self, response: &str) -> ScoreResult {
		let normalized = normalize(response);
		let key = if self.choice_question && !normalized.is_empty() {
			self.extract_choice(&normalized).unwrap_or(normalized)
		} else {
			normalized
		};

		match self.mapping.get(&key) {
			Some(hit) => hit.clone(),
			None => ScoreResult::new(self.default_score, self.default_reason.clone()),
		}
	}

	/// Pick the option letter out of a normalized response.
	///
	/// Prefers a standalone letter (no ASCII letter on either side) that is
	/// an option, then any option letter, in order of appearance.
	fn extract_choice(&self, normalized: &str) -> Option<String> {
		let chars: Vec<char> = normalized.chars().collect();
		let is_option = |c: char| c.is_ascii_alphabetic() && self.mapping.contains_key(c.to_string().as_str());
		let standalone = |i: usize| {
			let before = i == 0 || !chars[i - 1].is_ascii_alphabetic();
			let after = i + 1 == chars.len() || !chars[i + 1].is_ascii_alphabetic();
			before && after
		};

		chars
			.iter()
			.enumerate()
			.find(|&(i, &c)| is_option(c) && standalone(i))
			.or_else(|| chars.iter().enumerate().find(|&(_, &c)| is_option(c)))
			.map(|(_, c)| c.to_string())
	}
}
