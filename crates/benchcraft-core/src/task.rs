use crate::policy::EvaluationPolicy;
use crate::types::DEFAULT_CATEGORY;

/// One benchmark question: a rendered prompt and the policy that scores
/// the model's reply to it.
#[derive(Debug, Clone)]
pub struct Task {
	pub name: String,
	pub category: String,
	pub description: String,
	pub prompt: String,
	pub policy: EvaluationPolicy,
}

impl Task {
	pub fn new(name: impl Into<String>, prompt: impl Into<String>, policy: EvaluationPolicy) -> Self {
		Self {
			name: name.into(),
			category: DEFAULT_CATEGORY.to_string(),
			description: String::new(),
			prompt: prompt.into(),
			policy,
		}
	}

	pub fn with_category(mut self, category: impl Into<String>) -> Self {
		self.category = category.into();
		self
	}

	pub fn with_description(mut self, description: impl Into<String>) -> Self {
		self.description = description.into();
		self
	}
}
