//! LLM-as-judge plumbing: the judge seam, the judging prompt, and the parser
//! that turns a judge's free-text reply into a [`ScoreResult`].
//!
//! The reply contract is free text: a `Score:` label followed by a number,
//! then a `Reason:` label followed by the justification. Everything about
//! that format lives in this module.

use std::sync::{Arc, OnceLock};

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use thiserror::Error;

use crate::model::ModelClient;
use crate::types::ScoreResult;

/// A secondary model that grades responses.
#[async_trait]
pub trait Judge: Send + Sync {
	/// Send a composed judging prompt, return the raw reply.
	async fn judge(&self, prompt: &str) -> Result<String>;
}

/// Uses any [`ModelClient`] as a judge.
pub struct ModelJudge {
	model: Arc<dyn ModelClient>,
}

impl ModelJudge {
	pub fn new(model: Arc<dyn ModelClient>) -> Self {
		Self { model }
	}

	pub fn model_id(&self) -> &str {
		self.model.model_id()
	}
}

#[async_trait]
impl Judge for ModelJudge {
	async fn judge(&self, prompt: &str) -> Result<String> {
		self.model.query(prompt).await
	}
}

/// Compose the prompt sent to the judge for one response.
pub fn build_judge_prompt(standard: &str, response: &str) -> String {
	format!(
		"You are a grader. Score the AI's answer against the standard below.\n\
		 \n\
		 [Grading standard]\n\
		 {standard}\n\
		 \n\
		 [AI answer]\n\
		 {response}\n\
		 \n\
		 Reply using exactly the format below and nothing else.\n\
		 \n\
		 Score: [total score out of 100]\n\
		 Reason: [brief justification for the score]\n"
	)
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum JudgeParseError {
	#[error("no `Score:` label in judge response: {raw}")]
	MissingScore { raw: String },

	#[error("no `Reason:` label in judge response: {raw}")]
	MissingReason { raw: String },

	#[error("invalid score `{token}` in judge response: {raw}")]
	InvalidScore { token: String, raw: String },
}

impl JudgeParseError {
	/// The judge reply that failed to parse, verbatim.
	pub fn raw(&self) -> &str {
		match self {
			Self::MissingScore { raw } | Self::MissingReason { raw } | Self::InvalidScore { raw, .. } => raw,
		}
	}
}

fn score_pattern() -> &'static Regex {
	static RE: OnceLock<Regex> = OnceLock::new();
	RE.get_or_init(|| Regex::new(r"Score:\s*([0-9]+(?:\.[0-9]+)?)").expect("score pattern is valid"))
}

fn reason_pattern() -> &'static Regex {
	static RE: OnceLock<Regex> = OnceLock::new();
	RE.get_or_init(|| Regex::new(r"(?s)Reason:\s*(.*)").expect("reason pattern is valid"))
}

/// Extract the score and justification from a judge reply.
///
/// The score is the first well-formed number after `Score:`, so trailing
/// punctuation (`Score: 8.5.`) or a denominator (`85/100`) is ignored. It is
/// returned exactly as stated; no rescaling happens here.
pub fn parse_judgment(raw: &str) -> Result<ScoreResult, JudgeParseError> {
	let token = score_pattern()
		.captures(raw)
		.and_then(|caps| caps.get(1))
		.map(|m| m.as_str())
		.ok_or_else(|| JudgeParseError::MissingScore { raw: raw.to_string() })?;

	let reason = reason_pattern()
		.captures(raw)
		.and_then(|caps| caps.get(1))
		.map(|m| m.as_str().trim().to_string())
		.ok_or_else(|| JudgeParseError::MissingReason { raw: raw.to_string() })?;

	let score = token
		.parse::<f64>()
		.ok()
		.filter(|s| s.is_finite())
		.ok_or_else(|| JudgeParseError::InvalidScore {
			token: token.to_string(),
			raw: raw.to_string(),
		})?;

	Ok(ScoreResult::new(score, reason))
}
