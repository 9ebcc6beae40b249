use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::policy::EvaluationPolicy;
use crate::scorers::exact::ExactMatchPolicy;
use crate::scorers::fill_in::FillInPolicy;
use crate::task::Task;
use crate::types::ScoreResult;

/// A task definition that cannot be run.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid task definition {}: {source}", .path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("exact_match evaluation needs a non-empty mapping")]
    EmptyMapping,

    #[error("exact_match mapping keys {first:?} and {second:?} both normalize to {normalized:?}")]
    DuplicateMappingKey {
        first: String,
        second: String,
        normalized: String,
    },

    #[error("fill_in evaluation needs at least one non-empty answer")]
    EmptyAnswers,

    #[error("task {index} selected but {available} task(s) are loaded (tasks are numbered from 1)")]
    TaskIndexOutOfRange { index: usize, available: usize },
}

/// One task file.
///
/// ```yaml
/// name: Radio Band Classification
/// prompt_template: "Which option ... Answer with the letter only."
/// evaluation:
///   method: exact_match
///   mapping: { a: 100, b: { score: 20, reason: "430 MHz is secondary" } }
///   default_reason: "unrelated answer"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskConfig {
    pub name: String,
    #[serde(default = "default_description")]
    pub description: String,
    pub prompt_template: String,
    /// Placeholder name to file path, relative to the task file. `{name}` in
    /// the template is replaced by the file's contents.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub prompt_files: BTreeMap<String, PathBuf>,
    pub evaluation: EvaluationConfig,
}

fn default_description() -> String {
    "no description".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method")]
#[serde(rename_all = "snake_case")]
pub enum EvaluationConfig {
    ExactMatch {
        mapping: BTreeMap<String, MappingEntry>,
        #[serde(default)]
        default_score: f64,
        #[serde(default = "default_reason")]
        default_reason: String,
    },
    FillIn {
        answers: Answers,
        #[serde(default = "default_fill_in_score")]
        score: f64,
        #[serde(default)]
        default_score: f64,
        #[serde(default = "default_reason")]
        default_reason: String,
    },
    LlmEval {
        standard: String,
    },
}

fn default_reason() -> String {
    "response did not match any expected option".to_string()
}

fn default_fill_in_score() -> f64 {
    100.0
}

/// A mapping value: either a bare score or a score with its own reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MappingEntry {
    Score(f64),
    Detailed {
        score: f64,
        #[serde(default)]
        reason: Option<String>,
    },
}

impl MappingEntry {
    fn into_result(self) -> ScoreResult {
        match self {
            Self::Score(score) => ScoreResult::new(score, "correct answer"),
            Self::Detailed { score, reason } => {
                ScoreResult::new(score, reason.unwrap_or_else(|| "matched expected answer".to_string()))
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answers {
    One(String),
    Many(Vec<String>),
}

impl Answers {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(answer) => vec![answer],
            Self::Many(answers) => answers,
        }
    }
}

impl EvaluationConfig {
    pub fn into_policy(self) -> Result<EvaluationPolicy, ConfigError> {
        let policy = match self {
            Self::ExactMatch {
                mapping,
                default_score,
                default_reason,
            } => EvaluationPolicy::ExactMatch(ExactMatchPolicy::new(
                mapping.into_iter().map(|(k, v)| (k, v.into_result())),
                default_score,
                default_reason,
            )?),
            Self::FillIn {
                answers,
                score,
                default_score,
                default_reason,
            } => EvaluationPolicy::FillIn(FillInPolicy::new(
                answers.into_vec(),
                score,
                default_score,
                default_reason,
            )?),
            Self::LlmEval { standard } => EvaluationPolicy::LlmJudged { standard },
        };
        Ok(policy)
    }
}

impl TaskConfig {
    pub fn from_yaml_str(path: impl Into<PathBuf>, content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(|source| ConfigError::Yaml {
            path: path.into(),
            source,
        })
    }

    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = read_file(path).await?;
        Self::from_yaml_str(path, &content)
    }

    /// Render the prompt and build the runnable task. `base_dir` resolves
    /// relative `prompt_files` entries.
    pub async fn into_task(self, category: impl Into<String>, base_dir: &Path) -> Result<Task, ConfigError> {
        let mut prompt = self.prompt_template;
        for (placeholder, file) in &self.prompt_files {
            let content = read_file(&base_dir.join(file)).await?;
            prompt = prompt.replace(&format!("{{{placeholder}}}"), &content);
        }

        Ok(Task {
            name: self.name,
            category: category.into(),
            description: self.description,
            prompt,
            policy: self.evaluation.into_policy()?,
        })
    }
}

/// Read and build the task defined at `path`.
pub async fn load_task_file(path: &Path, category: &str) -> Result<Task, ConfigError> {
    let config = TaskConfig::load(path).await?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    config.into_task(category, base_dir).await
}

async fn read_file(path: &Path) -> Result<String, ConfigError> {
    tokio::fs::read_to_string(path).await.map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}
