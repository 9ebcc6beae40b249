use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use anyhow::Result;
use async_trait::async_trait;

use crate::judge::Judge;
use crate::model::{ModelClient, QueryError};
use crate::types::RunReport;

/// One canned outcome for [`ScriptedModel`].
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Text(String),
    /// Fails with [`QueryError::Timeout`].
    Timeout,
    /// Fails with a non-timeout error carrying this message.
    Fail(String),
}

/// A model that replays canned replies in order and records the prompts it saw.
///
/// # Example
/// ```ignore
/// let model = Arc::new(ScriptedModel::texts("mock", ["A", "借贷"]));
/// let bench = Benchmark::builder()
///     .model(model.clone())
///     .tasks(tasks)
///     .build()?;
/// let report = bench.run().await?;
/// assert_average_at_least(&report, 80.0)?;
/// ```
pub struct ScriptedModel {
    model_id: String,
    replies: Mutex<VecDeque<ScriptedReply>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new<I>(model_id: impl Into<String>, replies: I) -> Self
    where
        I: IntoIterator<Item = ScriptedReply>,
    {
        Self {
            model_id: model_id.into(),
            replies: Mutex::new(replies.into_iter().collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn texts<I, S>(model_id: impl Into<String>, texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(model_id, texts.into_iter().map(|t| ScriptedReply::Text(t.into())))
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn query(&self, prompt: &str) -> Result<String> {
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(prompt.to_string());
        let next = self
            .replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        match next {
            Some(ScriptedReply::Text(text)) => Ok(text),
            Some(ScriptedReply::Timeout) => Err(QueryError::Timeout(60).into()),
            Some(ScriptedReply::Fail(message)) => Err(anyhow::anyhow!(message)),
            None => anyhow::bail!("scripted model has no replies left"),
        }
    }
}

/// A judge that replays canned replies, or always fails.
pub struct ScriptedJudge {
    replies: Mutex<VecDeque<String>>,
    failure: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedJudge {
    pub fn replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
            failure: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            failure: Some(message.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl Judge for ScriptedJudge {
    async fn judge(&self, prompt: &str) -> Result<String> {
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(prompt.to_string());
        if let Some(message) = &self.failure {
            anyhow::bail!("{message}");
        }
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("scripted judge has no replies left"))
    }
}

/// Helper to assert the overall average score meets a threshold.
///
/// Use this in your `#[tokio::test]` functions.
pub fn assert_average_at_least(report: &RunReport, min_average: f64) -> Result<()> {
    if report.summary.overall_average < min_average {
        anyhow::bail!(
            "Benchmark failed: overall average {:.2} is below threshold {:.2}\n{}",
            report.summary.overall_average,
            min_average,
            report.summary_table()
        );
    }
    Ok(())
}

/// Helper to assert one category's average score meets a threshold.
pub fn assert_category_average_at_least(report: &RunReport, category: &str, min_average: f64) -> Result<()> {
    let Some(stats) = report.summary.categories.get(category) else {
        anyhow::bail!(
            "Benchmark failed: no results for category {:?}\n{}",
            category,
            report.summary_table()
        );
    };
    if stats.average < min_average {
        anyhow::bail!(
            "Benchmark failed: category {:?} average {:.2} is below threshold {:.2}\n{}",
            category,
            stats.average,
            min_average,
            report.summary_table()
        );
    }
    Ok(())
}
