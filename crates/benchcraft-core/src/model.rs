use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

/// The model under test. Given a prompt, returns the model's text reply.
#[async_trait]
pub trait ModelClient: Send + Sync {
	/// Identifier reported in the run summary.
	fn model_id(&self) -> &str;

	async fn query(&self, prompt: &str) -> Result<String>;
}

/// Failures raised by model and judge adapters.
///
/// Messages carry the `Error:` prefix so that a stringified failure still
/// matches [`is_timeout_response`] when it travels as plain text.
#[derive(Debug, Error)]
pub enum QueryError {
	#[error("Error: request timed out after {0}s")]
	Timeout(u64),

	#[error("Error: HTTP request failed: {0}")]
	Http(String),

	#[error("Error: server returned status {status}: {body}")]
	Status { status: u16, body: String },

	#[error("Error: unexpected response format: {0}")]
	Decode(String),
}

/// True when a response text is the transport-timeout sentinel.
pub fn is_timeout_response(text: &str) -> bool {
	text.contains("Error") && text.contains("timed out")
}

/// True when a query error is a transport timeout, either typed or stringly.
pub fn is_timeout_error(err: &anyhow::Error) -> bool {
	if let Some(QueryError::Timeout(_)) = err.downcast_ref::<QueryError>() {
		return true;
	}
	is_timeout_response(&format!("{err:#}"))
}

/// Wrap an async closure as a `ModelClient`.
pub fn from_async_fn<F, Fut>(model_id: impl Into<String>, f: F) -> Arc<dyn ModelClient>
where
	F: Send + Sync + 'static + Fn(&str) -> Fut,
	Fut: Future<Output = Result<String>> + Send + 'static,
{
	struct ClosureModel<F, Fut>
	where
		F: Send + Sync + 'static + Fn(&str) -> Fut,
		Fut: Future<Output = Result<String>> + Send + 'static,
	{
		model_id: String,
		f: F,
	}

	#[async_trait]
	impl<F, Fut> ModelClient for ClosureModel<F, Fut>
	where
		F: Send + Sync + 'static + Fn(&str) -> Fut,
		Fut: Future<Output = Result<String>> + Send + 'static,
	{
		fn model_id(&self) -> &str {
			&self.model_id
		}

		async fn query(&self, prompt: &str) -> Result<String> {
			(self.f)(prompt).await
		}
	}

	Arc::new(ClosureModel { model_id: model_id.into(), f })
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_timeout_sentinel() {
		assert!(is_timeout_response("Error: HTTPConnectionPool: Read timed out. (read timeout=60)"));
		assert!(!is_timeout_response("the request timed out yesterday"));
		assert!(!is_timeout_response("Error: connection refused"));
	}

	#[test]
	fn test_timeout_error_detection() {
		let typed = anyhow::Error::new(QueryError::Timeout(60));
		assert!(is_timeout_error(&typed));

		let stringly = anyhow::anyhow!("Error: read timed out");
		assert!(is_timeout_error(&stringly));

		let other = anyhow::Error::new(QueryError::Status { status: 500, body: "boom".into() });
		assert!(!is_timeout_error(&other));
	}

	#[tokio::test]
	async fn test_from_async_fn() {
		let model = from_async_fn("echo", |prompt| {
			let prompt = prompt.to_uppercase();
			async move { Ok(prompt) }
		});
		assert_eq!(model.model_id(), "echo");
		assert_eq!(model.query("hi").await.unwrap(), "HI");
	}
}
