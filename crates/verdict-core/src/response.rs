use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::BoxError;

/// Description of a raw response, attached as cause to failures.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Body text, if it has been read.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// Response returned by an invocation.
///
/// `text` must remain callable after `json`, implementations buffer the body.
#[async_trait]
pub trait RawResponse: Send {
    async fn text(&mut self) -> Result<String, BoxError>;

    async fn json(&mut self) -> Result<Value, BoxError> {
        let text = self.text().await?;

        Ok(serde_json::from_str(&text)?)
    }

    fn summary(&self) -> ResponseSummary;
}

/// A response whose body is already in memory.
#[derive(Debug, Clone, Default)]
pub struct BufferedResponse {
    status: Option<u16>,
    url: Option<String>,
    body: String,
}

impl BufferedResponse {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

#[async_trait]
impl RawResponse for BufferedResponse {
    async fn text(&mut self) -> Result<String, BoxError> {
        Ok(self.body.clone())
    }

    fn summary(&self) -> ResponseSummary {
        ResponseSummary {
            status: self.status,
            url: self.url.clone(),
            body: Some(self.body.clone()),
        }
    }
}

/// Invocation error carrying the body the remote returned with it.
///
/// When an invocation fails with this error, the body is reported as the
/// `response` of the resulting [`crate::Failure::Query`].
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
#[error("{message}")]
pub struct QueryError {
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl QueryError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            body: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}
