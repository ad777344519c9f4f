use async_trait::async_trait;
use verdict_core::{BoxError, RawResponse, ResponseSummary};

/// [`RawResponse`] over a `reqwest` response. The body is read once and kept,
/// a read failure is kept as its message and reported again on later reads.
pub struct HttpResponse {
    summary: ResponseSummary,
    inner: Option<reqwest::Response>,
    read: Option<Result<String, String>>,
}

impl HttpResponse {
    pub fn new(response: reqwest::Response) -> Self {
        Self {
            summary: ResponseSummary {
                status: Some(response.status().as_u16()),
                url: Some(response.url().to_string()),
                body: None,
            },
            inner: Some(response),
            read: None,
        }
    }
}

#[async_trait]
impl RawResponse for HttpResponse {
    async fn text(&mut self) -> Result<String, BoxError> {
        if let Some(response) = self.inner.take() {
            return match response.text().await {
                Ok(text) => {
                    self.read = Some(Ok(text.clone()));
                    Ok(text)
                },
                Err(e) => {
                    self.read = Some(Err(e.to_string()));
                    Err(e.into())
                },
            };
        }

        match &self.read {
            Some(Ok(text)) => Ok(text.clone()),
            Some(Err(e)) => Err(e.clone().into()),
            None => Err("response body could not be read".into()),
        }
    }

    fn summary(&self) -> ResponseSummary {
        ResponseSummary {
            body: self.read.as_ref().and_then(|read| read.as_ref().ok()).cloned(),
            ..self.summary.clone()
        }
    }
}
