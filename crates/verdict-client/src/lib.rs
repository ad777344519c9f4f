use std::collections::HashMap;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client as HTTPClient, Url};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{error, instrument, warn};
use verdict_common::{measure_duration, metric};
use verdict_core::{
    handle_request, BoxError, ExtractError, Extracted, Failure, MutationContext, Outcome, QueryError, RequestContext,
};

mod response;
#[cfg(test)]
mod testing;

pub use response::HttpResponse;

macro_rules! log_if_failure {
    ($e: expr) => {{
        let result = $e;
        match &result {
            Err(e @ Failure::GraphQLUser(_)) => warn!(kind = %e.kind(), message = %e),
            Err(e @ Failure::NotFound(_)) => warn!(kind = %e.kind(), message = %e),
            Err(e) => error!(kind = %e.kind(), message = %e, context = %e.context()),
            _ => (),
        };
        result
    }};
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid url {0}")]
    URL(String),

    #[error("invalid header {0}")]
    Header(String),

    #[error(transparent)]
    HTTP(#[from] reqwest::Error),
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Configuration {
    pub endpoint: String,

    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Request timeout in seconds.
    #[serde(default = "Configuration::default_timeout")]
    pub timeout: u64,
}

impl Configuration {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            headers: HashMap::new(),
            timeout: Self::default_timeout(),
        }
    }

    fn default_timeout() -> u64 {
        10
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Operation {
    Query,
    Mutation,
}

impl Operation {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Mutation => "mutation",
        }
    }
}

/// GraphQL-over-HTTP client classifying every call with [`handle_request`].
#[derive(Clone)]
pub struct GraphQLClient {
    endpoint: Url,
    client: HTTPClient,
}

impl GraphQLClient {
    pub fn new(configuration: &Configuration) -> Result<Self, Error> {
        let endpoint = Url::parse(&configuration.endpoint).map_err(|e| Error::URL(e.to_string()))?;

        let mut headers = HeaderMap::new();
        for (name, value) in &configuration.headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| Error::Header(format!("{}: {}", name, e)))?;
            let value = HeaderValue::from_str(value).map_err(|e| Error::Header(format!("{}: {}", name, e)))?;
            headers.insert(name, value);
        }

        let client = HTTPClient::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(configuration.timeout))
            .build()?;

        Ok(Self { endpoint, client })
    }

    #[instrument(name = "graphql_query", skip_all)]
    pub async fn query<K, X>(&self, document: &str, variables: Value, extract: X) -> Outcome<K>
    where
        X: FnOnce(&Value) -> Result<Extracted<K>, ExtractError>,
    {
        log_if_failure!(self.execute(Operation::Query, document, variables, extract).await)
    }

    /// Same as [`Self::query`], transport failures are reported as [`Failure::Mutation`].
    #[instrument(name = "graphql_mutation", skip_all)]
    pub async fn mutate<K, X>(&self, document: &str, variables: Value, extract: X) -> Outcome<K>
    where
        X: FnOnce(&Value) -> Result<Extracted<K>, ExtractError>,
    {
        let result = self
            .execute(Operation::Mutation, document, variables.clone(), extract)
            .await
            .map_err(|failure| match failure {
                Failure::Query(failure) => {
                    let (message, _, cause) = failure.into_parts();
                    let mutation = Failure::mutation(
                        message,
                        MutationContext {
                            mutation: document.to_string(),
                            variables,
                        },
                    );

                    match cause {
                        Some(cause) => mutation.caused_by(cause),
                        None => mutation,
                    }
                },
                failure => failure,
            });

        log_if_failure!(result)
    }

    async fn execute<K, X>(&self, operation: Operation, document: &str, variables: Value, extract: X) -> Outcome<K>
    where
        X: FnOnce(&Value) -> Result<Extracted<K>, ExtractError>,
    {
        let context = RequestContext::new(variables);
        let payload = json!({ "query": document, "variables": context.variables });

        let (result, duration) = measure_duration!(handle_request(move || self.send(payload), extract, &context).await);

        metric!(counter[graphql_request] = 1, operation = operation.as_str());
        metric!(histogram[graphql_request_duration_milliseconds] = duration.as_millis(), operation = operation.as_str());
        metric!(on error result.as_ref().map_err(Failure::name) => counter[graphql_request_failure] = 1, operation = operation.as_str());

        result
    }

    /// A non-success status fails with a [`QueryError`] carrying the body.
    async fn send(&self, payload: Value) -> Result<HttpResponse, BoxError> {
        let response = self.client.post(self.endpoint.clone()).json(&payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            let url = response.url().to_string();
            let text = response.text().await?;
            let body = serde_json::from_str(&text).unwrap_or(Value::String(text));

            return Err(Box::new(
                QueryError::new(format!("request error url={} status={}", url, status))
                    .with_status(status.as_u16())
                    .with_body(body),
            ));
        }

        Ok(HttpResponse::new(response))
    }
}
