use std::error::Error as StdError;
use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{Cause, CorruptDataContext, Failure, JsonSyntaxContext, QueryContext, UserErrorsContext};
use crate::extract::{ExtractError, Extracted};
use crate::response::{QueryError, RawResponse};
use crate::user_errors::find_user_errors;
use crate::{BoxError, Outcome};

const MSG_REQUEST_FAILED: &str = "Failed to make request";
const MSG_INVALID_JSON: &str = "Could not parse JSON";
const MSG_USER_ERRORS: &str = "User errors in the response";
const MSG_UNEXPECTED_DATA: &str = "Failed to parse expected data from response";
const MSG_MISSING_EXTRACTION: &str = "Extracted data is undefined. Did you forget to return a value from the extractor function?";
const MSG_NOT_FOUND: &str = "Could not find data";
const MSG_UNCLASSIFIED: &str = "Unknown error!";

/// What the call was made with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestContext {
    pub variables: Value,
}

impl RequestContext {
    pub fn new(variables: Value) -> Self {
        Self { variables }
    }
}

/// Invokes the call, then classifies its outcome.
///
/// Stages run in order and the first one that fails decides the outcome:
/// 1. `invoke` fails: [`Failure::Query`]
/// 2. the body is not JSON: [`Failure::JSONSyntax`]
/// 3. the body contains a non-empty `userErrors`: [`Failure::GraphQLUser`], even when `data` is usable
/// 4. `data` is absent or falsy: [`Failure::Unexpected`]; `extract` reports a validation error:
///    [`Failure::CorruptData`]; any other extractor error: [`Failure::Unclassified`]
/// 5. `extract` returns [`Extracted::Missing`]: [`Failure::Unexpected`]; [`Extracted::Null`]:
///    [`Failure::NotFound`]
pub async fn handle_request<R, E, F, Fut, X, K>(invoke: F, extract: X, context: &RequestContext) -> Outcome<K>
where
    R: RawResponse,
    E: Into<BoxError>,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<R, E>>,
    X: FnOnce(&Value) -> Result<Extracted<K>, ExtractError>,
{
    let mut response = match invoke().await {
        Ok(response) => response,
        Err(error) => return Err(query_failure(&context.variables, error.into())),
    };

    let body = match response.json().await {
        Ok(body) => body,
        Err(_) => return Err(json_syntax_failure(&mut response).await),
    };

    if let Some(user_errors) = find_user_errors(&body) {
        return Err(Failure::graphql_user(MSG_USER_ERRORS, UserErrorsContext { user_errors }).caused_by(response.summary()));
    }

    let data = match body.get("data") {
        Some(data) if !is_falsy(data) => data,
        _ => {
            let text = response.text().await.unwrap_or_else(|_| body.to_string());
            return Err(Failure::unexpected(MSG_UNEXPECTED_DATA, json!({ "response": text })).caused_by(response.summary()));
        },
    };

    let extracted = match extract(data) {
        Ok(extracted) => extracted,
        Err(ExtractError::Validation(error)) => {
            let context = CorruptDataContext {
                issues: error.format(),
                variables: context.variables.clone(),
                data: data.clone(),
            };
            return Err(Failure::corrupt_data(MSG_UNEXPECTED_DATA, context).caused_by(response.summary()));
        },
        // TODO: give extractor errors that are not validation errors their own kind
        Err(ExtractError::Other(error)) => return Err(Failure::unclassified(MSG_UNCLASSIFIED).caused_by(error)),
    };

    match extracted {
        Extracted::Found(value) => Ok(value),
        Extracted::Null => Err(Failure::not_found(MSG_NOT_FOUND, context.variables.clone()).caused_by(response.summary())),
        Extracted::Missing => Err(Failure::unexpected(MSG_MISSING_EXTRACTION, json!({})).caused_by(Cause::Body(body))),
    }
}

fn query_failure(variables: &Value, error: BoxError) -> Failure {
    let context = query_context(variables, error.as_ref());
    query_failure_with_context(variables, error, context)
}

/// Falls back to the minimal context, with the reason under `innerErr`, when the detailed one failed.
fn query_failure_with_context(variables: &Value, error: BoxError, context: Result<QueryContext, serde_json::Error>) -> Failure {
    let context = context.unwrap_or_else(|inner| QueryContext {
        variables: variables.clone(),
        response: Value::String(error.to_string()),
        inner_err: Some(inner.to_string()),
    });

    Failure::query(MSG_REQUEST_FAILED, context).caused_by(error)
}

/// The body carried by a [`QueryError`] is preferred over the error itself.
fn query_context(variables: &Value, error: &(dyn StdError + Send + Sync + 'static)) -> Result<QueryContext, serde_json::Error> {
    let response = match error.downcast_ref::<QueryError>() {
        Some(QueryError { body: Some(body), .. }) => body.clone(),
        Some(query_error) => Value::String(serde_json::to_string(query_error)?),
        None => Value::String(error.to_string()),
    };

    Ok(QueryContext {
        variables: variables.clone(),
        response,
        inner_err: None,
    })
}

async fn json_syntax_failure<R: RawResponse>(response: &mut R) -> Failure {
    match response.text().await {
        Ok(json) => Failure::json_syntax(MSG_INVALID_JSON, JsonSyntaxContext { json }).caused_by(response.summary()),
        Err(error) => Failure::json_syntax(MSG_INVALID_JSON, JsonSyntaxContext { json: String::new() }).caused_by(error),
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}
