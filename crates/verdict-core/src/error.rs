use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error as StdError;
use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Value};
use thiserror::Error;
use verdict_common::enum_dispatch;

use crate::response::ResponseSummary;
use crate::user_errors::UserError;
use crate::BoxError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    NotFound,
    GraphQLUser,
    CorruptData,
    JSONSyntax,
    Mutation,
    Query,
    Unexpected,
    Unclassified,
}

impl FailureKind {
    /// Name carried by the serialized record.
    pub fn name(&self) -> &'static str {
        match self {
            Self::NotFound => "NotFound",
            Self::GraphQLUser => "GraphQLUserError",
            Self::CorruptData => "CorruptDataError",
            Self::JSONSyntax => "JSONSyntaxError",
            Self::Mutation => "MutationError",
            Self::Query => "QueryError",
            Self::Unexpected => "UnexpectedError",
            Self::Unclassified => "UnclassifiedError",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a failure was caused by.
#[derive(Debug)]
pub enum Cause {
    /// An error raised by a collaborator.
    Error(BoxError),
    /// The raw response of the call.
    Response(ResponseSummary),
    /// The parsed response body.
    Body(Value),
}

impl Cause {
    fn to_json(&self) -> Value {
        match self {
            Self::Error(error) => {
                let mut sources = vec![];
                let mut source = error.source();
                while let Some(e) = source {
                    sources.push(Value::String(e.to_string()));
                    source = e.source();
                }

                json!({ "message": error.to_string(), "sources": sources })
            },
            Self::Response(summary) => serde_json::to_value(summary).unwrap_or(Value::Null),
            Self::Body(body) => body.clone(),
        }
    }
}

impl From<BoxError> for Cause {
    fn from(value: BoxError) -> Self {
        Self::Error(value)
    }
}

impl From<ResponseSummary> for Cause {
    fn from(value: ResponseSummary) -> Self {
        Self::Response(value)
    }
}

impl From<Value> for Cause {
    fn from(value: Value) -> Self {
        Self::Body(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserErrorsContext {
    #[serde(rename = "userErrors")]
    pub user_errors: Vec<UserError>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorruptDataContext {
    pub issues: Value,
    pub variables: Value,
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonSyntaxContext {
    pub json: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationContext {
    pub mutation: String,
    pub variables: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryContext {
    pub variables: Value,
    pub response: Value,

    /// Set when the detailed context could not be built.
    #[serde(rename = "innerErr", default, skip_serializing_if = "Option::is_none")]
    pub inner_err: Option<String>,
}

/// A failure message together with its kind-specific context and optional cause.
#[derive(Debug)]
pub struct ContextualError<C> {
    message: String,
    context: C,
    cause: Option<Cause>,
    backtrace: Backtrace,
}

impl<C> ContextualError<C> {
    fn new(message: impl Into<String>, context: C) -> Self {
        Self {
            message: message.into(),
            context,
            cause: None,
            backtrace: Backtrace::capture(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn cause(&self) -> Option<&Cause> {
        self.cause.as_ref()
    }

    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    /// Message, context and cause, for re-tagging a failure as another kind.
    pub fn into_parts(self) -> (String, C, Option<Cause>) {
        (self.message, self.context, self.cause)
    }
}

impl<C> fmt::Display for ContextualError<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl<C: fmt::Debug> StdError for ContextualError<C> {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match &self.cause {
            Some(Cause::Error(error)) => Some(error.as_ref()),
            _ => None,
        }
    }
}

/// The closed set of failures a call can end with.
#[derive(Error, Debug)]
pub enum Failure {
    /// The call succeeded but the queried entity does not exist. Context: the call variables.
    #[error(transparent)]
    NotFound(ContextualError<Value>),

    #[error(transparent)]
    GraphQLUser(ContextualError<UserErrorsContext>),

    #[error(transparent)]
    CorruptData(ContextualError<CorruptDataContext>),

    #[error(transparent)]
    JSONSyntax(ContextualError<JsonSyntaxContext>),

    /// Never produced by [`crate::handle_request`], callers tag mutation failures with it.
    #[error(transparent)]
    Mutation(ContextualError<MutationContext>),

    #[error(transparent)]
    Query(ContextualError<QueryContext>),

    /// Context is free-form.
    #[error(transparent)]
    Unexpected(ContextualError<Value>),

    /// Extractor failure that is not a validation error.
    #[error(transparent)]
    Unclassified(ContextualError<()>),
}

impl Failure {
    pub fn not_found(message: impl Into<String>, variables: Value) -> Self {
        Self::NotFound(ContextualError::new(message, variables))
    }

    pub fn graphql_user(message: impl Into<String>, context: UserErrorsContext) -> Self {
        Self::GraphQLUser(ContextualError::new(message, context))
    }

    pub fn corrupt_data(message: impl Into<String>, context: CorruptDataContext) -> Self {
        Self::CorruptData(ContextualError::new(message, context))
    }

    pub fn json_syntax(message: impl Into<String>, context: JsonSyntaxContext) -> Self {
        Self::JSONSyntax(ContextualError::new(message, context))
    }

    pub fn mutation(message: impl Into<String>, context: MutationContext) -> Self {
        Self::Mutation(ContextualError::new(message, context))
    }

    pub fn query(message: impl Into<String>, context: QueryContext) -> Self {
        Self::Query(ContextualError::new(message, context))
    }

    pub fn unexpected(message: impl Into<String>, context: Value) -> Self {
        Self::Unexpected(ContextualError::new(message, context))
    }

    pub fn unclassified(message: impl Into<String>) -> Self {
        Self::Unclassified(ContextualError::new(message, ()))
    }

    /// Attaches the underlying cause, replacing any previous one.
    pub fn caused_by(mut self, cause: impl Into<Cause>) -> Self {
        let cause = Some(cause.into());
        let failure = &mut self;
        enum_dispatch!(failure {
            Failure::NotFound(x) |
            Failure::GraphQLUser(x) |
            Failure::CorruptData(x) |
            Failure::JSONSyntax(x) |
            Failure::Mutation(x) |
            Failure::Query(x) |
            Failure::Unexpected(x) |
            Failure::Unclassified(x) => x.cause = cause
        });

        self
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Self::NotFound(_) => FailureKind::NotFound,
            Self::GraphQLUser(_) => FailureKind::GraphQLUser,
            Self::CorruptData(_) => FailureKind::CorruptData,
            Self::JSONSyntax(_) => FailureKind::JSONSyntax,
            Self::Mutation(_) => FailureKind::Mutation,
            Self::Query(_) => FailureKind::Query,
            Self::Unexpected(_) => FailureKind::Unexpected,
            Self::Unclassified(_) => FailureKind::Unclassified,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    pub fn message(&self) -> &str {
        enum_dispatch!(self {
            Self::NotFound(x) |
            Self::GraphQLUser(x) |
            Self::CorruptData(x) |
            Self::JSONSyntax(x) |
            Self::Mutation(x) |
            Self::Query(x) |
            Self::Unexpected(x) |
            Self::Unclassified(x) => x.message()
        })
    }

    pub fn cause(&self) -> Option<&Cause> {
        enum_dispatch!(self {
            Self::NotFound(x) |
            Self::GraphQLUser(x) |
            Self::CorruptData(x) |
            Self::JSONSyntax(x) |
            Self::Mutation(x) |
            Self::Query(x) |
            Self::Unexpected(x) |
            Self::Unclassified(x) => x.cause()
        })
    }

    /// The context rendered as JSON, in the shape fixed for the kind.
    pub fn context(&self) -> Value {
        let context = enum_dispatch!(self {
            Self::NotFound(x) |
            Self::Unexpected(x) => Ok(x.context().clone()),
            Self::GraphQLUser(x) => serde_json::to_value(x.context()),
            Self::CorruptData(x) => serde_json::to_value(x.context()),
            Self::JSONSyntax(x) => serde_json::to_value(x.context()),
            Self::Mutation(x) => serde_json::to_value(x.context()),
            Self::Query(x) => serde_json::to_value(x.context()),
            Self::Unclassified(_x) => Ok(Value::Null)
        });

        context.unwrap_or(Value::Null)
    }

    fn backtrace(&self) -> &Backtrace {
        enum_dispatch!(self {
            Self::NotFound(x) |
            Self::GraphQLUser(x) |
            Self::CorruptData(x) |
            Self::JSONSyntax(x) |
            Self::Mutation(x) |
            Self::Query(x) |
            Self::Unexpected(x) |
            Self::Unclassified(x) => x.backtrace()
        })
    }

    /// Header line followed by the trimmed backtrace frames, when captured.
    fn stack(&self) -> Vec<String> {
        let mut stack = vec![format!("{}: {}", self.name(), self.message())];

        let backtrace = self.backtrace();
        if backtrace.status() == BacktraceStatus::Captured {
            stack.extend(
                backtrace
                    .to_string()
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(String::from),
            );
        }

        stack
    }

    /// Plain record for logs and telemetry.
    pub fn to_record(&self) -> FailureRecord {
        FailureRecord {
            name: self.name(),
            message: self.message().to_string(),
            context: self.context(),
            cause: self.cause().map(Cause::to_json),
            stack: self.stack(),
        }
    }
}

impl Serialize for Failure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_record().serialize(serializer)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureRecord {
    pub name: &'static str,
    pub message: String,
    pub context: Value,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<Value>,

    pub stack: Vec<String>,
}
