//! Classification of remote query/mutation outcomes.
//!
//! A call goes through a fixed sequence of stages, each of which may end it:
//!
//! - invocation of the caller-supplied transport function ([`Failure::Query`])
//! - parsing of the response body ([`Failure::JSONSyntax`])
//! - search for `userErrors` anywhere in the body ([`Failure::GraphQLUser`])
//! - extraction of the typed payload from `data` ([`Failure::Unexpected`], [`Failure::CorruptData`])
//! - classification of the extracted value ([`Failure::NotFound`], success)
//!
//! The entry point is [`handle_request`]. It never panics and never propagates an
//! error: every outcome comes back as an [`Outcome`].
//!
//! # Usage
//!
//! ```ignore
//! let context = RequestContext::new(json!({ "id": "gid://shop/Product/1" }));
//! let outcome: Outcome<Product> = handle_request(
//!     || client.send(document, &context.variables),
//!     extract::field("product"),
//!     &context,
//! )
//! .await;
//!
//! match outcome {
//!     Ok(product) => println!("{}", product.title),
//!     Err(Failure::NotFound(_)) => println!("no such product"),
//!     Err(failure) => eprintln!("{}", serde_json::to_string(&failure)?),
//! }
//! ```

mod error;
pub mod extract;
mod pipeline;
mod response;
mod user_errors;

pub use error::{
    Cause, ContextualError, CorruptDataContext, Failure, FailureKind, FailureRecord, JsonSyntaxContext, MutationContext,
    QueryContext, UserErrorsContext,
};
pub use extract::{ExtractError, Extracted, ValidationError, ValidationIssue};
pub use pipeline::{handle_request, RequestContext};
pub use response::{BufferedResponse, QueryError, RawResponse, ResponseSummary};
pub use user_errors::{find_user_errors, locate_user_errors, FieldPath, UserError, USER_ERRORS_KEY};

/// Type-erased error used for causes raised by collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The classified result of one call.
pub type Outcome<K> = Result<K, Failure>;
