//! Extractor contract and helpers.
//!
//! An extractor narrows the `data` member of a response down to the payload the
//! caller wants. It reports "the entity does not exist" with [`Extracted::Null`]
//! and malformed data with [`ExtractError::Validation`].

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::BoxError;

/// Key holding the messages of a node in [`ValidationError::format`].
const ISSUES_KEY: &str = "_errors";

/// Value produced by an extractor.
#[derive(Debug, Clone, PartialEq)]
pub enum Extracted<K> {
    Found(K),

    /// The queried entity is `null` in the response.
    Null,

    /// The extractor produced nothing at all. This is an extractor bug.
    Missing,
}

impl<K> From<Option<K>> for Extracted<K> {
    fn from(value: Option<K>) -> Self {
        match value {
            Some(value) => Self::Found(value),
            None => Self::Null,
        }
    }
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Other(BoxError),
}

impl From<serde_json::Error> for ExtractError {
    fn from(value: serde_json::Error) -> Self {
        Self::Validation(value.into())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub path: Vec<String>,
    pub message: String,
}

/// Structured validation failure raised by an extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    issues: Vec<ValidationIssue>,
}

impl ValidationError {
    pub fn new(issues: Vec<ValidationIssue>) -> Self {
        Self { issues }
    }

    pub fn single(path: Vec<String>, message: impl Into<String>) -> Self {
        Self::new(vec![ValidationIssue {
            path,
            message: message.into(),
        }])
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    /// Issues as a tree mirroring the data: every node holds the messages
    /// reported at its path under `_errors`.
    ///
    /// `[{ path: ["shop", "name"], message: "expected a string" }]` formats to
    /// `{ "_errors": [], "shop": { "_errors": [], "name": { "_errors": ["expected a string"] } } }`.
    pub fn format(&self) -> Value {
        fn node() -> Map<String, Value> {
            let mut node = Map::new();
            node.insert(ISSUES_KEY.to_string(), Value::Array(vec![]));
            node
        }

        fn insert(tree: &mut Map<String, Value>, path: &[String], message: &str) {
            match path.split_first() {
                None => {
                    if let Some(Value::Array(messages)) = tree.get_mut(ISSUES_KEY) {
                        messages.push(Value::String(message.to_string()));
                    }
                },
                Some((segment, rest)) => {
                    let child = tree.entry(segment.clone()).or_insert_with(|| Value::Object(node()));
                    if let Value::Object(child) = child {
                        insert(child, rest, message);
                    }
                },
            }
        }

        let mut tree = node();
        for issue in &self.issues {
            insert(&mut tree, &issue.path, &issue.message);
        }

        Value::Object(tree)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self
            .issues
            .iter()
            .map(|issue| {
                if issue.path.is_empty() {
                    issue.message.clone()
                } else {
                    format!("{}: {}", issue.path.join("."), issue.message)
                }
            })
            .collect();

        write!(f, "invalid data: {}", messages.join(", "))
    }
}

impl std::error::Error for ValidationError {}

impl From<serde_json::Error> for ValidationError {
    fn from(value: serde_json::Error) -> Self {
        Self::single(vec![], value.to_string())
    }
}

fn pointer_segments(pointer: &str) -> Vec<String> {
    pointer
        .split('/')
        .skip(1)
        .map(|segment| segment.replace("~1", "/").replace("~0", "~"))
        .collect()
}

/// Extractor reading the value at a JSON pointer of `data`.
///
/// An absent pointer yields [`Extracted::Missing`], a `null` value yields
/// [`Extracted::Null`].
pub fn at<T: DeserializeOwned>(pointer: impl Into<String>) -> impl FnOnce(&Value) -> Result<Extracted<T>, ExtractError> {
    let pointer = pointer.into();

    move |data: &Value| match data.pointer(&pointer) {
        None => Ok(Extracted::Missing),
        Some(Value::Null) => Ok(Extracted::Null),
        Some(value) => T::deserialize(value)
            .map(Extracted::Found)
            .map_err(|e| ValidationError::single(pointer_segments(&pointer), e.to_string()).into()),
    }
}

/// Extractor reading a single root field of `data`.
pub fn field<T: DeserializeOwned>(name: &str) -> impl FnOnce(&Value) -> Result<Extracted<T>, ExtractError> {
    at(format!("/{}", name.replace('~', "~0").replace('/', "~1")))
}
