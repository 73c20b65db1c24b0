//! Response envelope.
//!
//! Every execution produces a [`Response`] with an `errors` member followed
//! by a `data` member. Both are always present in the serialized form: an
//! execution with no recovered errors serializes `"errors": null`, and an
//! execution whose root collapsed serializes `"data": null`.

use grql_core::{Location, PathSegment};
use serde::Serialize;
use serde_json::Value;

/// A single recorded execution error.
///
/// `locations` points at the field or argument in the request that produced
/// the error, and `path` is the response path from the root down to the
/// offending field, with list positions as integer segments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionError {
    pub message: String,
    pub locations: Option<Vec<Location>>,
    pub path: Option<Vec<PathSegment>>,
}

impl ExecutionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            locations: None,
            path: None,
        }
    }

    #[must_use]
    pub fn at(mut self, location: Location) -> Self {
        self.locations = Some(vec![location]);
        self
    }

    #[must_use]
    pub fn with_path(mut self, path: Vec<PathSegment>) -> Self {
        self.path = Some(path);
        self
    }
}

/// The execution result envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub errors: Option<Vec<ExecutionError>>,
    pub data: Option<Value>,
}

impl Response {
    /// An envelope with neither data nor errors. Returned when a document
    /// carries no executable operation.
    pub fn empty() -> Self {
        Self {
            errors: None,
            data: None,
        }
    }

    pub fn new(data: Option<Value>, errors: Vec<ExecutionError>) -> Self {
        Self {
            errors: if errors.is_empty() { None } else { Some(errors) },
            data,
        }
    }

    /// A failed-closed envelope carrying a single top-level error.
    pub fn from_error(error: ExecutionError) -> Self {
        Self {
            errors: Some(vec![error]),
            data: None,
        }
    }

    pub fn has_errors(&self) -> bool {
        self.errors.as_ref().is_some_and(|e| !e.is_empty())
    }

    /// Serializes the envelope, `errors` member first.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
