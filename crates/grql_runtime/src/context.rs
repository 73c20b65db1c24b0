//! Per-execution state.
//!
//! An [`ExecutionContext`] is built once per incoming request and threaded
//! explicitly through coercion and resolution. Nothing here is global; two
//! executions running concurrently never observe each other's state.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use grql_ast::{Document, FragmentDefinition};
use grql_schema::Schema;
use serde_json::Value;

/// Variable bindings supplied alongside a request.
pub type Variables = HashMap<String, Value>;

/// Opaque caller-supplied request handle, recoverable through
/// [`ExecutionContext::request`].
pub type Request = Arc<dyn Any + Send + Sync>;

/// Everything resolvers and the executor need for the duration of one
/// request: the schema, the parsed document (for fragment lookup), variable
/// bindings, and an optional opaque request handle.
pub struct ExecutionContext {
    schema: Arc<Schema>,
    document: Document,
    variables: Variables,
    request: Option<Request>,
}

impl ExecutionContext {
    pub fn new(
        schema: Arc<Schema>,
        document: Document,
        variables: Variables,
        request: Option<Request>,
    ) -> Self {
        Self {
            schema,
            document,
            variables,
            request,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    /// Looks up a named fragment definition in the executing document.
    pub fn fragment(&self, name: &str) -> Option<&FragmentDefinition> {
        self.document.fragment(name)
    }

    /// Downcasts the opaque request handle, if one was supplied and its
    /// concrete type matches.
    pub fn request<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.request.as_deref().and_then(|r| r.downcast_ref())
    }
}
