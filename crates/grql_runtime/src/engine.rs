//! Schema entry point.
//!
//! An [`Engine`] pairs an immutable [`Schema`] with a [`ResolverMap`] and
//! executes parsed documents against them. [`Engine::execute`] handles
//! queries and mutations; subscriptions run over a [`Socket`] through
//! [`Engine::serve`], which is handed a parser so transport framing and
//! query syntax stay outside the runtime.

use std::sync::Arc;

use futures::StreamExt;
use grql_ast::{Document, OperationDefinition, OperationKind, Selection};
use grql_core::to_snake_case;
use grql_schema::Schema;
use serde_json::{Map, Value};

use crate::context::{ExecutionContext, Request, Variables};
use crate::executor::{bind_arguments, Execution};
use crate::resolver::{ResolverInfo, ResolverMap};
use crate::response::{ExecutionError, Response};
use crate::socket::{Socket, WireRequest};

const UNSUPPORTED_OPERATION: &str = "This API does not support this operation";

pub struct Engine {
    schema: Arc<Schema>,
    resolvers: Arc<ResolverMap>,
}

impl Engine {
    pub fn new(schema: Schema, resolvers: ResolverMap) -> Self {
        Self {
            schema: Arc::new(schema),
            resolvers: Arc::new(resolvers),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Executes the first operation of a parsed document. Queries and
    /// mutations only; a subscription operation here fails closed with a
    /// top-level error. A document with no operation yields an empty
    /// envelope.
    pub async fn execute(
        &self,
        document: Document,
        variables: Variables,
        request: Option<Request>,
    ) -> Response {
        let ctx = ExecutionContext::new(self.schema.clone(), document, variables, request);
        let Some(operation) = ctx.document().operations().next() else {
            return Response::empty();
        };
        if !matches!(
            operation.operation,
            OperationKind::Query | OperationKind::Mutation
        ) {
            return Response::from_error(ExecutionError::new(UNSUPPORTED_OPERATION));
        }
        let Some(root) = self.schema.root_object(operation.operation.keyword()) else {
            return Response::from_error(ExecutionError::new(UNSUPPORTED_OPERATION));
        };
        let root_name = root.name.clone();
        self.run_operation(&ctx, operation, &root_name, None).await
    }

    /// Serves one socket connection until the peer disconnects. Each
    /// received message is a serialized [`WireRequest`]; `parse` turns its
    /// query text into a document. Query and mutation requests answer with
    /// a single envelope; a subscription request streams one envelope per
    /// value yielded by its source field.
    pub async fn serve<S, P, E>(&self, mut socket: S, parse: P)
    where
        S: Socket,
        P: Fn(&str) -> Result<Document, E> + Send + Sync,
        E: std::fmt::Display,
    {
        loop {
            let message = match socket.receive().await {
                Ok(message) => message,
                Err(error) => {
                    tracing::debug!(%error, "peer disconnected");
                    let _ = socket.close().await;
                    return;
                }
            };
            let request: WireRequest = match serde_json::from_str(&message) {
                Ok(request) => request,
                Err(error) => {
                    tracing::warn!(%error, "malformed wire request");
                    let response =
                        Response::from_error(ExecutionError::new(error.to_string()));
                    if self.send(&mut socket, &response).await.is_err() {
                        return;
                    }
                    continue;
                }
            };
            let document = match parse(&request.query) {
                Ok(document) => document,
                Err(error) => {
                    let response =
                        Response::from_error(ExecutionError::new(error.to_string()));
                    if self.send(&mut socket, &response).await.is_err() {
                        return;
                    }
                    continue;
                }
            };
            let variables = request.variables.unwrap_or_default();
            if self.answer(&mut socket, document, variables).await.is_err() {
                return;
            }
        }
    }

    async fn run_operation(
        &self,
        ctx: &ExecutionContext,
        operation: &OperationDefinition,
        root_type: &str,
        root_override: Option<(String, Value)>,
    ) -> Response {
        let root_value = Value::Object(Map::new());
        let mut execution = Execution::new(ctx, &self.resolvers, root_override);
        let data = execution
            .resolve_selection_set(&operation.selections, root_type, &root_value, &[])
            .await;
        let errors = execution.errors;
        Response::new(if data.is_null() { None } else { Some(data) }, errors)
    }

    /// Runs one wire request and sends its envelope(s). `Err` means the
    /// socket went away.
    async fn answer<S: Socket>(
        &self,
        socket: &mut S,
        document: Document,
        variables: Variables,
    ) -> Result<(), ()> {
        let ctx = ExecutionContext::new(self.schema.clone(), document, variables, None);
        let Some(operation) = ctx.document().operations().next() else {
            return self.send(socket, &Response::empty()).await;
        };
        if !matches!(operation.operation, OperationKind::Subscription) {
            let Some(root) = self.schema.root_object(operation.operation.keyword()) else {
                let response =
                    Response::from_error(ExecutionError::new(UNSUPPORTED_OPERATION));
                return self.send(socket, &response).await;
            };
            let root_name = root.name.clone();
            let response = self.run_operation(&ctx, operation, &root_name, None).await;
            return self.send(socket, &response).await;
        }

        let Some(root) = self.schema.root_object("subscription") else {
            let response = Response::from_error(ExecutionError::new(UNSUPPORTED_OPERATION));
            return self.send(socket, &response).await;
        };
        let root_name = root.name.clone();

        // One streaming source per subscription: the first root field with
        // a stream resolver bound.
        let mut source = None;
        for selection in &operation.selections {
            if let Selection::Field(node) = selection {
                let snake = to_snake_case(&node.name);
                if let Some(stream_resolver) = self.resolvers.get_stream(&root_name, &snake) {
                    let field = root.fields.get(&snake);
                    source = field.map(|field| (node, field, snake, stream_resolver));
                    break;
                }
            }
        }
        let Some((node, field, snake, stream_resolver)) = source else {
            // no streaming field selected: answer once, like a query
            let response = self.run_operation(&ctx, operation, &root_name, None).await;
            return self.send(socket, &response).await;
        };

        let path = vec![node.output_name().into()];
        let args = match bind_arguments(
            node,
            field,
            &self.schema.registry,
            ctx.variables(),
            &path,
        ) {
            Ok(args) => args,
            Err(error) => {
                return self.send(socket, &Response::from_error(error)).await;
            }
        };
        let info = ResolverInfo {
            parent_type: root_name.clone(),
            field_name: snake.clone(),
            path: path.clone(),
        };
        let root_value = Value::Object(Map::new());
        let mut stream = stream_resolver.resolve(&root_value, &args, &ctx, &info);
        while let Some(item) = stream.next().await {
            match item {
                Ok(value) => {
                    let response = self
                        .run_operation(&ctx, operation, &root_name, Some((snake.clone(), value)))
                        .await;
                    self.send(socket, &response).await?;
                }
                Err(error) => {
                    tracing::error!(field = %node.name, error = %error, "subscription source failed");
                    let response = Response::from_error(
                        ExecutionError::new(error.to_string())
                            .at(node.location)
                            .with_path(path.clone()),
                    );
                    self.send(socket, &response).await?;
                    break;
                }
            }
        }
        Ok(())
    }

    async fn send<S: Socket>(&self, socket: &mut S, response: &Response) -> Result<(), ()> {
        let text = match response.to_json() {
            Ok(text) => text,
            Err(error) => {
                tracing::error!(%error, "failed to serialize response");
                return Ok(());
            }
        };
        socket.send(text).await.map_err(|error| {
            tracing::debug!(%error, "send failed, dropping connection");
        })
    }
}

impl Clone for Engine {
    fn clone(&self) -> Self {
        Self {
            schema: self.schema.clone(),
            resolvers: self.resolvers.clone(),
        }
    }
}
