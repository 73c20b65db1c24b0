//! Resolver registration and invocation.
//!
//! A [`ResolverMap`] binds `Type.field` coordinates to [`Resolver`]
//! implementations. Fields declared with parameters must have a resolver
//! bound here; plain data fields are read straight off the parent value and
//! never consult the map. Subscription sources bind a [`StreamResolver`]
//! instead, yielding a sequence of values rather than a single one.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use futures::Stream;
use grql_core::PathSegment;
use serde_json::Value;
use thiserror::Error;

use crate::context::ExecutionContext;

pub type ResolverResult = Result<Value, ResolverError>;
pub type ResolverFuture<'a> = Pin<Box<dyn Future<Output = ResolverResult> + Send + 'a>>;
pub type ResolverStream<'a> = Pin<Box<dyn Stream<Item = ResolverResult> + Send + 'a>>;

/// An error raised inside a resolver. Recovered per field: the field
/// becomes null, the error is recorded, and sibling fields keep their
/// results.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolverError {
    #[error("missing required argument `{0}`")]
    MissingArgument(String),
    #[error("argument `{name}` has an unexpected shape: {reason}")]
    ArgumentShape { name: String, reason: String },
    #[error("{0}")]
    Custom(String),
}

impl ResolverError {
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }
}

/// Coerced arguments for one resolver invocation, keyed by snake_case
/// parameter name. Defaults have already been substituted for absent
/// arguments.
#[derive(Debug, Clone, Default)]
pub struct ResolverArgs {
    values: HashMap<String, Value>,
}

impl ResolverArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// The argument value, or an error if it is absent or null.
    pub fn require(&self, name: &str) -> Result<&Value, ResolverError> {
        match self.values.get(name) {
            Some(value) if !value.is_null() => Ok(value),
            _ => Err(ResolverError::MissingArgument(name.to_string())),
        }
    }

    /// Deserializes the argument into a concrete type.
    pub fn get_as<T: serde::de::DeserializeOwned>(&self, name: &str) -> Result<T, ResolverError> {
        let value = self.require(name)?;
        serde_json::from_value(value.clone()).map_err(|e| ResolverError::ArgumentShape {
            name: name.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Where in the response tree a resolver is running.
#[derive(Debug, Clone)]
pub struct ResolverInfo {
    pub parent_type: String,
    pub field_name: String,
    pub path: Vec<PathSegment>,
}

pub trait Resolver: Send + Sync {
    fn resolve<'a>(
        &'a self,
        parent: &'a Value,
        args: &'a ResolverArgs,
        ctx: &'a ExecutionContext,
        info: &'a ResolverInfo,
    ) -> ResolverFuture<'a>;
}

pub trait StreamResolver: Send + Sync {
    fn resolve<'a>(
        &'a self,
        parent: &'a Value,
        args: &'a ResolverArgs,
        ctx: &'a ExecutionContext,
        info: &'a ResolverInfo,
    ) -> ResolverStream<'a>;
}

/// Wraps a synchronous closure. The closure runs at dispatch time, before
/// any sibling future is awaited.
pub struct FnResolver<F>(F);

impl<F> FnResolver<F>
where
    F: Fn(&Value, &ResolverArgs, &ExecutionContext, &ResolverInfo) -> ResolverResult
        + Send
        + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> Resolver for FnResolver<F>
where
    F: Fn(&Value, &ResolverArgs, &ExecutionContext, &ResolverInfo) -> ResolverResult
        + Send
        + Sync,
{
    fn resolve<'a>(
        &'a self,
        parent: &'a Value,
        args: &'a ResolverArgs,
        ctx: &'a ExecutionContext,
        info: &'a ResolverInfo,
    ) -> ResolverFuture<'a> {
        let result = (self.0)(parent, args, ctx, info);
        Box::pin(async move { result })
    }
}

/// Wraps a closure returning a boxed future borrowing its inputs.
pub struct AsyncFnResolver<F>(F);

impl<F> AsyncFnResolver<F>
where
    F: for<'a> Fn(
            &'a Value,
            &'a ResolverArgs,
            &'a ExecutionContext,
            &'a ResolverInfo,
        ) -> ResolverFuture<'a>
        + Send
        + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> Resolver for AsyncFnResolver<F>
where
    F: for<'a> Fn(
            &'a Value,
            &'a ResolverArgs,
            &'a ExecutionContext,
            &'a ResolverInfo,
        ) -> ResolverFuture<'a>
        + Send
        + Sync,
{
    fn resolve<'a>(
        &'a self,
        parent: &'a Value,
        args: &'a ResolverArgs,
        ctx: &'a ExecutionContext,
        info: &'a ResolverInfo,
    ) -> ResolverFuture<'a> {
        (self.0)(parent, args, ctx, info)
    }
}

/// Wraps a closure returning a boxed stream. One subscription field drives
/// one stream; each yielded value produces one response envelope.
pub struct StreamFnResolver<F>(F);

impl<F> StreamFnResolver<F>
where
    F: for<'a> Fn(
            &'a Value,
            &'a ResolverArgs,
            &'a ExecutionContext,
            &'a ResolverInfo,
        ) -> ResolverStream<'a>
        + Send
        + Sync,
{
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> StreamResolver for StreamFnResolver<F>
where
    F: for<'a> Fn(
            &'a Value,
            &'a ResolverArgs,
            &'a ExecutionContext,
            &'a ResolverInfo,
        ) -> ResolverStream<'a>
        + Send
        + Sync,
{
    fn resolve<'a>(
        &'a self,
        parent: &'a Value,
        args: &'a ResolverArgs,
        ctx: &'a ExecutionContext,
        info: &'a ResolverInfo,
    ) -> ResolverStream<'a> {
        (self.0)(parent, args, ctx, info)
    }
}

/// Resolver bindings keyed by `Type.field` (snake_case field name).
#[derive(Default)]
pub struct ResolverMap {
    resolvers: HashMap<String, Arc<dyn Resolver>>,
    streams: HashMap<String, Arc<dyn StreamResolver>>,
}

impl ResolverMap {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(type_name: &str, field_name: &str) -> String {
        format!("{type_name}.{field_name}")
    }

    pub fn register(
        &mut self,
        type_name: &str,
        field_name: &str,
        resolver: impl Resolver + 'static,
    ) {
        self.resolvers
            .insert(Self::key(type_name, field_name), Arc::new(resolver));
    }

    /// Registers a synchronous closure resolver.
    pub fn register_fn<F>(&mut self, type_name: &str, field_name: &str, f: F)
    where
        F: Fn(&Value, &ResolverArgs, &ExecutionContext, &ResolverInfo) -> ResolverResult
            + Send
            + Sync
            + 'static,
    {
        self.register(type_name, field_name, FnResolver::new(f));
    }

    /// Registers an async closure resolver.
    pub fn register_async<F>(&mut self, type_name: &str, field_name: &str, f: F)
    where
        F: for<'a> Fn(
                &'a Value,
                &'a ResolverArgs,
                &'a ExecutionContext,
                &'a ResolverInfo,
            ) -> ResolverFuture<'a>
            + Send
            + Sync
            + 'static,
    {
        self.register(type_name, field_name, AsyncFnResolver::new(f));
    }

    /// Registers a streaming resolver for a subscription field.
    pub fn register_stream<F>(&mut self, type_name: &str, field_name: &str, f: F)
    where
        F: for<'a> Fn(
                &'a Value,
                &'a ResolverArgs,
                &'a ExecutionContext,
                &'a ResolverInfo,
            ) -> ResolverStream<'a>
            + Send
            + Sync
            + 'static,
    {
        self.streams
            .insert(Self::key(type_name, field_name), Arc::new(StreamFnResolver::new(f)));
    }

    pub fn get(&self, type_name: &str, field_name: &str) -> Option<&dyn Resolver> {
        self.resolvers
            .get(&Self::key(type_name, field_name))
            .map(Arc::as_ref)
    }

    pub fn get_stream(&self, type_name: &str, field_name: &str) -> Option<&dyn StreamResolver> {
        self.streams
            .get(&Self::key(type_name, field_name))
            .map(Arc::as_ref)
    }

    pub fn len(&self) -> usize {
        self.resolvers.len() + self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty() && self.streams.is_empty()
    }
}

impl fmt::Debug for ResolverMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverMap")
            .field("resolvers", &self.resolvers.keys().collect::<Vec<_>>())
            .field("streams", &self.streams.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn args_require_and_deserialize() {
        let mut args = ResolverArgs::new();
        args.set("count", json!(4));
        args.set("tag", Value::Null);
        assert_eq!(args.get_as::<i64>("count").unwrap(), 4);
        assert_eq!(
            args.require("tag").unwrap_err(),
            ResolverError::MissingArgument("tag".to_string())
        );
        assert_eq!(
            args.require("absent").unwrap_err(),
            ResolverError::MissingArgument("absent".to_string())
        );
    }

    #[test]
    fn map_keys_by_type_and_field() {
        let mut map = ResolverMap::new();
        map.register_fn("Query", "ping", |_, _, _, _| Ok(json!("pong")));
        assert!(map.get("Query", "ping").is_some());
        assert!(map.get("Query", "pong").is_none());
        assert!(map.get_stream("Query", "ping").is_none());
        assert_eq!(map.len(), 1);
    }
}
