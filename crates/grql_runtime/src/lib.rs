//! Execution runtime.
//!
//! Ties a [`grql_schema::Schema`] to a [`resolver::ResolverMap`] and walks
//! query documents against it. The entry point is [`engine::Engine`]:
//! [`engine::Engine::execute`] runs queries and mutations to completion and
//! returns a [`response::Response`] envelope, while [`engine::Engine::serve`]
//! drives a long-lived [`socket::Socket`] connection and streams one envelope
//! per yielded value for subscription fields.

pub mod coerce;
pub mod context;
pub mod engine;
mod executor;
pub mod resolver;
pub mod response;
pub mod socket;

pub use coerce::{coerce_literal, coerce_variable, CoercionError};
pub use context::{ExecutionContext, Request, Variables};
pub use engine::Engine;
pub use resolver::{
    AsyncFnResolver, FnResolver, Resolver, ResolverArgs, ResolverError, ResolverFuture,
    ResolverInfo, ResolverMap, ResolverResult, ResolverStream, StreamFnResolver, StreamResolver,
};
pub use response::{ExecutionError, Response};
pub use socket::{Socket, SocketError, WireRequest};
