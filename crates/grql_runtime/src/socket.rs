//! Socket transport seam.
//!
//! The runtime never owns a network connection. A long-lived peer is
//! anything implementing [`Socket`]; [`crate::Engine::serve`] drives it,
//! one JSON text frame in, one or more envelope frames out.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::context::Variables;

#[derive(Debug, Error)]
pub enum SocketError {
    /// The peer closed the connection or it was torn down underneath us.
    #[error("connection closed")]
    Closed,
    #[error("transport error: {0}")]
    Transport(String),
}

/// A bidirectional text-frame connection.
#[async_trait]
pub trait Socket: Send {
    async fn send(&mut self, text: String) -> Result<(), SocketError>;
    async fn receive(&mut self) -> Result<String, SocketError>;
    async fn close(&mut self) -> Result<(), SocketError>;
}

/// One request frame: query text plus optional variable bindings.
#[derive(Debug, Clone, Deserialize)]
pub struct WireRequest {
    pub query: String,
    #[serde(default)]
    pub variables: Option<Variables>,
}
