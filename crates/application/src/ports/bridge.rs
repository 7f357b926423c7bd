//! Lifecycle bridge port
//!
//! The bridge owns the server under test and the raw request call. The chain
//! engine only ever issues a request through it, and resets it before each
//! request.

use async_trait::async_trait;
use courier_domain::{OutgoingRequest, ResponseSnapshot};

/// Transport failures reported by a bridge.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BridgeError {
    /// The request URL could not be built.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The request body could not be built.
    #[error("invalid body: {0}")]
    InvalidBody(String),

    /// The server could not be reached.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The request did not complete in time.
    #[error("request timed out after {timeout_ms}ms")]
    Timeout {
        /// Configured timeout.
        timeout_ms: u64,
    },

    /// Any other transport error.
    #[error("HTTP error: {0}")]
    Other(String),
}

/// Port for issuing requests against the server under test.
#[async_trait]
pub trait LifecycleBridge: Send + Sync {
    /// Sends the request and returns the complete response.
    ///
    /// # Errors
    ///
    /// Returns a [`BridgeError`] if the exchange fails at the transport level.
    /// An error status from the server is a response, not an error.
    async fn issue_request(
        &self,
        request: OutgoingRequest,
    ) -> Result<ResponseSnapshot, BridgeError>;

    /// Clears per-exchange state. Called before every request.
    async fn reset(&self) {}

    /// Returns false once the server has been shut down. A chain reaching a
    /// request step on a closed bridge stops without an error.
    fn is_open(&self) -> bool {
        true
    }
}
