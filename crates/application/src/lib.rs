//! Courier Application - The chain engine
//!
//! This crate runs chains of requests, header updates and assertions against
//! a server under test. The server itself sits behind the
//! [`LifecycleBridge`](ports::LifecycleBridge) port, implemented in the
//! infrastructure layer.

pub mod chain;
pub mod check;
pub mod error;
pub mod headers;
pub mod ports;

pub use chain::{Chain, ChainState, ErrorDecorator, Step};
pub use check::{Check, Inspector};
pub use error::{BoxError, ChainError, ChainResult};
pub use headers::{BoxFuture, HeaderSet, HeaderSource};
pub use ports::{BridgeError, Clock, LifecycleBridge};
