//! The ephemeral test server.
//!
//! This module provides:
//! - [`HttpContext`], which boots a handler on a loopback port and creates
//!   chains against it
//! - [`ExchangeLog`], the server's record of what it last received

mod context;
mod exchange;

pub use context::HttpContext;
pub use exchange::{ExchangeLog, RecordedRequest};
