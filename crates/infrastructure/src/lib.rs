//! Courier Infrastructure - Adapters and implementations
//!
//! This crate boots the handler under test on an ephemeral port and provides
//! concrete implementations of the ports defined in the application layer.

pub mod adapters;
pub mod config;
pub mod error;
pub mod http;
pub mod server;

pub use adapters::{ReqwestBridge, SystemClock};
pub use config::{ContextConfig, DEFAULT_USER_AGENT};
pub use error::{ContextError, ContextResult};
pub use http::{BodyBuildError, BuiltBody, build_body};
pub use server::{ExchangeLog, HttpContext, RecordedRequest};
