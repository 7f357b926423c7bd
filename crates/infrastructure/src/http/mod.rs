//! HTTP infrastructure utilities.
//!
//! This module provides:
//! - Body building for every `RequestBody` kind
//! - Multipart file resolution

mod body_builder;

pub use body_builder::{BodyBuildError, BuiltBody, build_body};
