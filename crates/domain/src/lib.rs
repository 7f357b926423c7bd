//! Courier Domain - Core types
//!
//! This crate defines the pieces of the Courier test harness that need no
//! I/O: the response snapshot, cookie parsing and the per-chain cookie jar,
//! response assertions with their failure messages, and request bodies
//! including the multipart encoder.

pub mod assertion;
pub mod cookie;
pub mod error;
pub mod format;
pub mod multipart;
pub mod request;
pub mod response;

pub use assertion::{Assertion, BodyExpectation, CookieAssertion, HeaderExpectation};
pub use cookie::{AttributeValue, CookieJar, CookieRecord, JarUpdate};
pub use error::{AssertionError, DomainError, DomainResult};
pub use multipart::{
    DEFAULT_BOUNDARY, DEFAULT_FILE_CONTENT_TYPE, FileOptions, FormField, FormSection,
    MultipartForm, encode_sections,
};
pub use request::{HttpMethod, OutgoingRequest, RequestBody};
pub use response::ResponseSnapshot;
