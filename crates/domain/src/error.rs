//! Domain error types

use std::fmt;

use thiserror::Error;

use crate::format::{cookie_attribute, did_not_match_value, was_expected, was_not_expected};

/// Domain-level errors that can occur while building requests.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The HTTP method is not supported.
    #[error("unsupported HTTP method: {0}")]
    UnsupportedMethod(String),

    /// A multipart form still references files that were not loaded.
    #[error("form field {0} references a file that has not been read")]
    UnresolvedFormFile(String),
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

/// A failed assertion against the last received response.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssertionError {
    /// The status code differs from the expected one.
    StatusMismatch {
        /// Expected status code.
        expected: u16,
        /// Received status code.
        actual: u16,
        /// Body of the response, included for context.
        body: String,
    },

    /// The body differs from the expected text, pattern or structure.
    BodyMismatch {
        /// Rendered expectation.
        expected: String,
        /// Received body.
        actual: String,
    },

    /// A header with a value was expected but is missing.
    HeaderExpected {
        /// Header name as written by the caller.
        name: String,
        /// Expected value.
        expected: String,
    },

    /// A header was expected to be absent but is present.
    HeaderNotExpected {
        /// Header name as written by the caller.
        name: String,
        /// Value that was found.
        actual: String,
    },

    /// A header value differs from the expected value or pattern.
    HeaderMismatch {
        /// Header name as written by the caller.
        name: String,
        /// Rendered expectation.
        expected: String,
        /// Value found, if the header was present at all.
        actual: Option<String>,
    },

    /// A header assertion was given nothing to check against.
    NothingTested {
        /// Header name as written by the caller.
        name: String,
    },

    /// A cookie was expected in the response but was not set.
    CookieExpected {
        /// Cookie name.
        name: String,
        /// Expected value, when the assertion was on the value.
        expected: Option<String>,
    },

    /// The cookie value differs from the expected one.
    CookieMismatch {
        /// Cookie name.
        name: String,
        /// Expected value.
        expected: String,
        /// Value that was set.
        actual: String,
    },

    /// The response set a different number of cookies.
    CookieCountMismatch {
        /// Expected number of `set-cookie` values.
        expected: usize,
        /// Number received.
        actual: usize,
    },

    /// A cookie attribute was expected but is missing.
    AttributeExpected {
        /// Cookie name.
        cookie: String,
        /// Attribute name as written by the caller.
        attribute: String,
    },

    /// A cookie attribute has a different value.
    AttributeMismatch {
        /// Cookie name.
        cookie: String,
        /// Attribute name as written by the caller.
        attribute: String,
        /// Expected value.
        expected: String,
        /// Value found, `None` for a flag attribute.
        actual: Option<String>,
    },

    /// A cookie attribute was expected to be absent.
    AttributeNotExpected {
        /// Cookie name.
        cookie: String,
        /// Attribute name as written by the caller.
        attribute: String,
        /// Value found.
        actual: String,
    },
}

impl fmt::Display for AssertionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StatusMismatch {
                expected,
                actual,
                body,
            } => write!(
                f,
                "{}\n{body}",
                did_not_match_value(
                    "Status code",
                    None,
                    &expected.to_string(),
                    Some(&actual.to_string())
                )
            ),
            Self::BodyMismatch { expected, actual } => {
                f.write_str(&did_not_match_value("Body", None, expected, Some(actual)))
            }
            Self::HeaderExpected { name, expected } => {
                f.write_str(&was_expected("Header", name, Some(expected)))
            }
            Self::HeaderNotExpected { name, actual } => {
                f.write_str(&was_not_expected("Header", Some(name), actual))
            }
            Self::HeaderMismatch {
                name,
                expected,
                actual,
            } => f.write_str(&did_not_match_value(
                "Header",
                Some(name),
                expected,
                actual.as_deref(),
            )),
            Self::NothingTested { name } => write!(f, "Nothing was tested for header {name}"),
            Self::CookieExpected { name, expected } => {
                f.write_str(&was_expected("Cookie", name, expected.as_deref()))
            }
            Self::CookieMismatch {
                name,
                expected,
                actual,
            } => f.write_str(&did_not_match_value(
                "Cookie",
                Some(name),
                expected,
                Some(actual),
            )),
            Self::CookieCountMismatch { expected, actual } => {
                write!(f, "Should set cookie {expected} times, not {actual}.")
            }
            Self::AttributeExpected { cookie, attribute } => {
                write!(f, "{} was expected.", cookie_attribute(cookie, attribute))
            }
            Self::AttributeMismatch {
                cookie,
                attribute,
                expected,
                actual,
            } => f.write_str(&did_not_match_value(
                &cookie_attribute(cookie, attribute),
                None,
                expected,
                actual.as_deref(),
            )),
            Self::AttributeNotExpected {
                cookie,
                attribute,
                actual,
            } => f.write_str(&was_not_expected(
                &cookie_attribute(cookie, attribute),
                None,
                actual,
            )),
        }
    }
}
