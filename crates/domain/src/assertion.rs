//! Response assertions.
//!
//! An [`Assertion`] checks the status code (optionally with the body) or a
//! single header of a [`ResponseSnapshot`]. A [`CookieAssertion`] checks the
//! cookies the response set. Both report failures as [`AssertionError`].

use std::fmt;

use regex::Regex;

use crate::cookie::{AttributeValue, CookieRecord};
use crate::error::AssertionError;
use crate::response::ResponseSnapshot;

/// What the body of a response should look like.
#[derive(Debug, Clone)]
pub enum BodyExpectation {
    /// Exact text equality.
    Equals(String),
    /// The body matches the pattern.
    Matches(Regex),
    /// The body parses as JSON equal to this value.
    Json(serde_json::Value),
}

impl fmt::Display for BodyExpectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equals(text) => f.write_str(text),
            Self::Matches(pattern) => write!(f, "/{pattern}/"),
            Self::Json(value) => {
                let pretty = serde_json::to_string_pretty(value).map_err(|_| fmt::Error)?;
                f.write_str(&pretty)
            }
        }
    }
}

impl From<&str> for BodyExpectation {
    fn from(text: &str) -> Self {
        Self::Equals(text.to_string())
    }
}

impl From<String> for BodyExpectation {
    fn from(text: String) -> Self {
        Self::Equals(text)
    }
}

impl From<Regex> for BodyExpectation {
    fn from(pattern: Regex) -> Self {
        Self::Matches(pattern)
    }
}

impl From<serde_json::Value> for BodyExpectation {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

/// What a header of a response should look like.
#[derive(Debug, Clone)]
pub enum HeaderExpectation {
    /// The header is present with exactly this value.
    Equals(String),
    /// The header is present and its value matches the pattern.
    Matches(Regex),
    /// The header is not present.
    Absent,
}

impl From<&str> for HeaderExpectation {
    fn from(value: &str) -> Self {
        Self::Equals(value.to_string())
    }
}

impl From<String> for HeaderExpectation {
    fn from(value: String) -> Self {
        Self::Equals(value)
    }
}

impl From<Regex> for HeaderExpectation {
    fn from(pattern: Regex) -> Self {
        Self::Matches(pattern)
    }
}

/// A single check against the last received response.
#[derive(Debug, Clone)]
pub enum Assertion {
    /// Check the status code, then the body when an expectation is given.
    Status {
        /// Expected status code.
        code: u16,
        /// Optional body expectation.
        body: Option<BodyExpectation>,
    },
    /// Check a header, looked up case-insensitively.
    Header {
        /// Header name.
        name: String,
        /// What to check; `None` is itself a failure.
        expectation: Option<HeaderExpectation>,
    },
}

impl Assertion {
    /// Run the assertion against a response.
    ///
    /// # Errors
    ///
    /// Returns the [`AssertionError`] describing the first mismatch.
    pub fn check(&self, response: &ResponseSnapshot) -> Result<(), AssertionError> {
        match self {
            Self::Status { code, body } => check_status(response, *code, body.as_ref()),
            Self::Header { name, expectation } => {
                check_header(response, name, expectation.as_ref())
            }
        }
    }
}

fn check_status(
    response: &ResponseSnapshot,
    code: u16,
    body: Option<&BodyExpectation>,
) -> Result<(), AssertionError> {
    if response.status != code {
        return Err(AssertionError::StatusMismatch {
            expected: code,
            actual: response.status,
            body: response.body.clone(),
        });
    }
    let Some(expectation) = body else {
        return Ok(());
    };

    let matched = match expectation {
        BodyExpectation::Equals(text) => response.body == *text,
        BodyExpectation::Matches(pattern) => pattern.is_match(&response.body),
        BodyExpectation::Json(value) => response.json().is_ok_and(|actual| actual == *value),
    };
    if matched {
        Ok(())
    } else {
        Err(AssertionError::BodyMismatch {
            expected: expectation.to_string(),
            actual: response.body.clone(),
        })
    }
}

fn check_header(
    response: &ResponseSnapshot,
    name: &str,
    expectation: Option<&HeaderExpectation>,
) -> Result<(), AssertionError> {
    let actual = response.header(name);
    match (expectation, actual) {
        (None, _) => Err(AssertionError::NothingTested {
            name: name.to_string(),
        }),
        (Some(HeaderExpectation::Absent), None) => Ok(()),
        (Some(HeaderExpectation::Absent), Some(actual)) => {
            Err(AssertionError::HeaderNotExpected {
                name: name.to_string(),
                actual: actual.into_owned(),
            })
        }
        (Some(HeaderExpectation::Matches(pattern)), actual) => {
            if actual.as_deref().is_some_and(|v| pattern.is_match(v)) {
                Ok(())
            } else {
                Err(AssertionError::HeaderMismatch {
                    name: name.to_string(),
                    expected: format!("/{pattern}/"),
                    actual: actual.map(std::borrow::Cow::into_owned),
                })
            }
        }
        (Some(HeaderExpectation::Equals(expected)), None) => Err(AssertionError::HeaderExpected {
            name: name.to_string(),
            expected: expected.clone(),
        }),
        (Some(HeaderExpectation::Equals(expected)), Some(actual)) => {
            if actual == expected.as_str() {
                Ok(())
            } else {
                Err(AssertionError::HeaderMismatch {
                    name: name.to_string(),
                    expected: expected.clone(),
                    actual: Some(actual.into_owned()),
                })
            }
        }
    }
}

/// A check on the cookies set by the last received response.
///
/// These read the response's `set-cookie` headers directly and work whether
/// or not session tracking is on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieAssertion {
    /// The response set exactly this many cookies.
    Count(usize),
    /// The response set a cookie with this name.
    Name {
        /// Cookie name.
        name: String,
    },
    /// The named cookie was set to this value.
    Value {
        /// Cookie name.
        name: String,
        /// Expected value.
        value: String,
    },
    /// The named cookie carries the attribute.
    Attribute {
        /// Cookie name.
        name: String,
        /// Attribute name, case-insensitive.
        attribute: String,
    },
    /// The named cookie carries the attribute with this value.
    AttributeValue {
        /// Cookie name.
        name: String,
        /// Attribute name, case-insensitive.
        attribute: String,
        /// Expected attribute value.
        value: String,
    },
    /// The named cookie does not carry the attribute.
    NoAttribute {
        /// Cookie name.
        name: String,
        /// Attribute name, case-insensitive.
        attribute: String,
    },
}

impl CookieAssertion {
    /// Run the assertion against a response.
    ///
    /// # Errors
    ///
    /// Returns the [`AssertionError`] describing the mismatch.
    pub fn check(&self, response: &ResponseSnapshot) -> Result<(), AssertionError> {
        let cookies: Vec<CookieRecord> = response
            .set_cookies()
            .into_iter()
            .filter_map(CookieRecord::parse)
            .collect();
        let find = |name: &str, expected: Option<&str>| {
            cookies
                .iter()
                .find(|c| c.name == name)
                .ok_or_else(|| AssertionError::CookieExpected {
                    name: name.to_string(),
                    expected: expected.map(str::to_string),
                })
        };

        match self {
            Self::Count(expected) => {
                if cookies.len() == *expected {
                    Ok(())
                } else {
                    Err(AssertionError::CookieCountMismatch {
                        expected: *expected,
                        actual: cookies.len(),
                    })
                }
            }
            Self::Name { name } => find(name, None).map(|_| ()),
            Self::Value { name, value } => {
                let cookie = find(name, Some(value.as_str()))?;
                if cookie.value == *value {
                    Ok(())
                } else {
                    Err(AssertionError::CookieMismatch {
                        name: name.clone(),
                        expected: value.clone(),
                        actual: cookie.value.clone(),
                    })
                }
            }
            Self::Attribute { name, attribute } => {
                let cookie = find(name, None)?;
                require_attribute(cookie, attribute).map(|_| ())
            }
            Self::AttributeValue {
                name,
                attribute,
                value,
            } => {
                let cookie = find(name, None)?;
                let actual = require_attribute(cookie, attribute)?;
                if actual.as_str() == Some(value.as_str()) {
                    Ok(())
                } else {
                    Err(AssertionError::AttributeMismatch {
                        cookie: name.clone(),
                        attribute: attribute.clone(),
                        expected: value.clone(),
                        actual: actual.as_str().map(str::to_string),
                    })
                }
            }
            Self::NoAttribute { name, attribute } => {
                let cookie = find(name, None)?;
                match cookie.attribute(attribute) {
                    None => Ok(()),
                    Some(found) => Err(AssertionError::AttributeNotExpected {
                        cookie: name.clone(),
                        attribute: attribute.clone(),
                        actual: found.as_str().unwrap_or(attribute).to_string(),
                    }),
                }
            }
        }
    }
}

fn require_attribute<'a>(
    cookie: &'a CookieRecord,
    attribute: &str,
) -> Result<&'a AttributeValue, AssertionError> {
    cookie
        .attribute(attribute)
        .ok_or_else(|| AssertionError::AttributeExpected {
            cookie: cookie.name.clone(),
            attribute: attribute.to_string(),
        })
}
