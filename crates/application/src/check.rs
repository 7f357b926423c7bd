//! Assertion input
//!
//! [`Check`] is the single argument of `Chain::assert`. Its `From` impls let
//! the call site pick the check by the shape of what it passes:
//!
//! | argument | check |
//! |---|---|
//! | `200` | status |
//! | `(200, "body")`, `(200, regex)`, `(200, json!(..))` | status and body |
//! | `("content-type", "text/plain")`, `("content-type", regex)` | header |
//! | `("content-type", HeaderExpectation::Absent)` | header absent |
//! | `"content-type"` | nothing to test, always fails |

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use courier_domain::{
    Assertion, BodyExpectation, CookieAssertion, HeaderExpectation, ResponseSnapshot,
};

use crate::error::{BoxError, ChainError, ChainResult};
use crate::headers::BoxFuture;

/// A user-supplied response inspector.
pub type Inspector =
    Box<dyn FnOnce(Arc<ResponseSnapshot>) -> BoxFuture<Result<(), BoxError>> + Send>;

/// One assertion against the last received response.
pub enum Check {
    /// A status, body or header assertion.
    Response(Assertion),
    /// An assertion on the cookies the response set.
    Cookies(CookieAssertion),
    /// An arbitrary inspector; its error is the failure.
    Inspect(Inspector),
}

impl Check {
    /// Status code check.
    #[must_use]
    pub const fn status(code: u16) -> Self {
        Self::Response(Assertion::Status { code, body: None })
    }

    /// Status code and body check.
    pub fn status_body(code: u16, body: impl Into<BodyExpectation>) -> Self {
        Self::Response(Assertion::Status {
            code,
            body: Some(body.into()),
        })
    }

    /// Header value check.
    pub fn header(name: impl Into<String>, expectation: impl Into<HeaderExpectation>) -> Self {
        Self::Response(Assertion::Header {
            name: name.into(),
            expectation: Some(expectation.into()),
        })
    }

    /// Passes only when the header is missing.
    pub fn header_absent(name: impl Into<String>) -> Self {
        Self::Response(Assertion::Header {
            name: name.into(),
            expectation: Some(HeaderExpectation::Absent),
        })
    }

    /// Synchronous inspector.
    pub fn inspect<F>(inspector: F) -> Self
    where
        F: FnOnce(&ResponseSnapshot) -> Result<(), BoxError> + Send + 'static,
    {
        Self::Inspect(Box::new(move |response| {
            let outcome = inspector(&response);
            Box::pin(async move { outcome })
        }))
    }

    /// Asynchronous inspector.
    pub fn inspect_async<F, Fut>(inspector: F) -> Self
    where
        F: FnOnce(Arc<ResponseSnapshot>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        Self::Inspect(Box::new(move |response| Box::pin(inspector(response))))
    }

    /// Runs the check against a response.
    ///
    /// # Errors
    ///
    /// Returns the assertion failure, or the inspector's error verbatim.
    pub async fn evaluate(self, response: Arc<ResponseSnapshot>) -> ChainResult<()> {
        match self {
            Self::Response(assertion) => Ok(assertion.check(&response)?),
            Self::Cookies(assertion) => Ok(assertion.check(&response)?),
            Self::Inspect(inspector) => inspector(response).await.map_err(ChainError::Inspector),
        }
    }
}

impl fmt::Debug for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Response(assertion) => f.debug_tuple("Response").field(assertion).finish(),
            Self::Cookies(assertion) => f.debug_tuple("Cookies").field(assertion).finish(),
            Self::Inspect(_) => f.write_str("Inspect(..)"),
        }
    }
}

impl From<u16> for Check {
    fn from(code: u16) -> Self {
        Self::status(code)
    }
}

impl<B: Into<BodyExpectation>> From<(u16, B)> for Check {
    fn from((code, body): (u16, B)) -> Self {
        Self::status_body(code, body)
    }
}

impl<H: Into<HeaderExpectation>> From<(&str, H)> for Check {
    fn from((name, expectation): (&str, H)) -> Self {
        Self::header(name, expectation)
    }
}

impl From<&str> for Check {
    fn from(name: &str) -> Self {
        Self::Response(Assertion::Header {
            name: name.to_string(),
            expectation: None,
        })
    }
}

impl From<Assertion> for Check {
    fn from(assertion: Assertion) -> Self {
        Self::Response(assertion)
    }
}

impl From<CookieAssertion> for Check {
    fn from(assertion: CookieAssertion) -> Self {
        Self::Cookies(assertion)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use courier_domain::AssertionError;
    use pretty_assertions::assert_eq;
    use regex::Regex;

    fn response() -> Arc<ResponseSnapshot> {
        Arc::new(ResponseSnapshot::new(
            205,
            [("content-type", "text/plain")],
            b"example".to_vec(),
        ))
    }

    #[tokio::test]
    async fn test_status_from_number() {
        assert!(Check::from(205).evaluate(response()).await.is_ok());

        let err = Check::from(200).evaluate(response()).await.unwrap_err();
        assert!(err.to_string().contains("example"));
    }

    #[tokio::test]
    async fn test_status_and_body_from_tuple() {
        assert!(Check::from((205, "example")).evaluate(response()).await.is_ok());
        assert!(
            Check::from((205, Regex::new("^ex").unwrap()))
                .evaluate(response())
                .await
                .is_ok()
        );

        let err = Check::from((205, "other"))
            .evaluate(response())
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_assertion(),
            Some(AssertionError::BodyMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_header_forms() {
        assert!(
            Check::from(("Content-Type", "text/plain"))
                .evaluate(response())
                .await
                .is_ok()
        );
        assert!(
            Check::header_absent("x-missing")
                .evaluate(response())
                .await
                .is_ok()
        );

        let err = Check::from("content-type")
            .evaluate(response())
            .await
            .unwrap_err();
        assert_eq!(
            err.as_assertion(),
            Some(&AssertionError::NothingTested {
                name: "content-type".to_string()
            })
        );
    }

    #[tokio::test]
    async fn test_inspector_error_is_verbatim() {
        let check = Check::inspect(|response| {
            if response.body == "example" {
                Err("handler leaked the example body".into())
            } else {
                Ok(())
            }
        });

        let err = check.evaluate(response()).await.unwrap_err();
        assert!(matches!(err, ChainError::Inspector(_)));
        assert_eq!(err.to_string(), "handler leaked the example body");
    }

    #[tokio::test]
    async fn test_async_inspector_sees_response() {
        let check = Check::inspect_async(|response| async move {
            assert_eq!(response.status, 205);
            Ok::<(), BoxError>(())
        });
        assert!(check.evaluate(response()).await.is_ok());
        assert!(format!("{:?}", Check::status(200)).starts_with("Response"));
    }
}
