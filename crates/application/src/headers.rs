//! Outgoing header composition
//!
//! Header values are either literal or produced by a deferred closure. The
//! chain resolves deferred values when their `set` step runs, so a header
//! may depend on state an earlier inspector captured.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use courier_domain::CookieJar;

use crate::error::BoxError;

/// A boxed, sendable future.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;

type Producer = Box<dyn FnOnce() -> BoxFuture<Result<String, BoxError>> + Send>;

/// The value of a `set` step.
pub enum HeaderSource {
    /// A value known when the step was added.
    Literal(String),
    /// A value computed when the step runs.
    Deferred(Producer),
}

impl HeaderSource {
    /// Wraps an async producer.
    pub fn deferred<F, Fut>(producer: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<String, BoxError>> + Send + 'static,
    {
        Self::Deferred(Box::new(move || Box::pin(producer())))
    }

    /// Resolves the value, awaiting the producer if there is one.
    ///
    /// # Errors
    ///
    /// Returns the producer's error.
    pub async fn resolve(self) -> Result<String, BoxError> {
        match self {
            Self::Literal(value) => Ok(value),
            Self::Deferred(producer) => producer().await,
        }
    }
}

impl fmt::Debug for HeaderSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Self::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

impl From<&str> for HeaderSource {
    fn from(value: &str) -> Self {
        Self::Literal(value.to_string())
    }
}

impl From<String> for HeaderSource {
    fn from(value: String) -> Self {
        Self::Literal(value)
    }
}

/// Headers sent with every following request of a chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet {
    entries: Vec<(String, String)>,
}

impl HeaderSet {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Stores a value, replacing any earlier value under the same name
    /// regardless of case.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .entries
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            Some(entry) => *entry = (name, value),
            None => self.entries.push((name, value)),
        }
    }

    /// Returns the value stored under `name`, case-insensitively.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Returns the number of headers set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether no header is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Builds the headers for the next request.
    ///
    /// With a jar, its cookies are folded into one `Cookie` header ahead of
    /// any explicitly set `Cookie` value. Without cookies on either side no
    /// `Cookie` header is sent.
    #[must_use]
    pub fn compose(&self, jar: Option<&CookieJar>) -> Vec<(String, String)> {
        let mut headers: Vec<(String, String)> = self
            .entries
            .iter()
            .filter(|(name, _)| !name.eq_ignore_ascii_case("cookie"))
            .cloned()
            .collect();

        let explicit = self.get("cookie");
        let cookie = match jar {
            Some(jar) => jar.cookie_header(explicit),
            None => explicit.map(str::to_string),
        };
        if let Some(cookie) = cookie {
            headers.push(("Cookie".to_string(), cookie));
        }
        headers
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use courier_domain::CookieRecord;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_set_replaces_case_insensitively() {
        let mut headers = HeaderSet::new();
        headers.set("X-Token", "a");
        headers.set("x-token", "b");

        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("X-TOKEN"), Some("b"));
    }

    #[test]
    fn test_compose_without_jar_keeps_explicit_cookie() {
        let mut headers = HeaderSet::new();
        headers.set("Accept", "text/plain");
        headers.set("cookie", "manual=x");

        assert_eq!(
            headers.compose(None),
            vec![
                ("Accept".to_string(), "text/plain".to_string()),
                ("Cookie".to_string(), "manual=x".to_string()),
            ]
        );
    }

    #[test]
    fn test_compose_puts_jar_before_explicit_cookie() {
        let mut jar = CookieJar::new();
        jar.apply(CookieRecord::new("sess", "abc"), Utc::now());

        let mut headers = HeaderSet::new();
        headers.set("Cookie", "manual=x");

        assert_eq!(
            headers.compose(Some(&jar)),
            vec![("Cookie".to_string(), "sess=abc;manual=x".to_string())]
        );
    }

    #[test]
    fn test_compose_empty_jar_sends_no_cookie() {
        let jar = CookieJar::new();
        assert!(HeaderSet::new().compose(Some(&jar)).is_empty());
    }

    #[tokio::test]
    async fn test_deferred_source_resolves() {
        let source = HeaderSource::deferred(|| async { Ok("late".to_string()) });
        assert_eq!(format!("{source:?}"), "Deferred(..)");
        assert_eq!(source.resolve().await.unwrap(), "late");
        assert_eq!(HeaderSource::from("now").resolve().await.unwrap(), "now");
    }
}
