//! Response snapshot type
//!
//! The snapshot is the captured status, headers and body of the most recent
//! request in a chain. Header names are stored lowercased so every lookup is
//! case-insensitive, and repeated headers keep every value in wire order.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// The last received response.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResponseSnapshot {
    /// HTTP status code.
    pub status: u16,
    /// Response headers, lowercased names, in the order received.
    headers: Vec<(String, String)>,
    /// Response body decoded as UTF-8 (lossy).
    pub body: String,
    /// Response body as raw bytes.
    #[serde(default)]
    pub body_bytes: Vec<u8>,
}

impl ResponseSnapshot {
    /// Creates a snapshot from raw response data.
    #[must_use]
    pub fn new<I, K, V>(status: u16, headers: I, body: Vec<u8>) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let headers = headers
            .into_iter()
            .map(|(name, value)| (name.as_ref().to_ascii_lowercase(), value.into()))
            .collect();
        let body_string = String::from_utf8_lossy(&body).into_owned();

        Self {
            status,
            headers,
            body: body_string,
            body_bytes: body,
        }
    }

    /// Returns the header value, joining repeated headers with `", "`.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<Cow<'_, str>> {
        let mut values = self.header_values(name);
        let first = values.next()?;
        match values.next() {
            None => Some(Cow::Borrowed(first)),
            Some(second) => {
                let mut joined = format!("{first}, {second}");
                for value in values {
                    joined.push_str(", ");
                    joined.push_str(value);
                }
                Some(Cow::Owned(joined))
            }
        }
    }

    /// Returns every value received for the header.
    pub fn header_values<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> {
        self.headers
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns the raw `set-cookie` values of this response.
    #[must_use]
    pub fn set_cookies(&self) -> Vec<&str> {
        self.header_values("set-cookie").collect()
    }

    /// Parses the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not valid JSON.
    pub fn json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_slice(&self.body_bytes)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn snapshot() -> ResponseSnapshot {
        ResponseSnapshot::new(
            200,
            [
                ("Content-Type", "text/plain"),
                ("Set-Cookie", "a=1"),
                ("set-cookie", "b=2; HttpOnly"),
            ],
            b"hello".to_vec(),
        )
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let res = snapshot();
        assert_eq!(res.header("content-type").as_deref(), Some("text/plain"));
        assert_eq!(res.header("CONTENT-TYPE").as_deref(), Some("text/plain"));
        assert!(res.header("x-missing").is_none());
    }

    #[test]
    fn test_repeated_headers() {
        let res = snapshot();
        assert_eq!(res.set_cookies(), vec!["a=1", "b=2; HttpOnly"]);
        assert_eq!(res.header("set-cookie").as_deref(), Some("a=1, b=2; HttpOnly"));
    }

    #[test]
    fn test_body_decoding() {
        let res = snapshot();
        assert_eq!(res.body, "hello");
        assert!(res.json().is_err());

        let res = ResponseSnapshot::new(
            201,
            Vec::<(String, String)>::new(),
            br#"{"id":1}"#.to_vec(),
        );
        assert_eq!(res.json().unwrap(), serde_json::json!({"id": 1}));
    }
}
