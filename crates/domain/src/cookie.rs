//! Cookie management types.
//!
//! `set-cookie` values are parsed into [`CookieRecord`]s, and a
//! [`CookieJar`] keeps one active record per cookie name across the requests
//! of a single chain.

use chrono::{DateTime, NaiveDateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Value of a cookie attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// A bare attribute such as `HttpOnly`.
    Present,
    /// An `attribute=value` pair.
    Value(String),
}

impl AttributeValue {
    /// Returns the attribute value, `None` for a bare flag.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Present => None,
            Self::Value(value) => Some(value),
        }
    }
}

/// A single cookie parsed from a `set-cookie` header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieRecord {
    /// Cookie name.
    pub name: String,
    /// Cookie value, empty when the server deletes the cookie.
    pub value: String,
    /// Attributes keyed by lowercased name, in header order.
    #[serde(default)]
    pub attributes: IndexMap<String, AttributeValue>,
    /// Parsed `expires` attribute.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<DateTime<Utc>>,
}

impl CookieRecord {
    /// Create a new cookie without attributes.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            attributes: IndexMap::new(),
            expires: None,
        }
    }

    /// Parse from a `set-cookie` header value.
    ///
    /// The first `;`-separated token is the `name=value` pair; every further
    /// token is an `attribute` or `attribute=value`. A leading token without
    /// `=` yields a cookie with an empty value. Returns `None` when the name
    /// is empty.
    #[must_use]
    pub fn parse(header: &str) -> Option<Self> {
        let mut parts = header.split(';');
        let pair = parts.next()?;
        let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let mut cookie = Self::new(name, value.trim());
        for part in parts {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let (attr, val) = match part.split_once('=') {
                Some((attr, val)) if !val.trim().is_empty() => {
                    (attr, AttributeValue::Value(val.trim().to_string()))
                }
                Some((attr, _)) => (attr, AttributeValue::Present),
                None => (part, AttributeValue::Present),
            };
            let attr = attr.trim().to_ascii_lowercase();
            if attr == "expires" {
                cookie.expires = val.as_str().and_then(parse_http_date);
            }
            cookie.attributes.insert(attr, val);
        }

        Some(cookie)
    }

    /// Set the expiration.
    #[must_use]
    pub fn with_expires(mut self, expires: DateTime<Utc>) -> Self {
        self.expires = Some(expires);
        self
    }

    /// Returns the attribute, looked up case-insensitively.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(&name.to_ascii_lowercase())
    }

    /// Check if the cookie has expired at the given instant.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires.is_some_and(|exp| exp <= now)
    }

    /// Format for the `Cookie` request header.
    #[must_use]
    pub fn to_cookie_pair(&self) -> String {
        format!("{}={}", self.name, self.value)
    }
}

/// Parses an HTTP date, accepting both the RFC 1123 and the dashed
/// `Wed, 21-Oct-2015 07:28:00 GMT` forms.
fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc2822(value) {
        return Some(date.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%a, %d-%b-%Y %H:%M:%S GMT")
        .ok()
        .map(|naive| naive.and_utc())
}

/// What a jar did with a parsed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JarUpdate {
    /// The server sent an empty value; any stored cookie was removed.
    Deleted,
    /// The cookie had already expired; any stored cookie was removed.
    Expired,
    /// The cookie was stored, replacing any previous record.
    Stored,
}

/// Cookie jar keyed by cookie name, one record per name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CookieJar {
    #[serde(default)]
    cookies: IndexMap<String, CookieRecord>,
}

impl CookieJar {
    /// Create a new empty cookie jar.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one parsed record.
    ///
    /// An empty value deletes the cookie, an `expires` at or before `now`
    /// deletes it as well, anything else replaces the stored record
    /// entirely.
    pub fn apply(&mut self, cookie: CookieRecord, now: DateTime<Utc>) -> JarUpdate {
        if cookie.value.is_empty() {
            self.cookies.shift_remove(&cookie.name);
            return JarUpdate::Deleted;
        }
        if cookie.is_expired_at(now) {
            self.cookies.shift_remove(&cookie.name);
            return JarUpdate::Expired;
        }
        self.cookies.insert(cookie.name.clone(), cookie);
        JarUpdate::Stored
    }

    /// Process `set-cookie` values from a response, in order.
    ///
    /// Returns each applied record with what happened to it.
    pub fn process_set_cookies<'a, I>(
        &mut self,
        headers: I,
        now: DateTime<Utc>,
    ) -> Vec<(CookieRecord, JarUpdate)>
    where
        I: IntoIterator<Item = &'a str>,
    {
        headers
            .into_iter()
            .filter_map(CookieRecord::parse)
            .map(|cookie| {
                let update = self.apply(cookie.clone(), now);
                (cookie, update)
            })
            .collect()
    }

    /// Get a stored cookie by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CookieRecord> {
        self.cookies.get(name)
    }

    /// Get all cookies, in the order they were first stored.
    pub fn iter(&self) -> impl Iterator<Item = &CookieRecord> {
        self.cookies.values()
    }

    /// Get the total number of cookies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    /// Check if the jar is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Build the `Cookie` header value.
    ///
    /// Jar pairs come first, joined with `;`, followed by `explicit` when the
    /// caller set a `Cookie` header of their own. Returns `None` when there is
    /// nothing to send.
    #[must_use]
    pub fn cookie_header(&self, explicit: Option<&str>) -> Option<String> {
        let mut pairs: Vec<String> = self.iter().map(CookieRecord::to_cookie_pair).collect();
        if let Some(explicit) = explicit.filter(|v| !v.is_empty()) {
            pairs.push(explicit.to_string());
        }
        if pairs.is_empty() {
            None
        } else {
            Some(pairs.join(";"))
        }
    }
}
