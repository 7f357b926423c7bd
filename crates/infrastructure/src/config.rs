//! Context configuration

use serde::Deserialize;

/// Default `User-Agent` sent by the bridge.
pub const DEFAULT_USER_AGENT: &str = concat!("courier/", env!("CARGO_PKG_VERSION"));

/// Settings for an [`HttpContext`](crate::HttpContext).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Interface the test server binds to, on an ephemeral port.
    pub host: String,
    /// Track cookies in every chain the context creates.
    pub session: bool,
    /// Log handler errors at `error` level instead of `debug`.
    pub debug: bool,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
    /// Per-request timeout. `None` lets a hanging handler hang the chain.
    pub request_timeout_ms: Option<u64>,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            session: false,
            debug: false,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout_ms: None,
        }
    }
}

impl ContextConfig {
    /// Bind to another interface.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Enable session tracking for every chain.
    #[must_use]
    pub const fn with_session(mut self, session: bool) -> Self {
        self.session = session;
        self
    }

    /// Log handler errors loudly.
    #[must_use]
    pub const fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Send another `User-Agent`.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Fail requests that take longer than `timeout_ms`.
    #[must_use]
    pub const fn with_request_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.request_timeout_ms = Some(timeout_ms);
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = ContextConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert!(!config.session);
        assert!(config.user_agent.starts_with("courier/"));
        assert_eq!(config.request_timeout_ms, None);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: ContextConfig =
            serde_json::from_str(r#"{"session": true, "request_timeout_ms": 500}"#).unwrap();

        assert!(config.session);
        assert_eq!(config.request_timeout_ms, Some(500));
        assert_eq!(config.host, "127.0.0.1");
    }

    #[test]
    fn test_builders() {
        let config = ContextConfig::default()
            .with_host("0.0.0.0")
            .with_session(true)
            .with_debug(true)
            .with_user_agent("suite/1")
            .with_request_timeout_ms(10);

        assert_eq!(config.host, "0.0.0.0");
        assert!(config.session && config.debug);
        assert_eq!(config.user_agent, "suite/1");
        assert_eq!(config.request_timeout_ms, Some(10));
    }
}
