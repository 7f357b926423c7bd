//! Lifecycle bridge implementation using reqwest.
//!
//! This adapter implements the `LifecycleBridge` port: it sends the chain's
//! requests to the test server and hands back complete response snapshots.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use courier_application::ports::{BridgeError, LifecycleBridge};
use courier_domain::{HttpMethod, OutgoingRequest, ResponseSnapshot};
use reqwest::{Client, Method};
use tracing::debug;
use url::Url;

use crate::config::ContextConfig;
use crate::error::{ContextError, ContextResult};
use crate::http::{BuiltBody, build_body};
use crate::server::ExchangeLog;

/// Bridge between a chain and the server under test.
///
/// Redirects are never followed, so every snapshot is the handler's own
/// response.
#[derive(Debug)]
pub struct ReqwestBridge {
    client: Client,
    base_url: Url,
    timeout_ms: Option<u64>,
    exchange: Arc<ExchangeLog>,
}

impl ReqwestBridge {
    /// Creates a bridge to the server at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the client cannot be created.
    pub fn new(
        base_url: Url,
        config: &ContextConfig,
        exchange: Arc<ExchangeLog>,
    ) -> ContextResult<Self> {
        let mut builder = Client::builder()
            .user_agent(config.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::none());
        if let Some(timeout_ms) = config.request_timeout_ms {
            builder = builder.timeout(Duration::from_millis(timeout_ms));
        }
        let client = builder
            .build()
            .map_err(|e| ContextError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            timeout_ms: config.request_timeout_ms,
            exchange,
        })
    }

    /// Returns the server's base URL.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Converts domain `HttpMethod` to reqwest `Method`.
    const fn to_reqwest_method(method: HttpMethod) -> Method {
        match method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Delete => Method::DELETE,
            HttpMethod::Head => Method::HEAD,
            HttpMethod::Options => Method::OPTIONS,
        }
    }

    /// Maps reqwest errors to `BridgeError`.
    fn map_error(&self, error: &reqwest::Error) -> BridgeError {
        if error.is_timeout() {
            return BridgeError::Timeout {
                timeout_ms: self.timeout_ms.unwrap_or_default(),
            };
        }
        if error.is_connect() {
            return BridgeError::ConnectionFailed(error.to_string());
        }
        if error.is_body() || error.is_builder() {
            return BridgeError::InvalidBody(error.to_string());
        }
        BridgeError::Other(error.to_string())
    }
}

#[async_trait]
impl LifecycleBridge for ReqwestBridge {
    async fn issue_request(
        &self,
        request: OutgoingRequest,
    ) -> Result<ResponseSnapshot, BridgeError> {
        let url = self
            .base_url
            .join(&request.path)
            .map_err(|e| BridgeError::InvalidUrl(format!("{e}: {}", request.path)))?;

        let mut builder = self
            .client
            .request(Self::to_reqwest_method(request.method), url);

        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        let body = build_body(&request.body)
            .await
            .map_err(|e| BridgeError::InvalidBody(e.to_string()))?;
        if let BuiltBody::Bytes {
            content,
            content_type,
        } = body
        {
            if request.header("content-type").is_none() {
                builder = builder.header("Content-Type", content_type);
            }
            builder = builder.body(content);
        }

        let response = builder.send().await.map_err(|e| self.map_error(&e))?;
        let status = response.status().as_u16();

        // Repeated headers such as set-cookie stay separate entries
        let headers: Vec<(String, String)> = response
            .headers()
            .iter()
            .map(|(k, v)| {
                (
                    k.as_str().to_string(),
                    String::from_utf8_lossy(v.as_bytes()).into_owned(),
                )
            })
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| BridgeError::Other(format!("Failed to read body: {e}")))?
            .to_vec();

        debug!(method = %request.method, path = %request.path, status, "exchange complete");
        Ok(ResponseSnapshot::new(status, headers, body))
    }

    async fn reset(&self) {
        self.exchange.reset();
    }

    fn is_open(&self) -> bool {
        self.exchange.is_open()
    }
}
