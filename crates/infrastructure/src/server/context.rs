//! `HttpContext`: a handler served on an ephemeral port.

use std::fmt::Display;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use courier_application::Chain;
use courier_application::ports::Clock;
use courier_domain::{HttpMethod, MultipartForm, RequestBody};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};
use url::Url;

use super::exchange::{ExchangeLog, RecordedRequest, record_request};
use crate::adapters::{ReqwestBridge, SystemClock};
use crate::config::ContextConfig;
use crate::error::{ContextError, ContextResult};

/// A running test server and the factory for chains against it.
///
/// The server stops when the context is closed or dropped.
///
/// ```no_run
/// # use courier_infrastructure::HttpContext;
/// # use axum::{extract::Request, http::StatusCode};
/// # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
/// let context = HttpContext::start(|_request: Request| async {
///     Ok::<_, std::io::Error>((StatusCode::RESET_CONTENT, "example"))
/// })
/// .await?;
///
/// context.get("/sitemap").assert((205, "example")).await?;
/// # Ok(())
/// # }
/// ```
pub struct HttpContext {
    config: ContextConfig,
    addr: SocketAddr,
    bridge: Arc<ReqwestBridge>,
    exchange: Arc<ExchangeLog>,
    clock: Arc<dyn Clock>,
    server: JoinHandle<()>,
}

impl std::fmt::Debug for HttpContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpContext")
            .field("addr", &self.addr)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HttpContext {
    /// Serves a fallible handler with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the server cannot be started.
    pub async fn start<H, Fut, R, E>(handler: H) -> ContextResult<Self>
    where
        H: Fn(Request) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
        R: IntoResponse + Send + 'static,
        E: Display + Send + 'static,
    {
        Self::start_with(ContextConfig::default(), handler).await
    }

    /// Serves a fallible handler.
    ///
    /// Every request reaches `handler`. When it returns an error, the client
    /// receives a `500` whose body is the error message.
    ///
    /// # Errors
    ///
    /// Returns an error if the server cannot be started.
    pub async fn start_with<H, Fut, R, E>(config: ContextConfig, handler: H) -> ContextResult<Self>
    where
        H: Fn(Request) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
        R: IntoResponse + Send + 'static,
        E: Display + Send + 'static,
    {
        let loud = config.debug;
        let router = Router::new().fallback(move |request: Request| {
            let handler = handler.clone();
            async move {
                match handler(request).await {
                    Ok(response) => response.into_response(),
                    Err(err) => unhandled(&err, loud),
                }
            }
        });
        Self::serve(config, router).await
    }

    /// Serves a router as is, with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the server cannot be started.
    pub async fn start_plain(router: Router) -> ContextResult<Self> {
        Self::start_plain_with(ContextConfig::default(), router).await
    }

    /// Serves a router as is.
    ///
    /// # Errors
    ///
    /// Returns an error if the server cannot be started.
    pub async fn start_plain_with(config: ContextConfig, router: Router) -> ContextResult<Self> {
        Self::serve(config, router).await
    }

    async fn serve(config: ContextConfig, router: Router) -> ContextResult<Self> {
        let exchange = Arc::new(ExchangeLog::new());
        let router = router.layer(middleware::from_fn_with_state(
            exchange.clone(),
            record_request,
        ));

        let bind_error = |source| ContextError::Bind {
            host: config.host.clone(),
            source,
        };
        let listener = TcpListener::bind((config.host.as_str(), 0))
            .await
            .map_err(bind_error)?;
        let addr = listener.local_addr().map_err(bind_error)?;
        let base_url = Url::parse(&format!("http://{addr}/"))
            .map_err(|e| ContextError::Address(e.to_string()))?;
        let bridge = Arc::new(ReqwestBridge::new(base_url, &config, exchange.clone())?);

        let server = tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, router).await {
                warn!(error = %err, "test server stopped");
            }
        });
        debug!(%addr, "test server listening");

        Ok(Self {
            config,
            addr,
            bridge,
            exchange,
            clock: Arc::new(SystemClock::new()),
            server,
        })
    }

    /// Use another clock for cookie expiry.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the configuration the server was started with.
    #[must_use]
    pub const fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// Returns the socket address the server is listening on.
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Returns the absolute URL of `path` on the server.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        self.bridge
            .base_url()
            .join(path)
            .map_or_else(|_| format!("{}{path}", self.bridge.base_url()), Into::into)
    }

    /// Starts a new chain. Session tracking is on when the configuration
    /// asks for it.
    pub fn chain(&self) -> Chain {
        let chain = Chain::new(self.bridge.clone(), self.clock.clone());
        if self.config.session {
            chain.session()
        } else {
            chain
        }
    }

    /// Starts a new chain with session tracking on.
    pub fn session(&self) -> Chain {
        self.chain().session()
    }

    /// Starts a chain with a `GET` request.
    pub fn get(&self, path: impl Into<String>) -> Chain {
        self.chain().get(path)
    }

    /// Starts a chain with a `HEAD` request.
    pub fn head(&self, path: impl Into<String>) -> Chain {
        self.chain().head(path)
    }

    /// Starts a chain with a `POST` request.
    pub fn post(&self, path: impl Into<String>, body: impl Into<RequestBody>) -> Chain {
        self.chain().post(path, body)
    }

    /// Starts a chain with a `PUT` request.
    pub fn put(&self, path: impl Into<String>, body: impl Into<RequestBody>) -> Chain {
        self.chain().put(path, body)
    }

    /// Starts a chain with a `PATCH` request.
    pub fn patch(&self, path: impl Into<String>, body: impl Into<RequestBody>) -> Chain {
        self.chain().patch(path, body)
    }

    /// Starts a chain with a `DELETE` request.
    pub fn delete(&self, path: impl Into<String>) -> Chain {
        self.chain().delete(path)
    }

    /// Starts a chain with an `OPTIONS` request.
    pub fn options(&self, path: impl Into<String>) -> Chain {
        self.chain().options(path)
    }

    /// Starts a chain with any request.
    pub fn request(
        &self,
        method: HttpMethod,
        path: impl Into<String>,
        body: impl Into<RequestBody>,
    ) -> Chain {
        self.chain().request(method, path, body)
    }

    /// Starts a chain by posting a multipart form.
    pub fn post_form(&self, path: impl Into<String>, form: MultipartForm) -> Chain {
        self.chain().post_form(path, form)
    }

    /// Starts a chain with a header set.
    pub fn set(&self, name: impl Into<String>, value: impl Into<String>) -> Chain {
        self.chain().set(name, value.into())
    }

    /// Returns the last request the server received since the last reset.
    #[must_use]
    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.exchange.last_request()
    }

    /// Returns how many requests the server has received.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.exchange.request_count()
    }

    /// Forgets the last request. Chains do this before every request.
    pub fn reset(&self) {
        self.exchange.reset();
    }

    /// Stops the server. Chains still pending stop at their next request
    /// without an error.
    pub fn close(&self) {
        self.exchange.close();
        self.server.abort();
        debug!(addr = %self.addr, "test server closed");
    }

    /// Returns whether the server is still running.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.exchange.is_open()
    }
}

impl Drop for HttpContext {
    fn drop(&mut self) {
        self.server.abort();
    }
}

fn unhandled(err: &dyn Display, loud: bool) -> Response {
    if loud {
        error!(error = %err, "handler failed");
    } else {
        debug!(error = %err, "handler failed");
    }
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
}
