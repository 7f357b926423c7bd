//! The chain engine
//!
//! A [`Chain`] is a builder: every fluent call appends a step and hands the
//! chain back without running anything. [`Chain::run`] (or `.await`) consumes
//! the chain and drains its steps strictly in order, stopping at the first
//! failure.

use std::fmt;
use std::future::{Future, IntoFuture};
use std::panic::Location;
use std::sync::Arc;

use courier_domain::{
    CookieAssertion, CookieJar, HttpMethod, JarUpdate, MultipartForm, OutgoingRequest,
    RequestBody, ResponseSnapshot,
};
use tracing::debug;

use crate::check::Check;
use crate::error::{BoxError, ChainError, ChainResult};
use crate::headers::{BoxFuture, HeaderSet, HeaderSource};
use crate::ports::{Clock, LifecycleBridge};

/// Rewrites the failure of the step it is attached to.
pub type ErrorDecorator = Box<dyn FnOnce(ChainError) -> ChainError + Send>;

/// A unit of deferred work.
pub enum Step {
    /// Store a header for the following requests.
    SetHeader {
        /// Header name.
        name: String,
        /// Header value, resolved when the step runs.
        value: HeaderSource,
    },
    /// Issue a request and replace the response snapshot.
    Request {
        /// HTTP method.
        method: HttpMethod,
        /// Path relative to the server root.
        path: String,
        /// Request body.
        body: RequestBody,
    },
    /// Check the response snapshot.
    Assert(Check),
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetHeader { name, value } => f
                .debug_struct("SetHeader")
                .field("name", name)
                .field("value", value)
                .finish(),
            Self::Request { method, path, .. } => f
                .debug_struct("Request")
                .field("method", method)
                .field("path", path)
                .finish_non_exhaustive(),
            Self::Assert(check) => f.debug_tuple("Assert").field(check).finish(),
        }
    }
}

struct Link {
    step: Step,
    decorator: Option<ErrorDecorator>,
}

/// What a chain leaves behind once every step has run.
#[derive(Debug, Default)]
pub struct ChainState {
    /// Headers set by the chain.
    pub headers: HeaderSet,
    /// The most recent response.
    pub response: Option<Arc<ResponseSnapshot>>,
    /// The cookie jar, when session tracking was on.
    pub jar: Option<CookieJar>,
}

enum Flow {
    Continue,
    Halt,
}

/// An ordered sequence of requests, header updates and assertions.
#[must_use = "a chain does nothing until it is run or awaited"]
pub struct Chain {
    bridge: Arc<dyn LifecycleBridge>,
    clock: Arc<dyn Clock>,
    links: Vec<Link>,
    session: bool,
}

impl fmt::Debug for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chain")
            .field("steps", &self.links.len())
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl Chain {
    /// Creates an empty chain issuing its requests through `bridge`.
    pub fn new(bridge: Arc<dyn LifecycleBridge>, clock: Arc<dyn Clock>) -> Self {
        Self {
            bridge,
            clock,
            links: Vec::new(),
            session: false,
        }
    }

    /// Appends a step. Nothing runs until the chain is awaited.
    ///
    /// When the step fails, `decorator` receives the failure and its return
    /// value becomes the chain's error.
    pub fn enqueue(mut self, step: Step, decorator: Option<ErrorDecorator>) -> Self {
        self.links.push(Link { step, decorator });
        self
    }

    /// Returns the number of steps enqueued so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Returns whether no step has been enqueued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Turns on session tracking: cookies set by responses are kept and
    /// sent back with every following request of this chain.
    pub fn session(mut self) -> Self {
        self.session = true;
        self
    }

    /// Returns whether session tracking is on.
    #[must_use]
    pub const fn is_session(&self) -> bool {
        self.session
    }

    /// Sets a header for the following requests.
    pub fn set(self, name: impl Into<String>, value: impl Into<HeaderSource>) -> Self {
        self.enqueue(
            Step::SetHeader {
                name: name.into(),
                value: value.into(),
            },
            None,
        )
    }

    /// Sets a header whose value is computed when the step runs.
    ///
    /// An error from the producer fails the chain as an inspector error.
    #[track_caller]
    pub fn set_with<F, Fut>(self, name: impl Into<String>, producer: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<String, BoxError>> + Send + 'static,
    {
        self.enqueue(
            Step::SetHeader {
                name: name.into(),
                value: HeaderSource::deferred(producer),
            },
            Some(located(Location::caller())),
        )
    }

    /// Issues a request with any method and body.
    pub fn request(
        self,
        method: HttpMethod,
        path: impl Into<String>,
        body: impl Into<RequestBody>,
    ) -> Self {
        self.enqueue(
            Step::Request {
                method,
                path: path.into(),
                body: body.into(),
            },
            None,
        )
    }

    /// Issues a `GET` request.
    pub fn get(self, path: impl Into<String>) -> Self {
        self.request(HttpMethod::Get, path, RequestBody::Empty)
    }

    /// Issues a `HEAD` request.
    pub fn head(self, path: impl Into<String>) -> Self {
        self.request(HttpMethod::Head, path, RequestBody::Empty)
    }

    /// Issues a `DELETE` request.
    pub fn delete(self, path: impl Into<String>) -> Self {
        self.request(HttpMethod::Delete, path, RequestBody::Empty)
    }

    /// Issues an `OPTIONS` request.
    pub fn options(self, path: impl Into<String>) -> Self {
        self.request(HttpMethod::Options, path, RequestBody::Empty)
    }

    /// Issues a `POST` request.
    pub fn post(self, path: impl Into<String>, body: impl Into<RequestBody>) -> Self {
        self.request(HttpMethod::Post, path, body)
    }

    /// Issues a `PUT` request.
    pub fn put(self, path: impl Into<String>, body: impl Into<RequestBody>) -> Self {
        self.request(HttpMethod::Put, path, body)
    }

    /// Issues a `PATCH` request.
    pub fn patch(self, path: impl Into<String>, body: impl Into<RequestBody>) -> Self {
        self.request(HttpMethod::Patch, path, body)
    }

    /// Posts a `multipart/form-data` form.
    pub fn post_form(self, path: impl Into<String>, form: MultipartForm) -> Self {
        self.request(HttpMethod::Post, path, RequestBody::Multipart(form))
    }

    /// Asserts on the last response.
    ///
    /// A failure reports the location of this call.
    #[track_caller]
    pub fn assert(self, check: impl Into<Check>) -> Self {
        let location = Location::caller();
        self.enqueue(Step::Assert(check.into()), Some(located(location)))
    }

    /// Asserts with an inspector; its error fails the chain.
    #[track_caller]
    pub fn assert_fn<F>(self, inspector: F) -> Self
    where
        F: FnOnce(&ResponseSnapshot) -> Result<(), BoxError> + Send + 'static,
    {
        self.assert(Check::inspect(inspector))
    }

    /// Asserts with an async inspector.
    #[track_caller]
    pub fn assert_async<F, Fut>(self, inspector: F) -> Self
    where
        F: FnOnce(Arc<ResponseSnapshot>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        self.assert(Check::inspect_async(inspector))
    }

    /// Asserts the last response set exactly `count` cookies.
    #[track_caller]
    pub fn cookie_count(self, count: usize) -> Self {
        self.assert(CookieAssertion::Count(count))
    }

    /// Asserts the last response set a cookie called `name`.
    #[track_caller]
    pub fn cookie_name(self, name: impl Into<String>) -> Self {
        self.assert(CookieAssertion::Name { name: name.into() })
    }

    /// Asserts the last response set the cookie to `value`.
    #[track_caller]
    pub fn cookie_value(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.assert(CookieAssertion::Value {
            name: name.into(),
            value: value.into(),
        })
    }

    /// Asserts the cookie set by the last response carries `attribute`.
    #[track_caller]
    pub fn cookie_attribute(self, name: impl Into<String>, attribute: impl Into<String>) -> Self {
        self.assert(CookieAssertion::Attribute {
            name: name.into(),
            attribute: attribute.into(),
        })
    }

    /// Asserts the cookie's `attribute` has `value`.
    #[track_caller]
    pub fn cookie_attribute_value(
        self,
        name: impl Into<String>,
        attribute: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.assert(CookieAssertion::AttributeValue {
            name: name.into(),
            attribute: attribute.into(),
            value: value.into(),
        })
    }

    /// Asserts the cookie does not carry `attribute`.
    #[track_caller]
    pub fn no_cookie_attribute(
        self,
        name: impl Into<String>,
        attribute: impl Into<String>,
    ) -> Self {
        self.assert(CookieAssertion::NoAttribute {
            name: name.into(),
            attribute: attribute.into(),
        })
    }

    /// Runs every step in order.
    ///
    /// Stops without an error when the bridge has been closed.
    ///
    /// # Errors
    ///
    /// Returns the failure of the first failing step, rewritten by its
    /// decorator when it has one. Later steps never run.
    pub async fn run(self) -> ChainResult<ChainState> {
        let Self {
            bridge,
            clock,
            links,
            session,
        } = self;
        let mut state = ChainState {
            jar: session.then(CookieJar::new),
            ..ChainState::default()
        };

        for (index, Link { step, decorator }) in links.into_iter().enumerate() {
            debug!(index, ?step, "running step");
            match execute(step, &mut state, bridge.as_ref(), clock.as_ref()).await {
                Ok(Flow::Continue) => {}
                Ok(Flow::Halt) => {
                    debug!(index, "bridge closed, stopping chain");
                    break;
                }
                Err(err) => {
                    debug!(index, error = %err, "step failed");
                    return Err(match decorator {
                        Some(decorate) => decorate(err),
                        None => err,
                    });
                }
            }
        }

        Ok(state)
    }
}

impl IntoFuture for Chain {
    type Output = ChainResult<ChainState>;
    type IntoFuture = BoxFuture<Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.run())
    }
}

fn located(location: &'static Location<'static>) -> ErrorDecorator {
    Box::new(move |err| ChainError::Located {
        location,
        source: Box::new(err),
    })
}

async fn execute(
    step: Step,
    state: &mut ChainState,
    bridge: &dyn LifecycleBridge,
    clock: &dyn Clock,
) -> ChainResult<Flow> {
    match step {
        Step::SetHeader { name, value } => {
            let value = value.resolve().await.map_err(ChainError::Inspector)?;
            state.headers.set(name, value);
        }
        Step::Request { method, path, body } => {
            if !bridge.is_open() {
                return Ok(Flow::Halt);
            }
            bridge.reset().await;

            let request = OutgoingRequest {
                method,
                path,
                headers: state.headers.compose(state.jar.as_ref()),
                body,
            };
            let path = request.path.clone();
            debug!(%method, path = %path, "issuing request");
            let response = bridge.issue_request(request).await?;
            debug!(path = %path, status = response.status, "received response");

            if let Some(jar) = state.jar.as_mut() {
                track_cookies(jar, &response, &path, clock);
            }
            state.response = Some(Arc::new(response));
        }
        Step::Assert(check) => {
            let response = state.response.clone().ok_or(ChainError::NoResponse)?;
            check.evaluate(response).await?;
        }
    }
    Ok(Flow::Continue)
}

fn track_cookies(
    jar: &mut CookieJar,
    response: &ResponseSnapshot,
    path: &str,
    clock: &dyn Clock,
) {
    for (cookie, update) in jar.process_set_cookies(response.set_cookies(), clock.now()) {
        match update {
            JarUpdate::Deleted => {
                debug!(path = %path, cookie = %cookie.name, "server deleted cookie");
            }
            JarUpdate::Expired => debug!(path = %path, cookie = %cookie.name, "cookie expired"),
            JarUpdate::Stored => debug!(
                path = %path,
                cookie = %cookie.to_cookie_pair(),
                expires = ?cookie.expires,
                "setting cookie"
            ),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};
    use courier_domain::AssertionError;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ports::BridgeError;

    #[derive(Default)]
    struct MockBridge {
        responses: Mutex<VecDeque<ResponseSnapshot>>,
        requests: Mutex<Vec<OutgoingRequest>>,
        resets: AtomicUsize,
        closed: AtomicBool,
    }

    impl MockBridge {
        fn with_responses(responses: impl IntoIterator<Item = ResponseSnapshot>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into_iter().collect()),
                ..Self::default()
            })
        }

        fn requests(&self) -> Vec<OutgoingRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LifecycleBridge for MockBridge {
        async fn issue_request(
            &self,
            request: OutgoingRequest,
        ) -> Result<ResponseSnapshot, BridgeError> {
            self.requests.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| BridgeError::ConnectionFailed("no response queued".to_string()))
        }

        async fn reset(&self) {
            self.resets.fetch_add(1, Ordering::SeqCst);
        }

        fn is_open(&self) -> bool {
            !self.closed.load(Ordering::SeqCst)
        }
    }

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn clock() -> Arc<dyn Clock> {
        Arc::new(FixedClock(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()))
    }

    fn ok(body: &str) -> ResponseSnapshot {
        ResponseSnapshot::new(200, Vec::<(&str, &str)>::new(), body.as_bytes().to_vec())
    }

    fn with_cookie(cookie: &str) -> ResponseSnapshot {
        ResponseSnapshot::new(200, [("set-cookie", cookie)], Vec::new())
    }

    #[tokio::test]
    async fn test_enqueue_does_not_execute() {
        let bridge = MockBridge::with_responses([ok("a")]);
        let chain = Chain::new(bridge.clone(), clock()).get("/").assert(200);

        assert_eq!(chain.len(), 2);
        assert!(bridge.requests().is_empty());

        drop(chain);
        assert!(bridge.requests().is_empty());
        assert_eq!(bridge.resets.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_steps_run_in_order() {
        let bridge = MockBridge::with_responses([ok("first"), ok("second")]);
        let state = Chain::new(bridge.clone(), clock())
            .get("/one")
            .assert((200, "first"))
            .set("X-Step", "two")
            .post("/two", "payload")
            .assert((200, "second"))
            .await
            .unwrap();

        let requests = bridge.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].path, "/one");
        assert_eq!(requests[0].header("x-step"), None);
        assert_eq!(requests[1].method, HttpMethod::Post);
        assert_eq!(requests[1].header("x-step"), Some("two"));
        assert_eq!(requests[1].body, RequestBody::text("payload"));
        assert_eq!(bridge.resets.load(Ordering::SeqCst), 2);
        assert_eq!(state.response.unwrap().body, "second");
    }

    #[tokio::test]
    async fn test_failure_short_circuits() {
        let bridge = MockBridge::with_responses([ok("a"), ok("b")]);
        let later = Arc::new(AtomicBool::new(false));
        let flag = later.clone();

        let err = Chain::new(bridge.clone(), clock())
            .get("/a")
            .assert(500)
            .get("/b")
            .assert_fn(move |_| {
                flag.store(true, Ordering::SeqCst);
                Ok(())
            })
            .run()
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_assertion(),
            Some(AssertionError::StatusMismatch {
                expected: 500,
                actual: 200,
                ..
            })
        ));
        assert_eq!(bridge.requests().len(), 1);
        assert!(!later.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_failure_reports_call_site() {
        let bridge = MockBridge::with_responses([ok("a")]);
        let chain = Chain::new(bridge, clock()).get("/");
        let (line, chain) = (line!(), chain.assert(404));

        let err = chain.await.unwrap_err();
        let location = err.location().expect("decorated failure");

        assert_eq!(location.line(), line);
        assert!(location.file().ends_with("chain.rs"));
        assert!(matches!(err.root(), ChainError::Assertion(_)));
        assert!(err.to_string().contains(&format!("chain.rs:{line}")));
    }

    #[tokio::test]
    async fn test_undecorated_step_error_propagates() {
        let bridge = MockBridge::with_responses([]);
        let err = Chain::new(bridge, clock()).get("/").await.unwrap_err();

        assert!(matches!(err, ChainError::Bridge(BridgeError::ConnectionFailed(_))));
        assert_eq!(err.location(), None);
    }

    #[tokio::test]
    async fn test_custom_decorator_replaces_error() {
        let bridge = MockBridge::with_responses([]);
        let err = Chain::new(bridge, clock())
            .enqueue(
                Step::Request {
                    method: HttpMethod::Get,
                    path: "/".to_string(),
                    body: RequestBody::Empty,
                },
                Some(Box::new(|_| ChainError::NoResponse)),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ChainError::NoResponse));
    }

    #[tokio::test]
    async fn test_assert_before_request() {
        let bridge = MockBridge::with_responses([]);
        let err = Chain::new(bridge, clock()).assert(200).await.unwrap_err();
        assert!(matches!(err.root(), ChainError::NoResponse));
    }

    #[tokio::test]
    async fn test_deferred_header_reads_inspected_state() {
        let bridge = MockBridge::with_responses([
            ResponseSnapshot::new(200, [("x-token", "t-42")], Vec::new()),
            ok(""),
        ]);
        let captured = Arc::new(Mutex::new(String::new()));
        let writer = captured.clone();
        let reader = captured.clone();

        Chain::new(bridge.clone(), clock())
            .get("/login")
            .assert_fn(move |response| {
                *writer.lock().unwrap() = response.header("x-token").unwrap_or_default().into();
                Ok(())
            })
            .set_with("Authorization", move || async move {
                Ok(format!("Bearer {}", reader.lock().unwrap()))
            })
            .get("/me")
            .await
            .unwrap();

        assert_eq!(bridge.requests()[1].header("authorization"), Some("Bearer t-42"));
    }

    #[tokio::test]
    async fn test_failing_header_producer_stops_chain() {
        let bridge = MockBridge::with_responses([ok(""), ok("")]);

        let err = Chain::new(bridge.clone(), clock())
            .get("/login")
            .set_with("Authorization", || async { Err::<String, BoxError>("no token".into()) })
            .get("/me")
            .await
            .unwrap_err();

        assert!(matches!(err, ChainError::Located { .. }));
        assert!(matches!(err.root(), ChainError::Inspector(e) if e.to_string() == "no token"));
        assert_eq!(bridge.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_session_sends_and_forgets_cookies() {
        let bridge = MockBridge::with_responses([
            with_cookie("sess=abc; path=/"),
            ok(""),
            with_cookie("sess=; path=/"),
            ok(""),
        ]);

        let state = Chain::new(bridge.clone(), clock())
            .session()
            .set("Cookie", "manual=x")
            .get("/login")
            .get("/echo")
            .get("/logout")
            .get("/echo")
            .await
            .unwrap();

        let cookies: Vec<Option<String>> = bridge
            .requests()
            .iter()
            .map(|r| r.header("cookie").map(str::to_string))
            .collect();
        assert_eq!(
            cookies,
            vec![
                Some("manual=x".to_string()),
                Some("sess=abc;manual=x".to_string()),
                Some("sess=abc;manual=x".to_string()),
                Some("manual=x".to_string()),
            ]
        );
        assert!(state.jar.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_expired_cookie_is_not_stored() {
        let bridge = MockBridge::with_responses([
            with_cookie("old=1; Expires=Wed, 21 Oct 2015 07:28:00 GMT"),
            ok(""),
        ]);

        Chain::new(bridge.clone(), clock())
            .session()
            .get("/")
            .get("/")
            .await
            .unwrap();

        assert_eq!(bridge.requests()[1].header("cookie"), None);
    }

    #[tokio::test]
    async fn test_no_session_leaves_cookies_alone() {
        let bridge = MockBridge::with_responses([with_cookie("sess=abc"), ok("")]);

        let state = Chain::new(bridge.clone(), clock())
            .get("/")
            .cookie_name("sess")
            .cookie_value("sess", "abc")
            .get("/")
            .await
            .unwrap();

        assert_eq!(bridge.requests()[1].header("cookie"), None);
        assert!(state.jar.is_none());
    }

    #[tokio::test]
    async fn test_closed_bridge_halts_silently() {
        let bridge = MockBridge::with_responses([ok("")]);
        bridge.closed.store(true, Ordering::SeqCst);

        let state = Chain::new(bridge.clone(), clock())
            .set("X-Before", "1")
            .get("/")
            .assert(500)
            .await
            .unwrap();

        assert!(bridge.requests().is_empty());
        assert!(state.response.is_none());
        assert_eq!(state.headers.get("x-before"), Some("1"));
    }
}
