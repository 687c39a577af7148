use crate::config::RetryConfig;
use crate::error::HttpError;
use http::Request;
use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tower::{Layer, Service, ServiceExt};

/// Tower layer that retries failed calls with linearly growing backoff
///
/// Up to `attempts` calls are made in total. After failed attempt `i`
/// (counted from 0) the layer sleeps `backoff × i`, the final attempt
/// included: the first retry follows immediately and the last failure is
/// returned only after its own delay. Successful responses are returned
/// immediately and the failure of the final attempt is returned unchanged.
#[derive(Clone, Debug)]
pub struct RetryLayer {
    attempts: usize,
    backoff: Duration,
}

impl RetryLayer {
    /// Create a new `RetryLayer`
    ///
    /// # Errors
    /// Returns `HttpError::InvalidConfig` if `attempts` is zero
    pub fn try_new(attempts: usize, backoff: Duration) -> Result<Self, HttpError> {
        if attempts == 0 {
            return Err(HttpError::InvalidConfig(
                "retry attempts must be at least 1".to_owned(),
            ));
        }
        Ok(Self { attempts, backoff })
    }

    /// Create a `RetryLayer` from its configuration section
    ///
    /// # Errors
    /// Returns `HttpError::InvalidConfig` if `config.attempts` is zero
    pub fn from_config(config: &RetryConfig) -> Result<Self, HttpError> {
        Self::try_new(config.attempts, config.backoff)
    }

    /// Total number of calls made before giving up
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// Base backoff duration
    #[must_use]
    pub fn backoff(&self) -> Duration {
        self.backoff
    }
}

impl<S> Layer<S> for RetryLayer {
    type Service = RetryService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RetryService {
            inner,
            attempts: self.attempts,
            backoff: self.backoff,
        }
    }
}

/// Service that implements the retry loop
///
/// Each attempt runs on a fresh clone of the inner service and of the
/// request, so layers below see the request exactly as it reached this
/// service. Readiness is driven per attempt; an inner service that fails
/// `poll_ready` counts as a failed attempt.
#[derive(Clone, Debug)]
pub struct RetryService<S> {
    inner: S,
    attempts: usize,
    backoff: Duration,
}

impl<S, ReqBody> Service<Request<ReqBody>> for RetryService<S>
where
    S: Service<Request<ReqBody>> + Clone + Send + 'static,
    S::Response: Send + 'static,
    S::Error: Display + Send + 'static,
    S::Future: Send,
    ReqBody: Clone + Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
        let inner = self.inner.clone();
        let attempts = self.attempts;
        let backoff = self.backoff;

        Box::pin(async move {
            let method = req.method().clone();
            let uri = req.uri().clone();

            let mut attempt = 0usize;
            loop {
                let mut svc = inner.clone();
                let result = match svc.ready().await {
                    Ok(ready) => ready.call(req.clone()).await,
                    Err(err) => Err(err),
                };

                let err = match result {
                    Ok(resp) => return Ok(resp),
                    Err(err) => err,
                };

                let delay = linear_backoff(backoff, attempt);
                attempt += 1;
                let exhausted = attempt >= attempts;

                if exhausted {
                    tracing::debug!(
                        attempts,
                        error = %err,
                        method = %method,
                        uri = %uri,
                        backoff_ms = delay.as_millis(),
                        "Retries exhausted"
                    );
                } else {
                    tracing::debug!(
                        attempt,
                        max_attempts = attempts,
                        error = %err,
                        method = %method,
                        uri = %uri,
                        backoff_ms = delay.as_millis(),
                        "Retrying request after failure"
                    );
                }

                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }

                if exhausted {
                    return Err(err);
                }
            }
        })
    }
}

/// Delay after failed attempt number `attempt` (0-based): `base × attempt`.
///
/// Growth is linear, not exponential. Saturates instead of overflowing.
#[must_use]
pub fn linear_backoff(base: Duration, attempt: usize) -> Duration {
    let factor = u32::try_from(attempt).unwrap_or(u32::MAX);
    base.saturating_mul(factor)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::response::{collect_body, full_body};
    use crate::transport::{HttpRequest, HttpResponse, TransportExt};
    use bytes::Bytes;
    use http::{Method, Response};
    use http_body_util::Full;
    use std::sync::{Arc, Mutex};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Transport that fails until call `succeed_on` (1-based), or forever.
    #[derive(Clone)]
    struct FlakyTransport {
        calls: Arc<AtomicUsize>,
        succeed_on: Option<usize>,
    }

    impl FlakyTransport {
        fn new(succeed_on: Option<usize>) -> Self {
            Self {
                calls: Arc::new(AtomicUsize::new(0)),
                succeed_on,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Service<HttpRequest> for FlakyTransport {
        type Response = HttpResponse;
        type Error = HttpError;
        type Future = std::future::Ready<Result<HttpResponse, HttpError>>;

        fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, _: HttpRequest) -> Self::Future {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.succeed_on == Some(n) {
                std::future::ready(Ok(Response::new(full_body(format!("response {n}")))))
            } else {
                std::future::ready(Err(HttpError::transport(format!("failure {n}"))))
            }
        }
    }

    /// Transport whose readiness always fails.
    #[derive(Clone, Default)]
    struct NeverReadyTransport {
        polls: Arc<AtomicUsize>,
    }

    impl Service<HttpRequest> for NeverReadyTransport {
        type Response = HttpResponse;
        type Error = HttpError;
        type Future = std::future::Ready<Result<HttpResponse, HttpError>>;

        fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            Poll::Ready(Err(HttpError::transport("pool closed")))
        }

        fn call(&mut self, _: HttpRequest) -> Self::Future {
            unreachable!("call must not run when poll_ready failed")
        }
    }

    fn request() -> HttpRequest {
        Request::builder()
            .method(Method::GET)
            .uri("http://example.com/orders")
            .body(Full::new(Bytes::new()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_always_failing_transport_called_attempts_times() {
        for attempts in [1, 2, 5] {
            let root = FlakyTransport::new(None);
            let mut svc = RetryLayer::try_new(attempts, Duration::ZERO)
                .unwrap()
                .layer(root.clone());

            let err = svc.execute(request()).await.unwrap_err();

            assert_eq!(root.calls(), attempts);
            assert_eq!(
                err.to_string(),
                format!("Transport error: failure {attempts}"),
                "final failure must come from the last call"
            );
        }
    }

    #[tokio::test]
    async fn test_success_on_kth_call_stops_retrying() {
        let root = FlakyTransport::new(Some(3));
        let mut svc = RetryLayer::try_new(5, Duration::ZERO)
            .unwrap()
            .layer(root.clone());

        let resp = svc.execute(request()).await.unwrap();

        assert_eq!(root.calls(), 3);
        assert_eq!(collect_body(resp).await.unwrap(), "response 3");
    }

    #[tokio::test]
    async fn test_success_on_first_call_no_retry() {
        let root = FlakyTransport::new(Some(1));
        let mut svc = RetryLayer::try_new(3, Duration::from_secs(60))
            .unwrap()
            .layer(root.clone());

        svc.execute(request()).await.unwrap();
        assert_eq!(root.calls(), 1);
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let err = RetryLayer::try_new(0, Duration::from_millis(10)).unwrap_err();
        assert!(matches!(err, HttpError::InvalidConfig(_)));
    }

    #[test]
    fn test_from_config() {
        let config = RetryConfig {
            attempts: 4,
            backoff: Duration::from_millis(250),
        };
        let layer = RetryLayer::from_config(&config).unwrap();
        assert_eq!(layer.attempts(), 4);
        assert_eq!(layer.backoff(), Duration::from_millis(250));
    }

    /// Always-failing transport that records the offset of each call from `origin`.
    #[derive(Clone)]
    struct TimedFailingTransport {
        origin: tokio::time::Instant,
        offsets: Arc<Mutex<Vec<Duration>>>,
    }

    impl TimedFailingTransport {
        fn new() -> Self {
            Self {
                origin: tokio::time::Instant::now(),
                offsets: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn offsets(&self) -> Vec<Duration> {
            self.offsets.lock().unwrap().clone()
        }
    }

    impl Service<HttpRequest> for TimedFailingTransport {
        type Response = HttpResponse;
        type Error = HttpError;
        type Future = std::future::Ready<Result<HttpResponse, HttpError>>;

        fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Ready(Ok(()))
        }

        fn call(&mut self, _: HttpRequest) -> Self::Future {
            self.offsets.lock().unwrap().push(self.origin.elapsed());
            std::future::ready(Err(HttpError::transport("down")))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_grows_linearly() {
        let root = TimedFailingTransport::new();
        let mut svc = RetryLayer::try_new(3, Duration::from_millis(100))
            .unwrap()
            .layer(root.clone());

        svc.execute(request()).await.unwrap_err();

        // sleeps 0ms, 100ms and 200ms after attempts 0, 1 and 2
        assert_eq!(
            root.offsets(),
            vec![
                Duration::ZERO,
                Duration::ZERO,
                Duration::from_millis(100)
            ]
        );
        assert_eq!(root.origin.elapsed(), Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_final_failure_waits_its_own_backoff() {
        let root = TimedFailingTransport::new();
        let mut svc = RetryLayer::try_new(2, Duration::from_millis(250))
            .unwrap()
            .layer(root.clone());

        svc.execute(request()).await.unwrap_err();

        assert_eq!(root.offsets(), vec![Duration::ZERO, Duration::ZERO]);
        assert_eq!(root.origin.elapsed(), Duration::from_millis(250));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_retry_is_immediate() {
        let root = FlakyTransport::new(Some(2));
        let mut svc = RetryLayer::try_new(3, Duration::from_secs(5))
            .unwrap()
            .layer(root.clone());

        let started = tokio::time::Instant::now();
        svc.execute(request()).await.unwrap();

        assert_eq!(root.calls(), 2);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_sleep_when_first_attempt_succeeds() {
        let root = FlakyTransport::new(Some(1));
        let mut svc = RetryLayer::try_new(3, Duration::from_secs(5))
            .unwrap()
            .layer(root);

        let started = tokio::time::Instant::now();
        svc.execute(request()).await.unwrap();
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_readiness_failure_counts_as_attempt() {
        let root = NeverReadyTransport::default();
        let mut svc = RetryLayer::try_new(3, Duration::ZERO)
            .unwrap()
            .layer(root.clone());

        let err = svc.execute(request()).await.unwrap_err();

        assert_eq!(root.polls.load(Ordering::SeqCst), 3);
        assert_eq!(err.to_string(), "Transport error: pool closed");
    }

    #[test]
    fn test_linear_backoff() {
        let base = Duration::from_millis(100);
        assert_eq!(linear_backoff(base, 0), Duration::ZERO);
        assert_eq!(linear_backoff(base, 1), Duration::from_millis(100));
        assert_eq!(linear_backoff(base, 3), Duration::from_millis(300));
        assert_eq!(linear_backoff(Duration::ZERO, 7), Duration::ZERO);
        assert_eq!(linear_backoff(Duration::MAX, 2), Duration::MAX);
    }
}
