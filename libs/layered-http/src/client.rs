use crate::builder::HttpClientBuilder;
use crate::connector::HyperTransport;
use crate::error::{HttpError, InvalidUriKind};
use crate::transport::{BoxTransport, HttpRequest, HttpResponse};
use bytes::Bytes;
use http::{Method, Request};
use http_body_util::Full;
use std::task::{Context, Poll};
use tower::{Service, ServiceExt};

/// HTTP client holding a composed transport
///
/// `HttpClient` is `Clone + Send + Sync`; each call runs on a clone of the
/// composed transport, so it can be stored and shared directly without a
/// `Mutex`.
///
/// It is itself a transport, so a built client can serve as the root of a
/// further composition without affecting the original.
///
/// # Example
///
/// ```ignore
/// let client = HttpClient::builder()
///     .decorate(authorization("Bearer abc")?)
///     .build()?;
///
/// let resp = client.get("http://localhost:8080/api/items").await?;
/// ```
#[derive(Clone)]
pub struct HttpClient {
    transport: BoxTransport,
}

impl HttpClient {
    /// Create a client over the default [`HyperTransport`] with no decorators
    #[must_use]
    pub fn new() -> Self {
        Self::from_transport(HyperTransport::new())
    }

    /// Create a builder for configuring the client
    #[must_use]
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::new()
    }

    /// Create a client that executes requests on `transport` as-is
    #[must_use]
    pub fn from_transport<T>(transport: T) -> Self
    where
        T: Service<HttpRequest, Response = HttpResponse, Error = HttpError>
            + Clone
            + Send
            + Sync
            + 'static,
        T::Future: Send + 'static,
    {
        Self {
            transport: BoxTransport::new(transport),
        }
    }

    /// Create a client over an already type-erased transport
    #[must_use]
    pub fn from_boxed(transport: BoxTransport) -> Self {
        Self { transport }
    }

    /// Execute a request through the composed transport
    ///
    /// # Errors
    /// Returns whatever failure the composed transport surfaces
    pub async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        self.transport.clone().oneshot(request).await
    }

    /// Send a `GET` request with an empty body
    ///
    /// The URL must be absolute (scheme and host).
    ///
    /// # Errors
    /// Returns `HttpError::InvalidUri` for a malformed or relative URL, or the
    /// failure surfaced by the composed transport
    pub async fn get(&self, url: &str) -> Result<HttpResponse, HttpError> {
        self.send(Method::GET, url, Bytes::new()).await
    }

    /// Send a request with the given method and body
    ///
    /// # Errors
    /// Returns `HttpError::InvalidUri` for a malformed or relative URL, or the
    /// failure surfaced by the composed transport
    pub async fn send(
        &self,
        method: Method,
        url: &str,
        body: impl Into<Bytes>,
    ) -> Result<HttpResponse, HttpError> {
        let uri = validate_url(url)?;
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .body(Full::new(body.into()))?;
        self.execute(request).await
    }

    /// Composed transport backing this client
    #[must_use]
    pub fn transport(&self) -> BoxTransport {
        self.transport.clone()
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<HttpRequest> for HttpClient {
    type Response = HttpResponse;
    type Error = HttpError;
    type Future = <BoxTransport as Service<HttpRequest>>::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.transport.poll_ready(cx)
    }

    fn call(&mut self, req: HttpRequest) -> Self::Future {
        self.transport.call(req)
    }
}

/// Parse `url` and require an absolute URI (scheme and authority).
fn validate_url(url: &str) -> Result<http::Uri, HttpError> {
    let uri: http::Uri = url
        .parse()
        .map_err(|e: http::uri::InvalidUri| HttpError::InvalidUri {
            url: url.to_owned(),
            kind: InvalidUriKind::ParseError,
            reason: e.to_string(),
        })?;

    if uri.scheme().is_none() {
        return Err(HttpError::InvalidUri {
            url: url.to_owned(),
            kind: InvalidUriKind::MissingScheme,
            reason: "missing scheme".to_owned(),
        });
    }

    if uri.authority().is_none() {
        return Err(HttpError::InvalidUri {
            url: url.to_owned(),
            kind: InvalidUriKind::MissingAuthority,
            reason: "missing host/authority".to_owned(),
        });
    }

    Ok(uri)
}
