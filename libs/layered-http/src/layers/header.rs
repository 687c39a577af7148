use crate::error::HttpError;
use http::header::HeaderName;
use http::{HeaderValue, Request};
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Tower layer that appends a fixed header to every request
///
/// Existing values for the same header name are kept: the layer appends,
/// it never replaces. Two stacked layers with the same name therefore leave
/// both values on the request.
#[derive(Clone, Debug)]
pub struct HeaderLayer {
    name: HeaderName,
    value: HeaderValue,
}

impl HeaderLayer {
    /// Create a new `HeaderLayer` from string name and value
    ///
    /// # Errors
    /// Returns `HttpError::InvalidHeaderName` or `HttpError::InvalidHeaderValue`
    /// if either part is not a valid HTTP header component
    pub fn try_new(name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self, HttpError> {
        let name = HeaderName::from_bytes(name.as_ref().as_bytes())?;
        let value = HeaderValue::from_str(value.as_ref())?;
        Ok(Self { name, value })
    }

    /// Create a `HeaderLayer` from already validated parts
    #[must_use]
    pub fn from_parts(name: HeaderName, value: HeaderValue) -> Self {
        Self { name, value }
    }

    /// Header name this layer appends
    #[must_use]
    pub fn name(&self) -> &HeaderName {
        &self.name
    }

    /// Header value this layer appends
    #[must_use]
    pub fn value(&self) -> &HeaderValue {
        &self.value
    }
}

impl<S> Layer<S> for HeaderLayer {
    type Service = HeaderService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        HeaderService {
            inner,
            name: self.name.clone(),
            value: self.value.clone(),
        }
    }
}

/// Service that appends a header to requests before delegating
#[derive(Clone, Debug)]
pub struct HeaderService<S> {
    inner: S,
    name: HeaderName,
    value: HeaderValue,
}

impl<S, ReqBody> Service<Request<ReqBody>> for HeaderService<S>
where
    S: Service<Request<ReqBody>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        req.headers_mut()
            .append(self.name.clone(), self.value.clone());
        self.inner.call(req)
    }
}
