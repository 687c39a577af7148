//! Decorators and the composer
//!
//! A [`Decorator`] turns one transport into another. [`compose`] applies a
//! list of them to a root, each wrapping everything built so far:
//!
//! ```text
//! compose(root, [A, B])  ==  B(A(root))
//!
//! call ──▶ B ──▶ A ──▶ root
//! ```
//!
//! The last decorator listed is the outermost layer and runs first. List
//! retry last to retry the whole stack, first to retry only the root call.

use crate::error::HttpError;
use crate::layers::{HeaderLayer, RetryLayer};
use crate::transport::{BoxTransport, HttpRequest, HttpResponse};
use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tower::{Layer, Service};

type DecorateFn = dyn Fn(BoxTransport) -> BoxTransport + Send + Sync;

/// Type-erased transform from one transport to another
///
/// Cheap to clone; building one captures only configuration, so a single
/// decorator can be applied to any number of transports.
#[derive(Clone)]
pub struct Decorator {
    name: &'static str,
    decorate: Arc<DecorateFn>,
}

impl Decorator {
    /// Create a decorator from a transform function.
    #[must_use]
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(BoxTransport) -> BoxTransport + Send + Sync + 'static,
    {
        Self {
            name: "custom",
            decorate: Arc::new(f),
        }
    }

    /// Create a decorator from any tower layer over [`BoxTransport`].
    #[must_use]
    pub fn from_layer<L>(layer: L) -> Self
    where
        L: Layer<BoxTransport> + Send + Sync + 'static,
        L::Service: Service<HttpRequest, Response = HttpResponse, Error = HttpError>
            + Clone
            + Send
            + Sync
            + 'static,
        <L::Service as Service<HttpRequest>>::Future: Send + 'static,
    {
        Self {
            name: std::any::type_name::<L>(),
            decorate: Arc::new(move |inner| BoxTransport::new(layer.layer(inner))),
        }
    }

    /// Label used in logs and `Debug` output.
    #[must_use]
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Label of this decorator.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Wrap `transport`, returning the decorated transport.
    ///
    /// The argument is consumed; clone it first to keep using the undecorated
    /// transport.
    #[must_use]
    pub fn decorate(&self, transport: BoxTransport) -> BoxTransport {
        (self.decorate)(transport)
    }
}

impl fmt::Debug for Decorator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decorator")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl<S> Layer<S> for Decorator
where
    S: Service<HttpRequest, Response = HttpResponse, Error = HttpError>
        + Clone
        + Send
        + Sync
        + 'static,
    S::Future: Send + 'static,
{
    type Service = BoxTransport;

    fn layer(&self, inner: S) -> Self::Service {
        self.decorate(BoxTransport::new(inner))
    }
}

/// Apply `decorators` to `root` in order, each wrapping the previous result.
///
/// With no decorators the result behaves exactly like `root`. Use
/// [`compose_boxed`] when the root is already a [`BoxTransport`].
#[must_use]
pub fn compose<T, I>(root: T, decorators: I) -> BoxTransport
where
    T: Service<HttpRequest, Response = HttpResponse, Error = HttpError>
        + Clone
        + Send
        + Sync
        + 'static,
    T::Future: Send + 'static,
    I: IntoIterator,
    I::Item: Borrow<Decorator>,
{
    compose_boxed(BoxTransport::new(root), decorators)
}

/// [`compose`] over an already type-erased root, without boxing it again.
#[must_use]
pub fn compose_boxed<I>(root: BoxTransport, decorators: I) -> BoxTransport
where
    I: IntoIterator,
    I::Item: Borrow<Decorator>,
{
    decorators
        .into_iter()
        .fold(root, |decorated, decorator| decorator.borrow().decorate(decorated))
}

/// Retry failed calls up to `attempts` times with linear backoff.
///
/// # Errors
/// Returns `HttpError::InvalidConfig` if `attempts` is zero
pub fn fault_tolerance(attempts: usize, backoff: Duration) -> Result<Decorator, HttpError> {
    let layer = RetryLayer::try_new(attempts, backoff)?;
    Ok(Decorator::from_layer(layer).named("fault_tolerance"))
}

/// Append `key: value` to every request.
///
/// # Errors
/// Returns an error if the key or value is not a valid header component
pub fn header(key: impl AsRef<str>, value: impl AsRef<str>) -> Result<Decorator, HttpError> {
    let layer = HeaderLayer::try_new(key, value)?;
    Ok(Decorator::from_layer(layer).named("header"))
}

/// Append `Authorization: <token>` to every request.
///
/// # Errors
/// Returns `HttpError::InvalidHeaderValue` if the token is not a valid header value
pub fn authorization(token: impl AsRef<str>) -> Result<Decorator, HttpError> {
    let layer = HeaderLayer::authorization(token)?;
    Ok(Decorator::from_layer(layer).named("authorization"))
}

/// Append `Authorization: Basic base64(username:password)` to every request.
///
/// # Errors
/// Returns `HttpError::InvalidHeaderValue` if the encoded value is rejected
pub fn basic_authorization(username: &str, password: &str) -> Result<Decorator, HttpError> {
    let layer = HeaderLayer::basic_authorization(username, password)?;
    Ok(Decorator::from_layer(layer).named("basic_authorization"))
}
