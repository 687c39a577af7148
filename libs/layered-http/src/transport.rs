//! Transport contract and the function adapter
//!
//! A transport executes a single request and yields a response or a failure.
//! The contract is `tower::Service`: anything implementing
//! `Service<HttpRequest, Response = HttpResponse, Error = HttpError>` can be
//! the root of a composition or the target of a decorator.

use crate::error::HttpError;
use crate::response::ResponseBody;
use bytes::Bytes;
use http::{Request, Response};
use http_body_util::Full;
use std::fmt;
use std::future::Future;
use std::task::{Context, Poll};
use tower::util::{BoxCloneSyncService, Oneshot};
use tower::{Service, ServiceExt};

/// Outbound request carried through every transport.
pub type HttpRequest = Request<Full<Bytes>>;

/// Response returned by every transport.
pub type HttpResponse = Response<ResponseBody>;

/// Type-erased transport.
///
/// This is what decorators consume and produce. It is `Clone + Send + Sync`,
/// so a composed transport can be shared and cloned per call.
pub type BoxTransport = BoxCloneSyncService<HttpRequest, HttpResponse, HttpError>;

/// `execute` for any transport: wait for readiness, then call once.
pub trait TransportExt<Req>: Service<Req> {
    /// Execute `request` and resolve to the transport's response or failure.
    fn execute(&mut self, request: Req) -> Oneshot<&mut Self, Req>
    where
        Self: Sized,
    {
        ServiceExt::<Req>::oneshot(self, request)
    }
}

impl<S, Req> TransportExt<Req> for S where S: Service<Req> {}

/// Transport backed by a plain function or closure.
///
/// Created by [`transport_fn`]. Always ready; each call invokes the function.
#[derive(Clone, Copy)]
pub struct TransportFn<F> {
    f: F,
}

/// Turn a function returning a future of `Result` into a transport.
///
/// ```ignore
/// let root = transport_fn(|_req: HttpRequest| async {
///     Err::<HttpResponse, _>(HttpError::transport("offline"))
/// });
/// ```
#[must_use]
pub fn transport_fn<F>(f: F) -> TransportFn<F> {
    TransportFn { f }
}

impl<F, Fut, Req, Res, E> Service<Req> for TransportFn<F>
where
    F: FnMut(Req) -> Fut,
    Fut: Future<Output = Result<Res, E>>,
{
    type Response = Res;
    type Error = E;
    type Future = Fut;

    fn poll_ready(&mut self, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Req) -> Self::Future {
        (self.f)(req)
    }
}

impl<F> fmt::Debug for TransportFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportFn")
            .field("f", &std::any::type_name::<F>())
            .finish()
    }
}
