#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![warn(warnings)]

//! Composable HTTP client built from a transport and a stack of decorators
//!
//! The crate is organised around three ideas:
//! - A **transport** executes one request and yields a response or a failure.
//!   Any `tower::Service<HttpRequest>` qualifies; plain closures become
//!   transports through [`transport_fn`].
//! - A **decorator** wraps one transport into another, adding behaviour:
//!   retry with linear backoff, header injection, authorization.
//! - The **composer** ([`compose`]) applies decorators in list order. The last
//!   decorator is the outermost layer and therefore runs first on every call.
//!
//! The network engine itself is a collaborator: [`HyperTransport`] adapts the
//! `hyper-util` client to the transport contract, and any other engine can be
//! plugged in as the root.
//!
//! # Example
//!
//! ```ignore
//! use layered_http::{HttpClient, basic_authorization, fault_tolerance, header};
//! use std::time::Duration;
//!
//! let client = HttpClient::builder()
//!     .decorate(header("x-client", "billing")?)
//!     .decorate(basic_authorization("svc", "s3cret")?)
//!     // listed last: outermost, so every attempt re-runs the layers above
//!     .decorate(fault_tolerance(3, Duration::from_millis(200))?)
//!     .build()?;
//!
//! let response = client.get("http://localhost:8080/health").await?;
//! let body = layered_http::collect_body(response).await?;
//! ```

mod builder;
mod client;
mod config;
mod connector;
mod decorator;
mod error;
mod layers;
mod response;
mod secret;
mod transport;

pub use builder::HttpClientBuilder;
pub use client::HttpClient;
pub use config::{AuthorizationConfig, HeaderConfig, HttpClientConfig, RetryConfig, TransportConfig};
pub use connector::HyperTransport;
pub use decorator::{
    Decorator, authorization, basic_authorization, compose, compose_boxed, fault_tolerance, header,
};
pub use error::{HttpError, InvalidUriKind};
pub use layers::{HeaderLayer, HeaderService, RetryLayer, RetryService, linear_backoff};
pub use response::{ResponseBody, collect_body};
pub use secret::SecretString;
pub use transport::{BoxTransport, HttpRequest, HttpResponse, TransportExt, TransportFn, transport_fn};
