//! Tower layers backing the decorator library
//!
//! ## Available Layers
//!
//! - [`RetryLayer`] - Retries failed calls with linearly growing backoff
//! - [`HeaderLayer`] - Appends a static header to every request; its
//!   `authorization` and `basic_authorization` constructors build the
//!   `Authorization` variants

mod auth;
mod header;
mod retry;

pub use header::{HeaderLayer, HeaderService};
pub use retry::{RetryLayer, RetryService, linear_backoff};
