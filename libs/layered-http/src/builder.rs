use crate::client::HttpClient;
use crate::config::{HttpClientConfig, TransportConfig};
use crate::connector::HyperTransport;
use crate::decorator::{Decorator, compose_boxed};
use crate::error::HttpError;
use crate::transport::{BoxTransport, HttpRequest, HttpResponse};
use tower::Service;

/// Builder for constructing an [`HttpClient`] from a root transport and decorators
///
/// ```text
/// call ──▶ extra decorators (last added first) ──▶ retry ──▶ authorization ──▶ headers ──▶ root
/// ```
///
/// Decorators described by [`HttpClientConfig`] are applied first, then the
/// ones added with [`decorate`](Self::decorate) in the order they were added.
pub struct HttpClientBuilder {
    config: HttpClientConfig,
    root: Option<BoxTransport>,
    decorators: Vec<Decorator>,
}

impl HttpClientBuilder {
    /// Create a new builder with default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(HttpClientConfig::default())
    }

    /// Create a builder with a specific configuration
    #[must_use]
    pub fn with_config(config: HttpClientConfig) -> Self {
        Self {
            config,
            root: None,
            decorators: Vec::new(),
        }
    }

    /// Use `transport` as the innermost transport instead of [`HyperTransport`]
    ///
    /// When set, `transport_config` settings are ignored.
    #[must_use]
    pub fn root<T>(mut self, transport: T) -> Self
    where
        T: Service<HttpRequest, Response = HttpResponse, Error = HttpError>
            + Clone
            + Send
            + Sync
            + 'static,
        T::Future: Send + 'static,
    {
        self.root = Some(BoxTransport::new(transport));
        self
    }

    /// Set the settings of the default hyper-backed root transport
    #[must_use]
    pub fn transport_config(mut self, transport: TransportConfig) -> Self {
        self.config.transport = transport;
        self
    }

    /// Append a decorator; each one added wraps everything before it
    #[must_use]
    pub fn decorate(mut self, decorator: Decorator) -> Self {
        self.decorators.push(decorator);
        self
    }

    /// Build the HTTP client
    ///
    /// # Errors
    /// Returns an error if the configuration describes an invalid header or a
    /// retry policy with zero attempts
    pub fn build(self) -> Result<HttpClient, HttpError> {
        let mut decorators = self.config.decorators()?;
        decorators.extend(self.decorators);

        let custom_root = self.root.is_some();
        let root = match self.root {
            Some(root) => root,
            None => BoxTransport::new(HyperTransport::with_config(&self.config.transport)),
        };

        let names: Vec<&str> = decorators.iter().map(Decorator::name).collect();
        tracing::debug!(
            custom_root,
            count = names.len(),
            decorators = ?names,
            "building http client"
        );

        Ok(HttpClient::from_boxed(compose_boxed(root, &decorators)))
    }
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
