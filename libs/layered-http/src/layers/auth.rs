use super::header::HeaderLayer;
use crate::error::HttpError;
use base64::{Engine as _, engine::general_purpose};
use http::HeaderValue;
use http::header::AUTHORIZATION;
use zeroize::Zeroizing;

impl HeaderLayer {
    /// Create a layer that appends `Authorization: <token>` verbatim.
    ///
    /// The token is used as-is, so include the scheme (`Bearer abc`). The
    /// header value is marked sensitive and prints redacted in `Debug`.
    ///
    /// # Errors
    /// Returns `HttpError::InvalidHeaderValue` if the token contains characters
    /// not allowed in a header value
    pub fn authorization(token: impl AsRef<str>) -> Result<Self, HttpError> {
        let mut value = HeaderValue::from_str(token.as_ref())?;
        value.set_sensitive(true);
        Ok(Self::from_parts(AUTHORIZATION, value))
    }

    /// Create a layer that appends `Authorization: Basic base64(username:password)`.
    ///
    /// Credentials are joined with a single colon and encoded with the
    /// standard padded base64 alphabet. A colon inside `username` is not
    /// escaped.
    ///
    /// # Errors
    /// Returns `HttpError::InvalidHeaderValue` if the resulting value cannot be
    /// used as a header (not expected for base64 output)
    pub fn basic_authorization(username: &str, password: &str) -> Result<Self, HttpError> {
        let credentials = Zeroizing::new(format!("{username}:{password}"));
        let encoded = Zeroizing::new(general_purpose::STANDARD.encode(credentials.as_bytes()));
        let token = Zeroizing::new(format!("Basic {}", &*encoded));
        Self::authorization(token.as_str())
    }
}
