use crate::error::HttpError;
use crate::transport::HttpResponse;
use bytes::Bytes;
use http_body_util::BodyExt;

/// Type alias for the boxed response body returned by every transport.
///
/// The body is type-erased so that roots backed by different engines (or by
/// plain closures in tests) share one response type.
pub type ResponseBody =
    http_body_util::combinators::BoxBody<Bytes, Box<dyn std::error::Error + Send + Sync>>;

/// Build a [`ResponseBody`] from in-memory bytes.
#[cfg(test)]
pub fn full_body(data: impl Into<Bytes>) -> ResponseBody {
    http_body_util::Full::new(data.into())
        .map_err(|e| -> Box<dyn std::error::Error + Send + Sync> { Box::new(e) })
        .boxed()
}

/// Read the whole response body into memory.
///
/// # Errors
/// Returns `HttpError::Transport` if reading a body frame fails
pub async fn collect_body(response: HttpResponse) -> Result<Bytes, HttpError> {
    let collected = response
        .into_body()
        .collect()
        .await
        .map_err(HttpError::Transport)?;
    Ok(collected.to_bytes())
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use http::Response;
    use http_body::Frame;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    #[tokio::test]
    async fn test_collect_body_reads_all_bytes() {
        let response = Response::new(full_body("hello there!"));
        let body = collect_body(response).await.unwrap();
        assert_eq!(body, Bytes::from_static(b"hello there!"));
    }

    /// Body whose first frame is an I/O failure.
    struct BrokenBody;

    impl http_body::Body for BrokenBody {
        type Data = Bytes;
        type Error = Box<dyn std::error::Error + Send + Sync>;

        fn poll_frame(
            self: Pin<&mut Self>,
            _: &mut Context<'_>,
        ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
            Poll::Ready(Some(Err("connection reset".into())))
        }
    }

    #[tokio::test]
    async fn test_collect_body_surfaces_frame_errors() {
        let response = Response::new(BrokenBody.boxed());
        let err = collect_body(response).await.unwrap_err();
        assert!(
            matches!(err, HttpError::Transport(ref source) if source.to_string() == "connection reset")
        );
    }
}
