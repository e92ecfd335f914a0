use std::{
    error::Error,
    pin::Pin,
    task::{Context, Poll},
};

use bytes::{Buf, Bytes};
use http::StatusCode;
use http_body::{Body as HttpBody, Frame, SizeHint};
use http_body_util::{BodyExt, Full, StreamBody};
use hyper::body::Incoming;

mod json;
mod limited;

pub use json::Json;
pub use limited::Limited;

#[derive(Debug, thiserror::Error)]
pub enum BodyError {
    #[error("Hyper error: {0}")]
    HyperError(#[from] hyper::Error),

    #[error("Stream Aborted")]
    StreamAborted,

    #[error("Length Limit Exceeded")]
    LengthLimitError,

    #[error(transparent)]
    Generic(Box<dyn Error + Send + Sync + 'static>),
}

impl BodyError {
    /// Status used when a body failure ends the request.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            BodyError::LengthLimitError => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

#[derive(Default)]
#[repr(transparent)]
pub struct Body(BodyInner);

#[derive(Default)]
#[pin_project::pin_project(project = BodyProj)]
enum BodyInner {
    #[default]
    Empty,
    Incoming(#[pin] Incoming),
    Full(#[pin] Full<Bytes>),
    Stream(#[pin] StreamBody<futures::stream::BoxStream<'static, Result<Frame<Bytes>, BodyError>>>),
    Dyn(#[pin] Pin<Box<dyn HttpBody<Data = Bytes, Error = BodyError> + Send + 'static>>),
}

// assert Send
const _: () = {
    const fn test_send<T: Send>() {}
    test_send::<Body>();
};

impl HttpBody for Body {
    type Data = Bytes;
    type Error = BodyError;

    #[inline]
    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        Pin::new(&mut self.get_mut().0).poll_frame(cx)
    }

    #[inline]
    fn is_end_stream(&self) -> bool {
        self.0.is_end_stream()
    }

    #[inline]
    fn size_hint(&self) -> SizeHint {
        self.0.size_hint()
    }
}

impl HttpBody for BodyInner {
    type Data = Bytes;
    type Error = BodyError;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match self.project() {
            BodyProj::Empty => Poll::Ready(None),
            BodyProj::Incoming(incoming) => incoming.poll_frame(cx).map_err(BodyError::from),
            BodyProj::Full(full) => full.poll_frame(cx).map_err(|e| match e {}),
            BodyProj::Stream(stream) => stream.poll_frame(cx),
            BodyProj::Dyn(body) => body.poll_frame(cx),
        }
    }

    fn is_end_stream(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Incoming(inner) => inner.is_end_stream(),
            Self::Full(inner) => inner.is_end_stream(),
            Self::Stream(inner) => inner.is_end_stream(),
            Self::Dyn(inner) => inner.is_end_stream(),
        }
    }

    fn size_hint(&self) -> SizeHint {
        match self {
            Self::Empty => SizeHint::with_exact(0),
            Self::Incoming(inner) => inner.size_hint(),
            Self::Full(inner) => inner.size_hint(),
            Self::Stream(inner) => inner.size_hint(),
            Self::Dyn(inner) => inner.size_hint(),
        }
    }
}

impl From<Bytes> for Body {
    #[inline]
    fn from(value: Bytes) -> Self {
        Body(BodyInner::Full(Full::new(value)))
    }
}

impl From<Vec<u8>> for Body {
    #[inline]
    fn from(value: Vec<u8>) -> Self {
        Bytes::from(value).into()
    }
}

impl From<String> for Body {
    #[inline]
    fn from(value: String) -> Self {
        Bytes::from(value).into()
    }
}

impl From<&'static str> for Body {
    #[inline]
    fn from(value: &'static str) -> Self {
        Bytes::from_static(value.as_bytes()).into()
    }
}

impl From<Incoming> for Body {
    #[inline]
    fn from(incoming: Incoming) -> Self {
        Body(BodyInner::Incoming(incoming))
    }
}

impl Body {
    /// Create a new empty body that yields no frames.
    #[must_use]
    pub const fn empty() -> Body {
        Body(BodyInner::Empty)
    }

    /// Takes the body, leaving [`Body::empty()`] in its place.
    pub fn take(&mut self) -> Self {
        std::mem::replace(self, Body::empty())
    }

    /// Creates an HTTP Body by wrapping a Stream of byte frames.
    pub fn stream<S>(stream: S) -> Body
    where
        S: futures::Stream<Item = Result<Frame<Bytes>, BodyError>> + Send + 'static,
    {
        Body(BodyInner::Stream(StreamBody::new(Box::pin(stream))))
    }

    pub fn wrap<B>(body: B) -> Body
    where
        B: HttpBody<Data = Bytes, Error = BodyError> + Send + 'static,
    {
        Body(BodyInner::Dyn(Box::pin(body)))
    }

    /// Cap the number of bytes this body may yield. Reading past the limit
    /// fails with [`BodyError::LengthLimitError`].
    #[must_use]
    pub fn limit(self, limit: u64) -> Body {
        Body::wrap(Limited::new(self, limit))
    }

    /// Read every remaining frame into a single contiguous buffer.
    pub async fn collect_bytes(&mut self) -> Result<Bytes, BodyError> {
        Ok(self.take().collect().await?.to_bytes())
    }

    /// Read the whole body as text, replacing invalid UTF-8 sequences
    /// with `U+FFFD`.
    pub async fn to_string_lossy(&mut self) -> Result<String, BodyError> {
        let mut buf = self.take().collect().await?.aggregate();
        let mut vec = vec![0u8; buf.remaining()];
        buf.copy_to_slice(&mut vec);

        Ok(match String::from_utf8(vec) {
            Ok(s) => s,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_collect_full_body() {
        let mut body = Body::from("<a>1</a>");
        assert_eq!(body.size_hint().exact(), Some(8));

        let bytes = body.collect_bytes().await.unwrap();
        assert_eq!(bytes, Bytes::from_static(b"<a>1</a>"));

        // taken
        assert!(body.is_end_stream());
    }

    #[tokio::test]
    async fn test_lossy_string() {
        let mut body = Body::from(vec![b'<', b'a', b'>', 0xFF, b'<', b'/', b'a', b'>']);
        assert_eq!(body.to_string_lossy().await.unwrap(), "<a>\u{FFFD}</a>");
    }

    #[tokio::test]
    async fn test_stream_error_surfaces() {
        let chunks = vec![Ok(Frame::data(Bytes::from_static(b"<a>"))), Err(BodyError::StreamAborted)];
        let mut body = Body::stream(futures::stream::iter(chunks));

        assert!(matches!(body.collect_bytes().await, Err(BodyError::StreamAborted)));
    }

    #[test]
    fn test_empty_hint() {
        let body = Body::empty();
        assert!(body.is_end_stream());
        assert_eq!(body.size_hint().exact(), Some(0));
    }
}
