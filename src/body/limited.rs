use bytes::{Buf, Bytes};
use http_body::{Body as HttpBody, Frame, SizeHint};
use std::{
    pin::Pin,
    task::{Context, Poll},
};

use super::{Body, BodyError};

/// Body wrapper that errors once more than `remaining` bytes have been read.
#[pin_project::pin_project]
pub struct Limited {
    remaining: u64,
    #[pin]
    inner: Body,
}

impl Limited {
    pub fn new(inner: Body, limit: u64) -> Self {
        Limited { remaining: limit, inner }
    }
}

impl HttpBody for Limited {
    type Data = Bytes;
    type Error = BodyError;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.project();

        match this.inner.poll_frame(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Ready(Some(Err(e))) => Poll::Ready(Some(Err(e))),
            Poll::Ready(Some(Ok(frame))) => Poll::Ready(Some(match frame.data_ref() {
                Some(data) => match this.remaining.checked_sub(data.remaining() as u64) {
                    Some(remaining) => {
                        *this.remaining = remaining;
                        Ok(frame)
                    }
                    None => {
                        *this.remaining = 0;
                        Err(BodyError::LengthLimitError)
                    }
                },
                None => Ok(frame), // trailers
            })),
        }
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        let n = self.remaining;
        let mut hint = self.inner.size_hint();

        if hint.lower() >= n {
            hint.set_exact(n);
        } else if let Some(max) = hint.upper() {
            hint.set_upper(n.min(max));
        } else {
            hint.set_upper(n);
        }

        hint
    }
}
