//! Streaming byte accounting for request and response bodies.
//!
//! [`CountingBody`] forwards frames untouched and adds the length of each
//! data frame to a shared [`ByteCounter`]. Nothing is buffered.

use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{ready, Context, Poll};

use bytes::Buf;
use http_body::{Body, Frame, SizeHint};
use pin_project_lite::pin_project;

/// Monotonic byte total shared between a body and whoever reports on it.
#[derive(Debug, Clone, Default)]
pub struct ByteCounter(Arc<AtomicU64>);

impl ByteCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, bytes: u64) {
        self.0.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Request and response byte totals for one request.
#[derive(Debug, Clone, Default)]
pub struct RequestByteCounters {
    pub request: ByteCounter,
    pub response: ByteCounter,
}

pin_project! {
    /// Body wrapper that counts data bytes as they stream through.
    #[derive(Debug)]
    pub struct CountingBody<B> {
        #[pin]
        inner: B,
        counter: ByteCounter,
    }
}

impl<B> CountingBody<B> {
    pub fn new(inner: B, counter: ByteCounter) -> Self {
        Self { inner, counter }
    }
}

impl<B: Body> Body for CountingBody<B> {
    type Data = B::Data;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.project();
        let frame = ready!(this.inner.poll_frame(cx));

        if let Some(Ok(frame)) = &frame {
            if let Some(data) = frame.data_ref() {
                this.counter.add(data.remaining() as u64);
            }
        }

        Poll::Ready(frame)
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}
