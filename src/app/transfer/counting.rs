//! Byte-counting write adapter
//!
//! [`CountingWriter`] forwards every write to the wrapped sink and adds the
//! number of bytes the sink actually accepted to a shared atomic counter, so
//! the progress sampler can read the transfer size without locking.

use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};

use tokio::io::AsyncWrite;

/// Write adapter that counts accepted bytes
#[derive(Debug)]
pub struct CountingWriter<'a, W> {
    inner: W,
    counter: &'a AtomicU64,
}

impl<'a, W> CountingWriter<'a, W> {
    /// Wrap `inner`, adding accepted bytes to `counter`
    pub fn new(inner: W, counter: &'a AtomicU64) -> Self {
        Self { inner, counter }
    }

    /// Current counter value
    pub fn count(&self) -> u64 {
        self.counter.load(Ordering::Acquire)
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: AsyncWrite + Unpin> AsyncWrite for CountingWriter<'_, W> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        let result = Pin::new(&mut this.inner).poll_write(cx, buf);
        if let Poll::Ready(Ok(written)) = &result {
            if *written > 0 {
                this.counter.fetch_add(*written as u64, Ordering::AcqRel);
            }
        }
        result
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}
