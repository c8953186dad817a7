use bytes::{Bytes, BytesMut};
use std::task::{Context, Poll};

use crate::body::error::ReadError;
use crate::body::handle::Reader;

/// Request message body.
///
/// Either fully buffered bytes or a live stream decoded from the connection.
/// The body emits at most one terminal event, end or error, and no data
/// after it.
///
/// Dropping or [`close`]-ing the body never affects the underlying
/// connection, unread bytes are discarded by the connection itself.
///
/// [`close`]: Incoming::close
#[derive(Debug, Default)]
pub struct Incoming {
    repr: Repr,
}

#[derive(Debug)]
enum Repr {
    Bytes(Bytes),
    Handle {
        reader: Reader,
        size_hint: Option<u64>,
    },
}

impl Default for Repr {
    #[inline]
    fn default() -> Self {
        Repr::Bytes(Bytes::new())
    }
}

// ===== Constructor =====

impl Incoming {
    /// Create an exact size body.
    #[inline]
    pub fn new(bytes: impl Into<Bytes>) -> Incoming {
        Self {
            repr: Repr::Bytes(bytes.into()),
        }
    }

    /// Create an empty body.
    ///
    /// Its end is observable immediately, a handler that never reads is not
    /// left waiting.
    #[inline]
    pub const fn empty() -> Incoming {
        Self {
            repr: Repr::Bytes(Bytes::new()),
        }
    }

    #[inline]
    pub(crate) fn from_reader(reader: Reader, size_hint: Option<u64>) -> Self {
        Self {
            repr: Repr::Handle { reader, size_hint },
        }
    }
}

// ===== Ref =====

impl Incoming {
    /// Returns the bounds on the remaining length of the message body.
    ///
    /// The first element is the lower bound, the second the upper bound;
    /// [`None`] means there is no known upper bound, as for a chunked body.
    pub fn size_hint(&self) -> (u64, Option<u64>) {
        match &self.repr {
            Repr::Bytes(b) => (b.len() as u64, Some(b.len() as u64)),
            Repr::Handle { size_hint, .. } => (size_hint.unwrap_or(0), *size_hint),
        }
    }
}

// ===== Read =====

impl Incoming {
    /// Tries to read the next data chunk from the body.
    ///
    /// Returns `Ready(None)` at the end of the body.
    pub fn poll_data(&mut self, cx: &mut Context) -> Poll<Option<Result<Bytes, ReadError>>> {
        match &mut self.repr {
            Repr::Bytes(b) => Poll::Ready(if b.is_empty() {
                None
            } else {
                Some(Ok(std::mem::take(b)))
            }),
            Repr::Handle { reader, size_hint } => {
                let result = std::task::ready!(reader.poll_data(cx));
                if let Some(Ok(data)) = &result
                    && let Some(size_hint) = size_hint
                {
                    *size_hint = size_hint.saturating_sub(data.len() as u64);
                }
                Poll::Ready(result)
            }
        }
    }

    /// Read the next data chunk from the body.
    #[inline]
    pub fn read(&mut self) -> impl Future<Output = Option<Result<Bytes, ReadError>>> {
        std::future::poll_fn(|cx| self.poll_data(cx))
    }

    /// Collect the whole body into contiguous bytes.
    #[inline]
    pub fn collect(self) -> Collect {
        Collect {
            body: self,
            buffer: BytesMut::new(),
        }
    }

    /// Close the body.
    ///
    /// Buffered and further body bytes are discarded. The underlying
    /// connection stays open and keeps serving subsequent requests.
    pub fn close(&mut self) {
        match &mut self.repr {
            Repr::Bytes(b) => *b = Bytes::new(),
            Repr::Handle { reader, .. } => reader.close(),
        }
    }
}

/// Future for [`Incoming::collect`].
#[derive(Debug)]
#[must_use = "futures do nothing unless polled"]
pub struct Collect {
    body: Incoming,
    buffer: BytesMut,
}

impl Future for Collect {
    type Output = Result<Bytes, ReadError>;

    fn poll(self: std::pin::Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let me = self.get_mut();
        loop {
            match std::task::ready!(me.body.poll_data(cx)) {
                Some(Ok(data)) => me.buffer.extend_from_slice(&data),
                Some(Err(err)) => return Poll::Ready(Err(err)),
                None => return Poll::Ready(Ok(me.buffer.split().freeze())),
            }
        }
    }
}
