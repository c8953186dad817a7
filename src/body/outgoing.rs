use bytes::Bytes;
use futures_core::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::body::tunnel::{Tunnel, TunnelPeer};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

type BoxStream = Pin<Box<dyn Stream<Item = Result<Bytes, BoxError>> + Send>>;

/// Response message body.
///
/// A bounded in-memory value is framed with `Content-Length`, a stream of
/// unknown total size with `Transfer-Encoding: chunked` on HTTP/1.1, and a
/// [`Tunnel`] switches the connection to raw forwarding.
#[derive(Default)]
pub struct Outgoing {
    repr: Repr,
}

enum Repr {
    Full(Bytes),
    Stream(BoxStream),
    Tunnel(Option<TunnelPeer>),
}

impl Default for Repr {
    #[inline]
    fn default() -> Self {
        Repr::Full(Bytes::new())
    }
}

impl Outgoing {
    /// Create an empty body.
    #[inline]
    pub const fn empty() -> Outgoing {
        Self {
            repr: Repr::Full(Bytes::new()),
        }
    }

    /// Create a bounded body from in-memory bytes.
    #[inline]
    pub fn full(bytes: impl Into<Bytes>) -> Outgoing {
        Self {
            repr: Repr::Full(bytes.into()),
        }
    }

    /// Create a body of unknown total size from a stream of byte chunks.
    #[inline]
    pub fn stream<S>(stream: S) -> Outgoing
    where
        S: Stream<Item = Result<Bytes, BoxError>> + Send + 'static,
    {
        Self {
            repr: Repr::Stream(Box::pin(stream)),
        }
    }

    /// Returns the known total size of the body, [`None`] for a stream of
    /// unknown size.
    pub fn size_hint(&self) -> Option<u64> {
        match &self.repr {
            Repr::Full(bytes) => Some(bytes.len() as u64),
            Repr::Stream(_) => None,
            Repr::Tunnel(_) => Some(0),
        }
    }

    pub(crate) fn is_tunnel(&self) -> bool {
        matches!(self.repr, Repr::Tunnel(_))
    }

    pub(crate) fn take_tunnel(&mut self) -> Option<TunnelPeer> {
        match &mut self.repr {
            Repr::Tunnel(peer) => peer.take(),
            _ => None,
        }
    }

    /// Pull the next body chunk.
    ///
    /// Returns `Ready(None)` at the end of the body.
    pub(crate) fn poll_data(&mut self, cx: &mut Context) -> Poll<Option<Result<Bytes, BoxError>>> {
        match &mut self.repr {
            Repr::Full(bytes) => Poll::Ready(if bytes.is_empty() {
                None
            } else {
                Some(Ok(std::mem::take(bytes)))
            }),
            Repr::Stream(stream) => stream.as_mut().poll_next(cx),
            Repr::Tunnel(_) => Poll::Ready(None),
        }
    }
}

impl From<Tunnel> for Outgoing {
    #[inline]
    fn from(tunnel: Tunnel) -> Self {
        Self {
            repr: Repr::Tunnel(Some(tunnel.peer)),
        }
    }
}

impl From<Bytes> for Outgoing {
    #[inline]
    fn from(bytes: Bytes) -> Self {
        Self::full(bytes)
    }
}

impl From<&'static str> for Outgoing {
    #[inline]
    fn from(value: &'static str) -> Self {
        Self::full(Bytes::from_static(value.as_bytes()))
    }
}

impl From<String> for Outgoing {
    #[inline]
    fn from(value: String) -> Self {
        Self::full(Bytes::from(value))
    }
}

impl From<Vec<u8>> for Outgoing {
    #[inline]
    fn from(value: Vec<u8>) -> Self {
        Self::full(Bytes::from(value))
    }
}

impl std::fmt::Debug for Outgoing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.repr {
            Repr::Full(bytes) => f.debug_tuple("Full").field(&bytes.len()).finish(),
            Repr::Stream(_) => f.debug_struct("Stream").finish_non_exhaustive(),
            Repr::Tunnel(_) => f.debug_struct("Tunnel").finish_non_exhaustive(),
        }
    }
}
