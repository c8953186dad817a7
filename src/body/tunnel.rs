//! Raw byte forwarding for upgraded connections.
//!
//! After a `101` response, or a successful `CONNECT`, the connection stops
//! being interpreted as HTTP: the engine pipes raw socket bytes into the
//! tunnel and tunnel writes back to the socket. The application drives its
//! half through [`TunnelStream`], a plain duplex IO handle.
use bytes::{Buf, Bytes};
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

/// Create a connected tunnel pair.
///
/// The [`Tunnel`] half becomes the response body of the upgrade response,
/// the [`TunnelStream`] half is kept by the application and speaks the
/// post-upgrade protocol.
pub fn tunnel() -> (Tunnel, TunnelStream) {
    let (tx_in, rx_in) = unbounded_channel();
    let (tx_out, rx_out) = unbounded_channel();
    (
        Tunnel {
            peer: TunnelPeer {
                tx: Some(tx_in),
                rx: rx_out,
            },
        },
        TunnelStream {
            rx: rx_in,
            partial: Bytes::new(),
            tx: Some(tx_out),
        },
    )
}

/// The response body half of a tunnel, see [`tunnel`].
#[derive(Debug)]
pub struct Tunnel {
    pub(crate) peer: TunnelPeer,
}

/// Connection side of a tunnel, driven by the connection future.
#[derive(Debug)]
pub(crate) struct TunnelPeer {
    /// socket bytes towards the application, `None` once the socket reached
    /// end of stream
    pub(crate) tx: Option<UnboundedSender<Bytes>>,
    /// application bytes towards the socket
    pub(crate) rx: UnboundedReceiver<Bytes>,
}

/// Application side of a tunnel, see [`tunnel`].
///
/// Reads yield the raw bytes arriving on the connection after the upgrade
/// response, writes go out on the connection unframed. Shutting down the
/// write half ends the connection once pending bytes are flushed.
#[derive(Debug)]
pub struct TunnelStream {
    rx: UnboundedReceiver<Bytes>,
    partial: Bytes,
    tx: Option<UnboundedSender<Bytes>>,
}

impl AsyncRead for TunnelStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let me = self.get_mut();

        if me.partial.is_empty() {
            match me.rx.poll_recv(cx) {
                Poll::Ready(Some(data)) => me.partial = data,
                // connection reached end of stream
                Poll::Ready(None) => return Poll::Ready(Ok(())),
                Poll::Pending => return Poll::Pending,
            }
        }

        let len = me.partial.len().min(buf.remaining());
        buf.put_slice(&me.partial[..len]);
        me.partial.advance(len);
        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for TunnelStream {
    fn poll_write(
        self: Pin<&mut Self>,
        _: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let me = self.get_mut();
        let Some(tx) = &me.tx else {
            return Poll::Ready(Err(io::ErrorKind::BrokenPipe.into()));
        };
        match tx.send(Bytes::copy_from_slice(buf)) {
            Ok(()) => Poll::Ready(Ok(buf.len())),
            Err(_) => Poll::Ready(Err(io::ErrorKind::BrokenPipe.into())),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.get_mut().tx = None;
        Poll::Ready(Ok(()))
    }
}
