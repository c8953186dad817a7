//! Buffered poll-level IO over a generic transport.
use bytes::{Buf, BytesMut};
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll, ready};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

const DEFAULT_BUFFER_CAP: usize = 1024;

/// Read and write buffers over a transport.
///
/// Reads land in a growable read buffer the parsers and body decoders
/// consume from, writes are staged in a write buffer and flushed as the
/// transport accepts them.
pub(crate) struct IoBuffer<IO> {
    io: IO,
    read_buffer: BytesMut,
    write_buffer: BytesMut,
}

impl<IO> IoBuffer<IO> {
    pub fn new(io: IO) -> Self {
        Self {
            io,
            read_buffer: BytesMut::with_capacity(DEFAULT_BUFFER_CAP),
            write_buffer: BytesMut::with_capacity(DEFAULT_BUFFER_CAP),
        }
    }

    pub fn read_buffer_mut(&mut self) -> &mut BytesMut {
        &mut self.read_buffer
    }

    pub fn write_buffer_mut(&mut self) -> &mut BytesMut {
        &mut self.write_buffer
    }

    /// Reclaim read buffer capacity between requests.
    pub fn reclaim(&mut self) {
        // `reserve` reclaims the buffer when no shared references are left,
        // reallocating only if consumers still hold split off chunks
        if self.read_buffer.is_empty() {
            self.read_buffer.reserve(DEFAULT_BUFFER_CAP);
        }
    }
}

impl<IO> IoBuffer<IO>
where
    IO: AsyncRead + Unpin,
{
    /// Read more bytes into the read buffer.
    ///
    /// Returns the number of bytes read, zero at end of stream.
    pub fn poll_read_buf(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<usize>> {
        if self.read_buffer.spare_capacity_mut().len() < DEFAULT_BUFFER_CAP / 2 {
            self.read_buffer.reserve(DEFAULT_BUFFER_CAP);
        }

        let mut buf = ReadBuf::uninit(self.read_buffer.spare_capacity_mut());
        ready!(Pin::new(&mut self.io).poll_read(cx, &mut buf))?;
        let read = buf.filled().len();

        // SAFETY: `poll_read` filled and initialized `read` bytes of the
        // spare capacity
        unsafe { self.read_buffer.set_len(self.read_buffer.len() + read) };

        Poll::Ready(Ok(read))
    }
}

impl<IO> IoBuffer<IO>
where
    IO: AsyncWrite + Unpin,
{
    /// Write the whole write buffer out and flush the transport.
    pub fn poll_flush(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        while !self.write_buffer.is_empty() {
            let written = ready!(Pin::new(&mut self.io).poll_write(cx, &self.write_buffer))?;
            if written == 0 {
                return Poll::Ready(Err(io::ErrorKind::WriteZero.into()));
            }
            self.write_buffer.advance(written);
        }
        Pin::new(&mut self.io).poll_flush(cx)
    }

    pub fn poll_shutdown(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.io).poll_shutdown(cx)
    }
}

impl<IO> std::fmt::Debug for IoBuffer<IO> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("IoBuffer").finish_non_exhaustive()
    }
}
