//! Accept loop and engine configuration.
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, ready};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};

#[cfg(unix)]
use tokio::net::{UnixListener, UnixStream};

use crate::body::DEFAULT_MAX_CHUNK_LINE;
use crate::h1::Connection;
use crate::log::error;
use crate::request::ConnectionInfo;
use crate::service::HttpService;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

// ===== Config =====

/// Engine limits and timeouts.
///
/// Every field has a documented default and can be overridden before handing
/// the config to [`Server::with_config`] or
/// [`Connection::with_config`][crate::h1::Connection::with_config].
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum size of a request header block in bytes, request line
    /// included. Default `8192`, exceeding it yields `431`.
    pub max_header_bytes: usize,
    /// Maximum number of header lines. Default `64`, exceeding it yields
    /// `431`.
    pub max_headers: usize,
    /// Maximum length of a chunk-size line in a chunked request body.
    /// Default `1024`, exceeding it fails the body stream.
    pub max_chunk_line_bytes: usize,
    /// Time limit for receiving a complete request header block, keep-alive
    /// idle time included. Default 30 seconds, `None` disables the limit.
    pub header_timeout: Option<Duration>,
    /// Unread request body bytes the engine discards to keep a connection
    /// reusable. Default `65536`, a larger remainder closes the connection
    /// instead.
    pub max_drain_bytes: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_header_bytes: 8192,
            max_headers: 64,
            max_chunk_line_bytes: DEFAULT_MAX_CHUNK_LINE,
            header_timeout: Some(Duration::from_secs(30)),
            max_drain_bytes: 64 * 1024,
        }
    }
}

// ===== Listener =====

/// An accept source producing connections to serve.
pub trait Listener {
    type Stream: AsyncRead + AsyncWrite + Unpin;

    type Addr;

    fn poll_accept(
        &self,
        cx: &mut Context,
    ) -> Poll<io::Result<(Self::Stream, Self::Addr)>>;

    /// Connection metadata recorded for requests on this stream.
    fn connection_info(stream: &Self::Stream, addr: &Self::Addr) -> ConnectionInfo {
        let _ = (stream, addr);
        ConnectionInfo::default()
    }
}

impl Listener for TcpListener {
    type Stream = TcpStream;

    type Addr = SocketAddr;

    #[inline]
    fn poll_accept(
        &self,
        cx: &mut Context,
    ) -> Poll<io::Result<(Self::Stream, Self::Addr)>> {
        TcpListener::poll_accept(self, cx)
    }

    fn connection_info(stream: &Self::Stream, addr: &Self::Addr) -> ConnectionInfo {
        ConnectionInfo {
            local_addr: stream.local_addr().ok(),
            remote_addr: Some(*addr),
            ..ConnectionInfo::default()
        }
    }
}

#[cfg(unix)]
impl Listener for UnixListener {
    type Stream = UnixStream;

    type Addr = tokio::net::unix::SocketAddr;

    #[inline]
    fn poll_accept(
        &self,
        cx: &mut Context,
    ) -> Poll<io::Result<(Self::Stream, Self::Addr)>> {
        UnixListener::poll_accept(self, cx)
    }
}

// ===== Server =====

/// Accept loop future, one spawned [`Connection`] per accepted stream.
#[derive(Debug)]
pub struct Server<L, S> {
    listener: L,
    service: Arc<S>,
    config: Arc<Config>,
}

impl<L, S> Server<L, S> {
    pub fn new(listener: L, service: S) -> Self {
        Self {
            listener,
            service: Arc::new(service),
            config: Arc::new(Config::default()),
        }
    }

    /// Override the engine limits for every served connection.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Arc::new(config);
        self
    }
}

impl<L, S> Future for Server<L, S>
where
    L: Listener<Stream: Send + 'static>,
    S: HttpService<Error: Into<BoxError>> + Send + Sync + 'static,
    S::Future: Send + 'static,
{
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context) -> Poll<Self::Output> {
        loop {
            let (io, addr) = match ready!(self.listener.poll_accept(cx)) {
                Ok(ok) => ok,
                Err(err) => {
                    error!("failed to accept peer: {err}");
                    continue;
                }
            };

            let info = L::connection_info(&io, &addr);
            let connection = Connection::with_config(io, Arc::clone(&self.service), Arc::clone(&self.config))
                .info(info);

            tokio::spawn(connection);
        }
    }
}
