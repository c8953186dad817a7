//! Per connection orchestrator.
//!
//! One [`Connection`] future owns the transport and drives the whole
//! exchange: parse the request head, feed the request body on demand while
//! the service runs, frame and write the response, then either reuse the
//! connection, switch it to raw tunnel forwarding, or close it.
use std::io;
use std::mem;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, ready};
use std::time::{Duration, SystemTime};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::Sleep;

use crate::body::error::BodyError;
use crate::body::handle::{self, Demand, Feeder};
use crate::body::tunnel::TunnelPeer;
use crate::body::{BodyDecoder, ChunkedEncoder, Incoming, Outgoing};
use crate::common::ParseResult;
use crate::h1::error::{H1Error, H1ErrorKind};
use crate::h1::io::IoBuffer;
use crate::h1::parser;
use crate::h1::proto::{self, HttpState, RequestContext, ResponseFraming};
use crate::headers::HeaderMap;
use crate::http::StatusCode;
use crate::log::{error, warning};
use crate::request::{ConnectionInfo, Request};
use crate::server::Config;
use crate::service::HttpService;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

pin_project_lite::pin_project! {
    /// Serve one connection with the given service.
    ///
    /// Resolves once the connection is closed, by either side or by a
    /// protocol error. Errors are logged, not returned, so the future can be
    /// spawned directly.
    pub struct Connection<IO, S, F> {
        io: IoBuffer<IO>,
        service: Arc<S>,
        config: Arc<Config>,
        info: ConnectionInfo,
        header_map: HeaderMap,
        // === per request ===
        decoder: BodyDecoder,
        context: RequestContext,
        feeder: Option<Feeder>,
        deadline: Option<Pin<Box<Sleep>>>,
        #[pin]
        phase: Phase<F>,
    }
}

pin_project_lite::pin_project! {
    #[project = PhaseProject]
    enum Phase<F> {
        Reqline { consumed: usize },
        Header { state: Option<HttpState>, consumed: usize },
        Service { #[pin] future: F },
        Forward { body: Outgoing, framing: WriteFraming },
        Drain { discarded: u64 },
        Tunnel { peer: TunnelPeer, finishing: bool },
        Close,
    }
}

/// Response body framing on the write side.
enum WriteFraming {
    Fixed(u64),
    Chunked(ChunkedEncoder),
    CloseDelimited,
}

impl<IO, S> Connection<IO, S, S::Future>
where
    S: HttpService<Error: Into<BoxError>>,
{
    pub fn new(io: IO, service: Arc<S>) -> Self {
        Self::with_config(io, service, Arc::new(Config::default()))
    }

    pub fn with_config(io: IO, service: Arc<S>, config: Arc<Config>) -> Self {
        Self {
            io: IoBuffer::new(io),
            service,
            config,
            info: ConnectionInfo::default(),
            header_map: HeaderMap::with_capacity(16),
            decoder: BodyDecoder::empty(),
            context: RequestContext::default(),
            feeder: None,
            deadline: None,
            phase: Phase::Reqline { consumed: 0 },
        }
    }

    /// Attach the transport metadata recorded into each request.
    pub fn info(mut self, info: ConnectionInfo) -> Self {
        self.info = info;
        self
    }

    fn try_poll(self: Pin<&mut Self>, cx: &mut Context) -> Poll<Result<(), BoxError>>
    where
        IO: AsyncRead + AsyncWrite + Unpin,
    {
        let mut me = self.project();

        'conn: loop {
            match me.phase.as_mut().project() {
                // ===== Request head =====
                PhaseProject::Reqline { consumed } => {
                    if poll_deadline(me.deadline, me.config.header_timeout, cx) {
                        reject_timeout(me.io, me.phase.as_mut());
                        continue 'conn;
                    }

                    let before = me.io.read_buffer_mut().len();
                    match parser::parse_reqline_chunk(me.io.read_buffer_mut()) {
                        ParseResult::Ok(reqline) => {
                            let consumed = *consumed + (before - me.io.read_buffer_mut().len());
                            if consumed > me.config.max_header_bytes {
                                reject(me.io, me.phase.as_mut(), H1ErrorKind::HeadersTooLarge.into());
                                continue 'conn;
                            }
                            let state = HttpState::with_headers(reqline, mem::take(me.header_map));
                            me.phase.set(Phase::Header { state: Some(state), consumed });
                        }
                        ParseResult::Err(err) => {
                            reject(me.io, me.phase.as_mut(), err.into());
                            continue 'conn;
                        }
                        ParseResult::Pending => {
                            if *consumed + me.io.read_buffer_mut().len()
                                > me.config.max_header_bytes
                            {
                                reject(me.io, me.phase.as_mut(), H1ErrorKind::HeadersTooLarge.into());
                                continue 'conn;
                            }
                            let read = ready!(me.io.poll_read_buf(cx))?;
                            if read == 0 {
                                // peer gone before a complete request line,
                                // there is nobody to answer
                                return Poll::Ready(Ok(()));
                            }
                        }
                    }
                }
                PhaseProject::Header { state, consumed } => {
                    if poll_deadline(me.deadline, me.config.header_timeout, cx) {
                        reject_timeout(me.io, me.phase.as_mut());
                        continue 'conn;
                    }

                    let Some(state_mut) = state.as_mut() else {
                        unreachable!("phase is always set with a state")
                    };

                    // collect header lines, breaking out with the failure if
                    // the head cannot be accepted
                    let failure = loop {
                        let before = me.io.read_buffer_mut().len();
                        match parser::parse_header_chunk(me.io.read_buffer_mut()) {
                            ParseResult::Ok(Some(header)) => {
                                *consumed += before - me.io.read_buffer_mut().len();
                                if *consumed > me.config.max_header_bytes {
                                    break Some(H1ErrorKind::HeadersTooLarge.into());
                                }
                                if let Err(err) =
                                    state_mut.insert_header(header, me.config.max_headers)
                                {
                                    break Some(err);
                                }
                            }
                            ParseResult::Ok(None) => {
                                *consumed += before - me.io.read_buffer_mut().len();
                                break None;
                            }
                            ParseResult::Err(err) => break Some(err.into()),
                            ParseResult::Pending => {
                                if *consumed + me.io.read_buffer_mut().len()
                                    > me.config.max_header_bytes
                                {
                                    break Some(H1ErrorKind::HeadersTooLarge.into());
                                }
                                let read = ready!(me.io.poll_read_buf(cx))?;
                                if read == 0 {
                                    return Poll::Ready(Ok(()));
                                }
                            }
                        }
                    };

                    if let Some(err) = failure {
                        reject(me.io, me.phase.as_mut(), err);
                        continue 'conn;
                    }

                    // ===== Request =====
                    let Some(state) = state.take() else {
                        unreachable!("checked above")
                    };
                    me.deadline.take();

                    let info = ConnectionInfo {
                        started_at: SystemTime::now(),
                        ..me.info.clone()
                    };

                    let (context, decoder, parts) = match state.build(&me.config, info) {
                        Ok(ok) => ok,
                        Err(err) => {
                            reject(me.io, me.phase.as_mut(), err);
                            continue 'conn;
                        }
                    };
                    *me.context = context;
                    *me.decoder = decoder;

                    // body selection, the whole body may already be buffered
                    let body = match me.decoder.size_hint() {
                        Some(0) => Incoming::empty(),
                        Some(len) if me.io.read_buffer_mut().len() as u64 >= len => {
                            let buffered =
                                me.io.read_buffer_mut().split_to(len as usize).freeze();
                            *me.decoder = BodyDecoder::empty();
                            Incoming::new(buffered)
                        }
                        size_hint => {
                            let (feeder, reader) = handle::channel();
                            *me.feeder = Some(feeder);
                            Incoming::from_reader(reader, size_hint)
                        }
                    };

                    let request = Request::from_parts(parts, body);
                    let future = me.service.call(request);
                    me.phase.set(Phase::Service { future });
                }

                // ===== Service =====
                PhaseProject::Service { future } => match future.poll(cx) {
                    Poll::Ready(Ok(response)) => {
                        let (mut parts, mut body) = response.into_parts();
                        parts.version = me.context.version;

                        let framing = proto::prepare_response(&mut parts, &body, me.context);
                        proto::write_response_head(&parts, me.io.write_buffer_mut());

                        // reuse the header map allocation
                        let mut headers = parts.headers;
                        headers.clear();
                        *me.header_map = headers;

                        match framing {
                            ResponseFraming::Tunnel => {
                                let Some(peer) = body.take_tunnel() else {
                                    unreachable!("tunnel framing implies a tunnel body")
                                };
                                me.phase.set(Phase::Tunnel { peer, finishing: false });
                            }
                            ResponseFraming::Empty => {
                                me.phase.set(Phase::Drain { discarded: 0 });
                            }
                            ResponseFraming::Fixed(len) => me.phase.set(Phase::Forward {
                                body,
                                framing: WriteFraming::Fixed(len),
                            }),
                            ResponseFraming::Chunked => me.phase.set(Phase::Forward {
                                body,
                                framing: WriteFraming::Chunked(ChunkedEncoder::new()),
                            }),
                            ResponseFraming::CloseDelimited => me.phase.set(Phase::Forward {
                                body,
                                framing: WriteFraming::CloseDelimited,
                            }),
                        }
                    }
                    Poll::Ready(Err(err)) => {
                        let err = err.into();
                        error!("service error: {err}");
                        // a generic answer, the cause never reaches the client
                        proto::write_error_head(
                            StatusCode::INTERNAL_SERVER_ERROR,
                            me.io.write_buffer_mut(),
                        );
                        me.phase.set(Phase::Close);
                    }
                    Poll::Pending => {
                        if pump_body(me.io, me.decoder, me.feeder, me.context, cx)? {
                            continue 'conn;
                        }
                        return Poll::Pending;
                    }
                },

                // ===== Response body =====
                PhaseProject::Forward { body, framing } => {
                    // one frame at a time, flushed before the next is pulled,
                    // a slow peer pauses the body stream
                    ready!(me.io.poll_flush(cx))?;

                    if let WriteFraming::Fixed(0) = framing {
                        me.phase.set(Phase::Drain { discarded: 0 });
                        continue 'conn;
                    }

                    match body.poll_data(cx) {
                        Poll::Ready(Some(Ok(data))) => match framing {
                            WriteFraming::Fixed(remaining) => {
                                let take = (*remaining).min(data.len() as u64) as usize;
                                me.io.write_buffer_mut().extend_from_slice(&data[..take]);
                                *remaining -= take as u64;
                            }
                            WriteFraming::Chunked(encoder) => {
                                encoder.encode(&data, me.io.write_buffer_mut());
                            }
                            WriteFraming::CloseDelimited => {
                                me.io.write_buffer_mut().extend_from_slice(&data);
                            }
                        },
                        Poll::Ready(None) => {
                            match framing {
                                WriteFraming::Chunked(encoder) => {
                                    encoder.finish(me.io.write_buffer_mut());
                                }
                                WriteFraming::Fixed(remaining) if *remaining > 0 => {
                                    // the body came up short of the declared
                                    // length and the head is on the wire
                                    me.context.keep_alive = false;
                                }
                                _ => {}
                            }
                            me.phase.set(Phase::Drain { discarded: 0 });
                        }
                        Poll::Ready(Some(Err(err))) => {
                            error!("response body error: {err}");
                            me.context.keep_alive = false;
                            me.phase.set(Phase::Close);
                        }
                        Poll::Pending => {
                            // the handler may be streaming the request body
                            // back out, keep feeding it
                            if pump_body(me.io, me.decoder, me.feeder, me.context, cx)? {
                                continue 'conn;
                            }
                            return Poll::Pending;
                        }
                    }
                }

                // ===== Between requests =====
                PhaseProject::Drain { discarded } => {
                    ready!(me.io.poll_flush(cx))?;
                    me.feeder.take();

                    if !me.context.keep_alive {
                        me.phase.set(Phase::Close);
                        continue 'conn;
                    }

                    // discard whatever of the request body was never read
                    let reusable = loop {
                        match me.decoder.decode(me.io.read_buffer_mut()) {
                            Poll::Ready(Some(Ok(data))) => {
                                *discarded += data.len() as u64;
                                if *discarded > me.config.max_drain_bytes {
                                    break false;
                                }
                            }
                            Poll::Ready(None) => break true,
                            Poll::Ready(Some(Err(_))) => break false,
                            Poll::Pending => {
                                let read = ready!(me.io.poll_read_buf(cx))?;
                                if read == 0 {
                                    return Poll::Ready(Ok(()));
                                }
                            }
                        }
                    };

                    if reusable {
                        // rearm for the next request
                        *me.decoder = BodyDecoder::empty();
                        *me.context = RequestContext::default();
                        me.io.reclaim();
                        me.phase.set(Phase::Reqline { consumed: 0 });
                    } else {
                        me.phase.set(Phase::Close);
                    }
                }

                // ===== Upgraded =====
                PhaseProject::Tunnel { peer, finishing } => {
                    // application bytes out to the socket
                    loop {
                        match me.io.poll_flush(cx) {
                            Poll::Ready(Ok(())) => {}
                            Poll::Ready(Err(err)) => return Poll::Ready(Err(err.into())),
                            Poll::Pending => break,
                        }
                        if *finishing {
                            ready!(me.io.poll_shutdown(cx))?;
                            return Poll::Ready(Ok(()));
                        }
                        match peer.rx.poll_recv(cx) {
                            Poll::Ready(Some(data)) => {
                                me.io.write_buffer_mut().extend_from_slice(&data);
                            }
                            Poll::Ready(None) => {
                                // the application closed its write half
                                *finishing = true;
                            }
                            Poll::Pending => break,
                        }
                    }

                    // socket bytes into the tunnel, any unread request body
                    // is discarded first
                    loop {
                        if !me.decoder.is_end() {
                            match me.decoder.decode(me.io.read_buffer_mut()) {
                                Poll::Ready(Some(Ok(_)) | None) => continue,
                                Poll::Ready(Some(Err(_))) => {
                                    peer.tx = None;
                                    break;
                                }
                                Poll::Pending => {}
                            }
                        } else if !me.io.read_buffer_mut().is_empty() {
                            let data = me.io.read_buffer_mut().split().freeze();
                            let gone = match &peer.tx {
                                Some(tx) => tx.send(data).is_err(),
                                None => false,
                            };
                            if gone {
                                // the application dropped its read half, the
                                // socket is still drained
                                peer.tx = None;
                            }
                            continue;
                        }
                        match me.io.poll_read_buf(cx) {
                            Poll::Ready(Ok(0)) => {
                                // socket end of stream is the tunnel's eof
                                peer.tx = None;
                                break;
                            }
                            Poll::Ready(Ok(_)) => {}
                            Poll::Ready(Err(err)) => return Poll::Ready(Err(err.into())),
                            Poll::Pending => break,
                        }
                    }

                    return Poll::Pending;
                }

                PhaseProject::Close => {
                    me.feeder.take();
                    ready!(me.io.poll_flush(cx))?;
                    ready!(me.io.poll_shutdown(cx))?;
                    return Poll::Ready(Ok(()));
                }
            }
        }
    }
}

impl<IO, S> Future for Connection<IO, S, S::Future>
where
    IO: AsyncRead + AsyncWrite + Unpin,
    S: HttpService<Error: Into<BoxError>>,
{
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context) -> Poll<Self::Output> {
        if let Err(err) = ready!(self.try_poll(cx)) {
            error!("connection error: {err}");
        }
        Poll::Ready(())
    }
}

impl<IO, S, F> std::fmt::Debug for Connection<IO, S, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection").finish_non_exhaustive()
    }
}

// ===== Helpers =====

/// Poll the header phase deadline, arming it lazily.
fn poll_deadline(
    deadline: &mut Option<Pin<Box<Sleep>>>,
    timeout: Option<Duration>,
    cx: &mut Context,
) -> bool {
    let Some(timeout) = timeout else { return false };
    let sleep = deadline.get_or_insert_with(|| Box::pin(tokio::time::sleep(timeout)));
    sleep.as_mut().poll(cx).is_ready()
}

/// Answer a rejected request head with a minimal response and close.
fn reject<IO, F>(io: &mut IoBuffer<IO>, mut phase: Pin<&mut Phase<F>>, err: H1Error) {
    warning!("request rejected: {err}");
    proto::write_error_head(err.status_hint(), io.write_buffer_mut());
    phase.set(Phase::Close);
}

fn reject_timeout<IO, F>(io: &mut IoBuffer<IO>, mut phase: Pin<&mut Phase<F>>) {
    warning!("request header timeout");
    proto::write_error_head(StatusCode::REQUEST_TIMEOUT, io.write_buffer_mut());
    phase.set(Phase::Close);
}

/// Feed the request body while the reader demands data.
///
/// Returns `true` when the body made progress, so the caller re-polls the
/// service before suspending.
fn pump_body<IO>(
    io: &mut IoBuffer<IO>,
    decoder: &mut BodyDecoder,
    feeder: &mut Option<Feeder>,
    context: &mut RequestContext,
    cx: &mut Context,
) -> io::Result<bool>
where
    IO: AsyncRead + Unpin,
{
    let mut progressed = false;

    loop {
        let Some(active) = feeder.as_ref() else {
            return Ok(progressed);
        };

        match active.poll_demand(cx) {
            Poll::Ready(Demand::Data) => {}
            Poll::Ready(Demand::Detached) => {
                // close protection: the reader is gone, the remaining body
                // stays on the connection for its own drain
                *feeder = None;
                return Ok(progressed);
            }
            Poll::Pending => return Ok(progressed),
        }

        match decoder.decode(io.read_buffer_mut()) {
            Poll::Ready(Some(Ok(data))) => {
                active.data(data);
                progressed = true;
            }
            Poll::Ready(None) => {
                active.end();
                *feeder = None;
                return Ok(true);
            }
            Poll::Ready(Some(Err(err))) => {
                // broken body framing poisons the connection, the response
                // side stays the handler's business
                context.keep_alive = false;
                active.fail(err.into());
                *feeder = None;
                return Ok(true);
            }
            Poll::Pending => match io.poll_read_buf(cx) {
                Poll::Ready(Ok(0)) => {
                    context.keep_alive = false;
                    active.fail(BodyError::UnexpectedEof.into());
                    *feeder = None;
                    return Ok(true);
                }
                Poll::Ready(Ok(_)) => {}
                Poll::Ready(Err(err)) => {
                    context.keep_alive = false;
                    active.fail(io::Error::new(err.kind(), "transport read failed").into());
                    *feeder = None;
                    return Err(err);
                }
                Poll::Pending => return Ok(progressed),
            },
        }
    }
}
