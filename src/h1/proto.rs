//! HTTP/1.x Semantics.
//!
//! [`HttpState`] accumulates a parsed request head and validates it into a
//! [`Request`]'s parts, a [`BodyDecoder`], and the per request
//! [`RequestContext`]. The response side decides body framing and connection
//! persistence, then serializes the head.
//!
//! [`Request`]: crate::request::Request
use bytes::{Bytes, BytesMut};
use std::net::SocketAddr;

use crate::body::{BodyDecoder, Outgoing};
use crate::h1::error::{H1Error, H1ErrorKind};
use crate::h1::parser::{Header, Reqline, Target, TargetKind};
use crate::headers::standard::{
    CONNECTION, CONTENT_LENGTH, DATE, HOST, SERVER, TRANSFER_ENCODING,
};
use crate::headers::{HeaderMap, HeaderName, HeaderValue};
use crate::http::{Extensions, Method, StatusCode, Version, httpdate_now};
use crate::request::{self, ConnectionInfo};
use crate::response;
use crate::server::Config;
use crate::uri::{Authority, Scheme, Uri, UriError};

const SERVER_IDENT: &str = concat!("salur/", env!("CARGO_PKG_VERSION"));

// ===== Request =====

/// Per request connection context.
#[derive(Debug, Default, Clone)]
pub(crate) struct RequestContext {
    pub version: Version,
    pub keep_alive: bool,
    pub is_head: bool,
    pub is_connect: bool,
}

/// Stateful request head builder.
#[derive(Debug)]
pub struct HttpState {
    reqline: Reqline,
    headers: HeaderMap,
}

impl HttpState {
    pub fn new(reqline: Reqline) -> Self {
        Self::with_headers(reqline, HeaderMap::with_capacity(8))
    }

    /// Reuse a cleared [`HeaderMap`] allocation from a previous request.
    pub fn with_headers(reqline: Reqline, headers: HeaderMap) -> Self {
        debug_assert!(headers.is_empty());
        Self { reqline, headers }
    }

    pub fn insert_header(&mut self, header: Header, max_headers: usize) -> Result<(), H1Error> {
        if self.headers.len() >= max_headers {
            return Err(H1ErrorKind::TooManyHeaders.into());
        }

        let name = HeaderName::from_bytes(header.name.freeze())?;
        let value = HeaderValue::from_bytes(header.value.freeze())?;
        self.headers.append(name, value);

        Ok(())
    }

    /// Validate the head and build the request parts, the body decoder, and
    /// the request context.
    pub(crate) fn build(
        self,
        config: &Config,
        info: ConnectionInfo,
    ) -> Result<(RequestContext, BodyDecoder, request::Parts), H1Error> {
        let Self { reqline, headers } = self;
        let Reqline { method, target, version } = reqline;

        // exactly zero or one content-length
        let mut content_lengths = headers.get_all(CONTENT_LENGTH);
        let content_length = match content_lengths.next() {
            Some(value) => {
                if content_lengths.next().is_some() {
                    return Err(H1ErrorKind::InvalidContentLength.into());
                }
                Some(parse_content_length(value)?)
            }
            None => None,
        };

        // transfer-encoding must be exactly `chunked`, and never alongside
        // content-length
        let mut codings = headers.get_all(TRANSFER_ENCODING);
        let chunked = match codings.next() {
            Some(value) => {
                if content_length.is_some() {
                    return Err(H1ErrorKind::ConflictingFraming.into());
                }
                if codings.next().is_some() || !value.as_str().eq_ignore_ascii_case("chunked") {
                    return Err(H1ErrorKind::UnsupportedCoding.into());
                }
                true
            }
            None => false,
        };

        let decoder = if chunked {
            BodyDecoder::chunked(config.max_chunk_line_bytes)
        } else {
            match content_length {
                Some(0) | None => BodyDecoder::empty(),
                Some(len) => BodyDecoder::length(len),
            }
        };

        let mut hosts = headers.get_all(HOST);
        let host = hosts.next();
        if hosts.next().is_some() {
            return Err(H1ErrorKind::InvalidHost.into());
        }
        let uri = resolve_uri(&method, target, host, version, info.local_addr)?;

        let keep_alive = version == Version::HTTP_11
            && !headers.get_all(CONNECTION).any(|v| v.contains_token("close"));

        let context = RequestContext {
            version,
            keep_alive,
            is_head: method == Method::HEAD,
            is_connect: method == Method::CONNECT,
        };

        let mut extensions = Extensions::new();
        extensions.insert(info);

        let parts = request::Parts {
            method,
            uri,
            version,
            headers,
            extensions,
        };

        Ok((context, decoder, parts))
    }
}

fn parse_content_length(value: &HeaderValue) -> Result<u64, H1Error> {
    let src = value.as_bytes();
    // `str::parse` would also accept a leading `+`
    if src.is_empty() || !src.iter().all(u8::is_ascii_digit) {
        return Err(H1ErrorKind::InvalidContentLength.into());
    }
    value
        .as_str()
        .parse()
        .map_err(|_| H1ErrorKind::InvalidContentLength.into())
}

fn resolve_uri(
    method: &Method,
    target: Target,
    host: Option<&HeaderValue>,
    version: Version,
    local_addr: Option<SocketAddr>,
) -> Result<Uri, H1Error> {
    match target.kind() {
        TargetKind::Authority => {
            if *method != Method::CONNECT {
                return Err(H1ErrorKind::MismatchedTarget.into());
            }
            let authority = Authority::from_bytes(target.into_bytes())?;
            if authority.port().is_none() {
                // CONNECT requires `host:port`
                return Err(H1ErrorKind::Uri(UriError::InvalidAuthority).into());
            }
            Ok(Uri::from_parts(Scheme::HTTP, authority, Bytes::new()))
        }
        TargetKind::Absolute => {
            if *method == Method::CONNECT {
                return Err(H1ErrorKind::MismatchedTarget.into());
            }
            if let Some(host) = host
                && host.is_empty()
            {
                // an absolute-form target must supply its own authority, an
                // empty host header alongside it is rejected
                return Err(H1ErrorKind::InvalidHost.into());
            }
            validate_host(host)?;
            Ok(Uri::parse_absolute(target.into_bytes())?)
        }
        TargetKind::Asterisk => {
            if *method != Method::OPTIONS {
                return Err(H1ErrorKind::MismatchedTarget.into());
            }
            let authority = resolve_authority(host, version, local_addr)?;
            Ok(Uri::from_parts(Scheme::HTTP, authority, Bytes::from_static(b"*")))
        }
        TargetKind::Origin => {
            if *method == Method::CONNECT {
                return Err(H1ErrorKind::MismatchedTarget.into());
            }
            let authority = resolve_authority(host, version, local_addr)?;
            Ok(Uri::from_parts(Scheme::HTTP, authority, target.into_bytes()))
        }
    }
}

fn validate_host(host: Option<&HeaderValue>) -> Result<(), H1Error> {
    match host {
        Some(value) if !value.is_empty() => {
            Authority::from_bytes(Bytes::copy_from_slice(value.as_bytes()))
                .map(drop)
                .map_err(|_| H1ErrorKind::InvalidHost.into())
        }
        _ => Ok(()),
    }
}

fn resolve_authority(
    host: Option<&HeaderValue>,
    version: Version,
    local_addr: Option<SocketAddr>,
) -> Result<Authority, H1Error> {
    match host {
        Some(value) if !value.is_empty() => {
            Authority::from_bytes(Bytes::copy_from_slice(value.as_bytes()))
                .map_err(|_| H1ErrorKind::InvalidHost.into())
        }
        // RFC 7230 allows an empty host header when the target itself has no
        // authority, fall back to the connection local address
        Some(_) => Ok(local_authority(local_addr)),
        None => {
            if version == Version::HTTP_11 {
                return Err(H1ErrorKind::MissingHost.into());
            }
            Ok(local_authority(local_addr))
        }
    }
}

fn local_authority(local_addr: Option<SocketAddr>) -> Authority {
    match local_addr {
        Some(addr) => {
            let host = match addr {
                SocketAddr::V4(v4) => v4.ip().to_string(),
                SocketAddr::V6(v6) => format!("[{}]", v6.ip()),
            };
            Authority::from_parts(Bytes::from(host), Some(addr.port()))
        }
        None => Authority::from_parts(Bytes::from_static(b"localhost"), None),
    }
}

// ===== Response =====

/// How the response body goes on the wire.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum ResponseFraming {
    /// `Content-Length` delimited, write exactly this many bytes.
    Fixed(u64),
    /// `Transfer-Encoding: chunked`.
    Chunked,
    /// Unframed, terminated by closing the connection.
    CloseDelimited,
    /// No body bytes are written, whatever the handler supplied.
    Empty,
    /// Switch the connection to raw forwarding.
    Tunnel,
}

/// Apply the protocol mandated response headers and decide body framing.
///
/// `context.keep_alive` is updated to the final persistence decision.
pub(crate) fn prepare_response(
    parts: &mut response::Parts,
    body: &Outgoing,
    context: &mut RequestContext,
) -> ResponseFraming {
    let headers = &mut parts.headers;
    let status = parts.status.status();

    // server identification, unless supplied or explicitly cleared
    match headers.get(SERVER) {
        None => {
            headers.insert(SERVER, HeaderValue::from_static(SERVER_IDENT));
        }
        Some(value) if value.is_empty() => {
            headers.remove(SERVER);
        }
        Some(_) => {}
    }

    // body framing is decided here, a caller supplied coding is dropped
    headers.remove(TRANSFER_ENCODING);

    match headers.get(DATE) {
        None => {
            headers.insert(DATE, date_value());
        }
        Some(value) if value.is_empty() => {
            headers.remove(DATE);
        }
        Some(_) => {}
    }

    let informational = parts.status.is_informational();
    let connect_success = context.is_connect && parts.status.is_success();
    let upgraded = status == 101 || connect_success;

    let mut framing = if upgraded && body.is_tunnel() {
        ResponseFraming::Tunnel
    } else {
        match body.size_hint() {
            Some(len) => {
                headers.insert(CONTENT_LENGTH, HeaderValue::from_integer(len));
                ResponseFraming::Fixed(len)
            }
            None if context.version == Version::HTTP_11 => {
                headers.insert(TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
                ResponseFraming::Chunked
            }
            None => {
                // HTTP/1.0 cannot frame an unbounded body, it is terminated
                // by closing the connection
                context.keep_alive = false;
                ResponseFraming::CloseDelimited
            }
        }
    };

    // responses that never carry framing headers
    if informational || status == 204 || connect_success {
        headers.remove(CONTENT_LENGTH);
        headers.remove(TRANSFER_ENCODING);
        if !matches!(framing, ResponseFraming::Tunnel) {
            framing = ResponseFraming::Empty;
        }
    }

    // responses that never carry body bytes, the framing headers survive
    if context.is_head || matches!(status, 100 | 204 | 304) {
        framing = ResponseFraming::Empty;
    }

    // connection persistence
    if status == 101 {
        headers.insert(CONNECTION, HeaderValue::from_static("upgrade"));
        if !matches!(framing, ResponseFraming::Tunnel) {
            // nothing will speak the switched protocol
            context.keep_alive = false;
        }
    } else {
        if headers.get_all(CONNECTION).any(|v| v.contains_token("close")) {
            context.keep_alive = false;
        }
        if context.version == Version::HTTP_10 {
            context.keep_alive = false;
        }
        if !context.keep_alive
            && context.version == Version::HTTP_11
            && !matches!(framing, ResponseFraming::Tunnel)
            && !headers.get_all(CONNECTION).any(|v| v.contains_token("close"))
        {
            headers.insert(CONNECTION, HeaderValue::from_static("close"));
        }
    }

    framing
}

fn date_value() -> HeaderValue {
    HeaderValue::from_owned_unchecked(Bytes::copy_from_slice(&httpdate_now()))
}

/// Serialize the response head into `buf`.
pub(crate) fn write_response_head(parts: &response::Parts, buf: &mut BytesMut) {
    buf.reserve(128);

    buf.extend_from_slice(parts.version.as_str().as_bytes());
    buf.extend_from_slice(b" ");
    buf.extend_from_slice(parts.status.as_str().as_bytes());
    buf.extend_from_slice(b"\r\n");

    for (name, value) in &parts.headers {
        buf.extend_from_slice(name.as_str().as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(value.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }

    buf.extend_from_slice(b"\r\n");
}

/// Serialize a minimal error response for a request that never reached the
/// handler.
pub(crate) fn write_error_head(status: StatusCode, buf: &mut BytesMut) {
    buf.reserve(128);

    buf.extend_from_slice(b"HTTP/1.1 ");
    buf.extend_from_slice(status.as_str().as_bytes());
    buf.extend_from_slice(b"\r\nServer: ");
    buf.extend_from_slice(SERVER_IDENT.as_bytes());
    buf.extend_from_slice(b"\r\nDate: ");
    buf.extend_from_slice(&httpdate_now());
    buf.extend_from_slice(b"\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
}
