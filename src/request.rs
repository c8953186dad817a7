//! HTTP Request.
use std::net::SocketAddr;
use std::time::SystemTime;

use crate::body::Incoming;
use crate::headers::HeaderMap;
use crate::http::{Extensions, Method, Version};
use crate::uri::Uri;

/// HTTP Request Parts.
#[derive(Debug)]
pub struct Parts {
    pub method: Method,
    pub uri: Uri,
    pub version: Version,
    pub headers: HeaderMap,
    pub extensions: Extensions,
}

/// HTTP Request.
///
/// An immutable request head with the message body attached. The body is a
/// live stream fed by the connection, see [`Incoming`].
#[derive(Debug)]
pub struct Request {
    parts: Parts,
    body: Incoming,
}

impl Request {
    /// Create [`Request`] from [`Parts`] and a body.
    #[inline]
    pub fn from_parts(parts: Parts, body: Incoming) -> Self {
        Self { parts, body }
    }

    /// Returns shared reference to [`Parts`].
    #[inline]
    pub fn parts(&self) -> &Parts {
        &self.parts
    }

    /// Returns the request method.
    #[inline]
    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    /// Returns the normalized request URI.
    #[inline]
    pub fn uri(&self) -> &Uri {
        &self.parts.uri
    }

    /// Returns the request protocol version.
    #[inline]
    pub fn version(&self) -> Version {
        self.parts.version
    }

    /// Returns shared reference to the headers.
    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    /// Returns mutable reference to the headers.
    #[inline]
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.parts.headers
    }

    /// Returns shared reference to the request extensions.
    #[inline]
    pub fn extensions(&self) -> &Extensions {
        &self.parts.extensions
    }

    /// Returns mutable reference to the request extensions.
    #[inline]
    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.parts.extensions
    }

    /// Returns the connection metadata recorded when the request was parsed.
    #[inline]
    pub fn connection_info(&self) -> Option<&ConnectionInfo> {
        self.parts.extensions.get()
    }

    /// Returns shared reference to the body.
    #[inline]
    pub fn body(&self) -> &Incoming {
        &self.body
    }

    /// Returns mutable reference to the body.
    #[inline]
    pub fn body_mut(&mut self) -> &mut Incoming {
        &mut self.body
    }

    /// Consumes self into the body.
    #[inline]
    pub fn into_body(self) -> Incoming {
        self.body
    }

    /// Consumes self into [`Parts`] and the body.
    #[inline]
    pub fn into_parts(self) -> (Parts, Incoming) {
        (self.parts, self.body)
    }
}

/// Coarse server side metadata about the connection a request arrived on.
///
/// Recorded by the connection when the request head is parsed and carried in
/// the request [`Extensions`].
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    /// Local address of the accepting socket.
    pub local_addr: Option<SocketAddr>,
    /// Peer address of the connection.
    pub remote_addr: Option<SocketAddr>,
    /// When the request head was fully parsed.
    pub started_at: SystemTime,
}

impl Default for ConnectionInfo {
    fn default() -> Self {
        Self {
            local_addr: None,
            remote_addr: None,
            started_at: SystemTime::now(),
        }
    }
}
