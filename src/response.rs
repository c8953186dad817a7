//! HTTP Response.
use crate::body::Outgoing;
use crate::headers::HeaderMap;
use crate::http::{StatusCode, Version};

/// HTTP Response Parts.
#[derive(Debug, Default)]
pub struct Parts {
    pub version: Version,
    pub status: StatusCode,
    pub headers: HeaderMap,
}

/// HTTP Response.
///
/// The version on the wire always follows the request, and body framing
/// headers are derived from the body when the response is written, see the
/// crate documentation.
#[derive(Debug, Default)]
pub struct Response {
    parts: Parts,
    body: Outgoing,
}

impl Response {
    /// Create a `200 OK` [`Response`] with the given body.
    #[inline]
    pub fn new(body: Outgoing) -> Self {
        Self {
            parts: Parts::default(),
            body,
        }
    }

    /// Create a [`Response`] with the given status and an empty body.
    #[inline]
    pub fn with_status(status: StatusCode) -> Self {
        Self {
            parts: Parts {
                status,
                ..Parts::default()
            },
            body: Outgoing::empty(),
        }
    }

    /// Create [`Response`] from [`Parts`] and a body.
    #[inline]
    pub fn from_parts(parts: Parts, body: Outgoing) -> Self {
        Self { parts, body }
    }

    /// Returns shared reference to [`Parts`].
    #[inline]
    pub fn parts(&self) -> &Parts {
        &self.parts
    }

    /// Returns the response status code.
    #[inline]
    pub fn status(&self) -> StatusCode {
        self.parts.status
    }

    /// Returns mutable reference to the status code.
    #[inline]
    pub fn status_mut(&mut self) -> &mut StatusCode {
        &mut self.parts.status
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

    /// Returns shared reference to the body.
    #[inline]
    pub fn body(&self) -> &Outgoing {
        &self.body
    }

    /// Returns mutable reference to the body.
    #[inline]
    pub fn body_mut(&mut self) -> &mut Outgoing {
        &mut self.body
    }

    /// Replace the body, keeping the head.
    #[inline]
    pub fn set_body(&mut self, body: Outgoing) {
        self.body = body;
    }

    /// Consumes self into [`Parts`] and the body.
    #[inline]
    pub fn into_parts(self) -> (Parts, Outgoing) {
        (self.parts, self.body)
    }
}
