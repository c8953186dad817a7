use std::fmt;

use crate::h1::parser::ParseError;
use crate::headers::error::HeaderError;
use crate::http::StatusCode;
use crate::uri::UriError;

/// A request head that cannot be accepted.
///
/// These errors never reach the application handler, the connection answers
/// with a minimal response carrying [`status_hint`] and closes.
///
/// [`status_hint`]: H1Error::status_hint
#[derive(Debug)]
pub struct H1Error {
    kind: H1ErrorKind,
}

/// The reason a request head was rejected.
#[derive(Debug)]
pub enum H1ErrorKind {
    /// Malformed request line or header line.
    Parse(ParseError),
    /// Request target or `Host` header does not form a valid URI.
    Uri(UriError),
    /// Invalid header name or value.
    Header(HeaderError),
    /// More header lines than the configured cap.
    TooManyHeaders,
    /// Header block exceeds the configured cap without terminating.
    HeadersTooLarge,
    /// Duplicate or non numeric `Content-Length`.
    InvalidContentLength,
    /// Both `Transfer-Encoding` and `Content-Length` are present.
    ConflictingFraming,
    /// A `Transfer-Encoding` other than exactly `chunked`.
    UnsupportedCoding,
    /// `Host` header is not a valid `host[:port]`.
    InvalidHost,
    /// HTTP/1.1 request without a `Host` header.
    MissingHost,
    /// The target form does not match the method.
    MismatchedTarget,
}

use H1ErrorKind as Kind;

impl H1Error {
    /// Returns the error kind.
    pub fn kind(&self) -> &H1ErrorKind {
        &self.kind
    }

    /// The status code an error response for this failure should carry.
    pub const fn status_hint(&self) -> StatusCode {
        match &self.kind {
            Kind::Parse(err) => err.status_hint(),
            Kind::TooManyHeaders | Kind::HeadersTooLarge => {
                StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE
            }
            Kind::UnsupportedCoding => StatusCode::NOT_IMPLEMENTED,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<Kind> for H1Error {
    fn from(kind: Kind) -> Self {
        Self { kind }
    }
}

impl std::error::Error for H1Error { }

impl fmt::Display for H1Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind.fmt(f)
    }
}

impl fmt::Display for H1ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kind::Parse(err) => write!(f, "parse error: {err}"),
            Kind::Uri(err) => write!(f, "uri error: {err}"),
            Kind::Header(err) => write!(f, "header error: {err}"),
            Kind::TooManyHeaders => f.write_str("too many headers"),
            Kind::HeadersTooLarge => f.write_str("header block too large"),
            Kind::InvalidContentLength => f.write_str("invalid content-length"),
            Kind::ConflictingFraming => {
                f.write_str("both transfer-encoding and content-length present")
            }
            Kind::UnsupportedCoding => f.write_str("unsupported transfer-encoding"),
            Kind::InvalidHost => f.write_str("invalid host header"),
            Kind::MissingHost => f.write_str("missing host header"),
            Kind::MismatchedTarget => f.write_str("request target does not match method"),
        }
    }
}

impl From<ParseError> for H1Error {
    fn from(v: ParseError) -> Self {
        Kind::Parse(v).into()
    }
}

impl From<UriError> for H1Error {
    fn from(v: UriError) -> Self {
        Kind::Uri(v).into()
    }
}

impl From<HeaderError> for H1Error {
    fn from(v: HeaderError) -> Self {
        Kind::Header(v).into()
    }
}
