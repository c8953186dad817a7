//! HTTP/1.x Request Parser.
//!
//! [`parse_reqline_chunk`] works on chunked bytes: given any length of bytes,
//! the parser finds the next line separator and advances the buffer past it.
//! If the separator is not buffered yet, the parser returns
//! [`ParseResult::Pending`] and more bytes are required to make progress.
//!
//! [`parse_header_chunk`] works the same way. Additionally, when it
//! encounters an empty line it returns [`ParseResult::Ok(None)`] denoting the
//! end of the header block.
//!
//! [`ParseResult::Pending`]: crate::common::ParseResult::Pending
//! [`ParseResult::Ok(None)`]: crate::common::ParseResult::Ok
mod target;
mod error;


use bytes::{Buf, BytesMut};

use crate::common::ParseResult;
use crate::http::{Method, Version};
use crate::uri::is_target_byte;

pub use error::ParseError;
pub use target::{Target, TargetKind};

macro_rules! tri {
    ($e:expr) => {
        match $e {
            ParseResult::Ok(ok) => ok,
            ParseResult::Err(err) => return ParseResult::Err(err),
            ParseResult::Pending => return ParseResult::Pending,
        }
    };
}

/// Request control data.
#[derive(Debug)]
pub struct Reqline {
    pub method: Method,
    pub target: Target,
    pub version: Version,
}

/// One header line, name and value still unvalidated as header types.
#[derive(Debug)]
pub struct Header {
    pub name: BytesMut,
    pub value: BytesMut,
}

/// Split the next line off `bytes`, accepting `CRLF` or bare `LF`.
///
/// A carriage return anywhere but immediately before the line feed is
/// rejected.
fn split_line(bytes: &mut BytesMut) -> ParseResult<BytesMut, ParseError> {
    match bytes.iter().position(|&b| b == b'\n') {
        Some(lf) => {
            let mut line = bytes.split_to(lf + 1);
            line.truncate(lf);
            if line.last() == Some(&b'\r') {
                line.truncate(line.len() - 1);
            }
            if line.iter().any(|&b| b == b'\r') {
                return ParseResult::Err(ParseError::InvalidSeparator);
            }
            ParseResult::Ok(line)
        }
        None => {
            // a trailing CR may still complete into CRLF on the next read
            match bytes.iter().position(|&b| b == b'\r') {
                Some(cr) if cr + 1 < bytes.len() => ParseResult::Err(ParseError::InvalidSeparator),
                _ => ParseResult::Pending,
            }
        }
    }
}

/// Parse the request line.
///
/// This function performs a chunked parsing, see [module level
/// documentation][self] for more details.
pub fn parse_reqline_chunk(bytes: &mut BytesMut) -> ParseResult<Reqline, ParseError> {
    use ParseResult as Result;

    if bytes.is_empty() {
        return Result::Pending;
    }

    let mut line = tri!(split_line(bytes));

    // method
    let Some(sp1) = line.iter().position(|&b| b == b' ') else {
        return Result::Err(ParseError::InvalidRequestLine);
    };
    let method_bytes = line.split_to(sp1);
    line.advance(1);
    let Some(method) = Method::from_bytes(&method_bytes) else {
        return Result::Err(ParseError::UnknownMethod);
    };

    // version, from the tail
    let Some(sp2) = line.iter().rposition(|&b| b == b' ') else {
        return Result::Err(ParseError::InvalidRequestLine);
    };
    let version_bytes = line.split_off(sp2 + 1);
    line.truncate(sp2);
    let Some(version) = Version::from_bytes(&version_bytes) else {
        return if version_bytes.starts_with(b"HTTP/") {
            Result::Err(ParseError::UnsupportedVersion)
        } else {
            Result::Err(ParseError::InvalidRequestLine)
        };
    };

    // target, exactly one and without whitespace
    if line.is_empty() || line.iter().any(|&b| b == b' ') {
        return Result::Err(ParseError::InvalidRequestLine);
    }
    if !line.iter().all(|&b| is_target_byte(b)) {
        return Result::Err(ParseError::InvalidTarget);
    }

    Result::Ok(Reqline {
        method,
        target: Target::new(line.freeze()),
        version,
    })
}

/// Parse one header line.
///
/// Returns `ParseResult::Ok(None)` when it encounters the empty line closing
/// the header block.
///
/// This function performs a chunked parsing, see [module level
/// documentation][self] for more details.
pub fn parse_header_chunk(bytes: &mut BytesMut) -> ParseResult<Option<Header>, ParseError> {
    use ParseResult as Result;

    let Some(&first) = bytes.first() else {
        return Result::Pending;
    };

    if matches!(first, b'\r' | b'\n') {
        let advance = match (first, bytes.get(1)) {
            (b'\n', _) => 1,
            (b'\r', Some(b'\n')) => 2,
            (b'\r', Some(_)) => return Result::Err(ParseError::InvalidSeparator),
            (b'\r', None) => return Result::Pending,
            _ => unreachable!(),
        };
        bytes.advance(advance);
        return Result::Ok(None);
    }

    let mut line = tri!(split_line(bytes));

    let Some(colon) = line.iter().position(|&b| b == b':') else {
        return Result::Err(ParseError::InvalidHeader);
    };
    let name = line.split_to(colon);
    line.advance(1);

    // whitespace inside or around the name is illegal, a token check covers
    // both at once
    if name.is_empty() || !name.iter().all(|&b| is_token_byte(b)) {
        return Result::Err(ParseError::InvalidHeader);
    }

    // optional whitespace around the value
    while matches!(line.first(), Some(b' ' | b'\t')) {
        line.advance(1);
    }
    while matches!(line.last(), Some(b' ' | b'\t')) {
        line.truncate(line.len() - 1);
    }

    ParseResult::Ok(Some(Header { name, value: line }))
}

/// token, per RFC 9110 field-name
const fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(
            b,
            b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.'
                | b'^' | b'_' | b'`' | b'|' | b'~'
        )
}
