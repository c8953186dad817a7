use bytes::{Bytes, BytesMut};
use std::task::Poll;

use crate::body::chunked::ChunkedDecoder;
use crate::body::error::BodyError;
use crate::body::length::LengthDecoder;

/// Message body decoder, selected from the request framing headers.
#[derive(Debug)]
pub struct BodyDecoder {
    coding: Coding,
}

/// Body coding information.
#[derive(Debug)]
pub enum Coding {
    /// No message body.
    Empty,
    /// `Transfer-Encoding: chunked` body.
    Chunked(ChunkedDecoder),
    /// `Content-Length` delimited body.
    Length(LengthDecoder),
}

impl Default for BodyDecoder {
    #[inline]
    fn default() -> Self {
        Self::empty()
    }
}

impl BodyDecoder {
    /// Create a decoder for a message without body.
    #[inline]
    pub const fn empty() -> Self {
        Self { coding: Coding::Empty }
    }

    /// Create a decoder for a chunked body.
    #[inline]
    pub fn chunked(max_line: usize) -> Self {
        Self {
            coding: Coding::Chunked(ChunkedDecoder::with_max_line(max_line)),
        }
    }

    /// Create a decoder for a length delimited body.
    #[inline]
    pub const fn length(len: u64) -> Self {
        Self {
            coding: Coding::Length(LengthDecoder::new(len)),
        }
    }

    /// Returns the body coding.
    #[inline]
    pub const fn coding(&self) -> &Coding {
        &self.coding
    }

    /// Returns the known total size of the remaining body, when the coding
    /// declares one.
    pub const fn size_hint(&self) -> Option<u64> {
        match &self.coding {
            Coding::Empty => Some(0),
            Coding::Chunked(_) => None,
            Coding::Length(length) => Some(length.remaining()),
        }
    }

    /// Returns `true` when the body has been fully decoded.
    pub fn is_end(&self) -> bool {
        match &self.coding {
            Coding::Empty => true,
            Coding::Chunked(chunked) => chunked.is_eof(),
            Coding::Length(length) => length.is_end(),
        }
    }

    /// Decode the next data chunk out of `buffer`.
    ///
    /// Returns [`Poll::Pending`] when more upstream bytes are required.
    pub fn decode(&mut self, buffer: &mut BytesMut) -> Poll<Option<Result<Bytes, BodyError>>> {
        match &mut self.coding {
            Coding::Empty => Poll::Ready(None),
            Coding::Chunked(chunked) => chunked.decode(buffer),
            Coding::Length(length) => length.decode(buffer),
        }
    }
}
