use bytes::{Buf, Bytes, BytesMut};
use std::{mem, num::NonZeroU64, task::Poll};

use crate::body::error::BodyError;

const MAX_CHUNK_SIZE: u64 = u64::MAX >> 1;

/// Default cap for a chunk-size line without terminator.
pub const DEFAULT_MAX_CHUNK_LINE: usize = 1024;

/// Chunked transfer coding decoder.
///
/// The decoder pulls from a caller owned buffer, so a single upstream read
/// may be decoded into any number of data chunks without copying.
#[derive(Debug)]
pub struct ChunkedDecoder {
    phase: Phase,
    max_line: usize,
}

#[derive(Debug)]
enum Phase {
    /// Awaiting the `hex-size [;ext] CRLF` line.
    Line,
    /// Awaiting chunk payload.
    Data(NonZeroU64),
    /// Awaiting the CRLF closing a chunk payload.
    DataCrlf,
    /// Awaiting the CRLF closing the terminal zero chunk.
    TrailerCrlf,
    Eof,
}

impl Default for ChunkedDecoder {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkedDecoder {
    /// Create a decoder with the default chunk-size line cap.
    #[inline]
    pub fn new() -> Self {
        Self::with_max_line(DEFAULT_MAX_CHUNK_LINE)
    }

    /// Create a decoder with an explicit chunk-size line cap.
    #[inline]
    pub fn with_max_line(max_line: usize) -> Self {
        Self { phase: Phase::Line, max_line }
    }

    /// Returns `true` when the terminal chunk has been decoded.
    #[inline]
    pub fn is_eof(&self) -> bool {
        matches!(self.phase, Phase::Eof)
    }

    /// Decode the next data chunk out of `buffer`.
    ///
    /// Returns [`Poll::Pending`] when more upstream bytes are required, and
    /// `Ready(None)` once the terminal chunk is reached. Bytes past the
    /// terminal chunk are left in the buffer untouched.
    pub fn decode(&mut self, buffer: &mut BytesMut) -> Poll<Option<Result<Bytes, BodyError>>> {
        macro_rules! fail {
            ($variant:ident) => {{
                self.phase = Phase::Eof;
                return Poll::Ready(Some(Err(BodyError::$variant)));
            }};
        }

        loop {
            match &mut self.phase {
                Phase::Line => {
                    let Some(digits_len) = buffer.iter().position(|b| !b.is_ascii_hexdigit())
                    else {
                        if buffer.len() > self.max_line {
                            fail!(ChunkLineTooLong);
                        }
                        return Poll::Pending;
                    };
                    if digits_len == 0 {
                        fail!(InvalidChunked);
                    }
                    // SAFETY: `is_ascii_hexdigit` is a subset of ASCII
                    let digits = unsafe { str::from_utf8_unchecked(&buffer[..digits_len]) };
                    let Ok(size) = u64::from_str_radix(digits, 16) else {
                        fail!(InvalidChunked);
                    };
                    if size > MAX_CHUNK_SIZE {
                        fail!(ChunkTooLarge);
                    }

                    // extension / CRLF delimiter
                    let line_len = match buffer[digits_len] {
                        b'\r' => match buffer.get(digits_len + 1) {
                            Some(b'\n') => digits_len + 2,
                            Some(_) => fail!(InvalidChunked),
                            None => return Poll::Pending,
                        },
                        b';' => match buffer[digits_len..].iter().position(|&b| b == b'\n') {
                            // index of '\n', therefore `+ 1` to include it
                            Some(at) => digits_len + at + 1,
                            None => {
                                if buffer.len() > self.max_line {
                                    fail!(ChunkLineTooLong);
                                }
                                return Poll::Pending;
                            }
                        },
                        _ => fail!(InvalidChunked),
                    };
                    if line_len > self.max_line {
                        fail!(ChunkLineTooLong);
                    }

                    buffer.advance(line_len);
                    self.phase = match NonZeroU64::new(size) {
                        Some(size) => Phase::Data(size),
                        None => Phase::TrailerCrlf,
                    };
                }
                Phase::Data(remaining_mut) => {
                    if buffer.is_empty() {
                        return Poll::Pending;
                    }
                    let remaining = remaining_mut.get();
                    match remaining
                        .checked_sub(buffer.len() as u64)
                        .and_then(NonZeroU64::new)
                    {
                        // buffer contains partial of the expected chunk
                        Some(leftover) => {
                            *remaining_mut = leftover;
                            return Poll::Ready(Some(Ok(buffer.split().freeze())));
                        }
                        // buffer contains exact or larger than the expected chunk
                        None => {
                            #[allow(
                                clippy::cast_possible_truncation,
                                reason = "remaining <= buffer.len() which is usize"
                            )]
                            let data = buffer.split_to(remaining as usize).freeze();
                            self.phase = Phase::DataCrlf;
                            return Poll::Ready(Some(Ok(data)));
                        }
                    }
                }
                Phase::DataCrlf => match buffer.first_chunk::<2>() {
                    Some(b"\r\n") => {
                        buffer.advance(2);
                        self.phase = Phase::Line;
                    }
                    Some(_) => fail!(InvalidChunked),
                    None => return Poll::Pending,
                },
                Phase::TrailerCrlf => match buffer.first_chunk::<2>() {
                    Some(b"\r\n") => {
                        buffer.advance(2);
                        self.phase = Phase::Eof;
                        return Poll::Ready(None);
                    }
                    // trailers are not supported
                    Some(_) => fail!(InvalidChunked),
                    None => return Poll::Pending,
                },
                Phase::Eof => return Poll::Ready(None),
            }
        }
    }
}

/// Chunked transfer coding encoder.
///
/// Frames each payload as `hex-size CRLF payload CRLF`, with [`finish`]
/// appending the terminal zero chunk exactly once.
///
/// [`finish`]: ChunkedEncoder::finish
#[derive(Debug, Default)]
pub struct ChunkedEncoder {
    finished: bool,
}

impl ChunkedEncoder {
    /// Create a new encoder.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Frame one payload into `buffer`.
    ///
    /// An empty payload produces no output, it would otherwise encode as the
    /// terminal chunk.
    pub fn encode(&mut self, data: &[u8], buffer: &mut BytesMut) {
        if data.is_empty() || self.finished {
            return;
        }
        buffer.reserve(data.len() + 20);
        write_hex(data.len() as u64, buffer);
        buffer.extend_from_slice(b"\r\n");
        buffer.extend_from_slice(data);
        buffer.extend_from_slice(b"\r\n");
    }

    /// Write the terminal zero chunk into `buffer`.
    ///
    /// Subsequent calls are no-ops.
    pub fn finish(&mut self, buffer: &mut BytesMut) {
        if !mem::replace(&mut self.finished, true) {
            buffer.extend_from_slice(b"0\r\n\r\n");
        }
    }
}

fn write_hex(value: u64, buffer: &mut BytesMut) {
    const HEX: &[u8; 16] = b"0123456789abcdef";

    let mut digits = [0u8; 16];
    let mut at = digits.len();
    let mut rest = value;
    loop {
        at -= 1;
        digits[at] = HEX[(rest & 0xF) as usize];
        rest >>= 4;
        if rest == 0 {
            break;
        }
    }
    buffer.extend_from_slice(&digits[at..]);
}

#[cfg(test)]
mod test {
    use super::*;

    fn collect(decoder: &mut ChunkedDecoder, buffer: &mut BytesMut) -> (Vec<u8>, bool) {
        let mut out = Vec::new();
        loop {
            match decoder.decode(buffer) {
                Poll::Ready(Some(Ok(data))) => out.extend_from_slice(&data),
                Poll::Ready(Some(Err(err))) => panic!("unexpected error: {err}"),
                Poll::Ready(None) => return (out, true),
                Poll::Pending => return (out, false),
            }
        }
    }

    #[test]
    fn test_decode_single_fragment() {
        let mut decoder = ChunkedDecoder::new();
        let mut buffer = BytesMut::from(&b"5\r\nhello\r\n6\r\n world\r\n0\r\n\r\n"[..]);
        let (out, eof) = collect(&mut decoder, &mut buffer);
        assert!(eof);
        assert_eq!(out, b"hello world");
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_decode_fragmentation_invariance() {
        let input = &b"4\r\nwiki\r\n10\r\n0123456789abcdef\r\nE;ext=1\r\nin 14 chunks..\r\n0\r\n\r\n"[..];

        let mut single = ChunkedDecoder::new();
        let mut buffer = BytesMut::from(input);
        let (expected, eof) = collect(&mut single, &mut buffer);
        assert!(eof);
        assert_eq!(expected, b"wiki0123456789abcdefin 14 chunks..");

        // deliver the same input split at every boundary pair
        for split in 1..input.len() {
            let mut decoder = ChunkedDecoder::new();
            let mut buffer = BytesMut::from(&input[..split]);
            let (mut out, eof) = collect(&mut decoder, &mut buffer);
            assert!(!eof, "eof before the full input at split {split}");
            buffer.extend_from_slice(&input[split..]);
            let (rest, eof) = collect(&mut decoder, &mut buffer);
            assert!(eof, "no eof after the full input at split {split}");
            out.extend_from_slice(&rest);
            assert_eq!(out, expected, "diverged at split {split}");
        }

        // byte by byte
        let mut decoder = ChunkedDecoder::new();
        let mut buffer = BytesMut::new();
        let mut out = Vec::new();
        let mut finished = false;
        for &byte in input {
            assert!(!finished);
            buffer.extend_from_slice(&[byte]);
            let (data, eof) = collect(&mut decoder, &mut buffer);
            out.extend_from_slice(&data);
            finished = eof;
        }
        assert!(finished);
        assert_eq!(out, expected);
    }

    #[test]
    fn test_decode_hex_case_and_leading_zero() {
        let mut decoder = ChunkedDecoder::new();
        let mut buffer = BytesMut::from(&b"00A\r\n0123456789\r\n2F\r\n"[..]);
        match decoder.decode(&mut buffer) {
            Poll::Ready(Some(Ok(data))) => assert_eq!(&data[..], b"0123456789"),
            other => panic!("unexpected: {other:?}"),
        }
        // 0x2F = 47 bytes pending
        assert!(decoder.decode(&mut buffer).is_pending());
    }

    #[test]
    fn test_decode_trailing_bytes_ignored() {
        let mut decoder = ChunkedDecoder::new();
        let mut buffer = BytesMut::from(&b"3\r\nabc\r\n0\r\n\r\nGET / HTTP/1.1\r\n"[..]);
        let (out, eof) = collect(&mut decoder, &mut buffer);
        assert!(eof);
        assert_eq!(out, b"abc");
        assert_eq!(&buffer[..], b"GET / HTTP/1.1\r\n");

        // after eof, decode keeps returning end without touching the buffer
        assert!(matches!(decoder.decode(&mut buffer), Poll::Ready(None)));
        assert_eq!(&buffer[..], b"GET / HTTP/1.1\r\n");
    }

    #[test]
    fn test_decode_errors() {
        // missing CRLF after payload
        let mut decoder = ChunkedDecoder::new();
        let mut buffer = BytesMut::from(&b"3\r\nabcXX"[..]);
        assert!(matches!(decoder.decode(&mut buffer), Poll::Ready(Some(Ok(_)))));
        assert!(matches!(
            decoder.decode(&mut buffer),
            Poll::Ready(Some(Err(BodyError::InvalidChunked))),
        ));

        // invalid size line
        let mut decoder = ChunkedDecoder::new();
        let mut buffer = BytesMut::from(&b"xyz\r\n"[..]);
        assert!(matches!(
            decoder.decode(&mut buffer),
            Poll::Ready(Some(Err(BodyError::InvalidChunked))),
        ));

        // missing CRLF after the terminal chunk
        let mut decoder = ChunkedDecoder::new();
        let mut buffer = BytesMut::from(&b"0\r\nX-Trailer: 1\r\n\r\n"[..]);
        assert!(matches!(
            decoder.decode(&mut buffer),
            Poll::Ready(Some(Err(BodyError::InvalidChunked))),
        ));

        // unterminated size line beyond the cap
        let mut decoder = ChunkedDecoder::with_max_line(16);
        let mut buffer = BytesMut::from(&[b'a'; 32][..]);
        assert!(matches!(
            decoder.decode(&mut buffer),
            Poll::Ready(Some(Err(BodyError::ChunkLineTooLong))),
        ));

        // chunk size overflowing u64
        let mut decoder = ChunkedDecoder::new();
        let mut buffer = BytesMut::from(&b"fffffffffffffffff\r\n"[..]);
        assert!(matches!(
            decoder.decode(&mut buffer),
            Poll::Ready(Some(Err(BodyError::InvalidChunked))),
        ));
    }

    #[test]
    fn test_encode() {
        let mut encoder = ChunkedEncoder::new();
        let mut buffer = BytesMut::new();

        encoder.encode(b"hello", &mut buffer);
        encoder.encode(b"", &mut buffer);
        encoder.encode(&[b'x'; 26], &mut buffer);
        encoder.finish(&mut buffer);
        encoder.finish(&mut buffer);

        let expected = format!("5\r\nhello\r\n1a\r\n{}\r\n0\r\n\r\n", "x".repeat(26));
        assert_eq!(&buffer[..], expected.as_bytes());
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let payloads: &[&[u8]] = &[b"", b"a", b"hello world", &[0u8; 300]];

        for payload in payloads {
            let mut encoder = ChunkedEncoder::new();
            let mut wire = BytesMut::new();
            // split the payload into uneven chunks
            for part in payload.chunks(7) {
                encoder.encode(part, &mut wire);
            }
            encoder.finish(&mut wire);

            let mut decoder = ChunkedDecoder::new();
            let (out, eof) = collect(&mut decoder, &mut wire);
            assert!(eof);
            assert_eq!(&out[..], *payload);
        }
    }
}
