use bytes::{Bytes, BytesMut};
use std::task::Poll;

use crate::body::error::BodyError;

/// Length delimited body decoder.
///
/// Emits exactly the declared byte count across data chunks, then end.
/// Surplus buffered bytes are never consumed, they belong to the next
/// message on the connection.
#[derive(Debug)]
pub struct LengthDecoder {
    remaining: u64,
}

impl LengthDecoder {
    /// Create a decoder for a declared byte count.
    #[inline]
    pub const fn new(len: u64) -> Self {
        Self { remaining: len }
    }

    /// Returns the number of bytes not yet decoded.
    #[inline]
    pub const fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Returns `true` when the declared count has been fully decoded.
    #[inline]
    pub const fn is_end(&self) -> bool {
        self.remaining == 0
    }

    /// Decode the next data chunk out of `buffer`.
    ///
    /// Returns [`Poll::Pending`] when more upstream bytes are required, and
    /// `Ready(None)` once the declared count is reached. A declared count of
    /// zero is end without ever producing data.
    pub fn decode(&mut self, buffer: &mut BytesMut) -> Poll<Option<Result<Bytes, BodyError>>> {
        if self.remaining == 0 {
            return Poll::Ready(None);
        }
        if buffer.is_empty() {
            return Poll::Pending;
        }
        match self.remaining.checked_sub(buffer.len() as u64) {
            // buffer does not contain all the expected content
            Some(leftover) if leftover > 0 => {
                self.remaining = leftover;
                Poll::Ready(Some(Ok(buffer.split().freeze())))
            }
            // buffer contains exact or larger than the expected content
            _ => {
                #[allow(
                    clippy::cast_possible_truncation,
                    reason = "remaining <= buffer.len() which is usize"
                )]
                let data = buffer.split_to(self.remaining as usize).freeze();
                self.remaining = 0;
                Poll::Ready(Some(Ok(data)))
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_exact_count_across_fragments() {
        let input = b"0123456789";

        for split in 0..=input.len() {
            let mut decoder = LengthDecoder::new(10);
            let mut buffer = BytesMut::from(&input[..split]);
            let mut out = Vec::new();

            while let Poll::Ready(Some(Ok(data))) = decoder.decode(&mut buffer) {
                out.extend_from_slice(&data);
            }
            buffer.extend_from_slice(&input[split..]);
            while let Poll::Ready(Some(Ok(data))) = decoder.decode(&mut buffer) {
                out.extend_from_slice(&data);
            }

            assert_eq!(out, input, "diverged at split {split}");
            assert!(decoder.is_end());
            assert!(matches!(decoder.decode(&mut buffer), Poll::Ready(None)));
        }
    }

    #[test]
    fn test_surplus_is_left_in_buffer() {
        let mut decoder = LengthDecoder::new(4);
        let mut buffer = BytesMut::from(&b"bodyNEXT"[..]);

        match decoder.decode(&mut buffer) {
            Poll::Ready(Some(Ok(data))) => assert_eq!(&data[..], b"body"),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(matches!(decoder.decode(&mut buffer), Poll::Ready(None)));
        assert_eq!(&buffer[..], b"NEXT");
    }

    #[test]
    fn test_zero_count_is_immediate_end() {
        let mut decoder = LengthDecoder::new(0);
        let mut buffer = BytesMut::from(&b"ignored"[..]);
        assert!(matches!(decoder.decode(&mut buffer), Poll::Ready(None)));
        assert_eq!(&buffer[..], b"ignored");
    }

    #[test]
    fn test_short_input_stays_pending() {
        let mut decoder = LengthDecoder::new(16);
        let mut buffer = BytesMut::from(&b"partial"[..]);
        assert!(matches!(decoder.decode(&mut buffer), Poll::Ready(Some(Ok(_)))));
        // upstream end before the declared count is the caller's error to
        // report, the decoder itself just keeps waiting
        assert!(decoder.decode(&mut buffer).is_pending());
        assert_eq!(decoder.remaining(), 9);
    }
}
