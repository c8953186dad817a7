use bytes::Bytes;

use crate::headers::error::HeaderError;

/// HTTP Header Value.
///
/// This API does not support non-ASCII values.
#[derive(Clone, PartialEq, Eq)]
pub struct HeaderValue {
    /// is ASCII field content
    bytes: Bytes,
}

const MAX_HEADER_VALUE_LEN: usize = 1 << 13;

impl HeaderValue {
    /// Create an empty [`HeaderValue`].
    #[inline]
    pub const fn empty() -> Self {
        Self { bytes: Bytes::new() }
    }

    /// Create [`HeaderValue`] from static bytes.
    ///
    /// # Panics
    ///
    /// Panics if the input is not a valid header value.
    #[inline]
    pub const fn from_static(value: &'static str) -> Self {
        match validate_header_value(value.as_bytes()) {
            Ok(()) => Self {
                bytes: Bytes::from_static(value.as_bytes()),
            },
            Err(err) => err.panic_const(),
        }
    }

    /// Parse header value from [`Bytes`] without copying.
    ///
    /// # Errors
    ///
    /// Returns error if the input is not a valid header value.
    #[inline]
    pub fn from_bytes<B: Into<Bytes>>(value: B) -> Result<Self, HeaderError> {
        let bytes = value.into();
        match validate_header_value(&bytes) {
            Ok(()) => Ok(Self { bytes }),
            Err(err) => Err(err),
        }
    }

    /// Parse header value by copying from a slice of bytes.
    ///
    /// # Errors
    ///
    /// Returns error if the input is not a valid header value.
    #[inline]
    pub fn from_slice<A: AsRef<[u8]>>(value: A) -> Result<Self, HeaderError> {
        match validate_header_value(value.as_ref()) {
            Ok(()) => Ok(Self {
                bytes: Bytes::copy_from_slice(value.as_ref()),
            }),
            Err(err) => Err(err),
        }
    }

    /// Format an integer as a [`HeaderValue`].
    #[inline]
    pub fn from_integer(value: u64) -> Self {
        Self {
            bytes: Bytes::copy_from_slice(itoa::Buffer::new().format(value).as_bytes()),
        }
    }

    /// Wrap bytes the caller already knows to be valid field content.
    #[inline]
    pub(crate) fn from_owned_unchecked(bytes: Bytes) -> Self {
        debug_assert!(validate_header_value(&bytes).is_ok());
        Self { bytes }
    }

    /// Returns `true` if the value is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Returns header value as a byte slice.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns header value as `str`.
    #[inline]
    pub fn as_str(&self) -> &str {
        // SAFETY: `bytes` is validated ASCII
        unsafe { str::from_utf8_unchecked(&self.bytes) }
    }

    /// Returns `true` when any comma-separated element of the value matches
    /// `token` case-insensitively.
    pub fn contains_token(&self, token: &str) -> bool {
        self.as_str()
            .split(',')
            .any(|e| e.trim().eq_ignore_ascii_case(token))
    }
}

const fn validate_header_value(bytes: &[u8]) -> Result<(), HeaderError> {
    match bytes {
        // no leading SP / HTAB
        [b' ' | b'\t', ..]
        // no trailing SP / HTAB
        | [.., b' ' | b'\t'] => {
            return Err(HeaderError::Invalid);
        }
        _ => {}
    }
    if bytes.len() > MAX_HEADER_VALUE_LEN {
        return Err(HeaderError::TooLong);
    }
    let mut rest = bytes;
    while let [byte, tail @ ..] = rest {
        if !matches!(*byte, b'\t' | 0x20..=0x7E) {
            return Err(HeaderError::Invalid);
        }
        rest = tail;
    }
    Ok(())
}

// ===== Traits =====

impl PartialEq<str> for HeaderValue {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl PartialEq<&str> for HeaderValue {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl std::fmt::Debug for HeaderValue {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        std::fmt::Debug::fmt(self.as_str(), f)
    }
}

impl std::fmt::Display for HeaderValue {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
