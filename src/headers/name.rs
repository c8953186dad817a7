use bytes::Bytes;

use crate::headers::error::HeaderError;

/// HTTP Header name.
///
/// The spelling given at construction is preserved for serialization, while
/// comparison is ASCII case-insensitive.
#[derive(Clone)]
pub struct HeaderName {
    /// is a valid token
    bytes: Bytes,
}

const MAX_HEADER_NAME_LEN: usize = 256;

impl HeaderName {
    /// Create [`HeaderName`] from static bytes.
    ///
    /// # Panics
    ///
    /// Panics if the input is not a valid header name.
    #[inline]
    pub const fn from_static(name: &'static str) -> Self {
        match validate_header_name(name.as_bytes()) {
            Ok(()) => Self {
                bytes: Bytes::from_static(name.as_bytes()),
            },
            Err(err) => err.panic_const(),
        }
    }

    /// Parse header name from [`Bytes`] without copying.
    ///
    /// # Errors
    ///
    /// Returns error if the input is not a valid header name.
    #[inline]
    pub fn from_bytes<B: Into<Bytes>>(name: B) -> Result<Self, HeaderError> {
        let bytes = name.into();
        match validate_header_name(&bytes) {
            Ok(()) => Ok(Self { bytes }),
            Err(err) => Err(err),
        }
    }

    /// Parse header name by copying from a slice of bytes.
    ///
    /// # Errors
    ///
    /// Returns error if the input is not a valid header name.
    #[inline]
    pub fn from_slice<A: AsRef<[u8]>>(name: A) -> Result<Self, HeaderError> {
        match validate_header_name(name.as_ref()) {
            Ok(()) => Ok(Self {
                bytes: Bytes::copy_from_slice(name.as_ref()),
            }),
            Err(err) => Err(err),
        }
    }

    /// Extracts a string slice of the header name in its original spelling.
    #[inline]
    pub fn as_str(&self) -> &str {
        // SAFETY: `bytes` is a validated token, which is a subset of ASCII
        unsafe { str::from_utf8_unchecked(&self.bytes) }
    }

    /// Checks that two header names are an ASCII case-insensitive match.
    #[inline]
    pub fn eq_ignore_case(&self, other: &str) -> bool {
        self.as_str().eq_ignore_ascii_case(other)
    }
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

const fn validate_header_name(mut bytes: &[u8]) -> Result<(), HeaderError> {
    if bytes.is_empty() {
        return Err(HeaderError::Empty);
    }
    if bytes.len() > MAX_HEADER_NAME_LEN {
        return Err(HeaderError::TooLong);
    }
    while let [byte, rest @ ..] = bytes {
        if !is_token_byte(*byte) {
            return Err(HeaderError::Invalid);
        }
        bytes = rest;
    }
    Ok(())
}

// ===== Traits =====

impl PartialEq for HeaderName {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.eq_ignore_case(other.as_str())
    }
}

impl Eq for HeaderName {}

impl PartialEq<str> for HeaderName {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        self.eq_ignore_case(other)
    }
}

impl PartialEq<&str> for HeaderName {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        self.eq_ignore_case(other)
    }
}

impl std::fmt::Debug for HeaderName {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        std::fmt::Debug::fmt(self.as_str(), f)
    }
}

impl std::fmt::Display for HeaderName {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
