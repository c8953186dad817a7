//! URI types for request targets.
//!
//! Only the shapes an HTTP/1.x request target can take are representable:
//! an `http`/`https` scheme, a `host[:port]` authority, and a path with
//! optional query. Fragments are rejected at parse time.
use bytes::Bytes;

mod error;

pub use error::UriError;

// ===== Scheme =====

/// URI Scheme, `http` or `https`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Scheme(Repr);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Repr {
    Http,
    Https,
}

impl Scheme {
    /// `http`
    pub const HTTP: Scheme = Scheme(Repr::Http);

    /// `https`
    pub const HTTPS: Scheme = Scheme(Repr::Https);

    /// Create [`Scheme`] from bytes, case-insensitive.
    pub fn from_bytes(src: &[u8]) -> Option<Scheme> {
        if src.eq_ignore_ascii_case(b"http") {
            Some(Self::HTTP)
        } else if src.eq_ignore_ascii_case(b"https") {
            Some(Self::HTTPS)
        } else {
            None
        }
    }

    /// Returns string representation of the scheme.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self.0 {
            Repr::Http => "http",
            Repr::Https => "https",
        }
    }

    /// Returns the default port of the scheme, which is omitted from a
    /// normalized authority.
    #[inline]
    pub const fn default_port(&self) -> u16 {
        match self.0 {
            Repr::Http => 80,
            Repr::Https => 443,
        }
    }
}

impl std::fmt::Display for Scheme {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ===== Authority =====

/// URI Authority, `host[:port]`.
///
/// Userinfo is not supported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authority {
    /// is valid ASCII
    host: Bytes,
    port: Option<u16>,
}

impl Authority {
    /// Create [`Authority`] from parts without validating the host.
    pub(crate) fn from_parts(host: Bytes, port: Option<u16>) -> Self {
        Self { host, port }
    }

    /// Parse `host[:port]`.
    ///
    /// The host may be a registered name, an IPv4 literal, or a bracketed
    /// IPv6 literal. Userinfo, paths, and schemes are rejected.
    pub fn from_bytes(src: impl Into<Bytes>) -> Result<Self, UriError> {
        let src = src.into();

        let (host, port) = match src.as_ref() {
            [] => return Err(UriError::InvalidAuthority),
            // bracketed IPv6 literal
            [b'[', ..] => {
                let Some(close) = src.iter().position(|&b| b == b']') else {
                    return Err(UriError::InvalidAuthority);
                };
                match src.get(close + 1..) {
                    Some([]) | None => (src.slice(..close + 1), None),
                    Some([b':', port @ ..]) => {
                        let port = parse_port(port)?;
                        (src.slice(..close + 1), Some(port))
                    }
                    Some(_) => return Err(UriError::InvalidAuthority),
                }
            }
            _ => match src.iter().position(|&b| b == b':') {
                Some(colon) => {
                    let port = parse_port(&src[colon + 1..])?;
                    (src.slice(..colon), Some(port))
                }
                None => (src.clone(), None),
            },
        };

        if host.is_empty() || !host.iter().all(|&b| is_host_byte(b)) {
            return Err(UriError::InvalidAuthority);
        }

        Ok(Self { host, port })
    }

    /// Returns the host as string slice.
    #[inline]
    pub fn host(&self) -> &str {
        // SAFETY: `host` is validated ASCII at construction
        unsafe { str::from_utf8_unchecked(&self.host) }
    }

    /// Returns the explicit port, if any.
    #[inline]
    pub const fn port(&self) -> Option<u16> {
        self.port
    }

    /// Drop the port when it equals the scheme default.
    pub(crate) fn suppress_default_port(mut self, scheme: Scheme) -> Self {
        if self.port == Some(scheme.default_port()) {
            self.port = None;
        }
        self
    }
}

impl std::fmt::Display for Authority {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.host())?;
        if let Some(port) = self.port {
            write!(f, ":{port}")?;
        }
        Ok(())
    }
}

fn parse_port(src: &[u8]) -> Result<u16, UriError> {
    if src.is_empty() || src.len() > 5 || !src.iter().all(u8::is_ascii_digit) {
        return Err(UriError::InvalidPort);
    }
    let mut port = 0u32;
    for &b in src {
        port = port * 10 + u32::from(b - b'0');
    }
    u16::try_from(port).map_err(|_| UriError::InvalidPort)
}

/// reg-name / IPv4 bytes, userinfo and delimiters excluded
const fn is_host_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric()
        || matches!(b, b'-' | b'.' | b'_' | b'~' | b'%' | b':' | b'[' | b']')
}

// ===== Uri =====

/// Normalized request URI.
///
/// The authority never carries the scheme default port.
#[derive(Debug, Clone)]
pub struct Uri {
    scheme: Scheme,
    authority: Authority,
    /// path and query, is valid ASCII
    path: Bytes,
}

impl Uri {
    /// Create [`Uri`] from parts, suppressing the scheme default port.
    pub fn from_parts(scheme: Scheme, authority: Authority, path: impl Into<Bytes>) -> Self {
        Self {
            scheme,
            authority: authority.suppress_default_port(scheme),
            path: path.into(),
        }
    }

    /// Parse an absolute-form uri, `scheme://host[:port][/path][?query]`.
    ///
    /// A fragment is rejected, request targets cannot carry one.
    pub fn parse_absolute(src: impl Into<Bytes>) -> Result<Self, UriError> {
        let src = src.into();

        if src.iter().any(|&b| b == b'#') {
            return Err(UriError::FragmentNotAllowed);
        }

        let sep = src
            .windows(3)
            .position(|w| w == b"://")
            .ok_or(UriError::InvalidScheme)?;
        let scheme = Scheme::from_bytes(&src[..sep]).ok_or(UriError::UnsupportedScheme)?;

        let rest = src.slice(sep + 3..);
        let (authority, path) = match rest.iter().position(|&b| matches!(b, b'/' | b'?')) {
            Some(at) => (rest.slice(..at), rest.slice(at..)),
            None => (rest, Bytes::new()),
        };

        let authority = Authority::from_bytes(authority)?;

        if !path.iter().all(|&b| is_target_byte(b)) {
            return Err(UriError::InvalidPath);
        }

        Ok(Self::from_parts(scheme, authority, path))
    }

    /// Returns the uri scheme.
    #[inline]
    pub const fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Returns the uri authority.
    #[inline]
    pub const fn authority(&self) -> &Authority {
        &self.authority
    }

    /// Returns the uri host.
    #[inline]
    pub fn host(&self) -> &str {
        self.authority.host()
    }

    /// Returns the explicit uri port, if any.
    #[inline]
    pub const fn port(&self) -> Option<u16> {
        self.authority.port()
    }

    /// Returns the path with the query, e.g: `/index?page=2`.
    ///
    /// An empty path is returned as `/`.
    #[inline]
    pub fn path(&self) -> &str {
        if self.path.is_empty() {
            "/"
        } else {
            // SAFETY: `path` is validated ASCII at construction
            unsafe { str::from_utf8_unchecked(&self.path) }
        }
    }
}

impl std::fmt::Display for Uri {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}://{}{}", self.scheme, self.authority, self.path())
    }
}

/// visible ASCII, as in a request target
pub(crate) const fn is_target_byte(b: u8) -> bool {
    matches!(b, 0x21..=0x7E)
}
