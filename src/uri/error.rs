/// URI Parsing error.
#[derive(Debug, PartialEq, Eq)]
pub enum UriError {
    /// Scheme delimiter not found.
    InvalidScheme,
    /// Scheme is not `http` or `https`.
    UnsupportedScheme,
    /// Invalid `host[:port]` authority.
    InvalidAuthority,
    /// Port is not a valid integer.
    InvalidPort,
    /// Invalid character in path.
    InvalidPath,
    /// Request targets cannot carry a fragment.
    FragmentNotAllowed,
}

impl std::error::Error for UriError {}

impl std::fmt::Display for UriError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::InvalidScheme => f.write_str("invalid scheme"),
            Self::UnsupportedScheme => f.write_str("unsupported scheme"),
            Self::InvalidAuthority => f.write_str("invalid authority"),
            Self::InvalidPort => f.write_str("invalid port"),
            Self::InvalidPath => f.write_str("invalid path"),
            Self::FragmentNotAllowed => f.write_str("fragment not allowed"),
        }
    }
}
