use std::io;

/// A protocol error while decoding a message body.
#[derive(Debug, PartialEq, Eq)]
pub enum BodyError {
    /// Client error where the chunked framing is invalid.
    InvalidChunked,
    /// Client error where a chunk-size line has no terminator within the cap.
    ChunkLineTooLong,
    /// Client error where a chunk length is too large.
    ChunkTooLarge,
    /// The upstream connection ended before the body completed.
    UnexpectedEof,
}

impl BodyError {
    const fn message(&self) -> &'static str {
        match self {
            Self::InvalidChunked => "invalid chunked format",
            Self::ChunkLineTooLong => "chunk size line too long",
            Self::ChunkTooLarge => "chunk too large",
            Self::UnexpectedEof => "unexpected end of body",
        }
    }
}

impl std::error::Error for BodyError { }

impl std::fmt::Display for BodyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Body reading error.
#[derive(Debug)]
pub struct ReadError {
    kind: Box<Kind>,
}

/// The cause of a [`ReadError`].
#[derive(Debug)]
pub enum Kind {
    /// The body framing is broken.
    Body(BodyError),
    /// The underlying transport failed.
    Io(io::Error),
}

impl ReadError {
    /// Returns the error kind.
    pub fn kind(&self) -> &Kind {
        &self.kind
    }
}

impl From<BodyError> for ReadError {
    #[inline]
    fn from(v: BodyError) -> Self {
        Self { kind: Box::new(Kind::Body(v)) }
    }
}

impl From<io::Error> for ReadError {
    #[inline]
    fn from(v: io::Error) -> Self {
        Self { kind: Box::new(Kind::Io(v)) }
    }
}

impl From<io::ErrorKind> for ReadError {
    #[inline]
    fn from(v: io::ErrorKind) -> Self {
        Self { kind: Box::new(Kind::Io(v.into())) }
    }
}

impl std::error::Error for ReadError { }

impl std::fmt::Display for ReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind.as_ref() {
            Kind::Body(body) => body.fmt(f),
            Kind::Io(error) => error.fmt(f),
        }
    }
}
