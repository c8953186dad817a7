//! HTTP Message Bodies.
//!
//! ## Incoming
//!
//! - [`Incoming`] request body, buffered or streamed from the connection
//! - [`BodyDecoder`] framing decoder selected from the request headers
//! - [`ChunkedDecoder`] / [`LengthDecoder`] the underlying codecs
//!
//! ## Outgoing
//!
//! - [`Outgoing`] response body, buffered bytes, a stream, or a [`Tunnel`]
//! - [`ChunkedEncoder`] chunked framing for streams of unknown size
mod chunked;
mod length;
mod decoder;
pub(crate) mod handle;
mod incoming;
mod outgoing;
pub(crate) mod tunnel;
pub mod error;

pub use chunked::{ChunkedDecoder, ChunkedEncoder, DEFAULT_MAX_CHUNK_LINE};
pub use length::LengthDecoder;
pub use decoder::{BodyDecoder, Coding};
pub use incoming::{Collect, Incoming};
pub use outgoing::Outgoing;
pub use tunnel::{Tunnel, TunnelStream, tunnel};
pub use error::{BodyError, ReadError};
