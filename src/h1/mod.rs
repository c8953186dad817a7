//! HTTP/1.x engine: parser, protocol semantics, and the connection driver.
pub mod parser;
mod proto;
mod error;
mod io;
mod connection;

#[cfg(test)]
mod test;

pub use connection::Connection;
pub use error::{H1Error, H1ErrorKind};
pub use proto::HttpState;
