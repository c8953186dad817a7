//! Non-blocking HTTP/1.x protocol engine.
//!
//! `salur` turns the raw, possibly fragmented byte stream of a connection
//! into validated requests with streaming bodies, and turns responses back
//! into correctly framed bytes, without blocking and with bounded memory per
//! connection.
//!
//! # Overview
//!
//! - [`h1::Connection`] drives one connection: request parsing, body
//!   streaming with backpressure, response framing, keep-alive, and
//!   upgrade/CONNECT tunneling.
//! - [`server::Server`] is the accept loop spawning one connection task per
//!   peer, with limits configured through [`server::Config`].
//! - [`body`] holds the chunked and length-delimited codecs and the request
//!   and response body types.
//! - [`middleware::Stack`] composes an ordered chain of handlers into a
//!   single [`service::Service`].
//!
//! # Example
//!
//! ```no_run
//! use salur::body::Outgoing;
//! use salur::response::Response;
//! use salur::server::Server;
//! use salur::service::from_fn;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> std::io::Result<()> {
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:3000").await?;
//!
//!     Server::new(listener, from_fn(|_request| async {
//!         Response::new(Outgoing::full("Hello World!"))
//!     }))
//!     .await;
//!
//!     Ok(())
//! }
//! ```
#![warn(missing_debug_implementations)]

mod common;
mod log;

pub mod http;
pub mod uri;
pub mod headers;
pub mod body;
pub mod h1;
pub mod request;
pub mod response;
pub mod service;
pub mod middleware;
pub mod server;

pub use common::ParseResult;

#[doc(inline)]
pub use request::Request;
#[doc(inline)]
pub use response::Response;
#[doc(inline)]
pub use http::{Method, StatusCode, Version};
