//! HTTP Protocol.
mod method;
mod status;
mod version;
mod extensions;
mod date;

pub use method::{Method, UnknownMethod};
pub use version::Version;
pub use status::StatusCode;
pub use extensions::Extensions;
pub use date::{httpdate, httpdate_now};
