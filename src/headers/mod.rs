//! HTTP Headers.
//!
//! [`HeaderMap`] is an ordered multimap: lookup is case-insensitive, while
//! serialization preserves both the first-seen spelling of each name and the
//! insertion order of distinct names.
mod name;
mod value;
mod map;
pub mod error;

pub use name::HeaderName;
pub use value::HeaderValue;
pub use map::{AsHeaderName, GetAll, HeaderMap, IntoHeaderName, Iter};

/// Predefined standard header names.
pub mod standard {
    use super::HeaderName;

    macro_rules! standard {
        ($(pub const $id:ident = $name:literal;)*) => {
            $(
                #[doc = concat!("The `", $name, "` header name.")]
                pub const $id: HeaderName = HeaderName::from_static($name);
            )*
        };
    }

    standard! {
        pub const CONNECTION = "Connection";
        pub const CONTENT_LENGTH = "Content-Length";
        pub const CONTENT_TYPE = "Content-Type";
        pub const DATE = "Date";
        pub const HOST = "Host";
        pub const SERVER = "Server";
        pub const TRANSFER_ENCODING = "Transfer-Encoding";
        pub const UPGRADE = "Upgrade";
    }
}
