/// HTTP Method.
///
/// This API follows the [RFC9110] methods and the PATCH method from [RFC5789].
///
/// Arbitrary method is not supported.
///
/// [RFC5789]: https://www.rfc-editor.org/rfc/rfc5789
/// [RFC9110]: <https://www.rfc-editor.org/rfc/rfc9110.html#name-methods>
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Method(u8);

methods! {
    /// The GET method requests transfer of a current selected representation
    /// for the target resource.
    pub const GET = (0, b"GET", "GET");
    /// The HEAD method is identical to GET except that the server MUST NOT
    /// send content in the response.
    pub const HEAD = (1, b"HEAD", "HEAD");
    /// The POST method requests that the target resource process the
    /// representation enclosed in the request according to the resource's own
    /// specific semantics.
    pub const POST = (2, b"POST", "POST");
    /// The PUT method requests that the state of the target resource be
    /// created or replaced with the state defined by the enclosed
    /// representation.
    pub const PUT = (3, b"PUT", "PUT");
    /// The DELETE method requests that the origin server remove the
    /// association between the target resource and its current functionality.
    pub const DELETE = (4, b"DELETE", "DELETE");
    /// The CONNECT method requests that the recipient establish a tunnel to
    /// the destination origin server and thereafter restrict its behavior to
    /// blind forwarding of data in both directions.
    pub const CONNECT = (5, b"CONNECT", "CONNECT");
    /// The OPTIONS method requests information about the communication
    /// options available for the target resource.
    pub const OPTIONS = (6, b"OPTIONS", "OPTIONS");
    /// The TRACE method requests a remote, application-level loop-back of the
    /// request message.
    pub const TRACE = (7, b"TRACE", "TRACE");
    /// The PATCH method requests that a set of changes described in the
    /// request entity be applied to the resource identified by the
    /// Request-URI.
    pub const PATCH = (8, b"PATCH", "PATCH");
}

impl std::str::FromStr for Method {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_bytes(s.as_bytes()).ok_or(UnknownMethod)
    }
}

impl std::fmt::Debug for Method {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Display for Method {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ===== Error =====

pub struct UnknownMethod;

impl std::error::Error for UnknownMethod { }

impl std::fmt::Debug for UnknownMethod {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("unknown method")
    }
}

impl std::fmt::Display for UnknownMethod {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("unknown method")
    }
}

// ===== Macros =====

macro_rules! methods {
    (
        $(
           $(#[$doc:meta])*
           pub const $name:ident = ($idx:literal, $val:literal, $str:literal);
        )*
    ) => {
        impl Method {
            $(
               $(#[$doc])*
               pub const $name: Self = Self($idx);
            )*

            /// Create [`Method`] from bytes.
            #[inline]
            pub const fn from_bytes(src: &[u8]) -> Option<Method> {
                match src {
                    $(
                        $val => Some(Self::$name),
                    )*
                    _ => None,
                }
            }

            /// Returns string representation of the method.
            #[inline]
            pub const fn as_str(&self) -> &'static str {
                match self.0 {
                    $(
                        $idx => $str,
                    )*
                    // SAFETY: Method value is privately constructed and immutable
                    _ => unsafe { std::hint::unreachable_unchecked() },
                }
            }
        }
    };
}

use methods;
