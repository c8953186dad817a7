use std::num::NonZeroU16;

/// HTTP [Status Code][rfc].
///
/// [rfc]: <https://datatracker.ietf.org/doc/html/rfc9110#name-status-codes>
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusCode(NonZeroU16);

impl Default for StatusCode {
    #[inline]
    fn default() -> Self {
        Self::OK
    }
}

impl StatusCode {
    /// Returns `true` for an informational (1xx) status.
    #[inline]
    pub const fn is_informational(&self) -> bool {
        matches!(self.0.get(), 100..=199)
    }

    /// Returns `true` for a successful (2xx) status.
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self.0.get(), 200..=299)
    }

    /// Returns `true` for a redirection (3xx) status.
    #[inline]
    pub const fn is_redirection(&self) -> bool {
        matches!(self.0.get(), 300..=399)
    }

    /// Returns `true` for a client error (4xx) status.
    #[inline]
    pub const fn is_client_error(&self) -> bool {
        matches!(self.0.get(), 400..=499)
    }

    /// Returns `true` for a server error (5xx) status.
    #[inline]
    pub const fn is_server_error(&self) -> bool {
        matches!(self.0.get(), 500..=599)
    }
}

macro_rules! status_codes {
    (
        $(
            $(#[$doc:meta])*
            $int:literal $id:ident $msg:literal;
        )*
    ) => {
        impl StatusCode {
            /// Returns status code value, e.g: `200`.
            #[inline]
            pub const fn status(&self) -> u16 {
                self.0.get()
            }

            /// Returns status code and message as string slice, e.g: `"200 OK"`.
            #[inline]
            pub const fn as_str(&self) -> &'static str {
                match self.0.get() {
                    $(
                        $int => concat!(stringify!($int)," ",$msg),
                    )*
                    // SAFETY: StatusCode value is privately constructed and immutable
                    _ => unsafe { std::hint::unreachable_unchecked() },
                }
            }

            /// Returns status message, e.g: `"OK"`.
            #[inline]
            pub const fn message(&self) -> &'static str {
                match self.0.get() {
                    $(
                        $int => $msg,
                    )*
                    // SAFETY: StatusCode value is privately constructed and immutable
                    _ => unsafe { std::hint::unreachable_unchecked() },
                }
            }
        }

        impl StatusCode {
            $(
                $(#[$doc])*
                pub const $id: Self = Self(NonZeroU16::new($int).unwrap());
            )*
        }
    };
}

status_codes! {
    /// `100`. The initial part of a request has been received and has not yet
    /// been rejected by the server.
    100 CONTINUE "Continue";
    /// `101`. This code is sent in response to an `Upgrade` request header from
    /// the client and indicates the protocol the server is switching to.
    101 SWITCHING_PROTOCOLS "Switching Protocols";
    /// `200`. The request succeeded.
    200 OK "OK";
    /// `201`. The request succeeded, and a new resource was created as a result.
    201 CREATED "Created";
    /// `202`. The request has been accepted for processing, but the processing
    /// has not been completed.
    202 ACCEPTED "Accepted";
    /// `204`. There is no content to send for this request, but the headers are
    /// useful.
    204 NO_CONTENT "No Content";
    /// `301`. The URI of the requested resource has been changed permanently.
    301 MOVED_PERMANENTLY "Moved Permanently";
    /// `302`. This response code means that the URI of requested resource has
    /// been changed temporarily.
    302 FOUND "Found";
    /// `303`. The server sent this response to direct the client to get the
    /// requested resource at another URI with a GET request.
    303 SEE_OTHER "See Other";
    /// `304`. This is used for caching purposes. It tells the client that the
    /// response has not been modified.
    304 NOT_MODIFIED "Not Modified";
    /// `400`. The server cannot or will not process the request due to
    /// something that is perceived to be a client error.
    400 BAD_REQUEST "Bad Request";
    /// `401`. Although the HTTP standard specifies "unauthorized", semantically
    /// this response means "unauthenticated".
    401 UNAUTHORIZED "Unauthorized";
    /// `403`. The client's identity is known to the server, but client does not
    /// have access rights to the content.
    403 FORBIDDEN "Forbidden";
    /// `404`. The server cannot find the requested resource.
    404 NOT_FOUND "Not Found";
    /// `405`. The request method is known by the server but is not supported by
    /// the target resource.
    405 METHOD_NOT_ALLOWED "Method Not Allowed";
    /// `408`. This response is sent on an idle connection by some servers, even
    /// without any previous request by the client.
    408 REQUEST_TIMEOUT "Request Timeout";
    /// `411`. Server rejected the request because the `Content-Length` header
    /// field is not defined and the server requires it.
    411 LENGTH_REQUIRED "Length Required";
    /// `413`. The request body is larger than limits defined by server.
    413 CONTENT_TOO_LARGE "Content Too Large";
    /// `414`. The URI requested by the client is longer than the server is
    /// willing to interpret.
    414 URI_TOO_LONG "URI Too Long";
    /// `431`. The server is unwilling to process the request because its header
    /// fields are too large.
    431 REQUEST_HEADER_FIELDS_TOO_LARGE "Request Header Fields Too Large";
    /// `500`. The server has encountered a situation it does not know how to
    /// handle.
    500 INTERNAL_SERVER_ERROR "Internal Server Error";
    /// `501`. The request method or coding is not supported by the server and
    /// cannot be handled.
    501 NOT_IMPLEMENTED "Not Implemented";
    /// `502`. The server, while working as a gateway, got an invalid response.
    502 BAD_GATEWAY "Bad Gateway";
    /// `503`. The server is not ready to handle the request.
    503 SERVICE_UNAVAILABLE "Service Unavailable";
    /// `504`. The server is acting as a gateway and cannot get a response in
    /// time.
    504 GATEWAY_TIMEOUT "Gateway Timeout";
    /// `505`. The HTTP version used in the request is not supported by the
    /// server.
    505 HTTP_VERSION_NOT_SUPPORTED "HTTP Version Not Supported";
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Debug for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_tuple("StatusCode").field(&self.as_str()).finish()
    }
}
