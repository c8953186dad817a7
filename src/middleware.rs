//! Middleware composition.
//!
//! A [`Stack`] threads a request through an ordered chain of handlers. Each
//! handler receives the request and a [`Next`] bound to the remaining suffix
//! of the chain. The suffix is captured by value, so a handler may invoke its
//! [`Next`] zero, one, or several times, concurrently if it wants to, without
//! corrupting the chain for anyone else.
//!
//! Cancellation is structural: dropping the future returned by the stack
//! drops whichever handler future is currently outstanding, and dropping one
//! of several sibling [`Next`] futures leaves the others running.
//!
//! ```no_run
//! use salur::middleware::Stack;
//! use salur::response::Response;
//! use salur::body::Outgoing;
//!
//! let service = Stack::builder()
//!     .wrap(|request, next| async move {
//!         // pre-processing, then continue down the chain
//!         next.run(request).await
//!     })
//!     .endpoint(|_request| async { Response::new(Outgoing::full("hello")) });
//! ```
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::Response;
use crate::service::Service;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The pending result of a handler, cancellable by dropping it.
pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<Response, BoxError>> + Send>>;

type BoxHandler = Box<dyn Fn(Request, Next) -> HandlerFuture + Send + Sync>;

/// An ordered middleware chain composed into a single [`Service`].
#[derive(Clone)]
pub struct Stack {
    chain: Arc<[BoxHandler]>,
}

impl Stack {
    /// Start building a chain.
    pub fn builder() -> Builder {
        Builder { chain: Vec::new() }
    }
}

impl Service<Request> for Stack {
    type Response = Response;

    type Error = BoxError;

    type Future = HandlerFuture;

    fn call(&self, request: Request) -> Self::Future {
        Next { chain: self.chain.clone(), index: 0 }.run(request)
    }
}

impl std::fmt::Debug for Stack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stack").field("len", &self.chain.len()).finish()
    }
}

/// Builder for [`Stack`], handlers run in registration order.
pub struct Builder {
    chain: Vec<BoxHandler>,
}

impl Builder {
    /// Register a middleware handler.
    ///
    /// The handler decides whether and how often to continue down the chain
    /// through the given [`Next`].
    pub fn wrap<F, Fut>(mut self, f: F) -> Self
    where
        F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response, BoxError>> + Send + 'static,
    {
        self.chain.push(Box::new(move |request, next| Box::pin(f(request, next))));
        self
    }

    /// Register the terminal handler and finish the chain.
    ///
    /// The terminal handler receives only the request.
    pub fn endpoint<F, Fut>(mut self, f: F) -> Stack
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.chain.push(Box::new(move |request, _| {
            let future = f(request);
            Box::pin(async move { Ok(future.await) })
        }));
        Stack { chain: self.chain.into() }
    }
}

impl std::fmt::Debug for Builder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Builder").field("len", &self.chain.len()).finish()
    }
}

/// The continue capability handed to a middleware handler.
///
/// Holds the remaining suffix of the chain by value. Running it builds an
/// independent future over an independent copy of the suffix, so repeated or
/// concurrent runs are safe.
#[derive(Clone)]
pub struct Next {
    chain: Arc<[BoxHandler]>,
    index: usize,
}

impl Next {
    /// Continue into the remaining chain.
    pub fn run(&self, request: Request) -> HandlerFuture {
        match self.chain.get(self.index) {
            Some(handler) => {
                let next = Next {
                    chain: self.chain.clone(),
                    index: self.index + 1,
                };
                handler(request, next)
            }
            None => Box::pin(async { Err("middleware chain exhausted".into()) }),
        }
    }
}

impl std::fmt::Debug for Next {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Next")
            .field("remaining", &self.chain.len().saturating_sub(self.index))
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::body::{Incoming, Outgoing};
    use crate::headers::HeaderValue;
    use crate::http::StatusCode;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn request() -> Request {
        let reqline = match crate::h1::parser::parse_reqline_chunk(
            &mut bytes::BytesMut::from(&b"GET /test HTTP/1.1\r\n"[..]),
        ) {
            crate::common::ParseResult::Ok(ok) => ok,
            _ => unreachable!(),
        };
        let mut state = crate::h1::HttpState::new(reqline);
        state
            .insert_header(
                crate::h1::parser::Header {
                    name: bytes::BytesMut::from(&b"Host"[..]),
                    value: bytes::BytesMut::from(&b"example.com"[..]),
                },
                64,
            )
            .unwrap();
        let (_, _, parts) = state
            .build(&crate::server::Config::default(), Default::default())
            .unwrap();
        Request::from_parts(parts, Incoming::empty())
    }

    #[tokio::test]
    async fn test_chain_runs_in_order() {
        let stack = Stack::builder()
            .wrap(|request, next| async move {
                let mut response = next.run(request).await?;
                response
                    .headers_mut()
                    .append("X-Order", HeaderValue::from_static("outer"));
                Ok(response)
            })
            .wrap(|request, next| async move {
                let mut response = next.run(request).await?;
                response
                    .headers_mut()
                    .append("X-Order", HeaderValue::from_static("inner"));
                Ok(response)
            })
            .endpoint(|_| async { Response::new(Outgoing::full("done")) });

        let response = stack.call(request()).await.unwrap();
        let order = response
            .headers()
            .get_all("x-order")
            .map(HeaderValue::as_str)
            .collect::<Vec<_>>();
        // appended on the way back out
        assert_eq!(order, ["inner", "outer"]);
    }

    #[tokio::test]
    async fn test_next_runs_twice() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);

        let stack = Stack::builder()
            .wrap(|first_request, next| async move {
                // retry handler, the first attempt is rejected downstream
                let first = next.run(first_request).await?;
                if first.status() == StatusCode::SERVICE_UNAVAILABLE {
                    return next.run(request()).await;
                }
                Ok(first)
            })
            .endpoint(|_| async {
                match CALLS.fetch_add(1, Ordering::SeqCst) {
                    0 => Response::with_status(StatusCode::SERVICE_UNAVAILABLE),
                    _ => Response::new(Outgoing::full("retried")),
                }
            });

        let response = stack.call(request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(CALLS.load(Ordering::SeqCst), 2);

        // the chain is not corrupted for later invocations
        let response = stack.call(request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(CALLS.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausted_chain_is_an_error() {
        let stack = Stack::builder()
            .wrap(|request, next| async move { next.run(request).await })
            .endpoint(|_| async { Response::new(Outgoing::empty()) });

        // calling `run` past the terminal handler resolves to an error
        let exhausted = Next { chain: stack.chain.clone(), index: stack.chain.len() };
        assert!(exhausted.run(request()).await.is_err());
    }

    #[tokio::test]
    async fn test_drop_cancels_inner_handler() {
        use std::sync::Mutex;
        use std::task::Poll;

        static DROPPED: Mutex<Vec<&'static str>> = Mutex::new(Vec::new());

        struct Guard;
        impl Drop for Guard {
            fn drop(&mut self) {
                DROPPED.lock().unwrap().push("inner");
            }
        }

        let stack = Stack::builder()
            .wrap(|request, next| async move { next.run(request).await })
            .endpoint(|_| async {
                let _guard = Guard;
                // never resolves
                std::future::pending::<()>().await;
                Response::new(Outgoing::empty())
            });

        let mut future = stack.call(request());
        let poll = std::future::poll_fn(|cx| Poll::Ready(future.as_mut().poll(cx))).await;
        assert!(poll.is_pending());
        assert!(DROPPED.lock().unwrap().is_empty());

        // cancellation is dropping the pending result, it propagates to the
        // innermost outstanding handler
        drop(future);
        assert_eq!(DROPPED.lock().unwrap().as_slice(), ["inner"]);
    }
}
