//! Application handler abstraction.
use std::convert::Infallible;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::request::Request;
use crate::response::Response;

// ===== Service =====

/// An asynchronous request handler.
pub trait Service<Request> {
    type Response;

    type Error;

    type Future: Future<Output = Result<Self::Response, Self::Error>>;

    fn call(&self, request: Request) -> Self::Future;
}

/// A [`Service`] the HTTP engine can drive.
pub trait HttpService: Service<Request, Response = Response> {}

impl<S> HttpService for S where S: Service<Request, Response = Response> {}

// ===== FromFn =====

/// Create a [`Service`] from an async function.
pub fn from_fn<F>(f: F) -> FromFn<F> {
    FromFn { f }
}

/// [`Service`] for [`from_fn`].
#[derive(Debug, Clone)]
pub struct FromFn<F> {
    f: F,
}

impl<F, Fut, Req, Res> Service<Req> for FromFn<F>
where
    F: Fn(Req) -> Fut,
    Fut: Future<Output = Res>,
{
    type Response = Res;

    type Error = Infallible;

    type Future = Infallibly<Fut>;

    fn call(&self, request: Req) -> Self::Future {
        Infallibly { future: (self.f)(request) }
    }
}

pin_project_lite::pin_project! {
    /// Future wrapping an infallible handler output into a [`Result`].
    #[derive(Debug)]
    #[must_use = "futures do nothing unless polled"]
    pub struct Infallibly<F> {
        #[pin]
        future: F,
    }
}

impl<F: Future> Future for Infallibly<F> {
    type Output = Result<F::Output, Infallible>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.project().future.poll(cx).map(Ok)
    }
}
