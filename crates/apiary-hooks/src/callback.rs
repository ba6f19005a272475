#![forbid(unsafe_code)]

//! Async callbacks supplied by the host bindings.

use std::future::Future;
use std::rc::Rc;

use futures::FutureExt;
use futures::future::LocalBoxFuture;

use crate::error::Result;

/// Shared async callback taking `A` and producing `R`.
pub type AsyncHandler<A, R> = Rc<dyn Fn(A) -> LocalBoxFuture<'static, Result<R>>>;

/// Box an async closure into an [`AsyncHandler`].
pub fn handler<A, R, F, Fut>(f: F) -> AsyncHandler<A, R>
where
    F: Fn(A) -> Fut + 'static,
    Fut: Future<Output = Result<R>> + 'static,
{
    Rc::new(move |arg| f(arg).boxed_local())
}

/// Handler that succeeds immediately.
pub fn noop<A: 'static>() -> AsyncHandler<A, ()> {
    handler(|_| async { Ok(()) })
}
