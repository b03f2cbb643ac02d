//! Candidate invocation.
//!
//! A candidate is stored either as an *immediate* closure (returns its result directly) or a *deferred* one
//! (returns a future). Both shapes are normalized to `Result<R, InvocationError>`: an `Err` returned by a
//! fallible candidate and a panic raised while invoking or polling it are both captured here, never propagated.

use std::any::Any;
use std::fmt::Display;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::task::{Context, Poll};

use thiserror::Error;

/// A boxed, non-`Send` future.
pub type LocalBoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Why a single run produced no result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvocationError {
    /// The candidate returned an error.
    #[error("{0}")]
    Raised(String),

    /// The candidate panicked.
    #[error("candidate panicked: {0}")]
    Panicked(String),

    /// A future-returning candidate was run by a synchronous runner.
    #[error("deferred candidate requires asynchronous mode")]
    DeferredInSyncMode,

    /// A predicate validator panicked while judging the result.
    #[error("validator panicked: {0}")]
    ValidatorPanicked(String),
}

impl InvocationError {
    pub fn raised(err: impl Display) -> Self {
        InvocationError::Raised(err.to_string())
    }
}

type ImmediateFn<A, R, X> = Box<dyn FnMut(Option<&X>, A) -> Result<R, InvocationError>>;
type DeferredFn<A, R, X> = Box<dyn FnMut(Option<&X>, A) -> LocalBoxFuture<'static, Result<R, InvocationError>>>;

pub(crate) enum Candidate<A, R, X> {
    Immediate(ImmediateFn<A, R, X>),
    Deferred(DeferredFn<A, R, X>),
}

impl<A: 'static, R: 'static, X: 'static> Candidate<A, R, X> {
    pub(crate) fn immediate<F, E>(mut f: F) -> Self
    where
        F: FnMut(Option<&X>, A) -> Result<R, E> + 'static,
        E: Display,
    {
        Candidate::Immediate(Box::new(move |context: Option<&X>, args: A| {
            f(context, args).map_err(InvocationError::raised)
        }))
    }

    pub(crate) fn deferred<F, Fut, E>(mut f: F) -> Self
    where
        F: FnMut(Option<&X>, A) -> Fut + 'static,
        Fut: Future<Output = Result<R, E>> + 'static,
        E: Display,
    {
        Candidate::Deferred(Box::new(move |context: Option<&X>, args: A| {
            let pending = f(context, args);
            let boxed: LocalBoxFuture<'static, Result<R, InvocationError>> =
                Box::pin(async move { pending.await.map_err(InvocationError::raised) });
            boxed
        }))
    }

    pub(crate) fn is_deferred(&self) -> bool {
        matches!(self, Candidate::Deferred(_))
    }

    /// Invoke without suspending. Deferred candidates cannot be driven here.
    pub(crate) fn invoke_now(&mut self, context: Option<&X>, args: A) -> Result<R, InvocationError> {
        match self {
            Candidate::Immediate(f) => catch_panic(|| f(context, args)),
            Candidate::Deferred(_) => Err(InvocationError::DeferredInSyncMode),
        }
    }

    /// Invoke and, for deferred candidates, wait for the result.
    pub(crate) async fn invoke(&mut self, context: Option<&X>, args: A) -> Result<R, InvocationError> {
        match self {
            Candidate::Immediate(f) => catch_panic(|| f(context, args)),
            Candidate::Deferred(f) => {
                let pending = catch_panic(|| Ok(f(context, args)))?;
                CatchUnwind { inner: pending }.await
            }
        }
    }
}

fn catch_panic<T>(f: impl FnOnce() -> Result<T, InvocationError>) -> Result<T, InvocationError> {
    catch_panic_as(InvocationError::Panicked, f)
}

/// Run `f`, turning a panic into the error built by `wrap` from the panic message.
pub(crate) fn catch_panic_as<T>(
    wrap: fn(String) -> InvocationError,
    f: impl FnOnce() -> Result<T, InvocationError>,
) -> Result<T, InvocationError> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(wrap(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Polls a deferred result, turning a panic during any poll into an `InvocationError`.
struct CatchUnwind<R> {
    inner: LocalBoxFuture<'static, Result<R, InvocationError>>,
}

impl<R> Future for CatchUnwind<R> {
    type Output = Result<R, InvocationError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let inner = &mut self.inner;
        match panic::catch_unwind(AssertUnwindSafe(|| inner.as_mut().poll(cx))) {
            Ok(poll) => poll,
            Err(payload) => Poll::Ready(Err(InvocationError::Panicked(panic_message(payload.as_ref())))),
        }
    }
}
