//! Execution adapter
//!
//! A [`Runner`] is the function under test. It completes in one of three ways:
//!
//! - returns a value (or an error) directly,
//! - returns a [`Returned::Pending`] future or a [`Returned::Stream`],
//! - receives a [`Done`] handle and signals completion through it.
//!
//! [`execute`] drives any of these to exactly one [`Completion`].

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::stream::{BoxStream, Stream};
use futures::{FutureExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// Error kind assigned to a panic captured from a runner.
pub const PANIC_KIND: &str = "panic";

/// Error kind assigned when a [`Done`] handle is dropped without completing.
pub const COMPLETION_DROPPED_KIND: &str = "completion_dropped";

/// Outcome of one runner invocation.
pub type Completion = Result<Value, RunError>;

/// A typed error raised by a runner.
///
/// `parents` lists the kinds this error is also an instance of, so a
/// `RangeError` extending `Error` matches an expectation on either tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{kind}: {message}")]
pub struct RaisedError {
    pub kind: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,
}

impl RaisedError {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            parents: Vec::new(),
        }
    }

    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.parents.push(parent.into());
        self
    }

    /// Whether this error is of kind `tag`, directly or through a parent.
    pub fn is_a(&self, tag: &str) -> bool {
        self.kind == tag || self.parents.iter().any(|p| p == tag)
    }
}

/// The error half of a [`Completion`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RunError {
    /// A typed error.
    #[error(transparent)]
    Raised(RaisedError),

    /// A plain value used as an error, e.g. `done.fail("x")`.
    #[error("{0}")]
    Value(Value),
}

impl RunError {
    pub fn raised(kind: impl Into<String>, message: impl Into<String>) -> Self {
        RunError::Raised(RaisedError::new(kind, message))
    }

    pub fn value(value: impl Into<Value>) -> Self {
        RunError::Value(value.into())
    }

    pub fn is_panic(&self) -> bool {
        matches!(self, RunError::Raised(e) if e.kind == PANIC_KIND)
    }
}

impl From<RaisedError> for RunError {
    fn from(e: RaisedError) -> Self {
        RunError::Raised(e)
    }
}

/// What a direct-convention runner hands back.
pub enum Returned {
    /// Settled immediately.
    Ready(Value),
    /// Settles when the future resolves.
    Pending(BoxFuture<'static, Completion>),
    /// Settles on the first error, else on end with the last item.
    Stream(BoxStream<'static, Completion>),
}

impl fmt::Debug for Returned {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Returned::Ready(value) => f.debug_tuple("Ready").field(value).finish(),
            Returned::Pending(_) => f.write_str("Pending(..)"),
            Returned::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

impl From<Value> for Returned {
    fn from(value: Value) -> Self {
        Returned::Ready(value)
    }
}

/// Completion handle passed to callback-style runners.
///
/// Completing consumes the handle, so a runner can signal at most once.
pub struct Done {
    tx: oneshot::Sender<Completion>,
}

impl Done {
    pub fn complete(self, completion: Completion) {
        if self.tx.send(completion).is_err() {
            debug!("completion arrived after the test body went away");
        }
    }

    pub fn ok(self, value: impl Into<Value>) {
        self.complete(Ok(value.into()))
    }

    pub fn fail(self, error: impl Into<RunError>) {
        self.complete(Err(error.into()))
    }
}

impl fmt::Debug for Done {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Done").finish_non_exhaustive()
    }
}

type DirectFn = dyn Fn(&Value, &Value) -> Result<Returned, RunError> + Send + Sync;
type ErrbackFn = dyn Fn(Value, Value, Done) + Send + Sync;

#[derive(Clone)]
enum Convention {
    Direct(Arc<DirectFn>),
    Errback(Arc<ErrbackFn>),
}

/// The function under test.
///
/// Receives the instance value and the case options.
#[derive(Clone)]
pub struct Runner {
    convention: Convention,
}

impl Runner {
    /// A runner that may settle now or hand back a future or stream.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value, &Value) -> Result<Returned, RunError> + Send + Sync + 'static,
    {
        Self {
            convention: Convention::Direct(Arc::new(f)),
        }
    }

    pub fn sync<F>(f: F) -> Self
    where
        F: Fn(&Value, &Value) -> Result<Value, RunError> + Send + Sync + 'static,
    {
        Self::new(move |value, options| f(value, options).map(Returned::Ready))
    }

    pub fn future<F, Fut>(f: F) -> Self
    where
        F: Fn(Value, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Completion> + Send + 'static,
    {
        Self::new(move |value, options| {
            Ok(Returned::Pending(f(value.clone(), options.clone()).boxed()))
        })
    }

    pub fn stream<F, S>(f: F) -> Self
    where
        F: Fn(Value, Value) -> S + Send + Sync + 'static,
        S: Stream<Item = Completion> + Send + 'static,
    {
        Self::new(move |value, options| {
            Ok(Returned::Stream(f(value.clone(), options.clone()).boxed()))
        })
    }

    /// A callback-style runner; it must eventually call one of the [`Done`]
    /// methods, possibly from another task or thread.
    pub fn errback<F>(f: F) -> Self
    where
        F: Fn(Value, Value, Done) + Send + Sync + 'static,
    {
        Self {
            convention: Convention::Errback(Arc::new(f)),
        }
    }

    /// Returns the input value unchanged.
    pub fn identity() -> Self {
        Self::sync(|value, _| Ok(value.clone()))
    }

    pub fn is_errback(&self) -> bool {
        matches!(self.convention, Convention::Errback(_))
    }
}

impl Default for Runner {
    fn default() -> Self {
        Self::identity()
    }
}

impl fmt::Debug for Runner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.convention {
            Convention::Direct(_) => f.write_str("Runner::Direct"),
            Convention::Errback(_) => f.write_str("Runner::Errback"),
        }
    }
}

/// How a test body waits for its runner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    /// The body is synchronous; pending results are driven inline.
    #[default]
    Sync,
    /// The body is a future awaited by the registrar.
    Async,
    /// Like `Async`, and the runner completes through [`Done`]. Panics are
    /// not intercepted.
    Errback,
}

impl Mode {
    pub fn resolve(async_mode: bool, errback: bool) -> Self {
        match (async_mode, errback) {
            (_, true) => Mode::Errback,
            (true, false) => Mode::Async,
            (false, false) => Mode::Sync,
        }
    }

    pub fn is_async(self) -> bool {
        !matches!(self, Mode::Sync)
    }
}

/// Run `runner` once and normalize its outcome.
pub async fn execute(runner: &Runner, value: Value, options: Value, mode: Mode) -> Completion {
    match &runner.convention {
        Convention::Errback(f) => complete_errback(f.as_ref(), value, options).await,
        Convention::Direct(f) if mode == Mode::Errback => match f(&value, &options) {
            Ok(returned) => settle(returned, false).await,
            Err(e) => Err(e),
        },
        Convention::Direct(f) => {
            let called = panic::catch_unwind(AssertUnwindSafe(|| f(&value, &options)));
            match called {
                Ok(Ok(returned)) => settle(returned, true).await,
                Ok(Err(e)) => Err(e),
                Err(payload) => Err(panic_error(payload.as_ref())),
            }
        }
    }
}

/// [`execute`] for synchronous test bodies.
///
/// Futures that need a tokio timer or IO driver must run in [`Mode::Async`].
pub fn execute_blocking(runner: &Runner, value: Value, options: Value, mode: Mode) -> Completion {
    futures::executor::block_on(execute(runner, value, options, mode))
}

async fn complete_errback(f: &ErrbackFn, value: Value, options: Value) -> Completion {
    let (tx, rx) = oneshot::channel();
    f(value, options, Done { tx });
    match rx.await {
        Ok(completion) => completion,
        Err(_) => {
            warn!("runner dropped its completion handle");
            Err(RunError::raised(
                COMPLETION_DROPPED_KIND,
                "runner dropped its completion handle without completing",
            ))
        }
    }
}

async fn settle(returned: Returned, capture_panics: bool) -> Completion {
    let settled = async move {
        match returned {
            Returned::Ready(value) => Ok(value),
            Returned::Pending(future) => future.await,
            Returned::Stream(stream) => drain(stream).await,
        }
    };

    if capture_panics {
        AssertUnwindSafe(settled)
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(panic_error(payload.as_ref())))
    } else {
        settled.await
    }
}

async fn drain(mut stream: BoxStream<'static, Completion>) -> Completion {
    let mut last = Value::Null;
    while let Some(item) = stream.next().await {
        last = item?;
    }
    Ok(last)
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

fn panic_error(payload: &(dyn Any + Send)) -> RunError {
    RunError::raised(PANIC_KIND, panic_message(payload))
}
