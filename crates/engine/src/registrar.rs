//! The seam between the engine and whatever schedules tests

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;
use once_cell::sync::OnceCell;

use crate::compare::Verdict;
use crate::suite::Suite;

/// The work of one registered test.
pub enum TestBody {
    /// Completes when the closure returns.
    Sync(Box<dyn FnOnce() -> Verdict + Send>),
    /// Completes when the future resolves.
    Async(BoxFuture<'static, Verdict>),
}

impl TestBody {
    pub fn is_async(&self) -> bool {
        matches!(self, TestBody::Async(_))
    }

    /// Run the body on the current task.
    ///
    /// Sync bodies block; registrars with a runtime should prefer running
    /// them on a blocking thread.
    pub async fn run(self) -> Verdict {
        match self {
            TestBody::Sync(f) => f(),
            TestBody::Async(future) => future.await,
        }
    }
}

impl fmt::Debug for TestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestBody::Sync(_) => f.write_str("TestBody::Sync"),
            TestBody::Async(_) => f.write_str("TestBody::Async"),
        }
    }
}

/// Schedules one named test.
pub trait Registrar: Send + Sync {
    fn register(&self, title: String, body: TestBody);
}

impl<F> Registrar for F
where
    F: Fn(String, TestBody) + Send + Sync,
{
    fn register(&self, title: String, body: TestBody) {
        self(title, body)
    }
}

static DEFAULT_REGISTRAR: OnceCell<Arc<dyn Registrar>> = OnceCell::new();

/// Install the process-wide registrar. Fails, returning `registrar`, if one
/// has already been installed or resolved.
pub fn set_default_registrar(registrar: Arc<dyn Registrar>) -> Result<(), Arc<dyn Registrar>> {
    DEFAULT_REGISTRAR.set(registrar)
}

/// The process-wide registrar, falling back to [`Suite::global`].
pub fn default_registrar() -> Arc<dyn Registrar> {
    DEFAULT_REGISTRAR
        .get_or_init(|| Suite::global() as Arc<dyn Registrar>)
        .clone()
}
