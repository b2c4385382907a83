//! Tokio runtime wrapper that lets synchronous robot code drive async
//! WebDriver clients.
use anyhow::Result;
use std::future::Future;
use std::time::Duration;
use tokio::runtime::{Builder, Handle, Runtime};

/// Cloneable handle that blocks the calling thread on futures spawned onto
/// the owning [`BrobotRuntime`].
#[derive(Clone, Debug)]
pub struct BrobotHandle {
    inner: Handle,
}

#[derive(Debug)]
pub struct BrobotRuntime {
    runtime: Runtime,
}

impl BrobotRuntime {
    /// Build a Tokio runtime configured for browser sessions.
    ///
    /// ```
    /// use brobot_runtime::BrobotRuntime;
    /// use std::time::Duration;
    ///
    /// let runtime = BrobotRuntime::build("doctest-runtime", Some(1))
    ///     .expect("runtime builds");
    /// let value = runtime.block_on(async { 2 + 2 });
    /// assert_eq!(value, 4);
    /// runtime.shutdown(Duration::from_millis(10));
    /// ```
    pub fn build(thread_name: &str, worker_threads: Option<usize>) -> Result<Self> {
        let mut builder = Builder::new_multi_thread();
        builder.enable_all().thread_name(thread_name);

        if let Some(workers) = worker_threads {
            builder.worker_threads(workers.max(1));
        }

        let runtime = builder.build()?;
        Ok(Self { runtime })
    }

    /// Obtain a cloned handle, e.g. for element wrappers that outlive a
    /// borrow of the session.
    ///
    /// ```
    /// use brobot_runtime::BrobotRuntime;
    ///
    /// let runtime = BrobotRuntime::build("handle-example", Some(1)).unwrap();
    /// let handle = runtime.handle();
    /// assert_eq!(handle.block_on(async { "done" }), "done");
    /// ```
    pub fn handle(&self) -> BrobotHandle {
        BrobotHandle {
            inner: self.runtime.handle().clone(),
        }
    }

    /// Run a future to completion on the runtime.
    pub fn block_on<F: Future>(&self, fut: F) -> F::Output {
        self.runtime.block_on(fut)
    }

    /// Shut the runtime down, waiting at most `graceful` for in-flight work.
    pub fn shutdown(self, graceful: Duration) {
        self.runtime.shutdown_timeout(graceful);
    }
}

impl BrobotHandle {
    /// Block the current (non-runtime) thread until `fut` completes.
    ///
    /// Must not be called from inside an async context.
    pub fn block_on<F: Future>(&self, fut: F) -> F::Output {
        self.inner.block_on(fut)
    }
}
