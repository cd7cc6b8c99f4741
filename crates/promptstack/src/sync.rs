//! Blocking wrappers for synchronous test harnesses.

use std::future::Future;

use tokio::runtime::{Builder, Runtime};

use crate::backend::{ExitStatus, PtyTransport};
use crate::config::SessionConfig;
use crate::error::{ExpectError, Result};
use crate::expect::{Captured, ExpectationRule};
use crate::session::Session;

fn runtime() -> Result<Runtime> {
    Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| ExpectError::io("creating tokio runtime", e))
}

/// Run `future` to completion on a fresh current-thread runtime.
///
/// # Errors
///
/// Returns [`ExpectError::Io`] if the runtime cannot be created.
pub fn block_on<F: Future>(future: F) -> Result<F::Output> {
    Ok(runtime()?.block_on(future))
}

/// A PTY session driven without `async`.
pub struct SyncSession {
    runtime: Runtime,
    inner: Session<PtyTransport>,
}

impl SyncSession {
    /// Spawn `config.command` in a new PTY.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime cannot be created or spawning fails.
    pub fn spawn_with_config(config: SessionConfig) -> Result<Self> {
        let runtime = runtime()?;
        let inner = {
            let _guard = runtime.enter();
            Session::spawn_with_config(config)?
        };
        Ok(Self { runtime, inner })
    }

    /// Spawn `command` with `args`.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime cannot be created or spawning fails.
    pub fn spawn(command: &str, args: &[&str]) -> Result<Self> {
        Self::spawn_with_config(SessionConfig::new(command).args(args.iter().copied()))
    }

    /// See [`Session::send_line`].
    ///
    /// # Errors
    ///
    /// Returns [`ExpectError::Write`] if the write fails.
    pub fn send_line(&mut self, line: &str) -> Result<()> {
        self.runtime.block_on(self.inner.send_line(line))
    }

    /// See [`Session::expect`].
    ///
    /// # Errors
    ///
    /// Returns a timeout, EOF, or I/O error.
    pub fn expect(&mut self, rule: impl Into<ExpectationRule>) -> Result<Captured> {
        let rule = rule.into();
        self.runtime.block_on(self.inner.expect(&rule))
    }

    /// See [`Session::terminate`].
    pub fn terminate(&mut self) -> Option<ExitStatus> {
        self.runtime.block_on(self.inner.terminate())
    }

    /// The wrapped async session.
    #[must_use]
    pub const fn session(&self) -> &Session<PtyTransport> {
        &self.inner
    }
}

impl Drop for SyncSession {
    fn drop(&mut self) {
        if !self.inner.is_terminated() {
            self.runtime.block_on(self.inner.terminate());
        }
    }
}

impl std::fmt::Debug for SyncSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncSession")
            .field("session", &self.inner)
            .finish_non_exhaustive()
    }
}
