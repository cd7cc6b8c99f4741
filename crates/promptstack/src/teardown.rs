//! Orderly shutdown of a session and its prompt contexts.
//!
//! Teardown runs once at the end of every scenario, whether it passed or not.
//! Nested interpreters are exited innermost first, the top-level program is
//! asked to quit, and the child is then terminated unconditionally. Nothing in
//! here returns an error: problems are logged and reflected in the
//! [`TeardownReport`].

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};

use crate::backend::{ExitStatus, ProcessControl};
use crate::config::SessionConfig;
use crate::context::ContextStack;
use crate::session::Session;

/// What teardown managed to do.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeardownReport {
    /// Nested frames removed from the context stack.
    pub frames_unwound: usize,
    /// Nested frames whose exit command was acknowledged by the parent prompt.
    pub graceful_exits: usize,
    /// Whether the top-level program closed its output after its exit command.
    pub base_exited: bool,
    /// Whether the session was terminated (always true after [`TeardownManager::run`]).
    pub terminated: bool,
    /// Exit status of the child, if one was reaped.
    pub exit_status: Option<ExitStatus>,
}

/// Unwinds contexts and terminates the session.
#[derive(Debug, Clone, Copy)]
pub struct TeardownManager {
    exit_deadline: Duration,
}

impl TeardownManager {
    /// Wait at most `exit_deadline` for each exit command to be acknowledged.
    #[must_use]
    pub const fn new(exit_deadline: Duration) -> Self {
        Self { exit_deadline }
    }

    /// Use the teardown deadline from `config`.
    #[must_use]
    pub const fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.timeout.teardown_exit)
    }

    /// The per-exit-command deadline.
    #[must_use]
    pub const fn exit_deadline(&self) -> Duration {
        self.exit_deadline
    }

    /// Unwind `stack` to its base frame and terminate `session`.
    ///
    /// Afterwards `stack.depth()` is 1 and the session is terminated.
    pub async fn run<T>(&self, session: &mut Session<T>, stack: &mut ContextStack) -> TeardownReport
    where
        T: AsyncRead + AsyncWrite + ProcessControl + Unpin + Send,
    {
        let mut report = TeardownReport::default();
        tracing::debug!(depth = stack.depth(), "starting teardown");

        while let Some(frame) = stack.unwind_one() {
            report.frames_unwound += 1;

            let Some(exit) = frame.exit_command() else {
                tracing::debug!(context = frame.name(), "no exit command, dropping frame");
                continue;
            };
            if session.is_eof() || session.is_terminated() {
                continue;
            }

            let parent = stack.top().boundary_rule();
            let acknowledged = match session.send_line(exit).await {
                Ok(()) => session.read_until(&parent, self.exit_deadline).await,
                Err(e) => Err(e),
            };
            match acknowledged {
                Ok(_) => report.graceful_exits += 1,
                Err(e) => tracing::warn!(
                    context = frame.name(),
                    error = %e,
                    "nested context did not exit cleanly"
                ),
            }
        }

        if let Some(exit) = stack.base().exit_command() {
            if !session.is_eof() && !session.is_terminated() {
                report.base_exited = self.quit_base(session, exit).await;
            }
        }

        report.exit_status = session.terminate().await;
        report.terminated = session.is_terminated();

        tracing::debug!(
            unwound = report.frames_unwound,
            graceful = report.graceful_exits,
            base_exited = report.base_exited,
            status = ?report.exit_status,
            "teardown complete"
        );
        report
    }

    async fn quit_base<T>(&self, session: &mut Session<T>, exit: &str) -> bool
    where
        T: AsyncRead + AsyncWrite + ProcessControl + Unpin + Send,
    {
        if let Err(e) = session.send_line(exit).await {
            tracing::warn!(error = %e, "failed to send exit command");
            return false;
        }
        match session.expect_eof(self.exit_deadline).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(error = %e, "program did not exit after its exit command");
                false
            }
        }
    }
}

impl Default for TeardownManager {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_TEARDOWN_EXIT)
    }
}
