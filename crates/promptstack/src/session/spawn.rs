//! Spawning sessions on a real pseudo-terminal.

use super::Session;
use crate::backend::{PtySignal, PtyTransport};
use crate::config::SessionConfig;
use crate::error::Result;

impl Session<PtyTransport> {
    /// Spawn `command` with `args` in a new PTY using default settings.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use promptstack::{ExpectationRule, Session};
    ///
    /// # async fn demo() -> promptstack::Result<()> {
    /// let mut session = Session::spawn("lldb", &["a.out"])?;
    /// session.expect(&ExpectationRule::exact("(lldb) ")).await?;
    /// session.send_line("breakpoint set -f main.c -l 7").await?;
    /// session.expect(&ExpectationRule::exact("(lldb) ")).await?;
    /// session.terminate().await;
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`crate::ExpectError::Spawn`] if the program cannot be started.
    pub fn spawn(command: &str, args: &[&str]) -> Result<Self> {
        Self::spawn_with_config(SessionConfig::new(command).args(args.iter().copied()))
    }

    /// Spawn `config.command` with `config.args`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ExpectError::Spawn`] if the program cannot be started.
    pub fn spawn_with_config(config: SessionConfig) -> Result<Self> {
        let transport = PtyTransport::spawn(&config)?;
        tracing::info!(
            command = %config.command,
            args = ?config.args,
            pid = ?crate::backend::ProcessControl::pid(&transport),
            "spawned session"
        );
        Ok(Self::new(transport, config))
    }

    /// Deliver `signal` to the child's process group.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ExpectError::Io`] if the signal cannot be sent.
    pub fn signal(&self, signal: PtySignal) -> Result<()> {
        self.transport().signal(signal)
    }

    /// Interrupt the child as Ctrl-C would (SIGINT), e.g. to stop a running
    /// inferior and get the prompt back.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ExpectError::Io`] if the signal cannot be sent.
    pub fn interrupt(&self) -> Result<()> {
        self.signal(PtySignal::Interrupt)
    }

    /// Tell the child its terminal went away (SIGHUP).
    ///
    /// # Errors
    ///
    /// Returns [`crate::ExpectError::Io`] if the signal cannot be sent.
    pub fn hangup(&self) -> Result<()> {
        self.signal(PtySignal::Hangup)
    }

    /// Resize the terminal.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ExpectError::Io`] if the resize fails.
    pub fn resize(&self, cols: u16, rows: u16) -> Result<()> {
        self.transport().resize(cols, rows)
    }
}
