//! PTY transport.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use promptstack_pty::{UnixPtyChild, UnixPtyMaster};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use super::{ExitStatus, ProcessControl, PtySignal};
use crate::config::SessionConfig;
use crate::error::{Result, SpawnError};

/// A child process attached to a pseudo-terminal.
#[derive(Debug)]
pub struct PtyTransport {
    master: UnixPtyMaster,
    child: UnixPtyChild,
}

impl PtyTransport {
    /// Spawn `config.command` with `config.args` in a new PTY.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns a [`SpawnError`] if no command is configured, the PTY cannot
    /// be allocated, or the program cannot be executed.
    pub fn spawn(config: &SessionConfig) -> Result<Self> {
        if config.command.trim().is_empty() {
            return Err(SpawnError::EmptyCommand.into());
        }
        let (master, child) =
            promptstack_pty::spawn(&config.command, &config.args, &config.pty_config())
                .map_err(SpawnError::from)?;
        Ok(Self { master, child })
    }

    /// Resize the terminal.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ExpectError::Io`] if the master is closed or the
    /// ioctl fails.
    pub fn resize(&self, cols: u16, rows: u16) -> Result<()> {
        self.master
            .resize(promptstack_pty::WindowSize::new(cols, rows))
            .map_err(|e| crate::ExpectError::io("resizing PTY", io::Error::other(e)))
    }

    /// Deliver `signal` to the child's process group.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ExpectError::Io`] if the signal cannot be sent. A
    /// child that has already exited is not an error.
    pub fn signal(&self, signal: PtySignal) -> Result<()> {
        tracing::debug!(?signal, pid = self.child.pid(), "signalling child");
        self.child
            .signal(signal)
            .map_err(|e| crate::ExpectError::io("signalling child", io::Error::other(e)))
    }
}

impl AsyncRead for PtyTransport {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().master).poll_read(cx, buf)
    }
}

impl AsyncWrite for PtyTransport {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.get_mut().master).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().master).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().master).poll_shutdown(cx)
    }
}

impl ProcessControl for PtyTransport {
    fn pid(&self) -> Option<u32> {
        Some(self.child.pid())
    }

    fn is_running(&mut self) -> bool {
        self.child.is_running()
    }

    async fn terminate(&mut self, grace: Duration) -> Option<ExitStatus> {
        let status = self.child.terminate(grace).await;
        self.master.close();
        status
    }
}
