//! Unix child process attached to a PTY slave.

use std::ffi::OsStr;
use std::io;
use std::os::unix::io::OwnedFd;
use std::process::Stdio;
use std::time::Duration;

use rustix::process::{Pid, Signal, kill_process, kill_process_group};
use tokio::process::{Child, Command};

use crate::config::{PtyConfig, PtySignal};
use crate::error::{PtyError, Result};
use crate::status::ExitStatus;

/// Upper bound on reaping a child after SIGKILL.
const KILL_REAP_TIMEOUT: Duration = Duration::from_secs(5);

/// A child process running on the slave side of a PTY.
#[derive(Debug)]
pub struct UnixPtyChild {
    child: Child,
    pid: u32,
    /// The child leads its own process group.
    group_leader: bool,
    /// Cached once the child has been reaped.
    status: Option<ExitStatus>,
}

impl UnixPtyChild {
    /// The process ID.
    #[must_use]
    pub const fn pid(&self) -> u32 {
        self.pid
    }

    /// Poll for exit without blocking.
    pub fn try_wait(&mut self) -> Result<Option<ExitStatus>> {
        if self.status.is_some() {
            return Ok(self.status);
        }
        let status = self.child.try_wait().map_err(PtyError::Wait)?.map(ExitStatus::from);
        self.status = status;
        Ok(status)
    }

    /// Check if the child is still running.
    pub fn is_running(&mut self) -> bool {
        matches!(self.try_wait(), Ok(None))
    }

    /// Wait for the child to exit.
    pub async fn wait(&mut self) -> Result<ExitStatus> {
        if let Some(status) = self.status {
            return Ok(status);
        }
        let status = ExitStatus::from(self.child.wait().await.map_err(PtyError::Wait)?);
        self.status = Some(status);
        Ok(status)
    }

    /// Deliver a signal to the child (and its process group when it leads one).
    pub fn signal(&self, signal: PtySignal) -> Result<()> {
        if self.status.is_some() {
            return Ok(());
        }
        let pid = i32::try_from(self.pid)
            .ok()
            .and_then(Pid::from_raw)
            .ok_or_else(|| PtyError::Signal(io::Error::from(io::ErrorKind::InvalidInput)))?;
        let sig = Signal::from_named_raw(signal.as_unix_signal())
            .ok_or_else(|| PtyError::Signal(io::Error::from(io::ErrorKind::InvalidInput)))?;

        let delivered = if self.group_leader {
            kill_process_group(pid, sig).or_else(|_| kill_process(pid, sig))
        } else {
            kill_process(pid, sig)
        };

        match delivered {
            Ok(()) | Err(rustix::io::Errno::SRCH) => Ok(()),
            Err(e) => Err(PtyError::Signal(io::Error::from_raw_os_error(e.raw_os_error()))),
        }
    }

    /// Stop the child: SIGTERM, wait up to `grace`, then SIGKILL and reap.
    ///
    /// Never fails and is idempotent. Returns the exit status if the child
    /// could be reaped.
    pub async fn terminate(&mut self, grace: Duration) -> Option<ExitStatus> {
        match self.try_wait() {
            Ok(Some(status)) => return Some(status),
            Ok(None) => {}
            Err(e) => tracing::warn!(pid = self.pid, error = %e, "failed to poll child"),
        }

        if let Err(e) = self.signal(PtySignal::Terminate) {
            tracing::debug!(pid = self.pid, error = %e, "SIGTERM not delivered");
        }

        if !grace.is_zero() {
            if let Ok(Ok(status)) = tokio::time::timeout(grace, self.wait()).await {
                tracing::debug!(pid = self.pid, %status, "child exited after SIGTERM");
                return Some(status);
            }
        }

        if let Err(e) = self.signal(PtySignal::Kill) {
            tracing::debug!(pid = self.pid, error = %e, "SIGKILL via group failed");
        }
        if let Err(e) = self.child.start_kill() {
            tracing::debug!(pid = self.pid, error = %e, "start_kill failed");
        }

        match tokio::time::timeout(KILL_REAP_TIMEOUT, self.wait()).await {
            Ok(Ok(status)) => {
                tracing::debug!(pid = self.pid, %status, "child killed");
                Some(status)
            }
            Ok(Err(e)) => {
                tracing::warn!(pid = self.pid, error = %e, "failed to reap killed child");
                None
            }
            Err(_) => {
                tracing::warn!(pid = self.pid, "child did not exit after SIGKILL");
                None
            }
        }
    }
}

/// Spawn the child with `slave` as its standard streams.
pub(super) fn spawn_child<I>(
    slave: OwnedFd,
    program: &OsStr,
    args: I,
    config: &PtyConfig,
) -> Result<UnixPtyChild>
where
    I: IntoIterator,
    I::Item: AsRef<OsStr>,
{
    let program_name = program.to_string_lossy().into_owned();
    let spawn_err = |source: io::Error| PtyError::Spawn {
        program: program_name.clone(),
        source,
    };

    let mut cmd = Command::new(program);
    cmd.args(args)
        .env_clear()
        .envs(config.effective_env())
        .stdin(Stdio::from(slave.try_clone().map_err(spawn_err)?))
        .stdout(Stdio::from(slave.try_clone().map_err(spawn_err)?))
        .stderr(Stdio::from(slave))
        .kill_on_drop(true);

    if let Some(dir) = &config.working_directory {
        cmd.current_dir(dir);
    }

    if config.controlling_terminal {
        // SAFETY: only async-signal-safe calls between fork and exec.
        #[allow(unsafe_code)]
        unsafe {
            cmd.pre_exec(|| {
                if libc::setsid() == -1 {
                    return Err(io::Error::last_os_error());
                }
                #[allow(clippy::cast_lossless, clippy::useless_conversion)]
                if libc::ioctl(0, libc::TIOCSCTTY as _, 0) == -1 {
                    return Err(io::Error::last_os_error());
                }
                Ok(())
            });
        }
    }

    let child = cmd.spawn().map_err(spawn_err)?;
    // Drop the parent's copies of the slave so EOF reaches the master.
    drop(cmd);

    let pid = child.id().ok_or_else(|| spawn_err(io::Error::other("child exited before its pid was read")))?;

    Ok(UnixPtyChild {
        child,
        pid,
        group_leader: config.controlling_terminal,
        status: None,
    })
}
