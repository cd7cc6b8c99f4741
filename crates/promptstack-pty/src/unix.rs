//! Unix implementation: PTY allocation, child spawning, and process control.
//!
//! The master side is opened with `posix_openpt`, made non-blocking, and
//! registered with Tokio's reactor. The child gets the slave side as its
//! stdin/stdout/stderr and, by default, as its controlling terminal, so
//! programs that insist on a TTY (line editors, debuggers, `python -i`)
//! behave as they would for a human.

mod child;
mod pty;

use std::ffi::OsStr;

pub use child::UnixPtyChild;
pub use pty::UnixPtyMaster;

use crate::config::PtyConfig;
use crate::error::Result;

/// Spawn `program` with `args` inside a freshly allocated PTY.
///
/// Must be called from within a Tokio runtime: the master is registered with
/// the reactor and the child is reaped by Tokio's process driver.
///
/// # Errors
///
/// Returns [`crate::PtyError::Create`] if the PTY pair cannot be allocated and
/// [`crate::PtyError::Spawn`] if the program cannot be executed.
pub fn spawn<S, I>(program: S, args: I, config: &PtyConfig) -> Result<(UnixPtyMaster, UnixPtyChild)>
where
    S: AsRef<OsStr>,
    I: IntoIterator,
    I::Item: AsRef<OsStr>,
{
    let (master, slave) = UnixPtyMaster::open()?;
    master.resize(config.window_size)?;

    let child = child::spawn_child(slave, program.as_ref(), args, config)?;
    tracing::debug!(pid = child.pid(), program = ?program.as_ref(), "spawned child in PTY");

    Ok((master, child))
}
