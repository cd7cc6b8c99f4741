//! Error types for the promptstack-pty crate.

use std::io;

/// The error type for PTY operations.
#[derive(Debug, thiserror::Error)]
pub enum PtyError {
    /// Failed to allocate the pseudo-terminal pair.
    #[error("failed to create PTY: {0}")]
    Create(#[source] io::Error),

    /// Failed to start the child process.
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        /// The program that could not be started.
        program: String,
        /// The underlying error from `exec`/`fork`.
        #[source]
        source: io::Error,
    },

    /// An I/O error occurred on the master side.
    #[error("PTY I/O error: {0}")]
    Io(#[from] io::Error),

    /// Failed to resize the PTY.
    #[error("failed to resize PTY: {0}")]
    Resize(#[source] io::Error),

    /// The master side has been closed.
    #[error("PTY has been closed")]
    Closed,

    /// Failed to deliver a signal to the child.
    #[error("failed to send signal: {0}")]
    Signal(#[source] io::Error),

    /// Failed to reap the child.
    #[error("failed to wait for child: {0}")]
    Wait(#[source] io::Error),
}

/// A specialized Result type for PTY operations.
pub type Result<T> = std::result::Result<T, PtyError>;

#[cfg(unix)]
impl From<rustix::io::Errno> for PtyError {
    fn from(errno: rustix::io::Errno) -> Self {
        Self::Io(io::Error::from_raw_os_error(errno.raw_os_error()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_error_names_program() {
        let err = PtyError::Spawn {
            program: "/no/such/debugger".to_string(),
            source: io::Error::from(io::ErrorKind::NotFound),
        };
        assert!(err.to_string().contains("/no/such/debugger"));
    }

    #[test]
    fn error_from_io() {
        let pty_err: PtyError = io::Error::other("boom").into();
        assert!(matches!(pty_err, PtyError::Io(_)));
    }
}
