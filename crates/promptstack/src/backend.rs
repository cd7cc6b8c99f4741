//! Transports a session can drive.
//!
//! A transport is a byte channel to the child (`AsyncRead + AsyncWrite`) plus
//! [`ProcessControl`] for liveness and termination. The PTY backend is the
//! production transport; `MockTransport` (feature `mock`) scripts a fake one.

use std::future::Future;
use std::time::Duration;

pub use promptstack_pty::{ExitStatus, PtySignal};

#[cfg(unix)]
pub mod pty;

#[cfg(unix)]
pub use pty::PtyTransport;

/// Process lifecycle operations behind a transport.
pub trait ProcessControl {
    /// The child's process ID, if it has one.
    fn pid(&self) -> Option<u32>;

    /// Check if the child is still running.
    fn is_running(&mut self) -> bool;

    /// Stop the child and release the channel.
    ///
    /// Must never fail: errors are logged. Returns the exit status when the
    /// child could be reaped.
    fn terminate(&mut self, grace: Duration) -> impl Future<Output = Option<ExitStatus>> + Send;
}
