//! Unix PTY master.
//!
//! The master file descriptor is owned by an [`AsyncFd`] so reads and writes
//! integrate with Tokio. Closing the master drops the descriptor, which hangs
//! up the slave side.

use std::io;
use std::os::unix::io::{AsRawFd, OwnedFd, RawFd};
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use rustix::fs::{Mode, OFlags, fcntl_setfl};
use rustix::io::{Errno, FdFlags, fcntl_setfd};
use rustix::pty::{OpenptFlags, grantpt, openpt, ptsname, unlockpt};
use rustix::termios::{Winsize, tcgetwinsize, tcsetwinsize};
use tokio::io::unix::AsyncFd;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use crate::config::WindowSize;
use crate::error::{PtyError, Result};

fn create_err(errno: Errno) -> PtyError {
    PtyError::Create(io::Error::from_raw_os_error(errno.raw_os_error()))
}

/// The controller end of a pseudo-terminal pair.
pub struct UnixPtyMaster {
    /// `None` once the master has been closed.
    fd: Option<AsyncFd<OwnedFd>>,
}

impl std::fmt::Debug for UnixPtyMaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnixPtyMaster")
            .field("fd", &self.fd.as_ref().map(AsRawFd::as_raw_fd))
            .finish()
    }
}

impl UnixPtyMaster {
    /// Allocate a new PTY pair.
    ///
    /// Returns the master and the opened slave descriptor. The slave is meant
    /// to be handed to a child process and then dropped by the parent.
    ///
    /// # Errors
    ///
    /// Returns [`PtyError::Create`] if any allocation step fails.
    pub fn open() -> Result<(Self, OwnedFd)> {
        let master_fd = openpt(OpenptFlags::RDWR | OpenptFlags::NOCTTY).map_err(create_err)?;
        fcntl_setfd(&master_fd, FdFlags::CLOEXEC).map_err(create_err)?;
        grantpt(&master_fd).map_err(create_err)?;
        unlockpt(&master_fd).map_err(create_err)?;

        let slave_name = ptsname(&master_fd, Vec::new()).map_err(create_err)?;
        let slave_fd = rustix::fs::open(
            slave_name.as_c_str(),
            OFlags::RDWR | OFlags::NOCTTY | OFlags::CLOEXEC,
            Mode::empty(),
        )
        .map_err(create_err)?;

        fcntl_setfl(&master_fd, OFlags::NONBLOCK).map_err(create_err)?;
        let async_fd = AsyncFd::new(master_fd).map_err(PtyError::Create)?;

        tracing::trace!(slave = ?slave_name, "allocated PTY pair");
        Ok((Self { fd: Some(async_fd) }, slave_fd))
    }

    /// Check if the master is still open.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.fd.is_some()
    }

    /// Set the terminal window size.
    pub fn resize(&self, size: WindowSize) -> Result<()> {
        let fd = self.fd.as_ref().ok_or(PtyError::Closed)?;
        let winsize = Winsize {
            ws_col: size.cols,
            ws_row: size.rows,
            ws_xpixel: 0,
            ws_ypixel: 0,
        };
        tcsetwinsize(fd.get_ref(), winsize)
            .map_err(|e| PtyError::Resize(io::Error::from_raw_os_error(e.raw_os_error())))
    }

    /// Read back the terminal window size.
    pub fn window_size(&self) -> Result<WindowSize> {
        let fd = self.fd.as_ref().ok_or(PtyError::Closed)?;
        let winsize = tcgetwinsize(fd.get_ref())?;
        Ok(WindowSize::new(winsize.ws_col, winsize.ws_row))
    }

    /// Close the master. Idempotent.
    ///
    /// Subsequent reads report EOF and writes fail with `BrokenPipe`.
    pub fn close(&mut self) {
        if let Some(fd) = self.fd.take() {
            tracing::trace!(fd = fd.as_raw_fd(), "closing PTY master");
        }
    }
}

impl AsRawFd for UnixPtyMaster {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.as_ref().map_or(-1, AsRawFd::as_raw_fd)
    }
}

impl AsyncRead for UnixPtyMaster {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let Some(fd) = self.get_mut().fd.as_ref() else {
            return Poll::Ready(Ok(()));
        };

        loop {
            let mut guard = ready!(fd.poll_read_ready(cx))?;

            let unfilled = buf.initialize_unfilled();
            match rustix::io::read(guard.get_inner(), unfilled) {
                Ok(n) => {
                    buf.advance(n);
                    return Poll::Ready(Ok(()));
                }
                Err(Errno::AGAIN) => {
                    guard.clear_ready();
                }
                Err(Errno::INTR) => {}
                // Linux reports a hung-up slave as EIO rather than a zero-length read.
                Err(Errno::IO) => return Poll::Ready(Ok(())),
                Err(e) => return Poll::Ready(Err(io::Error::from_raw_os_error(e.raw_os_error()))),
            }
        }
    }
}

impl AsyncWrite for UnixPtyMaster {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let Some(fd) = self.get_mut().fd.as_ref() else {
            return Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "PTY closed")));
        };

        loop {
            let mut guard = ready!(fd.poll_write_ready(cx))?;

            match rustix::io::write(guard.get_inner(), buf) {
                Ok(n) => return Poll::Ready(Ok(n)),
                Err(Errno::AGAIN) => {
                    guard.clear_ready();
                }
                Err(Errno::INTR) => {}
                Err(Errno::IO) => {
                    return Poll::Ready(Err(io::Error::new(
                        io::ErrorKind::BrokenPipe,
                        "PTY slave hung up",
                    )));
                }
                Err(e) => return Poll::Ready(Err(io::Error::from_raw_os_error(e.raw_os_error()))),
            }
        }
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.get_mut().close();
        Poll::Ready(Ok(()))
    }
}
