//! promptstack-pty: async pseudo-terminal plumbing
//!
//! This crate allocates a pseudo-terminal, starts a child process with the
//! slave side as its controlling terminal, and exposes the master side as a
//! Tokio `AsyncRead + AsyncWrite` channel. It is the lowest layer of
//! `promptstack`, which drives interactive programs (debuggers, REPLs) line
//! by line.
//!
//! # Platform Support
//!
//! - **Unix** (Linux, macOS, BSDs): PTY allocation via `rustix`
//!   (`posix_openpt`/`grantpt`/`unlockpt`), I/O through `tokio::io::unix::AsyncFd`.
//!
//! # Quick Start
//!
//! ```ignore
//! use promptstack_pty::PtyConfig;
//! use tokio::io::{AsyncReadExt, AsyncWriteExt};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (mut master, mut child) = promptstack_pty::spawn("cat", [] as [&str; 0], &PtyConfig::default())?;
//!
//!     master.write_all(b"hello\n").await?;
//!
//!     let mut buf = [0u8; 1024];
//!     let n = master.read(&mut buf).await?;
//!     println!("{}", String::from_utf8_lossy(&buf[..n]));
//!
//!     child.terminate(std::time::Duration::from_millis(200)).await;
//!     master.close();
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod status;

#[cfg(unix)]
pub mod unix;

pub use config::{PtyConfig, PtyConfigBuilder, PtySignal, WindowSize};
pub use error::{PtyError, Result};
pub use status::ExitStatus;

#[cfg(unix)]
pub use unix::{UnixPtyChild, UnixPtyMaster, spawn};
