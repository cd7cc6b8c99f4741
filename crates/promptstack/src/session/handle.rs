//! Session handle for interacting with a child process.

use std::io;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::Instant;

use crate::backend::{ExitStatus, ProcessControl};
use crate::config::SessionConfig;
use crate::error::{ExpectError, Result};
use crate::expect::{Captured, ExpectationRule, Matcher};
use crate::transcript::Transcript;

/// Size of a single read from the transport.
const READ_CHUNK: usize = 4096;

/// A child process driven line by line.
///
/// Output is accumulated in a buffer; [`Session::read_until`] consumes it up
/// to and including the first match of a rule and hands back the text that
/// preceded the match.
pub struct Session<T> {
    transport: T,
    config: SessionConfig,
    matcher: Matcher,
    transcript: Transcript,
    eof: bool,
    terminated: bool,
    exit_status: Option<ExitStatus>,
}

impl<T> Session<T>
where
    T: AsyncRead + AsyncWrite + ProcessControl + Unpin + Send,
{
    /// Wrap an already running transport.
    pub fn new(transport: T, config: SessionConfig) -> Self {
        let mut transcript = Transcript::new();
        if config.trace {
            transcript.mirror_to(io::stdout());
        }
        Self {
            transport,
            matcher: Matcher::new(config.buffer.max_size),
            config,
            transcript,
            eof: false,
            terminated: false,
            exit_status: None,
        }
    }

    /// The session configuration.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Output received but not yet consumed by a match.
    #[must_use]
    pub fn buffer(&self) -> &str {
        self.matcher.as_str()
    }

    /// Discard unconsumed output.
    pub fn clear_buffer(&mut self) {
        self.matcher.clear();
    }

    /// The recorded transcript.
    #[must_use]
    pub const fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Mutable access to the transcript (markers, mirroring).
    pub fn transcript_mut(&mut self) -> &mut Transcript {
        &mut self.transcript
    }

    /// Consume the session, releasing the transport and keeping the transcript.
    #[must_use]
    pub fn into_transcript(self) -> Transcript {
        self.transcript
    }

    /// The underlying transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Check if the child has closed its output.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        self.eof
    }

    /// Check if [`Session::terminate`] has run.
    #[must_use]
    pub const fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Exit status recorded by [`Session::terminate`].
    #[must_use]
    pub const fn exit_status(&self) -> Option<ExitStatus> {
        self.exit_status
    }

    /// The child's process ID.
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.transport.pid()
    }

    /// Check if the child is still running.
    pub fn is_alive(&mut self) -> bool {
        !self.terminated && self.transport.is_running()
    }

    /// Write raw bytes without a terminator.
    ///
    /// # Errors
    ///
    /// Returns [`ExpectError::Write`] if the channel is closed or the write fails.
    pub async fn send_bytes(&mut self, data: &[u8]) -> Result<()> {
        let describe = || String::from_utf8_lossy(data).into_owned();
        if self.terminated {
            return Err(ExpectError::write(
                describe(),
                io::Error::new(io::ErrorKind::BrokenPipe, "session terminated"),
            ));
        }

        self.transport
            .write_all(data)
            .await
            .map_err(|e| ExpectError::write(describe(), e))?;
        self.transport
            .flush()
            .await
            .map_err(|e| ExpectError::write(describe(), e))?;

        self.transcript.record_sent(data);
        Ok(())
    }

    /// Write `line` followed by the configured line terminator.
    ///
    /// # Errors
    ///
    /// Returns [`ExpectError::Write`] if the channel is closed or the write fails.
    pub async fn send_line(&mut self, line: &str) -> Result<()> {
        tracing::debug!(line, "sending line");
        let data = format!("{line}{}", self.config.line_ending.as_str());
        self.send_bytes(data.as_bytes()).await
    }

    /// Accumulate output until `rule` matches or `deadline` elapses.
    ///
    /// The channel is always read at least once before a timeout is
    /// reported, so a zero deadline still sees output that is already
    /// waiting.
    ///
    /// # Errors
    ///
    /// - [`ExpectError::Timeout`] if the deadline elapses first.
    /// - [`ExpectError::Eof`] if the child closes its output first.
    /// - [`ExpectError::SessionClosed`] if the session was terminated.
    /// - [`ExpectError::Io`] if reading fails.
    pub async fn read_until(&mut self, rule: &ExpectationRule, deadline: Duration) -> Result<Captured> {
        let start = Instant::now();
        let mut polled = false;

        loop {
            if let Some(captured) = self.matcher.take(rule) {
                tracing::debug!(
                    rule = %rule,
                    before_len = captured.before.len(),
                    elapsed = ?start.elapsed(),
                    "rule matched"
                );
                return Ok(captured);
            }

            if self.terminated {
                return Err(ExpectError::SessionClosed);
            }

            if self.eof {
                tracing::debug!(rule = %rule, "EOF while waiting");
                return Err(ExpectError::eof(rule.to_string(), self.matcher.as_str()));
            }

            let elapsed = start.elapsed();
            if polled && elapsed >= deadline {
                tracing::debug!(rule = %rule, ?deadline, "timed out waiting");
                return Err(ExpectError::timeout(deadline, rule.to_string(), self.matcher.as_str()));
            }

            polled = true;
            self.fill(deadline.saturating_sub(elapsed)).await?;
        }
    }

    /// Wait for `rule` using its own deadline or the session default.
    ///
    /// # Errors
    ///
    /// See [`Session::read_until`].
    pub async fn expect(&mut self, rule: &ExpectationRule) -> Result<Captured> {
        let deadline = rule.deadline().unwrap_or(self.config.timeout.expect);
        self.read_until(rule, deadline).await
    }

    /// Wait until the child closes its output, returning whatever was unconsumed.
    ///
    /// # Errors
    ///
    /// Returns [`ExpectError::Timeout`] if output is still open at the deadline.
    pub async fn expect_eof(&mut self, deadline: Duration) -> Result<String> {
        let start = Instant::now();
        let mut polled = false;
        while !self.eof {
            let elapsed = start.elapsed();
            if polled && elapsed >= deadline {
                return Err(ExpectError::timeout(deadline, "end of output", self.matcher.as_str()));
            }
            polled = true;
            self.fill(deadline.saturating_sub(elapsed)).await?;
        }
        let rest = self.matcher.as_str().to_string();
        self.matcher.clear();
        Ok(rest)
    }

    /// Read once, waiting at most `remaining`.
    async fn fill(&mut self, remaining: Duration) -> Result<()> {
        let mut buf = [0u8; READ_CHUNK];
        match tokio::time::timeout(remaining, self.transport.read(&mut buf)).await {
            Ok(Ok(0)) => {
                tracing::debug!("child closed its output");
                self.eof = true;
            }
            Ok(Ok(n)) => {
                tracing::trace!(bytes = n, "read output");
                self.matcher.append(&buf[..n]);
                self.transcript.record_received(&buf[..n]);
            }
            Ok(Err(e)) => return Err(ExpectError::io("reading from process", e)),
            // Deadline reached; the caller reports it.
            Err(_) => {}
        }
        Ok(())
    }

    /// Terminate the child and release the channel. Idempotent; never fails.
    pub async fn terminate(&mut self) -> Option<ExitStatus> {
        if self.terminated {
            return self.exit_status;
        }
        self.terminated = true;

        let grace = self.config.timeout.terminate_grace;
        let status = self.transport.terminate(grace).await;
        self.exit_status = status;
        self.eof = true;

        match status {
            Some(status) => tracing::debug!(%status, "session terminated"),
            None => tracing::warn!("session terminated without a reaped exit status"),
        }
        self.transcript.marker("terminated");
        status
    }
}

impl<T> std::fmt::Debug for Session<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("command", &self.config.command)
            .field("eof", &self.eof)
            .field("terminated", &self.terminated)
            .field("buffered", &self.matcher.as_str().len())
            .finish_non_exhaustive()
    }
}
