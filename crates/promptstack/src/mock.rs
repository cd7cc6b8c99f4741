//! In-memory transport for exercising sessions and scenarios.
//!
//! A [`MockTransport`] plays a scripted interactive program: each complete
//! input line is looked up in a reply table and the matching output is queued
//! for reading. Lines with no reply produce nothing, so a pending read simply
//! waits, which is how timeouts are exercised.
//!
//! ```
//! use promptstack::mock::MockTransport;
//!
//! let fake = MockTransport::new()
//!     .with_output("(lldb) ")
//!     .on_line("script", "Python Interactive Interpreter.\n>>> ")
//!     .on_line("quit()", "(lldb) ")
//!     .on_line_exit("quit", "");
//! assert!(fake.written().is_empty());
//! ```

use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, Waker};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use crate::backend::{ExitStatus, ProcessControl};

#[derive(Debug, Clone)]
enum Reply {
    Output(String),
    OutputThenExit(String),
}

#[derive(Debug)]
struct MockState {
    /// Data waiting to be read by the session.
    output: VecDeque<u8>,
    /// Everything the session wrote.
    written: Vec<u8>,
    /// Current partial input line.
    line: Vec<u8>,
    replies: Vec<(String, Reply)>,
    echo: bool,
    eof: bool,
    running: bool,
    terminate_calls: usize,
    read_error: Option<String>,
    reader: Option<Waker>,
}

impl MockState {
    fn wake_reader(&mut self) {
        if let Some(waker) = self.reader.take() {
            waker.wake();
        }
    }

    fn complete_line(&mut self) {
        let raw = std::mem::take(&mut self.line);
        let text = String::from_utf8_lossy(&raw);
        let line = text.trim_end_matches(['\r', '\n']);

        let reply = self
            .replies
            .iter()
            .find(|(expected, _)| expected == line)
            .map(|(_, reply)| reply.clone());

        match reply {
            Some(Reply::Output(out)) => self.output.extend(out.as_bytes()),
            Some(Reply::OutputThenExit(out)) => {
                self.output.extend(out.as_bytes());
                self.eof = true;
                self.running = false;
            }
            None => {}
        }
    }
}

/// A scripted stand-in for an interactive child process.
///
/// Clones share state, so a test can keep a handle after moving the transport
/// into a session.
#[derive(Debug, Clone)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// Create a running mock with no output and no replies.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                output: VecDeque::new(),
                written: Vec::new(),
                line: Vec::new(),
                replies: Vec::new(),
                echo: false,
                eof: false,
                running: true,
                terminate_calls: 0,
                read_error: None,
                reader: None,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue initial output (a banner or the first prompt).
    #[must_use]
    pub fn with_output(self, output: &str) -> Self {
        self.queue_output(output);
        self
    }

    /// Reply to the input line `line` with `output`.
    #[must_use]
    pub fn on_line(self, line: impl Into<String>, output: impl Into<String>) -> Self {
        self.lock()
            .replies
            .push((line.into(), Reply::Output(output.into())));
        self
    }

    /// Reply to `line` with `output`, then close output and exit.
    #[must_use]
    pub fn on_line_exit(self, line: impl Into<String>, output: impl Into<String>) -> Self {
        self.lock()
            .replies
            .push((line.into(), Reply::OutputThenExit(output.into())));
        self
    }

    /// Echo input back as a terminal would.
    #[must_use]
    pub fn with_echo(self, echo: bool) -> Self {
        self.lock().echo = echo;
        self
    }

    /// Queue output now.
    pub fn queue_output(&self, output: &str) {
        let mut state = self.lock();
        state.output.extend(output.as_bytes());
        state.wake_reader();
    }

    /// Close output as if the child exited.
    pub fn hang_up(&self) {
        let mut state = self.lock();
        state.eof = true;
        state.running = false;
        state.wake_reader();
    }

    /// Make the next read fail with `message`.
    pub fn fail_next_read(&self, message: impl Into<String>) {
        let mut state = self.lock();
        state.read_error = Some(message.into());
        state.wake_reader();
    }

    /// Everything written so far.
    #[must_use]
    pub fn written(&self) -> String {
        String::from_utf8_lossy(&self.lock().written).into_owned()
    }

    /// The complete lines written so far, without terminators.
    #[must_use]
    pub fn written_lines(&self) -> Vec<String> {
        self.written()
            .split_inclusive('\n')
            .filter(|l| l.ends_with('\n'))
            .map(|l| l.trim_end_matches(['\r', '\n']).to_string())
            .collect()
    }

    /// How many times `terminate` reached the transport.
    #[must_use]
    pub fn terminate_calls(&self) -> usize {
        self.lock().terminate_calls
    }

    /// Check if the fake process is running.
    #[must_use]
    pub fn running(&self) -> bool {
        self.lock().running
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl AsyncRead for MockTransport {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let mut state = self.lock();

        if let Some(message) = state.read_error.take() {
            return Poll::Ready(Err(io::Error::other(message)));
        }

        if !state.output.is_empty() {
            let n = buf.remaining().min(state.output.len());
            let chunk: Vec<u8> = state.output.drain(..n).collect();
            buf.put_slice(&chunk);
            return Poll::Ready(Ok(()));
        }

        if state.eof {
            return Poll::Ready(Ok(()));
        }

        state.reader = Some(cx.waker().clone());
        Poll::Pending
    }
}

impl AsyncWrite for MockTransport {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let mut state = self.lock();
        if !state.running {
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "mock process has exited",
            )));
        }

        state.written.extend_from_slice(buf);
        for &byte in buf {
            if state.echo {
                state.output.push_back(byte);
            }
            state.line.push(byte);
            if byte == b'\n' {
                state.complete_line();
            }
        }
        state.wake_reader();
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

impl ProcessControl for MockTransport {
    fn pid(&self) -> Option<u32> {
        None
    }

    fn is_running(&mut self) -> bool {
        self.running()
    }

    async fn terminate(&mut self, _grace: Duration) -> Option<ExitStatus> {
        let mut state = self.lock();
        state.terminate_calls += 1;
        let was_running = state.running;
        state.running = false;
        state.eof = true;
        state.wake_reader();
        Some(if was_running {
            ExitStatus::Signaled(15)
        } else {
            ExitStatus::Exited(0)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn replies_to_complete_lines() {
        let mut mock = MockTransport::new().on_line("run", "stopped\n(lldb) ");
        mock.write_all(b"ru").await.unwrap();
        mock.write_all(b"n\n").await.unwrap();

        let mut buf = [0u8; 64];
        let n = mock.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"stopped\n(lldb) ");
        assert_eq!(mock.written_lines(), vec!["run"]);
    }

    #[tokio::test]
    async fn exit_reply_closes_output() {
        let mut mock = MockTransport::new().on_line_exit("quit", "bye\n");
        mock.write_all(b"quit\n").await.unwrap();

        let mut out = Vec::new();
        mock.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, b"bye\n");
        assert!(!mock.running());
        assert!(mock.write_all(b"more\n").await.is_err());
    }

    #[tokio::test]
    async fn terminate_counts_and_reports_status() {
        let mut mock = MockTransport::new();
        assert_eq!(mock.terminate(Duration::ZERO).await, Some(ExitStatus::Signaled(15)));
        assert_eq!(mock.terminate(Duration::ZERO).await, Some(ExitStatus::Exited(0)));
        assert_eq!(mock.terminate_calls(), 2);
    }
}
