//! Error types for promptstack.
//!
//! Every failure that can end a scenario is an [`ExpectError`]. Variants that
//! arise while waiting on output (timeout, EOF, content mismatch) carry the
//! rule that was not satisfied and the output that was seen instead, and their
//! `Display` output frames the tail of that buffer for human inspection.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Maximum length of buffer content to display in error messages.
const MAX_BUFFER_DISPLAY: usize = 600;

/// Lines kept when a large buffer is truncated.
const TAIL_LINES: usize = 8;

fn frame(header: &str, lines: &[&str]) -> String {
    format!(
        "┌─ {header} ─────────────────────\n│ {}\n└────────────────────────────────────────",
        lines.join("\n│ ")
    )
}

/// Format buffer content for display, keeping the tail if it is large.
fn format_buffer_snippet(buffer: &str) -> String {
    if buffer.is_empty() {
        return "(empty buffer)".to_string();
    }

    let lines: Vec<&str> = buffer.lines().collect();
    if buffer.len() <= MAX_BUFFER_DISPLAY || lines.len() <= TAIL_LINES {
        return frame(&format!("buffer ({} bytes)", buffer.len()), &lines);
    }

    let hidden = lines.len() - TAIL_LINES;
    let marker = format!("... ({hidden} lines hidden)");
    let mut shown = Vec::with_capacity(TAIL_LINES + 1);
    shown.push(marker.as_str());
    shown.extend_from_slice(&lines[hidden..]);
    frame(
        &format!("buffer ({} bytes, {} lines)", buffer.len(), lines.len()),
        &shown,
    )
}

fn format_timeout_error(duration: Duration, rule: &str, buffer: &str) -> String {
    format!(
        "timeout after {duration:?} waiting for {rule}\n\
         \n\
         {}\n\
         \n\
         Tip: the expected output never arrived. Check that:\n\
         - the previous command was accepted by the program\n\
         - the prompt literal for the current context is correct\n\
         - the deadline is long enough for the program to respond",
        format_buffer_snippet(buffer)
    )
}

fn format_eof_error(rule: &str, buffer: &str) -> String {
    format!(
        "process closed its output while waiting for {rule}\n\
         \n\
         {}\n\
         \n\
         Tip: the program exited or hung up before printing the expected text.",
        format_buffer_snippet(buffer)
    )
}

fn format_mismatch_error(rule: &str, buffer: &str) -> String {
    format!(
        "output does not satisfy {rule}\n\
         \n\
         {}",
        format_buffer_snippet(buffer)
    )
}

/// The main error type for promptstack operations.
#[derive(Debug, Error)]
pub enum ExpectError {
    /// The child process could not be started.
    #[error("failed to spawn process: {0}")]
    Spawn(#[from] SpawnError),

    /// Writing to the child failed.
    #[error("failed to send {data:?}: {source}")]
    Write {
        /// What was being sent.
        data: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A rule was not satisfied before its deadline.
    #[error("{}", format_timeout_error(*duration, rule, buffer))]
    Timeout {
        /// The deadline that elapsed.
        duration: Duration,
        /// Description of the rule being awaited.
        rule: String,
        /// Unconsumed output at the time of the timeout.
        buffer: String,
    },

    /// The child closed its output while a rule was pending.
    #[error("{}", format_eof_error(rule, buffer))]
    Eof {
        /// Description of the rule being awaited.
        rule: String,
        /// Unconsumed output when EOF was reached.
        buffer: String,
    },

    /// A content check did not match the captured output.
    #[error("{}", format_mismatch_error(rule, buffer))]
    Mismatch {
        /// Description of the rule that failed.
        rule: String,
        /// The text the rule was checked against.
        buffer: String,
    },

    /// A scenario tried to pop the base prompt context.
    #[error("cannot leave the base prompt context `{base}`")]
    ContextUnderflow {
        /// Name of the base context.
        base: String,
    },

    /// A rule was constructed with invalid input.
    #[error("invalid pattern: {message}")]
    InvalidPattern {
        /// What is wrong with the pattern.
        message: String,
    },

    /// A regular expression failed to compile.
    #[error("invalid regex pattern: {0}")]
    Regex(#[from] regex::Error),

    /// An I/O error with context.
    #[error("{context}: {source}")]
    Io {
        /// What operation was being performed.
        context: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Configuration could not be loaded or is inconsistent.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the problem.
        message: String,
    },

    /// The session has already been terminated.
    #[error("session is closed")]
    SessionClosed,
}

/// Errors related to starting the child process.
#[derive(Debug, Error)]
pub enum SpawnError {
    /// No command was configured.
    #[error("no command configured")]
    EmptyCommand,

    /// The executable does not exist.
    #[error("command not found: {command}")]
    CommandNotFound {
        /// The command that was not found.
        command: String,
    },

    /// The executable exists but may not be run.
    #[error("permission denied: {path}")]
    PermissionDenied {
        /// The path that could not be executed.
        path: String,
    },

    /// The pseudo-terminal could not be set up.
    #[error("failed to allocate PTY: {reason}")]
    PtyAllocation {
        /// Why allocation failed.
        reason: String,
    },

    /// Any other failure while executing the command.
    #[error("failed to execute {command}: {source}")]
    Exec {
        /// The command that failed.
        command: String,
        /// The underlying error.
        #[source]
        source: io::Error,
    },
}

/// Result type alias for promptstack operations.
pub type Result<T> = std::result::Result<T, ExpectError>;

impl ExpectError {
    /// Create a timeout error.
    pub fn timeout(duration: Duration, rule: impl Into<String>, buffer: impl Into<String>) -> Self {
        Self::Timeout {
            duration,
            rule: rule.into(),
            buffer: buffer.into(),
        }
    }

    /// Create an EOF error.
    pub fn eof(rule: impl Into<String>, buffer: impl Into<String>) -> Self {
        Self::Eof {
            rule: rule.into(),
            buffer: buffer.into(),
        }
    }

    /// Create a content mismatch error.
    pub fn mismatch(rule: impl Into<String>, buffer: impl Into<String>) -> Self {
        Self::Mismatch {
            rule: rule.into(),
            buffer: buffer.into(),
        }
    }

    /// Create a write error.
    pub fn write(data: impl Into<String>, source: io::Error) -> Self {
        Self::Write {
            data: data.into(),
            source,
        }
    }

    /// Create an I/O error with context.
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create an invalid pattern error.
    pub fn invalid_pattern(message: impl Into<String>) -> Self {
        Self::InvalidPattern {
            message: message.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Check if this is a timeout error.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Check if this is an EOF error.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self, Self::Eof { .. })
    }

    /// Check if the error stems from a badly written scenario rather than
    /// from the program under test.
    #[must_use]
    pub const fn is_authoring_defect(&self) -> bool {
        matches!(
            self,
            Self::ContextUnderflow { .. } | Self::InvalidPattern { .. } | Self::Regex(_)
        )
    }

    /// The captured output attached to this error, if any.
    #[must_use]
    pub fn buffer(&self) -> Option<&str> {
        match self {
            Self::Timeout { buffer, .. } | Self::Eof { buffer, .. } | Self::Mismatch { buffer, .. } => {
                Some(buffer)
            }
            _ => None,
        }
    }

    /// Description of the unsatisfied rule, if any.
    #[must_use]
    pub fn rule(&self) -> Option<&str> {
        match self {
            Self::Timeout { rule, .. } | Self::Eof { rule, .. } | Self::Mismatch { rule, .. } => {
                Some(rule)
            }
            _ => None,
        }
    }
}

impl SpawnError {
    /// Classify an I/O error raised while executing `command`.
    pub fn from_exec(command: impl Into<String>, source: io::Error) -> Self {
        let command = command.into();
        match source.kind() {
            io::ErrorKind::NotFound => Self::CommandNotFound { command },
            io::ErrorKind::PermissionDenied => Self::PermissionDenied { path: command },
            _ => Self::Exec { command, source },
        }
    }
}

impl From<promptstack_pty::PtyError> for SpawnError {
    fn from(err: promptstack_pty::PtyError) -> Self {
        match err {
            promptstack_pty::PtyError::Spawn { program, source } => Self::from_exec(program, source),
            other => Self::PtyAllocation {
                reason: other.to_string(),
            },
        }
    }
}
