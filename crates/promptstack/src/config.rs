//! Configuration types for promptstack.
//!
//! [`SessionConfig`] describes what to spawn and how long to wait. It can be
//! built in code, loaded from TOML (see [`file`]), and overridden from
//! `PROMPTSTACK_*` environment variables (see [`env`]).

pub mod env;
pub mod file;

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use env::EnvConfig;

/// Default deadline for a single expectation (30 seconds).
pub const DEFAULT_EXPECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default time a child gets to exit after SIGTERM.
pub const DEFAULT_TERMINATE_GRACE: Duration = Duration::from_millis(500);

/// Default wait for a prompt or EOF after an exit command during teardown.
pub const DEFAULT_TEARDOWN_EXIT: Duration = Duration::from_secs(5);

/// Default output buffer size (1 MiB).
pub const DEFAULT_BUFFER_SIZE: usize = crate::expect::DEFAULT_CAPACITY;

/// Default TERM handed to the child.
pub const DEFAULT_TERM: &str = "dumb";

/// Durations are written as integer milliseconds in config files.
mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// Configuration for a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// The program to execute.
    pub command: String,

    /// Program arguments.
    pub args: Vec<String>,

    /// Environment variables to set.
    pub env: HashMap<String, String>,

    /// Whether the child starts from the parent's environment.
    pub inherit_env: bool,

    /// Working directory for the child.
    pub working_dir: Option<PathBuf>,

    /// Terminal dimensions (columns, rows).
    pub dimensions: (u16, u16),

    /// Terminator appended by `send_line`.
    pub line_ending: LineEnding,

    /// Deadlines.
    pub timeout: TimeoutConfig,

    /// Output buffering.
    pub buffer: BufferConfig,

    /// Mirror everything the child prints to stdout as it arrives.
    pub trace: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        let mut env = HashMap::new();
        env.insert("TERM".to_string(), DEFAULT_TERM.to_string());

        Self {
            command: String::new(),
            args: Vec::new(),
            env,
            inherit_env: true,
            working_dir: None,
            dimensions: (80, 24),
            line_ending: LineEnding::default(),
            timeout: TimeoutConfig::default(),
            buffer: BufferConfig::default(),
            trace: false,
        }
    }
}

impl SessionConfig {
    /// Create a configuration that runs `command`.
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Default::default()
        }
    }

    /// Set the program arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Add an environment variable.
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Set whether to inherit the parent environment.
    #[must_use]
    pub const fn inherit_env(mut self, inherit: bool) -> Self {
        self.inherit_env = inherit;
        self
    }

    /// Set the working directory.
    #[must_use]
    pub fn working_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(path.into());
        self
    }

    /// Set the terminal dimensions.
    #[must_use]
    pub const fn dimensions(mut self, cols: u16, rows: u16) -> Self {
        self.dimensions = (cols, rows);
        self
    }

    /// Set the line terminator.
    #[must_use]
    pub const fn line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }

    /// Set the default expectation deadline.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout.expect = timeout;
        self
    }

    /// Replace the whole timeout configuration.
    #[must_use]
    pub const fn timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.timeout = timeouts;
        self
    }

    /// Set the maximum buffered output.
    #[must_use]
    pub const fn buffer_size(mut self, max_size: usize) -> Self {
        self.buffer.max_size = max_size;
        self
    }

    /// Mirror child output to stdout.
    #[must_use]
    pub const fn trace(mut self, enabled: bool) -> Self {
        self.trace = enabled;
        self
    }

    /// Apply `PROMPTSTACK_*` overrides from the process environment.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        EnvConfig::default().apply(self)
    }

    /// Translate into the PTY layer's configuration.
    #[must_use]
    pub fn pty_config(&self) -> promptstack_pty::PtyConfig {
        let mut builder = promptstack_pty::PtyConfig::builder()
            .window_size(self.dimensions.0, self.dimensions.1);
        if !self.inherit_env {
            builder = builder.env_clear();
        }
        for (key, value) in &self.env {
            builder = builder.env(key, value);
        }
        if let Some(dir) = &self.working_dir {
            builder = builder.working_directory(dir);
        }
        builder.build()
    }
}

/// Deadlines used by sessions and teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimeoutConfig {
    /// Deadline for expectations without their own.
    #[serde(rename = "expect_ms", with = "duration_ms")]
    pub expect: Duration,

    /// Time between SIGTERM and SIGKILL.
    #[serde(rename = "terminate_grace_ms", with = "duration_ms")]
    pub terminate_grace: Duration,

    /// Wait for the parent prompt (or EOF) after each exit command in teardown.
    #[serde(rename = "teardown_exit_ms", with = "duration_ms")]
    pub teardown_exit: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            expect: DEFAULT_EXPECT_TIMEOUT,
            terminate_grace: DEFAULT_TERMINATE_GRACE,
            teardown_exit: DEFAULT_TEARDOWN_EXIT,
        }
    }
}

impl TimeoutConfig {
    /// Create a timeout configuration with the given expectation deadline.
    #[must_use]
    pub fn new(expect: Duration) -> Self {
        Self {
            expect,
            ..Default::default()
        }
    }

    /// Set the SIGTERM grace period.
    #[must_use]
    pub const fn terminate_grace(mut self, grace: Duration) -> Self {
        self.terminate_grace = grace;
        self
    }

    /// Set the teardown exit wait.
    #[must_use]
    pub const fn teardown_exit(mut self, wait: Duration) -> Self {
        self.teardown_exit = wait;
        self
    }
}

/// Output buffer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BufferConfig {
    /// Maximum unconsumed output kept, in bytes.
    pub max_size: usize,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

/// Line terminator appended to sent lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    /// `\n`
    #[default]
    Lf,
    /// `\r\n`
    CrLf,
    /// `\r`
    Cr,
}

impl LineEnding {
    /// The terminator characters.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
            Self::Cr => "\r",
        }
    }
}
