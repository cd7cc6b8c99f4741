//! Configuration types for PTY creation.
//!
//! [`PtyConfig`] describes how the child is started (environment, working
//! directory, terminal size); [`PtySignal`] names the signals the engine
//! sends during shutdown.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::PathBuf;

/// Configuration for spawning a child in a new PTY.
///
/// # Example
///
/// ```
/// use promptstack_pty::PtyConfig;
///
/// let config = PtyConfig::builder()
///     .working_directory("/tmp")
///     .env("TERM", "dumb")
///     .window_size(120, 40)
///     .build();
/// assert_eq!(config.window_size.cols, 120);
/// ```
#[derive(Debug, Clone)]
pub struct PtyConfig {
    /// Working directory for the child process.
    pub working_directory: Option<PathBuf>,

    /// Whether the child starts from the parent's environment.
    pub inherit_env: bool,

    /// Variables added on top of the base environment.
    pub env_add: HashMap<OsString, OsString>,

    /// Variables removed from the base environment.
    pub env_remove: Vec<OsString>,

    /// Initial window size.
    pub window_size: WindowSize,

    /// Make the slave the child's controlling terminal (`setsid` + `TIOCSCTTY`).
    pub controlling_terminal: bool,
}

impl Default for PtyConfig {
    fn default() -> Self {
        Self {
            working_directory: None,
            inherit_env: true,
            env_add: HashMap::new(),
            env_remove: Vec::new(),
            window_size: WindowSize::default(),
            controlling_terminal: true,
        }
    }
}

impl PtyConfig {
    /// Create a new builder for `PtyConfig`.
    #[must_use]
    pub fn builder() -> PtyConfigBuilder {
        PtyConfigBuilder::default()
    }

    /// Compute the environment handed to the child.
    #[must_use]
    pub fn effective_env(&self) -> HashMap<OsString, OsString> {
        let mut env: HashMap<OsString, OsString> = if self.inherit_env {
            std::env::vars_os().collect()
        } else {
            HashMap::new()
        };

        env.extend(self.env_add.clone());
        for key in &self.env_remove {
            env.remove(key);
        }

        env
    }
}

/// Builder for [`PtyConfig`].
#[derive(Debug, Clone, Default)]
pub struct PtyConfigBuilder {
    config: PtyConfig,
}

impl PtyConfigBuilder {
    /// Set the working directory for the child process.
    #[must_use]
    pub fn working_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.working_directory = Some(path.into());
        self
    }

    /// Start from an empty environment instead of the parent's.
    #[must_use]
    pub const fn env_clear(mut self) -> Self {
        self.config.inherit_env = false;
        self
    }

    /// Add an environment variable.
    #[must_use]
    pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        self.config.env_add.insert(key.into(), value.into());
        self
    }

    /// Remove an environment variable.
    #[must_use]
    pub fn env_remove(mut self, key: impl Into<OsString>) -> Self {
        self.config.env_remove.push(key.into());
        self
    }

    /// Set the initial window size.
    #[must_use]
    pub const fn window_size(mut self, cols: u16, rows: u16) -> Self {
        self.config.window_size = WindowSize::new(cols, rows);
        self
    }

    /// Set whether the slave becomes the controlling terminal.
    #[must_use]
    pub const fn controlling_terminal(mut self, value: bool) -> Self {
        self.config.controlling_terminal = value;
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> PtyConfig {
        self.config
    }
}

/// Signals the engine delivers to a child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum PtySignal {
    /// SIGINT (Ctrl+C).
    Interrupt,
    /// SIGHUP (terminal went away).
    Hangup,
    /// SIGTERM (polite shutdown request).
    Terminate,
    /// SIGKILL (cannot be caught).
    Kill,
}

impl PtySignal {
    /// The Unix signal number.
    #[cfg(unix)]
    #[must_use]
    pub const fn as_unix_signal(self) -> i32 {
        match self {
            Self::Interrupt => libc::SIGINT,
            Self::Hangup => libc::SIGHUP,
            Self::Terminate => libc::SIGTERM,
            Self::Kill => libc::SIGKILL,
        }
    }
}

/// Window size for the PTY.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSize {
    /// Number of columns.
    pub cols: u16,
    /// Number of rows.
    pub rows: u16,
}

impl WindowSize {
    /// Create a new window size.
    #[must_use]
    pub const fn new(cols: u16, rows: u16) -> Self {
        Self { cols, rows }
    }
}

impl Default for WindowSize {
    fn default() -> Self {
        Self::new(80, 24)
    }
}

impl From<(u16, u16)> for WindowSize {
    fn from((cols, rows): (u16, u16)) -> Self {
        Self::new(cols, rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_fields() {
        let config = PtyConfig::builder()
            .working_directory("/tmp")
            .env("FOO", "bar")
            .window_size(132, 50)
            .controlling_terminal(false)
            .build();

        assert_eq!(config.working_directory, Some(PathBuf::from("/tmp")));
        assert_eq!(config.window_size, WindowSize::new(132, 50));
        assert!(!config.controlling_terminal);
        assert!(config.env_add.contains_key(&OsString::from("FOO")));
    }

    #[test]
    fn cleared_env_only_has_additions() {
        let config = PtyConfig::builder()
            .env_clear()
            .env("ONLY", "this")
            .build();

        let env = config.effective_env();
        assert_eq!(env.len(), 1);
        assert_eq!(env.get(&OsString::from("ONLY")), Some(&OsString::from("this")));
    }

    #[test]
    fn removed_variables_are_dropped() {
        let config = PtyConfig::builder()
            .env_clear()
            .env("KEEP", "1")
            .env("DROP", "1")
            .env_remove("DROP")
            .build();

        let env = config.effective_env();
        assert!(env.contains_key(&OsString::from("KEEP")));
        assert!(!env.contains_key(&OsString::from("DROP")));
    }

    #[cfg(unix)]
    #[test]
    fn signal_numbers() {
        assert_eq!(PtySignal::Kill.as_unix_signal(), libc::SIGKILL);
        assert_eq!(PtySignal::Terminate.as_unix_signal(), libc::SIGTERM);
    }
}
