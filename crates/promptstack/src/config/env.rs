//! Environment-based configuration overrides.

use std::collections::HashMap;
use std::time::Duration;

use super::SessionConfig;

/// Environment configuration prefix.
pub const DEFAULT_PREFIX: &str = "PROMPTSTACK";

/// Recognized variable names (without prefix).
pub mod vars {
    /// Default expectation deadline in milliseconds.
    pub const TIMEOUT_MS: &str = "TIMEOUT_MS";
    /// Mirror child output to stdout (`1`, `true`, `yes`, `on`).
    pub const TRACE: &str = "TRACE";
    /// Program to run instead of the configured command.
    pub const EXEC: &str = "EXEC";
}

/// Reads prefixed environment variables.
///
/// Values given with [`EnvConfig::with_var`] take precedence over the process
/// environment, which keeps tests independent of global state.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    prefix: String,
    overrides: HashMap<String, String>,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl EnvConfig {
    /// Create a reader for variables named `{prefix}_{NAME}`.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            overrides: HashMap::new(),
        }
    }

    /// Supply a value for `name` without touching the process environment.
    #[must_use]
    pub fn with_var(mut self, name: &str, value: impl Into<String>) -> Self {
        self.overrides.insert(self.var_name(name), value.into());
        self
    }

    fn var_name(&self, name: &str) -> String {
        if self.prefix.is_empty() {
            name.to_uppercase()
        } else {
            format!("{}_{}", self.prefix, name.to_uppercase())
        }
    }

    /// Get a string value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<String> {
        let var_name = self.var_name(name);
        self.overrides
            .get(&var_name)
            .cloned()
            .or_else(|| std::env::var(&var_name).ok())
    }

    /// Get a parsed value; unparsable values are ignored with a warning.
    #[must_use]
    pub fn parse<T: std::str::FromStr>(&self, name: &str) -> Option<T> {
        let raw = self.get(name)?;
        let parsed = raw.trim().parse().ok();
        if parsed.is_none() {
            tracing::warn!(variable = %self.var_name(name), value = %raw, "ignoring unparsable value");
        }
        parsed
    }

    /// Get a boolean value.
    #[must_use]
    pub fn bool(&self, name: &str) -> Option<bool> {
        self.get(name).map(|v| {
            matches!(
                v.trim().to_lowercase().as_str(),
                "1" | "true" | "yes" | "on" | "enabled"
            )
        })
    }

    /// Get a duration in milliseconds.
    #[must_use]
    pub fn duration_millis(&self, name: &str) -> Option<Duration> {
        self.parse::<u64>(name).map(Duration::from_millis)
    }

    /// Apply recognized overrides to `config`.
    #[must_use]
    pub fn apply(&self, mut config: SessionConfig) -> SessionConfig {
        if let Some(timeout) = self.duration_millis(vars::TIMEOUT_MS) {
            config.timeout.expect = timeout;
        }
        if let Some(trace) = self.bool(vars::TRACE) {
            config.trace = trace;
        }
        if let Some(exec) = self.get(vars::EXEC).filter(|s| !s.trim().is_empty()) {
            tracing::debug!(command = %exec, "command overridden from environment");
            config.command = exec;
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn isolated() -> EnvConfig {
        EnvConfig::new("PROMPTSTACK_TEST_ISOLATED")
    }

    #[test]
    fn overrides_take_precedence() {
        let env = isolated().with_var("timeout_ms", "250");
        assert_eq!(env.get("TIMEOUT_MS").as_deref(), Some("250"));
        assert_eq!(env.duration_millis(vars::TIMEOUT_MS), Some(Duration::from_millis(250)));
    }

    #[test]
    fn missing_and_bad_values_are_none() {
        let env = isolated().with_var(vars::TIMEOUT_MS, "soon");
        assert_eq!(env.duration_millis(vars::TIMEOUT_MS), None);
        assert_eq!(env.get("NOT_SET"), None);
    }

    #[test]
    fn apply_updates_config() {
        let env = isolated()
            .with_var(vars::TIMEOUT_MS, "1500")
            .with_var(vars::TRACE, "yes")
            .with_var(vars::EXEC, "/opt/llvm/bin/lldb");

        let config = env.apply(SessionConfig::new("lldb"));
        assert_eq!(config.timeout.expect, Duration::from_millis(1500));
        assert!(config.trace);
        assert_eq!(config.command, "/opt/llvm/bin/lldb");
    }

    #[test]
    fn apply_without_overrides_is_identity() {
        let config = SessionConfig::new("lldb").args(["a.out"]);
        assert_eq!(isolated().apply(config.clone()), config);
    }
}
