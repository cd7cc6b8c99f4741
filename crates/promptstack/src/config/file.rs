//! TOML configuration files.
//!
//! ```toml
//! command = "lldb"
//! args = ["a.out"]
//! trace = true
//!
//! [timeout]
//! expect_ms = 10000
//! terminate_grace_ms = 250
//! ```

use std::path::Path;

use super::SessionConfig;
use crate::error::{ExpectError, Result};

impl SessionConfig {
    /// Parse a configuration from TOML text. Missing keys take defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ExpectError::Config`] if the text is not valid TOML or
    /// contains unknown keys.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| ExpectError::config(e.to_string()))
    }

    /// Load a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ExpectError::Io`] if the file cannot be read and
    /// [`ExpectError::Config`] if it cannot be parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ExpectError::io(format!("reading {}", path.display()), e))?;
        Self::from_toml_str(&text).map_err(|e| match e {
            ExpectError::Config { message } => {
                ExpectError::config(format!("{}: {message}", path.display()))
            }
            other => other,
        })
    }

    /// Render the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ExpectError::Config`] if serialization fails.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| ExpectError::config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LineEnding;
    use std::time::Duration;

    #[test]
    fn partial_file_uses_defaults() {
        let config = SessionConfig::from_toml_str(
            r#"
            command = "lldb"
            args = ["a.out"]
            line_ending = "crlf"

            [timeout]
            expect_ms = 1500
            "#,
        )
        .unwrap();

        assert_eq!(config.command, "lldb");
        assert_eq!(config.args, vec!["a.out"]);
        assert_eq!(config.line_ending, LineEnding::CrLf);
        assert_eq!(config.timeout.expect, Duration::from_millis(1500));
        assert_eq!(config.timeout.terminate_grace, crate::config::DEFAULT_TERMINATE_GRACE);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = SessionConfig::from_toml_str("comand = \"typo\"").unwrap_err();
        assert!(matches!(err, ExpectError::Config { .. }));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = SessionConfig::from_file("/definitely/missing/promptstack.toml").unwrap_err();
        assert!(matches!(err, ExpectError::Io { .. }));
    }
}
