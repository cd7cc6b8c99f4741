//! Loading session configuration from files and the environment.

use std::io::Write;
use std::time::Duration;

use promptstack::{EnvConfig, ExpectError, LineEnding, SessionConfig};

const LLDB_TOML: &str = r#"
command = "lldb"
args = ["a.out"]
line_ending = "crlf"
trace = true

[env]
TERM = "dumb"
LLDB_HOME = "/opt/lldb"

[timeout]
expect_ms = 2500
teardown_exit_ms = 750

[buffer]
max_size = 4096
"#;

#[test]
fn load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(LLDB_TOML.as_bytes()).unwrap();

    let config = SessionConfig::from_file(file.path()).unwrap();

    assert_eq!(config.command, "lldb");
    assert_eq!(config.args, vec!["a.out"]);
    assert_eq!(config.line_ending, LineEnding::CrLf);
    assert!(config.trace);
    assert_eq!(config.env.get("LLDB_HOME").map(String::as_str), Some("/opt/lldb"));
    assert_eq!(config.timeout.expect, Duration::from_millis(2500));
    assert_eq!(config.timeout.teardown_exit, Duration::from_millis(750));
    // Unspecified fields keep their defaults.
    assert_eq!(config.timeout.terminate_grace, SessionConfig::default().timeout.terminate_grace);
    assert_eq!(config.buffer.max_size, 4096);
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = SessionConfig::from_file(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ExpectError::Io { .. }));
}

#[test]
fn unknown_keys_are_rejected() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"command = \"lldb\"\nprompt = \"(lldb) \"\n").unwrap();

    let err = SessionConfig::from_file(file.path()).unwrap_err();
    assert!(matches!(err, ExpectError::Config { .. }));
    assert!(err.to_string().contains("prompt"));
}

#[test]
fn parse_error_names_the_file_once() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"command = \"lldb\"\nbogus = 1\n").unwrap();

    let err = SessionConfig::from_file(file.path()).unwrap_err();
    let ExpectError::Config { message } = &err else {
        panic!("expected a configuration error, got {err}");
    };
    assert!(message.starts_with(&file.path().display().to_string()));

    let rendered = err.to_string();
    assert_eq!(rendered.matches("configuration error").count(), 1, "{rendered}");
}

#[test]
fn toml_round_trip_preserves_config() {
    let config = SessionConfig::from_toml_str(LLDB_TOML).unwrap();
    let text = config.to_toml_string().unwrap();
    assert_eq!(SessionConfig::from_toml_str(&text).unwrap(), config);
}

#[test]
fn environment_overrides_file() {
    let config = SessionConfig::from_toml_str(LLDB_TOML).unwrap();
    let env = EnvConfig::new("PROMPTSTACK_TEST_FILE")
        .with_var("TIMEOUT_MS", "100")
        .with_var("EXEC", "/usr/local/bin/lldb")
        .with_var("TRACE", "0");

    let config = env.apply(config);

    assert_eq!(config.command, "/usr/local/bin/lldb");
    assert_eq!(config.timeout.expect, Duration::from_millis(100));
    assert!(!config.trace);
}
