//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::time::Duration;

#[cfg(feature = "mock")]
use promptstack::mock::MockTransport;
use promptstack::{SessionConfig, TimeoutConfig};
use tempfile::TempDir;

/// A `/bin/sh` stand-in for the debugger.
///
/// It prints `(lldb) `, answers `breakpoint set`, `run`, and `script`, and
/// inside the scripting prompt (`>>> `) answers the `print lldb.*`
/// convenience variables. `quit()` returns to `(lldb) `, `quit` exits, and
/// `hang` prints nothing.
const FAKE_DEBUGGER: &str = r#"#!/bin/sh
exe="$1"
bp=0
q="'"
mode=lldb
printf '(lldb) '
while IFS= read -r line; do
  if [ "$mode" = python ]; then
    case "$line" in
      "print lldb.debugger") printf 'Debugger (instance: "debugger_1", id: 1)\n>>> ' ;;
      "print lldb.target") printf '%s\n>>> ' "$exe" ;;
      "print lldb.process") printf 'SBProcess: pid = 4242, state = stopped, threads = 1, executable = %s\n>>> ' "$exe" ;;
      "print lldb.thread") printf 'thread #1: tid = 0x1c03, 0x0000000100000f56 %s`main(argc=1, argv=0x00007fff5fbff8a8) + 22 at main.c:%s, queue = %scom.apple.main-thread%s, stop reason = breakpoint 1.1\n>>> ' "$exe" "$bp" "$q" "$q" ;;
      "print lldb.frame") printf 'frame #0: 0x0000000100000f56 %s`main(argc=1, argv=0x00007fff5fbff8a8) + 22 at main.c:%s\n>>> ' "$exe" "$bp" ;;
      "quit()") mode=lldb; printf '(lldb) ' ;;
      *) printf 'NameError: name is not defined\n>>> ' ;;
    esac
  else
    case "$line" in
      "breakpoint set -f main.c -l "*)
        bp="${line##* }"
        printf 'Breakpoint 1: where = %s`main + 22 at main.c:%s, address = 0x0000000100000f56\n(lldb) ' "$exe" "$bp" ;;
      run)
        printf 'Process 4242 launched: %s\nProcess 4242 stopped\n' "$exe"
        printf '* thread #1: tid = 0x1c03, 0x0000000100000f56 %s`main(argc=1, argv=0x00007fff5fbff8a8) + 22 at main.c:%s, queue = %scom.apple.main-thread%s, stop reason = breakpoint 1.1\n(lldb) ' "$exe" "$bp" "$q" "$q" ;;
      script) mode=python; printf 'Python Interactive Interpreter. To exit, type quit().\n>>> ' ;;
      quit) exit 0 ;;
      hang) ;;
      *) printf 'error: unknown command\n(lldb) ' ;;
    esac
  fi
done
"#;

/// The fake debugger written to a temporary directory.
pub struct FakeDebugger {
    _dir: TempDir,
    script: PathBuf,
}

impl FakeDebugger {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let script = dir.path().join("fake-lldb.sh");
        std::fs::write(&script, FAKE_DEBUGGER).expect("write fake debugger");
        Self { _dir: dir, script }
    }

    /// Session config running the script against inferior `a.out`.
    pub fn config(&self) -> SessionConfig {
        SessionConfig::new("/bin/sh")
            .args([self.script.to_string_lossy().into_owned(), "a.out".to_string()])
            .timeouts(
                TimeoutConfig::new(Duration::from_secs(5))
                    .terminate_grace(Duration::from_millis(200))
                    .teardown_exit(Duration::from_secs(2)),
            )
    }
}

pub const THREAD_LINE: &str = "* thread #1: tid = 0x1c03, 0x0000000100000f56 a.out`main(argc=1, argv=0x00007fff5fbff8a8) + 22 at main.c:7, queue = 'com.apple.main-thread', stop reason = breakpoint 1.1";
pub const FRAME_LINE: &str = "frame #0: 0x0000000100000f56 a.out`main(argc=1, argv=0x00007fff5fbff8a8) + 22 at main.c:7";

/// An in-memory debugger answering the convenience-variables exchange.
#[cfg(feature = "mock")]
pub fn mock_debugger() -> MockTransport {
    MockTransport::new()
        .with_output("(lldb) ")
        .on_line(
            "breakpoint set -f main.c -l 7",
            "Breakpoint 1: where = a.out`main + 22 at main.c:7, address = 0x0000000100000f56\n(lldb) ",
        )
        .on_line(
            "run",
            format!("Process 4242 launched: a.out\nProcess 4242 stopped\n{THREAD_LINE}\n(lldb) "),
        )
        .on_line("script", "Python Interactive Interpreter. To exit, type quit().\n>>> ")
        .on_line("print lldb.debugger", "Debugger (instance: \"debugger_1\", id: 1)\n>>> ")
        .on_line("print lldb.target", "a.out\n>>> ")
        .on_line(
            "print lldb.process",
            "SBProcess: pid = 4242, state = stopped, threads = 1, executable = a.out\n>>> ",
        )
        .on_line("print lldb.thread", format!("{}\n>>> ", &THREAD_LINE[2..]))
        .on_line("print lldb.frame", format!("{FRAME_LINE}\n>>> "))
        .on_line("quit()", "(lldb) ")
        .on_line_exit("quit", "")
}

/// Session config for mock-backed sessions.
pub fn mock_config() -> SessionConfig {
    SessionConfig::new("lldb").timeouts(
        TimeoutConfig::new(Duration::from_millis(500)).teardown_exit(Duration::from_millis(200)),
    )
}
