//! End-to-end scenarios over a real PTY.
//!
//! The debugger is played by a `/bin/sh` script, see `common/mod.rs`.

#![cfg(unix)]

mod common;

use std::time::Duration;

use promptstack::scenario::{STARTUP_STEP, convenience_variables_with};
use promptstack::{
    ExitStatus, ExpectError, ExpectationRule, PromptContext, PtySignal, Scenario, ScenarioRunner,
    Session, SessionConfig, SpawnError, Step, TimeoutConfig,
};

use common::FakeDebugger;

#[tokio::test]
async fn convenience_variables_against_fake_debugger() {
    let fake = FakeDebugger::new();
    let scenario = convenience_variables_with(fake.config(), "a.out", 7).unwrap();

    let report = ScenarioRunner::new().run(&scenario).await;

    assert!(report.passed(), "{report}");
    assert_eq!(report.steps.len(), 9);
    assert_eq!(report.steps[0].name, STARTUP_STEP);

    let run = report.step("run").unwrap();
    assert!(run.before.contains("stop reason = breakpoint 1.1"));

    let teardown = report.teardown.unwrap();
    assert_eq!(teardown.frames_unwound, 1);
    assert_eq!(teardown.graceful_exits, 1);
    assert!(teardown.base_exited);
    assert!(teardown.terminated);
    assert_eq!(teardown.exit_status, Some(ExitStatus::Exited(0)));
}

#[tokio::test]
async fn wrong_breakpoint_line_fails_the_thread_check() {
    let fake = FakeDebugger::new();
    let stock = convenience_variables_with(fake.config(), "a.out", 7).unwrap();
    // The debugger is told line 9 but the checks still expect line 7.
    let scenario = Scenario::new(stock.name(), fake.config(), stock.base().clone())
        .step(Step::send("breakpoint set -f main.c -l 9"))
        .steps(stock.step_list()[1..].to_vec());

    let report = ScenarioRunner::new().run(&scenario).await;

    assert!(matches!(report.error(), Some(ExpectError::Mismatch { .. })), "{report}");
    assert_eq!(report.failed_step().unwrap().name, "print lldb.thread");
    assert!(report.teardown.unwrap().terminated);
}

#[tokio::test]
async fn silent_program_times_out_on_second_step() {
    let fake = FakeDebugger::new();
    let config = fake.config().timeouts(
        TimeoutConfig::new(Duration::from_millis(300)).terminate_grace(Duration::from_millis(100)),
    );
    let scenario = Scenario::new(
        "hang",
        config,
        PromptContext::new("lldb", "(lldb) ").with_exit_command("quit"),
    )
    .step(Step::send("breakpoint set -f main.c -l 7"))
    .step(Step::send("hang"));

    let report = ScenarioRunner::new().run(&scenario).await;

    let error = report.error().unwrap();
    assert!(error.is_timeout(), "{error}");
    assert_eq!(report.failed_step().unwrap().name, "hang");
    let teardown = report.teardown.unwrap();
    assert!(teardown.terminated);
    assert!(teardown.base_exited);
}

#[tokio::test]
async fn spawn_failure_skips_teardown() {
    let scenario = Scenario::new(
        "missing",
        SessionConfig::new("/nonexistent/promptstack-debugger"),
        PromptContext::new("lldb", "(lldb) "),
    );

    let report = ScenarioRunner::new().run(&scenario).await;

    assert!(matches!(report.error(), Some(ExpectError::Spawn(_))));
    assert!(report.steps.is_empty());
    assert!(report.teardown.is_none());
}

#[tokio::test]
async fn empty_command_is_rejected() {
    let err = Session::spawn("", &[]).unwrap_err();
    assert!(matches!(err, ExpectError::Spawn(SpawnError::EmptyCommand)));
}

#[tokio::test]
async fn unresponsive_child_is_killed() {
    let config = SessionConfig::new("/bin/sh")
        .args(["-c", "trap '' TERM; echo armed; while :; do sleep 1; done"])
        .timeouts(TimeoutConfig::new(Duration::from_secs(1)).terminate_grace(Duration::from_millis(100)));
    let mut session = Session::spawn_with_config(config).unwrap();
    assert!(session.pid().is_some());
    // SIGTERM must arrive after the trap is installed.
    session.expect(&ExpectationRule::exact("armed")).await.unwrap();
    assert!(session.is_alive());

    let status = session.terminate().await;

    assert_eq!(status, Some(ExitStatus::Signaled(9)));
    assert_eq!(session.terminate().await, status);
    assert!(!session.is_alive());
}

#[tokio::test]
async fn interrupt_stops_a_running_child() {
    let mut session = Session::spawn("/bin/sh", &["-c", "echo ready; exec sleep 30"]).unwrap();
    session.expect(&ExpectationRule::exact("ready")).await.unwrap();

    session.interrupt().unwrap();
    session.expect_eof(Duration::from_secs(5)).await.unwrap();

    assert_eq!(session.terminate().await, Some(ExitStatus::Signaled(2)));
}

#[tokio::test]
async fn hangup_reaches_the_child() {
    let mut session = Session::spawn("/bin/sh", &["-c", "echo ready; exec sleep 30"]).unwrap();
    session.expect(&ExpectationRule::exact("ready")).await.unwrap();

    session.signal(PtySignal::Hangup).unwrap();
    session.expect_eof(Duration::from_secs(5)).await.unwrap();

    assert_eq!(session.terminate().await, Some(ExitStatus::Signaled(1)));
    // Signalling a reaped child is not an error.
    session.hangup().unwrap();
}

#[tokio::test]
async fn eof_after_exit() {
    let mut session = Session::spawn("/bin/sh", &["-c", "echo done"]).unwrap();
    let err = session
        .read_until(&ExpectationRule::exact("never printed"), Duration::from_secs(5))
        .await
        .unwrap_err();
    assert!(err.is_eof(), "{err}");
    assert!(err.buffer().unwrap().contains("done"));
}

#[test]
fn blocking_runner() {
    let fake = FakeDebugger::new();
    let scenario = Scenario::new(
        "blocking",
        fake.config(),
        PromptContext::new("lldb", "(lldb) ").with_exit_command("quit"),
    )
    .step(Step::send("breakpoint set -f main.c -l 3").check("main.c:3"));

    let report = ScenarioRunner::new().run_blocking(&scenario);

    assert!(report.passed(), "{report}");
    assert!(report.teardown.unwrap().base_exited);
}
