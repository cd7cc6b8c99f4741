//! Ready-made scenarios.

use std::path::Path;

use super::definition::{Scenario, Step};
use crate::config::SessionConfig;
use crate::context::PromptContext;
use crate::error::Result;
use crate::expect::ExpectationRule;
use crate::rule;

/// Prompt printed by the debugger's command interpreter.
pub const DEBUGGER_PROMPT: &str = "(lldb) ";

/// Prompt printed by the debugger's embedded Python interpreter.
pub const SCRIPT_PROMPT: &str = ">>> ";

/// Text printed when the inferior stops at the first breakpoint.
pub const BREAKPOINT_STOP: &str = "stop reason = breakpoint 1.1";

/// The debugger's top-level context, exited with `quit`.
#[must_use]
pub fn debugger_context() -> PromptContext {
    PromptContext::new("lldb", DEBUGGER_PROMPT).with_exit_command("quit")
}

/// The embedded interpreter's context, exited with `quit()`.
#[must_use]
pub fn script_context() -> PromptContext {
    PromptContext::new("script", SCRIPT_PROMPT).with_exit_command("quit()")
}

/// Launch `debugger executable`, stop at `main.c:breakpoint_line`, and check
/// the Python convenience variables from the embedded interpreter.
///
/// # Errors
///
/// Returns [`crate::ExpectError::InvalidPattern`] if a generated pattern
/// fails to compile.
pub fn convenience_variables(
    debugger: &str,
    executable: impl AsRef<Path>,
    breakpoint_line: u32,
) -> Result<Scenario> {
    let executable = executable.as_ref();
    let name = executable
        .file_name()
        .map_or_else(|| executable.to_string_lossy(), |n| n.to_string_lossy())
        .into_owned();
    let config = SessionConfig::new(debugger)
        .args([executable.to_string_lossy().into_owned()])
        .with_env_overrides();
    convenience_variables_with(config, &name, breakpoint_line)
}

/// [`convenience_variables`] with an explicit session configuration.
///
/// `executable_name` is the inferior's file name as the debugger prints it.
///
/// # Errors
///
/// Returns [`crate::ExpectError::InvalidPattern`] if a generated pattern
/// fails to compile.
pub fn convenience_variables_with(
    config: SessionConfig,
    executable_name: &str,
    breakpoint_line: u32,
) -> Result<Scenario> {
    let exe = regex::escape(executable_name);

    let process = ExpectationRule::pattern(&format!(
        r"SBProcess: pid = \d+, state = stopped, threads = \d, executable = {exe}"
    ))?;
    let thread = ExpectationRule::pattern(&format!(
        r"thread #1: tid = (0x[0-9a-f]+|[0-9]+), 0x[0-9a-f]+ {exe}`main\(argc=1, argv=0x[0-9a-f]+\) \+ \d+ at main\.c:{breakpoint_line}, (name|queue) = '.+', stop reason = breakpoint 1\.1"
    ))?;
    let frame = ExpectationRule::pattern(&format!(
        r"frame #0: 0x[0-9a-f]+ {exe}`main\(argc=1, argv=0x[0-9a-f]+\) \+ \d+ at main\.c:{breakpoint_line}"
    ))?;

    let scenario = Scenario::new("convenience variables", config, debugger_context()).steps([
        Step::send(format!("breakpoint set -f main.c -l {breakpoint_line}")),
        Step::send("run").wait_for(BREAKPOINT_STOP),
        Step::send("script").enter(script_context()),
        Step::send("print lldb.debugger").check(rule!(pattern r"Debugger \(instance: .*, id: \d\)")),
        Step::send("print lldb.target").check(ExpectationRule::exact(executable_name)),
        Step::send("print lldb.process").check(process),
        Step::send("print lldb.thread").check(thread),
        Step::send("print lldb.frame").check(frame),
    ]);
    Ok(scenario)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::Transition;

    const FRAME: &str = "frame #0: 0x0000000100000f56 a.out`main(argc=1, argv=0x00007fff5fbff8a8) + 22 at main.c:7";
    const THREAD: &str = "* thread #1: tid = 0x1c03, 0x0000000100000f56 a.out`main(argc=1, argv=0x00007fff5fbff8a8) + 22 at main.c:7, queue = 'com.apple.main-thread', stop reason = breakpoint 1.1";

    #[test]
    fn builds_the_debugger_session() {
        let scenario = convenience_variables("lldb", "/tmp/build/a.out", 7).unwrap();
        assert_eq!(scenario.config().command, "lldb");
        assert_eq!(scenario.config().args, vec!["/tmp/build/a.out"]);
        assert_eq!(scenario.base().prompt(), DEBUGGER_PROMPT);

        let steps = scenario.step_list();
        assert_eq!(steps.len(), 8);
        assert_eq!(steps[0].line(), Some("breakpoint set -f main.c -l 7"));
        assert!(matches!(steps[2].transition(), Some(Transition::Push(c)) if c.prompt() == SCRIPT_PROMPT));
    }

    #[test]
    fn generated_patterns_match_debugger_output() {
        let scenario = convenience_variables("lldb", "a.out", 7).unwrap();
        let check = |i: usize, text: &str| scenario.step_list()[i].checks()[0].find(text).is_some();

        assert!(check(3, "Debugger (instance: \"debugger_1\", id: 1)"));
        assert!(check(4, "a.out"));
        assert!(check(5, "SBProcess: pid = 4242, state = stopped, threads = 1, executable = a.out"));
        assert!(check(6, THREAD));
        assert!(check(7, FRAME));
    }

    #[test]
    fn patterns_pin_the_breakpoint_line() {
        let scenario = convenience_variables("lldb", "a.out", 12).unwrap();
        assert!(scenario.step_list()[7].checks()[0].find(FRAME).is_none());
    }
}
