//! Scenarios: ordered send/expect steps over nested prompt contexts.
//!
//! A [`Scenario`] names the program to spawn, its top-level prompt, and a list
//! of [`Step`]s. The [`ScenarioRunner`] executes the steps strictly in order,
//! stops at the first failure, and always hands the session to the
//! [`crate::TeardownManager`] before returning a [`ScenarioReport`].
//!
//! # Example
//!
//! ```no_run
//! use promptstack::prelude::*;
//!
//! # async fn demo() {
//! let scenario = Scenario::new(
//!     "arithmetic",
//!     SessionConfig::new("lldb"),
//!     PromptContext::new("lldb", "(lldb) ").with_exit_command("quit"),
//! )
//! .step(Step::send("script").enter(PromptContext::new("script", ">>> ")))
//! .step(Step::send("print 1 + 1").check(rule!(pattern r"^2\s*$")));
//!
//! let report = ScenarioRunner::new().run(&scenario).await;
//! assert!(report.passed(), "{report}");
//! # }
//! ```
//!
//! With the `mock` feature, [`ScenarioRunner::run_on`] drives the same
//! scenario over a scripted in-memory transport.

mod builtin;
mod definition;
mod report;
mod runner;

pub use builtin::{
    BREAKPOINT_STOP, DEBUGGER_PROMPT, SCRIPT_PROMPT, convenience_variables,
    convenience_variables_with, debugger_context, script_context,
};
pub use definition::{Scenario, Step, Transition};
pub use report::{FailureKind, Outcome, ScenarioReport, StepResult};
pub use runner::{STARTUP_STEP, ScenarioRunner};
