//! Scenario results.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::error::{ExpectError, Result};
use crate::teardown::TeardownReport;
use crate::transcript::Transcript;

/// The result of one step.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StepResult {
    /// Step name.
    pub name: String,
    /// Line sent, if any.
    pub sent: Option<String>,
    /// The last rule awaited or checked.
    pub expected: Option<String>,
    /// Output preceding the prompt (including waited-for text).
    pub before: String,
    /// Text matched by the last awaited rule.
    pub matched: String,
    /// Whether the step succeeded.
    pub passed: bool,
    /// Rendered error when the step failed.
    pub error: Option<String>,
    /// Wall time spent on the step.
    pub elapsed: Duration,
}

impl StepResult {
    pub(crate) fn started(name: &str, sent: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            sent: sent.map(str::to_string),
            ..Self::default()
        }
    }
}

/// Overall outcome of a scenario.
#[derive(Debug)]
pub enum Outcome {
    /// Every step succeeded.
    Passed,
    /// The scenario stopped at the first failure.
    Failed(ExpectError),
}

/// Who is at fault for a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The program misbehaved or the environment failed.
    Runtime,
    /// The scenario itself is malformed (unbalanced contexts, bad patterns).
    Authoring,
}

/// Everything known after a scenario run.
#[derive(Debug)]
pub struct ScenarioReport {
    /// Scenario name.
    pub scenario: String,
    /// Results of the steps that ran, in order.
    pub steps: Vec<StepResult>,
    /// Pass or the error that stopped the run.
    pub outcome: Outcome,
    /// Teardown summary; `None` if no session was ever started.
    pub teardown: Option<TeardownReport>,
    /// Everything sent and received.
    pub transcript: Transcript,
}

impl ScenarioReport {
    /// A report for a scenario that failed before a session existed.
    pub(crate) fn not_started(scenario: &str, error: ExpectError) -> Self {
        Self {
            scenario: scenario.to_string(),
            steps: Vec::new(),
            outcome: Outcome::Failed(error),
            teardown: None,
            transcript: Transcript::new(),
        }
    }

    /// Check if every step passed.
    #[must_use]
    pub const fn passed(&self) -> bool {
        matches!(self.outcome, Outcome::Passed)
    }

    /// The error that stopped the run.
    #[must_use]
    pub const fn error(&self) -> Option<&ExpectError> {
        match &self.outcome {
            Outcome::Passed => None,
            Outcome::Failed(e) => Some(e),
        }
    }

    /// Classify the failure, if any.
    #[must_use]
    pub const fn failure_kind(&self) -> Option<FailureKind> {
        match self.error() {
            None => None,
            Some(e) if e.is_authoring_defect() => Some(FailureKind::Authoring),
            Some(_) => Some(FailureKind::Runtime),
        }
    }

    /// The step that failed.
    #[must_use]
    pub fn failed_step(&self) -> Option<&StepResult> {
        self.steps.iter().find(|s| !s.passed)
    }

    /// The step named `name`.
    #[must_use]
    pub fn step(&self, name: &str) -> Option<&StepResult> {
        self.steps.iter().find(|s| s.name == name)
    }

    /// Convert into a `Result`, surfacing the error of a failed run.
    ///
    /// # Errors
    ///
    /// Returns the error that stopped the scenario.
    pub fn into_result(self) -> Result<Self> {
        match self.outcome {
            Outcome::Failed(e) => Err(e),
            Outcome::Passed => Ok(self),
        }
    }
}

impl fmt::Display for ScenarioReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.passed() { "passed" } else { "FAILED" };
        writeln!(f, "scenario `{}` {verdict}", self.scenario)?;
        for step in &self.steps {
            let mark = if step.passed { "ok" } else { "FAIL" };
            writeln!(f, "  [{mark:>4}] {} ({:?})", step.name, step.elapsed)?;
        }
        if let Some(teardown) = &self.teardown {
            writeln!(
                f,
                "  teardown: {} frame(s) unwound, {} graceful, exit status {}",
                teardown.frames_unwound,
                teardown.graceful_exits,
                teardown
                    .exit_status
                    .map_or_else(|| "unknown".to_string(), |s| s.to_string())
            )?;
        }
        if let Some(e) = self.error() {
            writeln!(f, "\n{e}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(outcome: Outcome) -> ScenarioReport {
        ScenarioReport {
            scenario: "demo".into(),
            steps: vec![
                StepResult {
                    passed: true,
                    ..StepResult::started("startup", None)
                },
                StepResult::started("run", Some("run")),
            ],
            outcome,
            teardown: Some(TeardownReport::default()),
            transcript: Transcript::new(),
        }
    }

    #[test]
    fn classifies_failures() {
        let runtime = report(Outcome::Failed(ExpectError::timeout(
            Duration::from_millis(5),
            "exact \"(lldb) \"",
            "",
        )));
        assert_eq!(runtime.failure_kind(), Some(FailureKind::Runtime));
        assert_eq!(runtime.failed_step().map(|s| s.name.as_str()), Some("run"));

        let authoring = report(Outcome::Failed(ExpectError::ContextUnderflow {
            base: "lldb".into(),
        }));
        assert_eq!(authoring.failure_kind(), Some(FailureKind::Authoring));
    }

    #[test]
    fn into_result_surfaces_error() {
        assert!(report(Outcome::Passed).into_result().is_ok());
        let err = report(Outcome::Failed(ExpectError::SessionClosed))
            .into_result()
            .unwrap_err();
        assert!(matches!(err, ExpectError::SessionClosed));
    }

    #[test]
    fn display_lists_steps() {
        let text = report(Outcome::Passed).to_string();
        assert!(text.contains("scenario `demo` passed"));
        assert!(text.contains("startup"));
        assert!(text.contains("teardown: 0 frame(s) unwound"));
    }
}
