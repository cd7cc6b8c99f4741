//! Scenario execution.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::Instant;

use super::definition::{Scenario, Step, Transition};
use super::report::{Outcome, ScenarioReport, StepResult};
use crate::backend::ProcessControl;
use crate::context::ContextStack;
use crate::error::Result;
use crate::expect::ExpectationRule;
use crate::session::Session;
use crate::teardown::TeardownManager;

/// Name of the implicit first step that waits for the base prompt.
pub const STARTUP_STEP: &str = "startup";

/// Runs scenarios step by step and always tears down afterwards.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScenarioRunner {
    teardown: Option<TeardownManager>,
}

impl ScenarioRunner {
    /// Create a runner that takes teardown deadlines from each scenario's config.
    #[must_use]
    pub const fn new() -> Self {
        Self { teardown: None }
    }

    /// Use `teardown` instead of one derived from the scenario config.
    #[must_use]
    pub const fn with_teardown(mut self, teardown: TeardownManager) -> Self {
        self.teardown = Some(teardown);
        self
    }

    /// Spawn the scenario's program on a PTY and run the scenario.
    ///
    /// A spawn failure yields a failed report with no steps and no teardown.
    #[cfg(unix)]
    pub async fn run(&self, scenario: &Scenario) -> ScenarioReport {
        match Session::spawn_with_config(scenario.config().clone()) {
            Ok(session) => self.run_on(session, scenario).await,
            Err(e) => {
                tracing::error!(scenario = scenario.name(), error = %e, "failed to spawn");
                ScenarioReport::not_started(scenario.name(), e)
            }
        }
    }

    /// Blocking variant of [`ScenarioRunner::run`] for synchronous harnesses.
    #[cfg(unix)]
    pub fn run_blocking(&self, scenario: &Scenario) -> ScenarioReport {
        match crate::sync::block_on(self.run(scenario)) {
            Ok(report) => report,
            Err(e) => ScenarioReport::not_started(scenario.name(), e),
        }
    }

    /// Run `scenario` on an already started session.
    ///
    /// The session is torn down and consumed whatever the outcome.
    pub async fn run_on<T>(&self, mut session: Session<T>, scenario: &Scenario) -> ScenarioReport
    where
        T: AsyncRead + AsyncWrite + ProcessControl + Unpin + Send,
    {
        tracing::info!(
            scenario = scenario.name(),
            steps = scenario.step_list().len(),
            "running scenario"
        );
        session.transcript_mut().marker(format!("scenario {}", scenario.name()));

        let mut stack = ContextStack::new(scenario.base().clone());
        let mut steps = Vec::new();
        let outcome = match Self::drive(&mut session, &mut stack, scenario, &mut steps).await {
            Ok(()) => Outcome::Passed,
            Err(e) => {
                tracing::warn!(scenario = scenario.name(), error = %e, "scenario failed");
                Outcome::Failed(e)
            }
        };

        let teardown = self
            .teardown
            .unwrap_or_else(|| TeardownManager::from_config(session.config()));
        let teardown = teardown.run(&mut session, &mut stack).await;

        ScenarioReport {
            scenario: scenario.name().to_string(),
            steps,
            outcome,
            teardown: Some(teardown),
            transcript: session.into_transcript(),
        }
    }

    async fn drive<T>(
        session: &mut Session<T>,
        stack: &mut ContextStack,
        scenario: &Scenario,
        results: &mut Vec<StepResult>,
    ) -> Result<()>
    where
        T: AsyncRead + AsyncWrite + ProcessControl + Unpin + Send,
    {
        if scenario.syncs_on_start() {
            let startup = Step::observe(STARTUP_STEP);
            Self::record(session, stack, &startup, results).await?;
        }
        for step in scenario.step_list() {
            Self::record(session, stack, step, results).await?;
        }
        Ok(())
    }

    async fn record<T>(
        session: &mut Session<T>,
        stack: &mut ContextStack,
        step: &Step,
        results: &mut Vec<StepResult>,
    ) -> Result<()>
    where
        T: AsyncRead + AsyncWrite + ProcessControl + Unpin + Send,
    {
        let start = Instant::now();
        let mut result = StepResult::started(step.name(), step.line());
        session.transcript_mut().marker(format!("step {}", step.name()));

        let outcome = Self::execute(session, stack, step, &mut result).await;
        result.elapsed = start.elapsed();
        result.passed = outcome.is_ok();
        if let Err(e) = &outcome {
            tracing::debug!(step = step.name(), error = %e, "step failed");
            result.error = Some(e.to_string());
        }
        results.push(result);
        outcome
    }

    async fn execute<T>(
        session: &mut Session<T>,
        stack: &mut ContextStack,
        step: &Step,
        result: &mut StepResult,
    ) -> Result<()>
    where
        T: AsyncRead + AsyncWrite + ProcessControl + Unpin + Send,
    {
        match step.transition() {
            Some(Transition::Push(context)) => stack.push_context(context.clone()),
            Some(Transition::Pop) => {
                stack.pop()?;
            }
            None => {}
        }

        if let Some(line) = step.line() {
            session.send_line(line).await?;
        }

        for wait in step.waits() {
            result.expected = Some(wait.to_string());
            let deadline = Self::deadline_for(session, step, wait);
            let captured = session.read_until(wait, deadline).await?;
            result.before.push_str(&captured.full_text());
            result.matched = captured.matched;
        }

        if step.has_boundary() {
            let boundary = stack.top().boundary_rule();
            result.expected = Some(boundary.to_string());
            let deadline = Self::deadline_for(session, step, &boundary);
            let captured = session.read_until(&boundary, deadline).await?;
            result.before.push_str(&captured.before);
            result.matched = captured.matched;
        }

        for check in step.checks() {
            result.expected = Some(check.to_string());
            check.check(&result.before)?;
        }
        Ok(())
    }

    fn deadline_for<T>(session: &Session<T>, step: &Step, rule: &ExpectationRule) -> Duration
    where
        T: AsyncRead + AsyncWrite + ProcessControl + Unpin + Send,
    {
        rule.deadline()
            .or(step.deadline())
            .unwrap_or(session.config().timeout.expect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::context::PromptContext;
    use crate::mock::MockTransport;

    fn shell(mock: &MockTransport) -> Session<MockTransport> {
        Session::new(
            mock.clone(),
            SessionConfig::new("mock").timeout(Duration::from_millis(100)),
        )
    }

    fn scenario(steps: impl IntoIterator<Item = Step>) -> Scenario {
        Scenario::new("test", SessionConfig::new("mock"), PromptContext::new("sh", "$ ")).steps(steps)
    }

    #[tokio::test]
    async fn passing_scenario_records_each_step() {
        let mock = MockTransport::new()
            .with_output("welcome\n$ ")
            .on_line("echo hi", "hi\n$ ");
        let report = ScenarioRunner::new()
            .run_on(shell(&mock), &scenario([Step::send("echo hi").check("hi")]))
            .await;

        assert!(report.passed(), "{report}");
        assert_eq!(report.steps.len(), 2);
        assert_eq!(report.steps[0].name, STARTUP_STEP);
        assert_eq!(report.steps[0].before, "welcome\n");
        assert_eq!(report.steps[1].before, "hi\n");
        assert_eq!(report.steps[1].matched, "$ ");
        assert!(report.teardown.as_ref().is_some_and(|t| t.terminated));
    }

    #[tokio::test]
    async fn wait_rules_precede_the_prompt() {
        let mock = MockTransport::new()
            .with_output("$ ")
            .on_line("run", "launched\nstop reason = breakpoint 1.1\n$ ");
        let step = Step::send("run").wait_for("stop reason = breakpoint 1.1");
        let report = ScenarioRunner::new().run_on(shell(&mock), &scenario([step])).await;

        assert!(report.passed(), "{report}");
        let run = report.step("run").unwrap();
        assert_eq!(run.before, "launched\nstop reason = breakpoint 1.1\n");
    }

    #[tokio::test]
    async fn failed_check_is_a_mismatch() {
        let mock = MockTransport::new()
            .with_output("$ ")
            .on_line("echo hi", "bye\n$ ");
        let report = ScenarioRunner::new()
            .run_on(shell(&mock), &scenario([Step::send("echo hi").check("hi")]))
            .await;

        assert!(matches!(report.error(), Some(crate::ExpectError::Mismatch { .. })));
        assert_eq!(report.failed_step().map(|s| s.name.as_str()), Some("echo hi"));
    }

    #[tokio::test]
    async fn pop_on_base_is_underflow() {
        let mock = MockTransport::new().with_output("$ ");
        let report = ScenarioRunner::new()
            .run_on(shell(&mock), &scenario([Step::send("exit").leave()]))
            .await;

        assert_eq!(report.failure_kind(), Some(super::super::FailureKind::Authoring));
        // Nothing was sent for the malformed step.
        assert!(mock.written().is_empty());
        assert_eq!(mock.terminate_calls(), 1);
    }
}
