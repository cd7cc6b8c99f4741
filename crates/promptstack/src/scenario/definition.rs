//! Scenario and step definitions.

use std::time::Duration;

use crate::config::SessionConfig;
use crate::context::PromptContext;
use crate::expect::ExpectationRule;

/// A change to the context stack made at the start of a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Enter a nested context; its prompt becomes the step's boundary.
    Push(PromptContext),
    /// Leave the active context; the parent's prompt becomes the boundary.
    Pop,
}

/// One send/expect exchange.
///
/// A step runs in this order: apply its [`Transition`], send its line, await
/// each wait rule in order, await the current prompt (unless disabled), then
/// check the content rules against everything that preceded the prompt.
#[derive(Debug, Clone)]
pub struct Step {
    name: String,
    line: Option<String>,
    transition: Option<Transition>,
    waits: Vec<ExpectationRule>,
    boundary: bool,
    checks: Vec<ExpectationRule>,
    deadline: Option<Duration>,
}

impl Step {
    /// A step that sends `line`. The line doubles as the step's name.
    pub fn send(line: impl Into<String>) -> Self {
        let line = line.into();
        Self {
            name: line.clone(),
            line: Some(line),
            transition: None,
            waits: Vec::new(),
            boundary: true,
            checks: Vec::new(),
            deadline: None,
        }
    }

    /// A step that sends nothing and only waits.
    pub fn observe(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            line: None,
            transition: None,
            waits: Vec::new(),
            boundary: true,
            checks: Vec::new(),
            deadline: None,
        }
    }

    /// Rename the step for reports.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Push `context` before sending.
    #[must_use]
    pub fn enter(mut self, context: PromptContext) -> Self {
        self.transition = Some(Transition::Push(context));
        self
    }

    /// Pop the active context before sending.
    #[must_use]
    pub fn leave(mut self) -> Self {
        self.transition = Some(Transition::Pop);
        self
    }

    /// Await `rule` after sending, before the prompt.
    #[must_use]
    pub fn wait_for(mut self, rule: impl Into<ExpectationRule>) -> Self {
        self.waits.push(rule.into());
        self
    }

    /// Require `rule` to match the output preceding the prompt.
    #[must_use]
    pub fn check(mut self, rule: impl Into<ExpectationRule>) -> Self {
        self.checks.push(rule.into());
        self
    }

    /// Do not wait for the prompt after sending.
    #[must_use]
    pub const fn no_boundary(mut self) -> Self {
        self.boundary = false;
        self
    }

    /// Deadline for waits and the prompt when a rule carries none.
    #[must_use]
    pub const fn within(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Name used in reports.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The line sent, if any.
    #[must_use]
    pub fn line(&self) -> Option<&str> {
        self.line.as_deref()
    }

    /// The context change applied first.
    #[must_use]
    pub const fn transition(&self) -> Option<&Transition> {
        self.transition.as_ref()
    }

    /// Intermediate rules awaited before the prompt.
    #[must_use]
    pub fn waits(&self) -> &[ExpectationRule] {
        &self.waits
    }

    /// Whether the prompt is awaited.
    #[must_use]
    pub const fn has_boundary(&self) -> bool {
        self.boundary
    }

    /// Content rules checked against the captured output.
    #[must_use]
    pub fn checks(&self) -> &[ExpectationRule] {
        &self.checks
    }

    /// The step deadline, if set.
    #[must_use]
    pub const fn deadline(&self) -> Option<Duration> {
        self.deadline
    }
}

/// An ordered list of steps run against one session.
#[derive(Debug, Clone)]
pub struct Scenario {
    name: String,
    config: SessionConfig,
    base: PromptContext,
    steps: Vec<Step>,
    sync_on_start: bool,
}

impl Scenario {
    /// Create an empty scenario spawning `config` whose top-level prompt is `base`.
    pub fn new(name: impl Into<String>, config: SessionConfig, base: PromptContext) -> Self {
        Self {
            name: name.into(),
            config,
            base,
            steps: Vec::new(),
            sync_on_start: true,
        }
    }

    /// Append a step.
    #[must_use]
    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Append several steps.
    #[must_use]
    pub fn steps(mut self, steps: impl IntoIterator<Item = Step>) -> Self {
        self.steps.extend(steps);
        self
    }

    /// Start sending immediately instead of waiting for the first prompt.
    #[must_use]
    pub const fn without_startup_sync(mut self) -> Self {
        self.sync_on_start = false;
        self
    }

    /// Replace the session configuration.
    #[must_use]
    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// The scenario name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Configuration used by [`super::ScenarioRunner::run`].
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The top-level prompt context.
    #[must_use]
    pub const fn base(&self) -> &PromptContext {
        &self.base
    }

    /// The steps, in order.
    #[must_use]
    pub fn step_list(&self) -> &[Step] {
        &self.steps
    }

    /// Whether the runner waits for the base prompt before the first step.
    #[must_use]
    pub const fn syncs_on_start(&self) -> bool {
        self.sync_on_start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_builder() {
        let step = Step::send("script")
            .enter(PromptContext::new("script", ">>> "))
            .check(ExpectationRule::exact("Python"))
            .within(Duration::from_secs(2));

        assert_eq!(step.name(), "script");
        assert_eq!(step.line(), Some("script"));
        assert!(matches!(step.transition(), Some(Transition::Push(c)) if c.prompt() == ">>> "));
        assert!(step.has_boundary());
        assert_eq!(step.checks().len(), 1);
        assert_eq!(step.deadline(), Some(Duration::from_secs(2)));
    }

    #[test]
    fn observe_step_sends_nothing() {
        let step = Step::observe("banner").no_boundary().wait_for("ready");
        assert!(step.line().is_none());
        assert!(!step.has_boundary());
        assert_eq!(step.waits().len(), 1);
    }

    #[test]
    fn scenario_collects_steps() {
        let scenario = Scenario::new("s", SessionConfig::new("sh"), PromptContext::new("sh", "$ "))
            .step(Step::send("echo 1"))
            .steps([Step::send("echo 2"), Step::send("echo 3")])
            .without_startup_sync();
        assert_eq!(scenario.step_list().len(), 3);
        assert!(!scenario.syncs_on_start());
        assert_eq!(scenario.base().prompt(), "$ ");
    }
}
