//! Nested prompt contexts.
//!
//! An interactive program can open a secondary interpreter inside itself
//! (a debugger's embedded scripting prompt, for instance). The
//! [`ContextStack`] records which prompt is currently active so the runner
//! always waits for the right literal. The bottom frame is the program's
//! top-level prompt and is never removed by [`ContextStack::pop`].

use crate::error::{ExpectError, Result};
use crate::expect::ExpectationRule;

/// A named prompt, optionally with the command that leaves it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptContext {
    name: String,
    prompt: String,
    exit_command: Option<String>,
}

impl PromptContext {
    /// Create a context expecting `prompt`.
    pub fn new(name: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prompt: prompt.into(),
            exit_command: None,
        }
    }

    /// Set the line that exits this context (`quit()`, `quit`, ...).
    #[must_use]
    pub fn with_exit_command(mut self, command: impl Into<String>) -> Self {
        self.exit_command = Some(command.into());
        self
    }

    /// The context's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The prompt literal printed while this context is active.
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// The line that exits this context, if known.
    #[must_use]
    pub fn exit_command(&self) -> Option<&str> {
        self.exit_command.as_deref()
    }

    /// Exact-match rule for this context's prompt.
    #[must_use]
    pub fn boundary_rule(&self) -> ExpectationRule {
        ExpectationRule::exact(self.prompt.clone())
    }
}

/// A non-empty stack of prompt contexts.
#[derive(Debug, Clone)]
pub struct ContextStack {
    frames: Vec<PromptContext>,
}

impl ContextStack {
    /// Create a stack whose base frame is `base`.
    #[must_use]
    pub fn new(base: PromptContext) -> Self {
        Self { frames: vec![base] }
    }

    /// Enter a nested context.
    pub fn push(&mut self, name: impl Into<String>, prompt: impl Into<String>) {
        self.push_context(PromptContext::new(name, prompt));
    }

    /// Enter a nested context described by `context`.
    pub fn push_context(&mut self, context: PromptContext) {
        tracing::debug!(
            context = context.name(),
            prompt = context.prompt(),
            depth = self.frames.len() + 1,
            "entering prompt context"
        );
        self.frames.push(context);
    }

    /// Leave the active context, restoring its parent's prompt.
    ///
    /// # Errors
    ///
    /// Returns [`ExpectError::ContextUnderflow`] when only the base frame
    /// remains.
    pub fn pop(&mut self) -> Result<PromptContext> {
        self.unwind_one().ok_or_else(|| ExpectError::ContextUnderflow {
            base: self.base().name().to_string(),
        })
    }

    /// Remove the top frame unless it is the base. Used by teardown.
    pub fn unwind_one(&mut self) -> Option<PromptContext> {
        if self.frames.len() <= 1 {
            return None;
        }
        let context = self.frames.pop()?;
        tracing::debug!(
            context = context.name(),
            depth = self.frames.len(),
            "left prompt context"
        );
        Some(context)
    }

    /// The active context's prompt literal.
    #[must_use]
    pub fn current(&self) -> &str {
        self.top().prompt()
    }

    /// The active context.
    #[must_use]
    pub fn top(&self) -> &PromptContext {
        // Non-empty by construction.
        &self.frames[self.frames.len() - 1]
    }

    /// The base (top-level) context.
    #[must_use]
    pub fn base(&self) -> &PromptContext {
        &self.frames[0]
    }

    /// Number of frames, base included.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// All frames, base first.
    #[must_use]
    pub fn frames(&self) -> &[PromptContext] {
        &self.frames
    }
}
