//! Matching engine: buffer plus consumption of matched output.

use super::buffer::OutputBuffer;
use super::rule::{ExpectationRule, MatchSpan};

/// Output consumed by a successful match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captured {
    /// Text that preceded the match.
    pub before: String,
    /// The matched text.
    pub matched: String,
}

impl Captured {
    /// `before` followed by `matched`.
    #[must_use]
    pub fn full_text(&self) -> String {
        let mut text = String::with_capacity(self.before.len() + self.matched.len());
        text.push_str(&self.before);
        text.push_str(&self.matched);
        text
    }
}

/// Applies rules to accumulated output and consumes what they match.
#[derive(Debug, Clone, Default)]
pub struct Matcher {
    buffer: OutputBuffer,
}

impl Matcher {
    /// Create a matcher whose buffer holds at most `buffer_size` bytes.
    #[must_use]
    pub fn new(buffer_size: usize) -> Self {
        Self {
            buffer: OutputBuffer::new(buffer_size),
        }
    }

    /// Append raw output.
    pub fn append(&mut self, data: &[u8]) {
        self.buffer.append(data);
    }

    /// The unconsumed text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.buffer.as_str()
    }

    /// The underlying buffer.
    #[must_use]
    pub const fn buffer(&self) -> &OutputBuffer {
        &self.buffer
    }

    /// Find `rule` in the unconsumed text.
    #[must_use]
    pub fn find(&self, rule: &ExpectationRule) -> Option<MatchSpan> {
        rule.find(self.buffer.as_str())
    }

    /// Consume everything up to the end of `span`.
    pub fn consume(&mut self, span: MatchSpan) -> Captured {
        let before = self.buffer.consume(span.start);
        let matched = self.buffer.consume(span.end - span.start);
        Captured { before, matched }
    }

    /// Find and consume in one step.
    pub fn take(&mut self, rule: &ExpectationRule) -> Option<Captured> {
        self.find(rule).map(|span| self.consume(span))
    }

    /// Discard all unconsumed text.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_splits_before_and_matched() {
        let mut matcher = Matcher::new(1024);
        matcher.append(b"breakpoint set -f main.c -l 7\r\nBreakpoint 1: where = a.out`main\r\n(lldb) ");

        let captured = matcher.take(&ExpectationRule::exact("(lldb) ")).unwrap();
        assert!(captured.before.contains("Breakpoint 1"));
        assert_eq!(captured.matched, "(lldb) ");
        assert!(matcher.as_str().is_empty());
    }

    #[test]
    fn unmatched_output_stays_buffered() {
        let mut matcher = Matcher::new(1024);
        matcher.append(b">>> partial");
        assert!(matcher.take(&ExpectationRule::exact("(lldb) ")).is_none());
        assert_eq!(matcher.as_str(), ">>> partial");
    }

    #[test]
    fn successive_prompts_are_consumed_in_order() {
        let mut matcher = Matcher::new(1024);
        matcher.append(b"one\n>>> two\n>>> ");
        let rule = ExpectationRule::exact(">>> ");
        assert_eq!(matcher.take(&rule).unwrap().before, "one\n");
        assert_eq!(matcher.take(&rule).unwrap().before, "two\n");
        assert!(matcher.take(&rule).is_none());
    }
}
