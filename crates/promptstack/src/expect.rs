//! Expectation rules and the matching engine.
//!
//! Matching is split in two layers:
//!
//! - [`ExpectationRule::find`] is the pure expector: given text and a rule it
//!   reports where (if anywhere) the rule is satisfied.
//! - [`Matcher`] owns the accumulated output of a session and consumes text up
//!   to and including a match, yielding the before-buffer.

mod buffer;
mod matcher;
mod rule;

pub use buffer::{DEFAULT_CAPACITY, OutputBuffer};
pub use matcher::{Captured, Matcher};
pub use rule::{ExpectationRule, MatchSpan, RuleKind};
