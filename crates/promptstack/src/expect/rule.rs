//! Expectation rules.

use std::fmt;
use std::time::Duration;

use regex::Regex;

use crate::error::{ExpectError, Result};

/// Byte range of a match within the searched text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchSpan {
    /// Start offset (inclusive).
    pub start: usize,
    /// End offset (exclusive).
    pub end: usize,
}

impl MatchSpan {
    /// Create a span.
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// The matched slice of `text`.
    #[must_use]
    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start..self.end]
    }
}

/// What a rule matches.
#[derive(Debug, Clone)]
pub enum RuleKind {
    /// A literal matched verbatim, case-sensitive, first occurrence.
    Exact(String),

    /// Regex alternatives; the earliest-starting match wins. Every
    /// `required` substring must also be present somewhere in the text.
    Patterns {
        /// The alternatives.
        patterns: Vec<Regex>,
        /// Plain substrings that must accompany a match.
        required: Vec<String>,
    },

    /// Every substring must appear, in any order. The match spans from the
    /// earliest to the latest occurrence.
    SubstringSet(Vec<String>),
}

/// A rule the expector checks output against, with an optional deadline.
///
/// # Example
///
/// ```
/// use promptstack::ExpectationRule;
/// use std::time::Duration;
///
/// let prompt = ExpectationRule::exact("(lldb) ");
/// assert!(prompt.find("Current executable set\n(lldb) ").is_some());
///
/// let stop = ExpectationRule::pattern(r"stop reason = breakpoint \d+\.\d+")?
///     .within(Duration::from_secs(10));
/// assert_eq!(stop.deadline(), Some(Duration::from_secs(10)));
/// # Ok::<(), promptstack::ExpectError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ExpectationRule {
    kind: RuleKind,
    deadline: Option<Duration>,
}

impl ExpectationRule {
    /// Match a literal verbatim.
    pub fn exact(literal: impl Into<String>) -> Self {
        Self {
            kind: RuleKind::Exact(literal.into()),
            deadline: None,
        }
    }

    /// Match a single regular expression.
    pub fn pattern(pattern: &str) -> Result<Self> {
        Ok(Self::from_regex(Regex::new(pattern)?))
    }

    /// Match the earliest of several regular expressions.
    pub fn patterns<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let compiled = patterns
            .into_iter()
            .map(|p| Regex::new(p.as_ref()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        if compiled.is_empty() {
            return Err(ExpectError::invalid_pattern("a pattern rule needs at least one pattern"));
        }
        Ok(Self::from_regexes(compiled))
    }

    /// Wrap an already compiled regex.
    #[must_use]
    pub fn from_regex(regex: Regex) -> Self {
        Self::from_regexes(vec![regex])
    }

    /// Wrap already compiled alternatives.
    #[must_use]
    pub const fn from_regexes(patterns: Vec<Regex>) -> Self {
        Self {
            kind: RuleKind::Patterns {
                patterns,
                required: Vec::new(),
            },
            deadline: None,
        }
    }

    /// Require every substring, in any order.
    pub fn substrings<I, S>(substrings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind: RuleKind::SubstringSet(substrings.into_iter().map(Into::into).collect()),
            deadline: None,
        }
    }

    /// Additionally require `substring` to be present.
    ///
    /// An exact rule becomes an escaped pattern rule so the requirement can
    /// accompany it.
    #[must_use]
    pub fn requiring(self, substring: impl Into<String>) -> Self {
        let substring = substring.into();
        let kind = match self.kind {
            RuleKind::Exact(literal) => RuleKind::Patterns {
                patterns: vec![escaped(&literal)],
                required: vec![substring],
            },
            RuleKind::Patterns { patterns, mut required } => {
                required.push(substring);
                RuleKind::Patterns { patterns, required }
            }
            RuleKind::SubstringSet(mut set) => {
                set.push(substring);
                RuleKind::SubstringSet(set)
            }
        };
        Self { kind, ..self }
    }

    /// Set the maximum wait for this rule.
    #[must_use]
    pub const fn within(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// The rule's own deadline, if set.
    #[must_use]
    pub const fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// What the rule matches.
    #[must_use]
    pub const fn kind(&self) -> &RuleKind {
        &self.kind
    }

    /// Locate the first satisfying match in `text`.
    #[must_use]
    pub fn find(&self, text: &str) -> Option<MatchSpan> {
        match &self.kind {
            RuleKind::Exact(literal) => text
                .find(literal.as_str())
                .map(|start| MatchSpan::new(start, start + literal.len())),
            RuleKind::Patterns { patterns, required } => {
                if !required.iter().all(|s| text.contains(s.as_str())) {
                    return None;
                }
                patterns
                    .iter()
                    .filter_map(|re| re.find(text))
                    .min_by_key(regex::Match::start)
                    .map(|m| MatchSpan::new(m.start(), m.end()))
            }
            RuleKind::SubstringSet(set) => {
                let mut span: Option<MatchSpan> = None;
                for needle in set {
                    let start = text.find(needle.as_str())?;
                    let end = start + needle.len();
                    span = Some(match span {
                        None => MatchSpan::new(start, end),
                        Some(s) => MatchSpan::new(s.start.min(start), s.end.max(end)),
                    });
                }
                Some(span.unwrap_or(MatchSpan::new(0, 0)))
            }
        }
    }

    /// Check `text` without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`ExpectError::Mismatch`] carrying the rule and the text when
    /// the rule is not satisfied.
    pub fn check(&self, text: &str) -> Result<MatchSpan> {
        self.find(text)
            .ok_or_else(|| ExpectError::mismatch(self.to_string(), text))
    }
}

fn escaped(literal: &str) -> Regex {
    // An escaped literal is always a valid regex.
    Regex::new(&regex::escape(literal)).unwrap_or_else(|_| unreachable!("escaped literal"))
}

impl From<&str> for ExpectationRule {
    fn from(literal: &str) -> Self {
        Self::exact(literal)
    }
}

impl From<String> for ExpectationRule {
    fn from(literal: String) -> Self {
        Self::exact(literal)
    }
}

impl From<Regex> for ExpectationRule {
    fn from(regex: Regex) -> Self {
        Self::from_regex(regex)
    }
}

impl fmt::Display for ExpectationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            RuleKind::Exact(literal) => write!(f, "exact {literal:?}")?,
            RuleKind::Patterns { patterns, required } => {
                let alternatives: Vec<_> = patterns.iter().map(|re| format!("/{re}/")).collect();
                write!(f, "pattern {}", alternatives.join(" | "))?;
                if !required.is_empty() {
                    write!(f, " requiring {required:?}")?;
                }
            }
            RuleKind::SubstringSet(set) => write!(f, "substrings {set:?}")?,
        }
        if let Some(deadline) = self.deadline {
            write!(f, " within {deadline:?}")?;
        }
        Ok(())
    }
}
