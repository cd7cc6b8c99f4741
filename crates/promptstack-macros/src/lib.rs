//! promptstack-macros: procedural macros for promptstack
//!
//! - [`rule!`] builds an `ExpectationRule` whose regular expressions are
//!   checked while the test suite compiles, with an optional human-readable
//!   deadline.
//!
//! # Example
//!
//! ```ignore
//! use promptstack::rule;
//!
//! let prompt = rule!(exact "(lldb) ");
//! let stopped = rule!(pattern r"stop reason = breakpoint \d+\.\d+" within 10 s);
//! let target = rule!(substrings ["a.out", "arch"]);
//! let frame = rule!(
//!     patterns [r"frame #0: 0x[0-9a-f]+", r"frame #0: [0-9]+"]
//!     requiring ["main.c"]
//!     within 2 s + 500 ms
//! );
//! ```

// In proc-macro crates, passing parsed input by value is idiomatic
#![allow(clippy::needless_pass_by_value)]

use proc_macro::TokenStream;
use syn::parse_macro_input;

mod deadline;
mod rule;

/// Build an expectation rule.
///
/// # Forms
///
/// - `exact "literal"` matches the literal verbatim (case-sensitive).
/// - `pattern r"regex"` matches the first occurrence of the regex.
/// - `patterns [r"a", r"b"]` matches the earliest occurrence of any alternative.
/// - `substrings ["x", "y"]` requires every substring, in any order.
///
/// Pattern forms accept `requiring ["substr", ...]` for additional substrings
/// that must also be present. Every form accepts a trailing
/// `within <amount> <unit> [+ <amount> <unit> ...]` deadline, with units
/// `ms`, `s`, `m` (and their long spellings).
///
/// Invalid regular expressions are reported as compile errors.
#[proc_macro]
pub fn rule(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as rule::RuleInput);
    rule::expand(input).into()
}
