//! promptstack: scripted sessions with nested interactive prompts
//!
//! This crate drives text-based REPL programs through a pseudo-terminal,
//! waits for their output with exact-string, regex, or substring-set rules,
//! and tracks nested prompt contexts such as a debugger's embedded Python
//! interpreter.
//!
//! # Layers
//!
//! - [`Session`]: one child process; line sends and deadline-bounded
//!   read-until-match.
//! - [`ExpectationRule`]: what to wait for or check; also built at compile
//!   time with [`rule!`].
//! - [`ContextStack`]: the active prompt literal and how to leave it.
//! - [`ScenarioRunner`]: ordered steps, first failure aborts, teardown always
//!   runs.
//! - [`TeardownManager`]: exits nested contexts innermost first, then
//!   terminates the child.
//!
//! # Example
//!
//! ```no_run
//! use promptstack::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let scenario = promptstack::scenario::convenience_variables("lldb", "a.out", 7)?;
//!     let report = ScenarioRunner::new().run(&scenario).await;
//!     println!("{report}");
//!     report.into_result().map(|_| ())
//! }
//! ```

extern crate self as promptstack;

pub use promptstack_macros::rule;

pub mod backend;
pub mod config;
pub mod context;
pub mod error;
pub mod expect;
pub mod logging;
pub mod prelude;
pub mod scenario;
pub mod session;
#[cfg(unix)]
pub mod sync;
pub mod teardown;
pub mod transcript;

/// In-memory transport for tests.
#[cfg(any(test, feature = "mock"))]
pub mod mock;

#[cfg(unix)]
pub use backend::PtyTransport;
pub use backend::{ExitStatus, ProcessControl, PtySignal};
pub use config::{BufferConfig, EnvConfig, LineEnding, SessionConfig, TimeoutConfig};
pub use context::{ContextStack, PromptContext};
pub use error::{ExpectError, Result, SpawnError};
pub use expect::{Captured, ExpectationRule, MatchSpan, Matcher, OutputBuffer, RuleKind};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockTransport;
pub use scenario::{
    FailureKind, Outcome, Scenario, ScenarioReport, ScenarioRunner, Step, StepResult, Transition,
};
pub use session::Session;
#[cfg(unix)]
pub use sync::{SyncSession, block_on};
pub use teardown::{TeardownManager, TeardownReport};
pub use transcript::{EventKind, Transcript, TranscriptEvent};

#[doc(hidden)]
pub mod __private {
    pub use regex::Regex;
}
