//! Convenient re-exports for writing scenarios.
//!
//! ```
//! use promptstack::prelude::*;
//!
//! let step = Step::send("print lldb.frame").check(rule!(pattern r"frame #0: 0x[0-9a-f]+"));
//! assert_eq!(step.checks().len(), 1);
//! ```

pub use crate::config::{LineEnding, SessionConfig, TimeoutConfig};
pub use crate::context::{ContextStack, PromptContext};
pub use crate::error::{ExpectError, Result, SpawnError};
pub use crate::expect::{Captured, ExpectationRule};
pub use crate::rule;
pub use crate::scenario::{Scenario, ScenarioReport, ScenarioRunner, Step};
pub use crate::session::Session;
pub use crate::teardown::{TeardownManager, TeardownReport};
