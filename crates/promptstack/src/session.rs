//! Session management.
//!
//! A [`Session`] owns one child process behind a transport and exposes the
//! line-oriented send / read-until-match operations the scenario runner is
//! built from.

mod handle;
#[cfg(unix)]
mod spawn;

pub use handle::Session;
