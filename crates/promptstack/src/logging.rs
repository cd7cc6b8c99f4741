//! Tracing subscriber setup.
//!
//! The library itself only emits `tracing` events. Binaries and test harnesses
//! call [`init`] (or [`init_json`]) once to print them; both honour `RUST_LOG`
//! and default to `promptstack=info,warn`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "promptstack=info,warn";

fn filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install a compact human-readable subscriber on stderr.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init() -> bool {
    tracing_subscriber::registry()
        .with(filter())
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .compact(),
        )
        .try_init()
        .is_ok()
}

/// Install a JSON subscriber on stderr.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_json() -> bool {
    tracing_subscriber::registry()
        .with(filter())
        .with(fmt::layer().with_writer(std::io::stderr).json())
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_harmless() {
        let _ = init();
        assert!(!init());
        assert!(!init_json());
    }
}
