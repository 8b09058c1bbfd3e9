//! Log subscriber setup.
//!
//! `RUST_LOG` wins when set. Otherwise the debug flag picks between
//! `padbridge=debug,info` and `info`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter directive for the debug flag.
#[must_use]
pub fn default_directive(debug: bool) -> &'static str {
    if debug { "padbridge=debug,info" } else { "info" }
}

/// Install the global subscriber.
///
/// Returns `false` if a subscriber was already installed, which happens when
/// the host process set up its own logging first.
pub fn init(debug: bool) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(debug)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_thread_names(true),
        )
        .try_init()
        .is_ok()
}
