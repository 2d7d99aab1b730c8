//! Structured logging setup
//!
//! The library only emits `tracing` events. Applications that want them on the
//! terminal call [`init_logging`] once at startup; `RUST_LOG` overrides the
//! default level, e.g. `RUST_LOG=plot_composer::state=trace`.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging at `info` unless `RUST_LOG` says otherwise
pub fn init_logging() {
    init_logging_with_level("info");
}

/// Initialize logging with a default level used when `RUST_LOG` is unset.
///
/// Calling this more than once is harmless; later calls are ignored.
pub fn init_logging_with_level(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("plot_composer={}", level)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init();
}
