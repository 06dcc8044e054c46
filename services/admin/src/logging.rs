use std::sync::OnceLock;
use tracing_subscriber::{fmt, EnvFilter};

static LOGGER_INIT: OnceLock<()> = OnceLock::new();

/// Install the global subscriber. Later calls are no-ops.
///
/// `RUST_LOG` wins over `fallback_filter` when set.
pub fn init(fallback_filter: &str, json: bool) {
    LOGGER_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback_filter));

        let builder = fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_line_number(true);
        let installed = if json {
            builder.json().try_init()
        } else {
            builder.try_init()
        };
        if installed.is_ok() {
            tracing::info!(service = env!("CARGO_PKG_NAME"), json, "logger initialized");
        }
    });
}
