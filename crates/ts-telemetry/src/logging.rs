use tracing_subscriber::{fmt, EnvFilter};

/// Output shape of the installed subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    Human,
    Json,
}

/// Build the level filter: `RUST_LOG` wins, otherwise `default_level`
/// (e.g. "info", "debug", "ts_daemon=debug,warn").
///
/// An unparseable `default_level` falls back to "info".
pub fn build_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber.
///
/// Returns `false` when a subscriber was already installed (e.g. a second
/// call in tests); the existing one stays in place.
pub fn init(service_name: &str, default_level: &str, output: Output) -> bool {
    let filter = build_filter(default_level);

    let installed = match output {
        Output::Human => fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(false)
            .with_level(true)
            .try_init()
            .is_ok(),
        Output::Json => fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_current_span(true)
            .with_level(true)
            .try_init()
            .is_ok(),
    };

    if installed {
        tracing::info!(service = service_name, ?output, "logging initialised");
    }
    installed
}

/// Human-readable output. Safe to call multiple times.
pub fn init_logging(service_name: &str, default_level: &str) {
    init(service_name, default_level, Output::Human);
}

/// JSON output (one object per line). Safe to call multiple times.
pub fn init_logging_json(service_name: &str, default_level: &str) {
    init(service_name, default_level, Output::Json);
}
