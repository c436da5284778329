use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "info,sqlx=warn";

/// Install a global fmt subscriber filtered by `RUST_LOG` (or [`DEFAULT_FILTER`]).
///
/// Libraries in this workspace only emit events; binaries call this once at startup.
/// Calling it a second time is a no-op.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
