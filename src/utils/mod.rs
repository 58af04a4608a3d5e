pub mod build_info;

use tracing_subscriber::{fmt, EnvFilter};

/// Filter applied when neither `RUST_LOG` nor a configured filter is usable.
pub const DEFAULT_LOG_DIRECTIVES: &str =
    "recurring_core=info,recur_core=info,recur_storage_json=info";

/// Installs the global subscriber on stderr. `RUST_LOG` wins over `fallback`.
pub fn init_tracing(fallback: Option<&str>) {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(fallback.unwrap_or(DEFAULT_LOG_DIRECTIVES))
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_DIRECTIVES)),
    };
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
