use tracing_subscriber::EnvFilter;

use crate::config::ValidatorConfig;

/// Install a fmt subscriber filtered by `RUST_LOG`, falling back to the
/// configured level. Returns false if a global subscriber was already set.
pub fn init(config: &ValidatorConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok()
}
