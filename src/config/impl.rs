use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwap;

use super::StaticConfig;

static CONFIG: OnceLock<ArcSwap<StaticConfig>> = OnceLock::new();

/// Get the global configuration instance
///
/// Returns an Arc pointer to the configuration, which is cheap to clone
/// and doesn't hold any locks.
pub fn get_config() -> Arc<StaticConfig> {
    CONFIG
        .get()
        .expect("Config not initialized. Call init_config() first.")
        .load_full()
}

/// Initialize the global configuration
///
/// Loads configuration from "config.toml" in the current directory.
/// If the file doesn't exist, uses in-memory defaults.
///
/// # Examples
/// ```no_run
/// use outlinker::config::init_config;
/// init_config();
/// ```
pub fn init_config() {
    CONFIG.get_or_init(|| ArcSwap::from_pointee(StaticConfig::load()));
}

/// Replace the global configuration.
///
/// Startup uses this once to store the admin password back in hashed form
/// before the credential is handed to request handlers.
pub(crate) fn store_config(config: StaticConfig) {
    let swap = CONFIG.get_or_init(|| ArcSwap::from_pointee(StaticConfig::default()));
    swap.store(Arc::new(config));
}

/// Replace the global configuration, used by tests to inject settings.
#[doc(hidden)]
pub fn set_config_for_tests(config: StaticConfig) {
    store_config(config);
}
