//! Global configuration options.

use std::sync::OnceLock;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Global configuration options for the `zarrs_lite` crate.
///
/// Retrieve the global [`Config`] with [`global_config`] and modify it with [`global_config_mut`].
///
/// ## Parallel Chunks
/// > default: [`true`]
///
/// If enabled, array operations spanning multiple chunks retrieve, decode, encode, and store those chunks in parallel.
///
/// ## Pretty Metadata
/// > default: [`true`]
///
/// If enabled, metadata records are written as indented JSON.
///
/// ## Validate Fill Value
/// > default: [`true`]
///
/// If enabled, decoding array metadata with a fill value incompatible with the data type fails.
/// Otherwise, the fill value is treated as `null` (all zero bytes) and a warning is logged.
#[derive(Debug)]
pub struct Config {
    parallel_chunks: bool,
    pretty_metadata: bool,
    validate_fill_value: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            parallel_chunks: true,
            pretty_metadata: true,
            validate_fill_value: true,
        }
    }
}

impl Config {
    /// Get the [parallel chunks](#parallel-chunks) configuration.
    #[must_use]
    pub fn parallel_chunks(&self) -> bool {
        self.parallel_chunks
    }

    /// Set the [parallel chunks](#parallel-chunks) configuration.
    pub fn set_parallel_chunks(&mut self, parallel_chunks: bool) {
        self.parallel_chunks = parallel_chunks;
    }

    /// Get the [pretty metadata](#pretty-metadata) configuration.
    #[must_use]
    pub fn pretty_metadata(&self) -> bool {
        self.pretty_metadata
    }

    /// Set the [pretty metadata](#pretty-metadata) configuration.
    pub fn set_pretty_metadata(&mut self, pretty_metadata: bool) {
        self.pretty_metadata = pretty_metadata;
    }

    /// Get the [validate fill value](#validate-fill-value) configuration.
    #[must_use]
    pub fn validate_fill_value(&self) -> bool {
        self.validate_fill_value
    }

    /// Set the [validate fill value](#validate-fill-value) configuration.
    pub fn set_validate_fill_value(&mut self, validate_fill_value: bool) {
        self.validate_fill_value = validate_fill_value;
    }
}

static CONFIG: OnceLock<RwLock<Config>> = OnceLock::new();

/// Returns a reference to the global configuration.
///
/// This blocks if the global config is held mutably by another thread, and deadlocks if it is held mutably by the current thread.
pub fn global_config() -> RwLockReadGuard<'static, Config> {
    CONFIG.get_or_init(|| RwLock::new(Config::default())).read()
}

/// Returns a mutable reference to the global configuration.
///
/// This blocks while the global config is held by another thread, and deadlocks if it is held by the current thread.
pub fn global_config_mut() -> RwLockWriteGuard<'static, Config> {
    CONFIG.get_or_init(|| RwLock::new(Config::default())).write()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_parallel_chunks() {
        assert!(global_config().parallel_chunks());
        global_config_mut().set_parallel_chunks(false);
        assert!(!global_config().parallel_chunks());
        global_config_mut().set_parallel_chunks(true);
    }
}
