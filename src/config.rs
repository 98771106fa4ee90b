//! `arraymerge` global configuration options.

use std::sync::{OnceLock, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Global configuration options for the arraymerge crate.
///
/// Retrieve the global [`Config`] with [`global_config`] and modify it with [`global_config_mut`].
///
/// # Chunk Layout Configuration Options
///
/// ## Chunk Target Bytes
/// > default: `3 * 1024 * 1024`
///
/// The chunk size in bytes that the [chunk layout planner](crate::chunk_layout) aims for.
/// A guessed chunk is accepted once it is smaller than the target or within 50% of it.
///
/// ## Chunk Maximum Bytes
/// > default: `3 * 1024 * 1024`
///
/// The hard upper limit on the size of a guessed chunk in bytes.
/// The only guessed chunk that may exceed it is a single element that is itself larger than the limit.
///
/// ## Unlimited Extent
/// > default: `1024`
///
/// The provisional extent used in place of an unlimited (extensible) dimension with fewer elements than this.
///
/// # Chunk Plan Configuration Options
///
/// ## Chunk Stop Factor
/// > default: `3`
///
/// The multiple of the chunk extent at which the [chunk plan decomposer](crate::chunk_plan) breaks contiguous runs.
/// Larger values produce fewer but larger writes.
#[derive(Debug)]
pub struct Config {
    chunk_target_bytes: u64,
    chunk_max_bytes: u64,
    unlimited_extent: u64,
    chunk_stop_factor: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            chunk_target_bytes: 3 * 1024 * 1024,
            chunk_max_bytes: 3 * 1024 * 1024,
            unlimited_extent: 1024,
            chunk_stop_factor: 3,
        }
    }
}

impl Config {
    /// Get the [chunk target bytes](#chunk-target-bytes) configuration.
    #[must_use]
    pub fn chunk_target_bytes(&self) -> u64 {
        self.chunk_target_bytes
    }

    /// Set the [chunk target bytes](#chunk-target-bytes) configuration.
    pub fn set_chunk_target_bytes(&mut self, chunk_target_bytes: u64) {
        self.chunk_target_bytes = chunk_target_bytes;
    }

    /// Get the [chunk maximum bytes](#chunk-maximum-bytes) configuration.
    #[must_use]
    pub fn chunk_max_bytes(&self) -> u64 {
        self.chunk_max_bytes
    }

    /// Set the [chunk maximum bytes](#chunk-maximum-bytes) configuration.
    pub fn set_chunk_max_bytes(&mut self, chunk_max_bytes: u64) {
        self.chunk_max_bytes = chunk_max_bytes;
    }

    /// Get the [unlimited extent](#unlimited-extent) configuration.
    #[must_use]
    pub fn unlimited_extent(&self) -> u64 {
        self.unlimited_extent
    }

    /// Set the [unlimited extent](#unlimited-extent) configuration.
    pub fn set_unlimited_extent(&mut self, unlimited_extent: u64) {
        self.unlimited_extent = unlimited_extent;
    }

    /// Get the [chunk stop factor](#chunk-stop-factor) configuration.
    #[must_use]
    pub fn chunk_stop_factor(&self) -> u64 {
        self.chunk_stop_factor
    }

    /// Set the [chunk stop factor](#chunk-stop-factor) configuration.
    ///
    /// A factor of zero is treated as one.
    pub fn set_chunk_stop_factor(&mut self, chunk_stop_factor: u64) {
        self.chunk_stop_factor = chunk_stop_factor.max(1);
    }
}

static CONFIG: OnceLock<RwLock<Config>> = OnceLock::new();

/// Returns a reference to the global arraymerge configuration.
///
/// # Panics
/// This function panics if the underlying lock has been poisoned and might panic if the global config is already held by the current thread.
pub fn global_config() -> RwLockReadGuard<'static, Config> {
    CONFIG
        .get_or_init(|| RwLock::new(Config::default()))
        .read()
        .unwrap()
}

/// Returns a mutable reference to the global arraymerge configuration.
///
/// # Panics
/// This function panics if the underlying lock has been poisoned and might panic if the global config is already held by the current thread.
pub fn global_config_mut() -> RwLockWriteGuard<'static, Config> {
    CONFIG
        .get_or_init(|| RwLock::new(Config::default()))
        .write()
        .unwrap()
}
