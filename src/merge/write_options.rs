use std::collections::{BTreeMap, BTreeSet};

use crate::{chunk_layout::ChunkSizeLimits, config::global_config};

/// Options for planning and writing a merge.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    chunk_shapes: BTreeMap<String, Vec<u64>>,
    unlimited_dimensions: BTreeSet<String>,
    chunk_stop_factor: u64,
    chunk_size_limits: ChunkSizeLimits,
}

impl Default for WriteOptions {
    fn default() -> Self {
        // one read guard, the config lock is not reentrant
        let config = global_config();
        Self {
            chunk_shapes: BTreeMap::new(),
            unlimited_dimensions: BTreeSet::new(),
            chunk_stop_factor: config.chunk_stop_factor(),
            chunk_size_limits: ChunkSizeLimits::from_config(&config),
        }
    }
}

impl WriteOptions {
    /// Return the chunk shape override of the array `name`.
    #[must_use]
    pub fn chunk_shape(&self, name: &str) -> Option<&[u64]> {
        self.chunk_shapes.get(name).map(Vec::as_slice)
    }

    /// Override the guessed chunk shape of the array `name`.
    pub fn set_chunk_shape(&mut self, name: impl Into<String>, chunk_shape: Vec<u64>) -> &mut Self {
        self.chunk_shapes.insert(name.into(), chunk_shape);
        self
    }

    /// Returns true if the dimension `name` is unlimited.
    #[must_use]
    pub fn is_unlimited(&self, name: &str) -> bool {
        self.unlimited_dimensions.contains(name)
    }

    /// Mark the dimension `name` as unlimited.
    ///
    /// Unlimited dimensions are declared extensible and planned with at least the
    /// [unlimited extent](crate::config::Config#unlimited-extent).
    pub fn set_unlimited(&mut self, name: impl Into<String>) -> &mut Self {
        self.unlimited_dimensions.insert(name.into());
        self
    }

    /// Get the [chunk stop factor](crate::config::Config#chunk-stop-factor).
    #[must_use]
    pub fn chunk_stop_factor(&self) -> u64 {
        self.chunk_stop_factor
    }

    /// Set the [chunk stop factor](crate::config::Config#chunk-stop-factor). Zero is treated as one.
    pub fn set_chunk_stop_factor(&mut self, chunk_stop_factor: u64) -> &mut Self {
        self.chunk_stop_factor = chunk_stop_factor.max(1);
        self
    }

    /// Get the chunk size limits of guessed chunk shapes.
    #[must_use]
    pub fn chunk_size_limits(&self) -> &ChunkSizeLimits {
        &self.chunk_size_limits
    }

    /// Set the chunk size limits of guessed chunk shapes.
    pub fn set_chunk_size_limits(&mut self, chunk_size_limits: ChunkSizeLimits) -> &mut Self {
        self.chunk_size_limits = chunk_size_limits;
        self
    }
}
