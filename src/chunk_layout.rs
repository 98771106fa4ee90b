//! Output chunk layout planning.
//!
//! [`guess_chunk_shape`] picks a chunk shape for an output array from its shape, the dimensions that are unlimited
//! (extensible), and its element size. The heuristic starts from the full array and repeatedly halves one dimension
//! at a time (round robin) until a chunk is close to the target size and below the maximum size.
//! Both sizes default to the values in the [global configuration](crate::config::global_config).
//! The result depends only on its inputs, never on array data.

use std::num::NonZeroU64;

use crate::{
    chunk_shape::ChunkShape,
    config::{global_config, Config},
};

/// Limits used by the chunk shape heuristic.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ChunkSizeLimits {
    /// The chunk size in bytes to aim for.
    pub target_bytes: u64,
    /// The hard maximum chunk size in bytes.
    pub max_bytes: u64,
    /// The provisional extent substituted for small unlimited dimensions.
    pub unlimited_extent: u64,
}

impl ChunkSizeLimits {
    /// Create chunk size limits from `config`.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            target_bytes: config.chunk_target_bytes(),
            max_bytes: config.chunk_max_bytes(),
            unlimited_extent: config.unlimited_extent(),
        }
    }
}

impl Default for ChunkSizeLimits {
    /// Create chunk size limits from the [global configuration](crate::config::global_config).
    fn default() -> Self {
        Self::from_config(&global_config())
    }
}

/// Guess a chunk shape for an array with `shape`, `extensible` dimensions, and `element_size`.
///
/// Uses the [`ChunkSizeLimits`] of the global configuration.
/// Returns [`None`] for a zero-dimensional array.
/// See [`guess_chunk_shape_with_limits`].
#[must_use]
pub fn guess_chunk_shape(
    shape: &[u64],
    extensible: &[bool],
    element_size: usize,
) -> Option<ChunkShape> {
    guess_chunk_shape_with_limits(shape, extensible, element_size, &ChunkSizeLimits::default())
}

/// Guess a chunk shape for an array with `shape`, `extensible` dimensions, and `element_size` subject to `limits`.
///
/// An extensible dimension is planned as if it had `max(extent, limits.unlimited_extent)` elements.
/// `extensible` may be shorter than `shape`, missing entries are not extensible.
/// Zero extents are planned as one.
///
/// Halving stops once the chunk is smaller than the target (or within 50% of it) and smaller than the maximum,
/// or once every dimension has been reduced to a single element.
///
/// Returns [`None`] for a zero-dimensional array.
#[must_use]
pub fn guess_chunk_shape_with_limits(
    shape: &[u64],
    extensible: &[bool],
    element_size: usize,
    limits: &ChunkSizeLimits,
) -> Option<ChunkShape> {
    if shape.is_empty() {
        return None;
    }

    let mut chunks: Vec<u64> = shape
        .iter()
        .enumerate()
        .map(|(i, &extent)| {
            let extent = if extensible.get(i).copied().unwrap_or(false) {
                extent.max(limits.unlimited_extent)
            } else {
                extent
            };
            extent.max(1)
        })
        .collect();

    let element_size = u128::try_from(element_size).unwrap_or(u128::MAX);
    let target = u128::from(limits.target_bytes.max(1));
    let max = u128::from(limits.max_bytes);
    let dimensionality = chunks.len();

    let mut idx = 0;
    loop {
        let num_elements: u128 = chunks.iter().map(|&c| u128::from(c)).product();
        let chunk_bytes = num_elements.saturating_mul(element_size);

        #[allow(clippy::cast_precision_loss)]
        let near_target = (chunk_bytes.abs_diff(target) as f64) / (target as f64) < 0.5;
        if (chunk_bytes < target || near_target) && chunk_bytes < max {
            break;
        }

        if num_elements == 1 {
            // a single element exceeds the limits
            break;
        }

        let axis = idx % dimensionality;
        chunks[axis] = chunks[axis].div_ceil(2);
        idx += 1;
    }

    Some(ChunkShape::from(
        chunks
            .into_iter()
            .map(|c| NonZeroU64::new(c).unwrap_or(NonZeroU64::MIN))
            .collect::<Vec<_>>(),
    ))
}
