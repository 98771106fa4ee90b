//! Chunk plans.
//!
//! A chunk plan is the ordered list of copy instructions that writes the contribution of one source to a variable.
//! Each [`ChunkPlanEntry`] pairs a region of the merged array (the global subset) with the region of the source array
//! holding its elements (the local subset).
//!
//! Along each dimension, the global and local selectors of a [`Correspondence`] are split into runs that are
//! contiguous in both the merged array and the source. Runs are also split at multiples of the chunk extent times a
//! stop factor, bounding the number of output chunks touched by a single copy.
//! The entries are the cartesian product of the runs of every dimension, in C-contiguous order.

use std::{num::NonZeroU64, ops::Range};

use crate::{
    array_subset::ArraySubset, chunk_shape::ChunkShape, selector::Selector,
    variable::Correspondence,
};

/// A copy instruction from a source array into a merged array.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ChunkPlanEntry {
    global: ArraySubset,
    local: ArraySubset,
}

impl ChunkPlanEntry {
    /// Create a new chunk plan entry.
    #[must_use]
    pub fn new(global: ArraySubset, local: ArraySubset) -> Self {
        Self { global, local }
    }

    /// Return the subset of the merged array in canonical dimension order.
    #[must_use]
    pub const fn global(&self) -> &ArraySubset {
        &self.global
    }

    /// Return the subset of the source array in the native dimension order of the source.
    #[must_use]
    pub const fn local(&self) -> &ArraySubset {
        &self.local
    }

    /// Return the number of elements copied.
    #[must_use]
    pub fn num_elements(&self) -> u64 {
        self.global.num_elements()
    }
}

/// A run of positions that is contiguous in both the merged array (`.0`) and the source (`.1`).
pub type Run = (Range<u64>, Range<u64>);

fn split_range_runs(global: &Range<u64>, local: &Range<u64>, stop: Option<NonZeroU64>) -> Vec<Run> {
    let Some(stop) = stop else {
        return vec![(global.clone(), local.clone())];
    };
    let stop = stop.get();
    let mut runs = Vec::new();
    let mut start = global.start;
    while start < global.end {
        let end = ((start / stop) + 1).saturating_mul(stop).min(global.end);
        let offset = start - global.start;
        runs.push((
            start..end,
            local.start + offset..local.start + offset + (end - start),
        ));
        start = end;
    }
    runs
}

/// Split the paired positions of `global` and `local` into runs.
///
/// A run ends where the next global position is not contiguous, where the next local position is not contiguous, or
/// at a global position `g` where `(g + 1)` is a multiple of `stop`.
///
/// `global` and `local` must select the same number of positions.
#[must_use]
pub fn split_runs(global: &Selector, local: &Selector, stop: Option<NonZeroU64>) -> Vec<Run> {
    if let (Selector::Range(global), Selector::Range(local)) = (global, local) {
        return split_range_runs(global, local, stop);
    }

    let mut runs = Vec::new();
    let mut current: Option<Run> = None;
    for (g, l) in std::iter::zip(global.iter(), local.iter()) {
        current = match current.take() {
            Some((global_run, local_run)) if global_run.end == g && local_run.end == l => {
                Some((global_run.start..g + 1, local_run.start..l + 1))
            }
            Some(run) => {
                runs.push(run);
                Some((g..g + 1, l..l + 1))
            }
            None => Some((g..g + 1, l..l + 1)),
        };
        if stop.is_some_and(|stop| (g + 1) % stop.get() == 0) {
            runs.extend(current.take());
        }
    }
    runs.extend(current);
    runs
}

/// Decompose the contribution described by `correspondence` into a chunk plan.
///
/// With a `chunk_shape`, runs along dimension `i` are also split at multiples of `chunk_shape[i] * factor`.
/// A zero `factor` is treated as one.
///
/// The global subsets of the entries partition the contribution and never overlap.
/// A scalar variable yields a single entry with zero-dimensional subsets.
#[must_use]
#[allow(clippy::missing_panics_doc)]
pub fn decompose(
    correspondence: &Correspondence,
    chunk_shape: Option<&ChunkShape>,
    factor: u64,
) -> Vec<ChunkPlanEntry> {
    let factor = factor.max(1);
    let dimensionality = correspondence.global().len();

    let runs: Vec<Vec<Run>> = (0..dimensionality)
        .map(|i| {
            let stop = chunk_shape
                .and_then(|chunk_shape| chunk_shape.get(i))
                .and_then(|extent| NonZeroU64::new(extent.get().saturating_mul(factor)));
            split_runs(&correspondence.global()[i], &correspondence.local()[i], stop)
        })
        .collect();

    let counts: Vec<u64> = runs.iter().map(|runs| runs.len() as u64).collect();
    let dimension_order = correspondence.dimension_order();
    ArraySubset::new_with_shape(counts)
        .iter_indices()
        .map(|indices| {
            let (global, local_canonical): (Vec<_>, Vec<_>) = std::iter::zip(&runs, &indices)
                .map(|(runs, &index)| {
                    // index < runs.len()
                    runs[usize::try_from(index).unwrap()].clone()
                })
                .unzip();
            let local: Vec<Range<u64>> = dimension_order
                .iter()
                .map(|&canonical| local_canonical[canonical].clone())
                .collect();
            ChunkPlanEntry::new(
                ArraySubset::new_with_ranges(&global),
                ArraySubset::new_with_ranges(&local),
            )
        })
        .collect()
}
