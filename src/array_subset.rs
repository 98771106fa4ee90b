//! Array subsets.
//!
//! An [`ArraySubset`] is a hyperrectangular region of an array, defined by a start and a shape.
//! Chunk plans are expressed as pairs of array subsets, and sinks accept writes addressed by an array subset.

mod indices_iterator;

pub use indices_iterator::{IndicesIterator, LinearisedIndicesIterator};

use std::ops::Range;

use derive_more::Display;
use itertools::izip;
use thiserror::Error;

use crate::{ArrayIndices, ArrayShape};

/// An array subset.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display, Default)]
#[display("start {start:?} shape {shape:?}")]
pub struct ArraySubset {
    /// The start of the array subset.
    start: ArrayIndices,
    /// The shape of the array subset.
    shape: ArrayShape,
}

impl ArraySubset {
    /// Create a new array subset with `shape` starting at the origin.
    #[must_use]
    pub fn new_with_shape(shape: ArrayShape) -> Self {
        Self {
            start: vec![0; shape.len()],
            shape,
        }
    }

    /// Create a new array subset from a list of [`Range`]s.
    ///
    /// Reversed ranges produce an empty extent on that dimension.
    #[must_use]
    pub fn new_with_ranges(ranges: &[Range<u64>]) -> Self {
        let start = ranges.iter().map(|range| range.start).collect();
        let shape = ranges
            .iter()
            .map(|range| range.end.saturating_sub(range.start))
            .collect();
        Self { start, shape }
    }

    /// Return the start of the array subset.
    #[must_use]
    pub fn start(&self) -> &[u64] {
        &self.start
    }

    /// Return the shape of the array subset.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    /// Return the dimensionality of the array subset.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.start.len()
    }

    /// Return the array subset as a list of ranges.
    #[must_use]
    pub fn to_ranges(&self) -> Vec<Range<u64>> {
        std::iter::zip(&self.start, &self.shape)
            .map(|(&start, &size)| start..start + size)
            .collect()
    }

    /// Return the number of elements of the array subset.
    ///
    /// Equal to the product of the components of its shape.
    /// A zero-dimensional array subset has one element.
    #[must_use]
    pub fn num_elements(&self) -> u64 {
        self.shape.iter().product()
    }

    /// Returns true if the array subset is within the bounds of `array_shape`.
    #[must_use]
    pub fn inbounds(&self, array_shape: &[u64]) -> bool {
        if self.dimensionality() != array_shape.len() {
            return false;
        }

        for (subset_start, subset_shape, shape) in izip!(self.start(), self.shape(), array_shape) {
            if subset_start + subset_shape > *shape {
                return false;
            }
        }
        true
    }

    /// Returns an iterator over the indices of elements within the subset.
    ///
    /// Iterates over the last dimension fastest (i.e. C-contiguous order).
    ///
    /// # Panics
    /// Panics if the number of elements exceeds [`usize::MAX`].
    #[must_use]
    pub fn iter_indices(&self) -> IndicesIterator {
        IndicesIterator::new(self.clone())
    }

    /// Returns an iterator over the linearised indices of elements within the subset of an array with `array_shape`.
    ///
    /// # Errors
    ///
    /// Returns [`IncompatibleArrayShapeError`] if the `array_shape` does not encapsulate this array subset.
    pub fn iter_linearised_indices<'a>(
        &self,
        array_shape: &'a [u64],
    ) -> Result<LinearisedIndicesIterator<'a>, IncompatibleArrayShapeError> {
        if self.inbounds(array_shape) {
            Ok(LinearisedIndicesIterator::new(
                self.iter_indices(),
                array_shape,
            ))
        } else {
            Err(IncompatibleArrayShapeError(
                array_shape.to_vec(),
                self.clone(),
            ))
        }
    }
}

/// An incompatible array shape error.
#[derive(Clone, Debug, Error)]
#[error("incompatible array shape {0:?} with array subset {1}")]
pub struct IncompatibleArrayShapeError(ArrayShape, ArraySubset);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_subset_ranges() {
        let subset = ArraySubset::new_with_ranges(&[2..5, 0..4]);
        assert_eq!(subset.start(), &[2, 0]);
        assert_eq!(subset.shape(), &[3, 4]);
        assert_eq!(subset.num_elements(), 12);
        assert_eq!(subset.to_ranges(), vec![2..5, 0..4]);
        assert_eq!(subset.to_string(), "start [2, 0] shape [3, 4]");
    }

    #[test]
    fn array_subset_inbounds() {
        let subset = ArraySubset::new_with_ranges(&[1..3, 0..2]);
        assert!(subset.inbounds(&[3, 2]));
        assert!(!subset.inbounds(&[2, 2]));
        assert!(!subset.inbounds(&[3]));
    }

    #[test]
    fn array_subset_iter_indices() {
        let subset = ArraySubset::new_with_ranges(&[1..3, 5..7]);
        let indices: Vec<_> = subset.iter_indices().collect();
        assert_eq!(
            indices,
            vec![vec![1, 5], vec![1, 6], vec![2, 5], vec![2, 6]]
        );
        let mut iter = subset.iter_indices();
        assert_eq!(iter.len(), 4);
        iter.next();
        assert_eq!(iter.size_hint(), (3, Some(3)));
        assert_eq!(iter.by_ref().count(), 3);
        assert_eq!(iter.len(), 0);
    }

    #[test]
    fn array_subset_iter_indices_scalar_and_empty() {
        let scalar = ArraySubset::new_with_shape(vec![]);
        assert_eq!(scalar.iter_indices().collect::<Vec<_>>(), vec![Vec::<u64>::new()]);
        let empty = ArraySubset::new_with_ranges(&[0..2, 3..3]);
        assert_eq!(empty.iter_indices().count(), 0);
    }

    #[test]
    fn array_subset_iter_linearised_indices() {
        let subset = ArraySubset::new_with_ranges(&[1..3, 1..3]);
        let indices: Vec<_> = subset.iter_linearised_indices(&[4, 4]).unwrap().collect();
        assert_eq!(indices, vec![5, 6, 9, 10]);
        assert!(subset.iter_linearised_indices(&[2, 2]).is_err());
    }
}
