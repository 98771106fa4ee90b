use std::iter::FusedIterator;

use itertools::izip;

use crate::{array_subset::ArraySubset, ArrayIndices};

/// Iterates over element indices in an array subset.
///
/// Iterates over the last dimension fastest (i.e. C-contiguous order).
pub struct IndicesIterator {
    subset: ArraySubset,
    index: usize,
    length: usize,
}

impl IndicesIterator {
    /// Create a new indices iterator.
    ///
    /// # Panics
    /// Panics if the number of elements in `subset` exceeds [`usize::MAX`].
    #[must_use]
    pub fn new(subset: ArraySubset) -> Self {
        let length = usize::try_from(subset.num_elements()).unwrap();
        Self {
            subset,
            index: 0,
            length,
        }
    }
}

impl Iterator for IndicesIterator {
    type Item = ArrayIndices;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.length {
            return None;
        }
        let mut current = self.index as u64;
        let mut indices = vec![0; self.subset.dimensionality()];
        for (out, &subset_start, &subset_size) in izip!(
            indices.iter_mut().rev(),
            self.subset.start.iter().rev(),
            self.subset.shape.iter().rev(),
        ) {
            *out = current % subset_size + subset_start;
            current /= subset_size;
        }
        self.index += 1;
        Some(indices)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.length - self.index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for IndicesIterator {}

impl FusedIterator for IndicesIterator {}

/// Iterates over linearised element indices of an array subset within an array.
pub struct LinearisedIndicesIterator<'a> {
    inner: IndicesIterator,
    array_shape: &'a [u64],
}

impl<'a> LinearisedIndicesIterator<'a> {
    pub(super) fn new(inner: IndicesIterator, array_shape: &'a [u64]) -> Self {
        Self { inner, array_shape }
    }
}

impl Iterator for LinearisedIndicesIterator<'_> {
    type Item = u64;

    fn next(&mut self) -> Option<Self::Item> {
        let indices = self.inner.next()?;
        let mut linearised = 0;
        for (index, size) in std::iter::zip(indices, self.array_shape) {
            linearised = linearised * size + index;
        }
        Some(linearised)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for LinearisedIndicesIterator<'_> {}

impl FusedIterator for LinearisedIndicesIterator<'_> {}
