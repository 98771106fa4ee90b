//! Selectors of positions along one axis.
//!
//! A [`Selector`] is either a contiguous half-open range or an explicit ascending list of positions.
//! [`classify`] picks the compact form for an ascending sequence of positions.

use std::ops::Range;

use derive_more::From;

/// An ascending selection of positions along one axis.
#[derive(Clone, Debug, Eq, PartialEq, Hash, From)]
pub enum Selector {
    /// A contiguous half-open range of positions.
    Range(Range<u64>),
    /// An explicit list of ascending positions.
    Indices(Vec<u64>),
}

impl Default for Selector {
    fn default() -> Self {
        Self::Range(0..0)
    }
}

impl Selector {
    /// Return the number of selected positions.
    #[must_use]
    pub fn len(&self) -> u64 {
        match self {
            Self::Range(range) => range.end.saturating_sub(range.start),
            Self::Indices(indices) => indices.len() as u64,
        }
    }

    /// Returns true if no positions are selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the `i`th selected position.
    #[must_use]
    pub fn get(&self, i: u64) -> Option<u64> {
        match self {
            Self::Range(range) => {
                let position = range.start.checked_add(i)?;
                (position < range.end).then_some(position)
            }
            Self::Indices(indices) => indices.get(usize::try_from(i).ok()?).copied(),
        }
    }

    /// Returns true if `position` is selected.
    #[must_use]
    pub fn contains(&self, position: u64) -> bool {
        match self {
            Self::Range(range) => range.contains(&position),
            Self::Indices(indices) => indices.binary_search(&position).is_ok(),
        }
    }

    /// Returns an iterator over the selected positions in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        let (range, indices) = match self {
            Self::Range(range) => (Some(range.clone()), None),
            Self::Indices(indices) => (None, Some(indices.iter().copied())),
        };
        range
            .into_iter()
            .flatten()
            .chain(indices.into_iter().flatten())
    }

    /// Return the selected positions as a vector.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u64> {
        self.iter().collect()
    }
}

/// Classify ascending `positions` as a [`Selector`].
///
/// Returns [`Selector::Range`] if every step between adjacent positions is one (including a single position),
/// otherwise [`Selector::Indices`]. No positions yield the empty range `0..0`.
#[must_use]
pub fn classify(positions: Vec<u64>) -> Selector {
    match (positions.first(), positions.last()) {
        (Some(&first), Some(&last))
            if positions.windows(2).all(|pair| pair[1] == pair[0] + 1) =>
        {
            Selector::Range(first..last + 1)
        }
        (Some(_), Some(_)) => Selector::Indices(positions),
        _ => Selector::Range(0..0),
    }
}
