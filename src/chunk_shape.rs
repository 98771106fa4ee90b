//! The shape of a chunk.

use std::num::NonZeroU64;

use derive_more::Deref;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ArrayShape;

/// The shape of a chunk. All dimensions must be non-zero.
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Hash, Debug, Deref)]
pub struct ChunkShape(Vec<NonZeroU64>);

/// A zero-extent chunk dimension error.
#[derive(Copy, Clone, Debug, Error)]
#[error("chunk shape dimensions must be non-zero")]
pub struct ZeroChunkExtentError;

impl ChunkShape {
    /// Return the number of elements.
    ///
    /// Equal to the product of the components of its shape.
    #[must_use]
    pub fn num_elements(&self) -> u64 {
        self.0.iter().copied().map(NonZeroU64::get).product::<u64>()
    }

    /// Return the size of a chunk in bytes given an `element_size`.
    #[must_use]
    pub fn size_bytes(&self, element_size: usize) -> u64 {
        self.num_elements()
            .saturating_mul(u64::try_from(element_size).unwrap_or(u64::MAX))
    }

    /// Return the dimensionality of the chunk shape.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.0.len()
    }

    /// Convert to an [`ArrayShape`].
    #[must_use]
    pub fn to_array_shape(&self) -> ArrayShape {
        self.0.iter().map(|i| i.get()).collect()
    }
}

impl From<ChunkShape> for Vec<NonZeroU64> {
    fn from(val: ChunkShape) -> Self {
        val.0
    }
}

impl From<Vec<NonZeroU64>> for ChunkShape {
    fn from(value: Vec<NonZeroU64>) -> Self {
        ChunkShape(value)
    }
}

macro_rules! try_from_chunkshape {
    ( $t:ty ) => {
        impl TryFrom<$t> for ChunkShape {
            type Error = ZeroChunkExtentError;
            fn try_from(value: $t) -> Result<Self, Self::Error> {
                Ok(ChunkShape(
                    value
                        .iter()
                        .map(|&i| NonZeroU64::new(i).ok_or(ZeroChunkExtentError))
                        .collect::<Result<_, _>>()?,
                ))
            }
        }
    };
    ( $t:ty, $g:ident ) => {
        impl<const $g: usize> TryFrom<$t> for ChunkShape {
            type Error = ZeroChunkExtentError;
            fn try_from(value: $t) -> Result<Self, Self::Error> {
                Ok(ChunkShape(
                    value
                        .iter()
                        .map(|&i| NonZeroU64::new(i).ok_or(ZeroChunkExtentError))
                        .collect::<Result<_, _>>()?,
                ))
            }
        }
    };
}

try_from_chunkshape!(Vec<u64>);
try_from_chunkshape!(&[u64]);
try_from_chunkshape!([u64; N], N);
try_from_chunkshape!(&[u64; N], N);
