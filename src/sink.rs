//! Sinks of merged array data.
//!
//! A sink is a chunked array store that merged arrays are written to.
//! An array is first declared with an [`ArrayDeclaration`] and then written region by region.
//!
//! Sinks implement [`SinkTraits`]. [`MemorySink`] is an in-memory sink.

mod memory_sink;

pub use memory_sink::MemorySink;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    array_subset::ArraySubset,
    chunk_shape::ChunkShape,
    codec::Encoding,
    data_type::DataType,
    values::{ArrayValues, IncompatibleValuesError, ScalarValue, SubsetValuesError},
    ArrayShape,
};

/// The declaration of an output array.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ArrayDeclaration {
    /// The array name.
    pub name: String,
    /// The array shape.
    pub shape: ArrayShape,
    /// The on-disk data type.
    pub data_type: DataType,
    /// The fill value of unwritten elements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_value: Option<ScalarValue>,
    /// The chunk shape. [`None`] for a contiguous (unchunked) array.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_shape: Option<ChunkShape>,
    /// Per dimension, true if the dimension is unlimited.
    pub extensible: Vec<bool>,
    /// The dimension names.
    pub dimensions: Vec<String>,
    /// True if the array is a dimension scale (a coordinate).
    pub dimension_scale: bool,
    /// The encoding of the array.
    pub encoding: Encoding,
}

/// A sink error.
#[derive(Clone, Debug, Error)]
pub enum SinkError {
    /// An array has not been declared.
    #[error("array {0} has not been declared")]
    UnknownArray(String),
    /// An invalid array declaration.
    #[error("invalid declaration of array {0}: {1}")]
    InvalidDeclaration(String, String),
    /// Values do not match the data type of an array.
    #[error("{kind} values are incompatible with data type {data_type} of array {name}")]
    IncompatibleDataType {
        /// The array name.
        name: String,
        /// The value representation.
        kind: &'static str,
        /// The data type.
        data_type: DataType,
    },
    /// The fill value does not match the data type of an array.
    #[error(transparent)]
    IncompatibleFillValue(#[from] IncompatibleValuesError),
    /// Values or a subset do not match the array.
    #[error(transparent)]
    InvalidValues(#[from] SubsetValuesError),
    /// Any other error.
    #[error("{0}")]
    Other(String),
}

/// Sink traits.
pub trait SinkTraits: Send + Sync {
    /// Create the array described by `declaration`, replacing any existing array of the same name.
    ///
    /// # Errors
    /// Returns a [`SinkError`] if the declaration is invalid or there is an underlying error.
    fn create_array(&self, declaration: &ArrayDeclaration) -> Result<(), SinkError>;

    /// Store `values` (in C-contiguous order) into `subset` of the array `name`.
    ///
    /// # Errors
    /// Returns a [`SinkError`] if the array has not been declared, `subset` is out of bounds, `values` do not match the
    /// subset or data type of the array, or there is an underlying error.
    fn store_array_subset(
        &self,
        name: &str,
        subset: &ArraySubset,
        values: &ArrayValues,
    ) -> Result<(), SinkError>;
}
