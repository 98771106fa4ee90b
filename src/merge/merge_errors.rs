use thiserror::Error;

use crate::{
    codec::EncodingError,
    selection::SelectionError,
    sink::SinkError,
    source::{SourceError, SourceId},
    values::{IncompatibleValuesError, SubsetValuesError},
};

/// A merge error.
#[derive(Debug, Error)]
pub enum MergeError {
    /// An invalid encoding.
    #[error(transparent)]
    EncodingError(#[from] EncodingError),
    /// An error reading from a source.
    #[error(transparent)]
    SourceError(#[from] SourceError),
    /// An error writing to a sink.
    #[error(transparent)]
    SinkError(#[from] SinkError),
    /// An invalid selection.
    #[error(transparent)]
    SelectionError(#[from] SelectionError),
    /// Values of incompatible representations were combined.
    #[error(transparent)]
    IncompatibleValues(#[from] IncompatibleValuesError),
    /// Values or a subset that do not match an array.
    #[error(transparent)]
    SubsetValues(#[from] SubsetValuesError),
    /// A variable has a different set of dimensions in two sources.
    #[error("variable {variable} has dimensions {dimensions:?} in source {source_id}, expected {expected:?}")]
    DimensionMismatch {
        /// The variable name.
        variable: String,
        /// The source.
        source_id: SourceId,
        /// The dimensions in the source.
        dimensions: Vec<String>,
        /// The dimensions of the variable.
        expected: Vec<String>,
    },
    /// A variable dimension has no coordinate.
    #[error("dimension {dimension} of variable {variable} has no coordinate")]
    MissingCoordinate {
        /// The variable name.
        variable: String,
        /// The dimension name.
        dimension: String,
    },
    /// A coordinate of a source is not strictly increasing.
    #[error("coordinate {0} of source {1} is not strictly increasing")]
    UnsortedCoordinate(String, SourceId),
    /// A chunk shape override does not match the dimensionality of an array.
    #[error("chunk shape {chunk_shape:?} does not match the dimensionality {dimensionality} of array {name}")]
    InvalidChunkShape {
        /// The array name.
        name: String,
        /// The chunk shape.
        chunk_shape: Vec<u64>,
        /// The dimensionality of the array.
        dimensionality: usize,
    },
}
