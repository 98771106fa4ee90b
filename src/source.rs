//! Sources of array data.
//!
//! A source is a dataset of one-dimensional coordinate arrays and variables defined over them.
//! Each coordinate is a dimension scale: its single dimension is named after the coordinate itself.
//! A variable references coordinates by name through its dimension names.
//!
//! Sources implement [`SourceTraits`] and are shared as [`Source`] handles.
//! A source holds its arrays in one of two [representations](Representation):
//!  - [`Representation::Stored`]: values are held in their on-disk encoding and the encoding is described by the
//!    attributes of each array (e.g. `scale_factor`, `calendar`), or
//!  - [`Representation::Labelled`]: values are held decoded and the attributes describe the encoding to apply on write.
//!
//! [`MemorySource`] is an in-memory source.

mod memory_source;

pub use memory_source::MemorySource;

use std::sync::Arc;

use thiserror::Error;

use crate::{
    array_subset::ArraySubset,
    data_type::DataType,
    values::{ArrayValues, SubsetValuesError},
    ArrayShape,
};

/// The position of a source in the list of sources of a merge.
pub type SourceId = usize;

/// [`Arc`] wrapped source.
pub type Source = Arc<dyn SourceTraits>;

/// The representation of the values held by a source.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Representation {
    /// Values are held in their on-disk encoding.
    Stored,
    /// Values are held decoded.
    Labelled,
}

/// Information about an array of a source.
#[derive(Clone, Debug, PartialEq)]
pub struct ArrayInfo {
    dimensions: Vec<String>,
    shape: ArrayShape,
    data_type: DataType,
    attributes: serde_json::Map<String, serde_json::Value>,
}

impl ArrayInfo {
    /// Create new array information.
    ///
    /// # Errors
    /// Returns [`SourceError::InvalidDimensions`] if the number of `dimensions` does not match the dimensionality of
    /// `shape`.
    pub fn new(
        dimensions: Vec<String>,
        shape: ArrayShape,
        data_type: DataType,
        attributes: serde_json::Map<String, serde_json::Value>,
    ) -> Result<Self, SourceError> {
        if dimensions.len() == shape.len() {
            Ok(Self {
                dimensions,
                shape,
                data_type,
                attributes,
            })
        } else {
            Err(SourceError::InvalidDimensions(dimensions, shape))
        }
    }

    /// Return the dimension names.
    #[must_use]
    pub fn dimensions(&self) -> &[String] {
        &self.dimensions
    }

    /// Return the shape.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    /// Return the data type.
    #[must_use]
    pub const fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Return the attributes.
    #[must_use]
    pub const fn attributes(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.attributes
    }

    /// Return a mutable reference to the attributes.
    pub fn attributes_mut(&mut self) -> &mut serde_json::Map<String, serde_json::Value> {
        &mut self.attributes
    }
}

/// A source error.
#[derive(Clone, Debug, Error)]
pub enum SourceError {
    /// An array does not exist.
    #[error("array {0} does not exist")]
    UnknownArray(String),
    /// An array name is already used.
    #[error("array {0} already exists")]
    ArrayExists(String),
    /// A variable dimension is not a coordinate of the source.
    #[error("dimension {0} is not a coordinate")]
    MissingDimension(String),
    /// The dimension names do not match the shape.
    #[error("dimensions {0:?} do not match shape {1:?}")]
    InvalidDimensions(Vec<String>, ArrayShape),
    /// Values do not match the data type of an array.
    #[error("{kind} values are incompatible with data type {data_type}")]
    IncompatibleDataType {
        /// The value representation.
        kind: &'static str,
        /// The data type.
        data_type: DataType,
    },
    /// Values or a subset do not match the array.
    #[error(transparent)]
    InvalidValues(#[from] SubsetValuesError),
    /// Any other error.
    #[error("{0}")]
    Other(String),
}

/// Source traits.
pub trait SourceTraits: core::fmt::Debug + Send + Sync {
    /// Return the representation of the values held by the source.
    fn representation(&self) -> Representation;

    /// Return the names of the coordinates.
    fn coordinate_names(&self) -> Vec<String>;

    /// Return the names of the variables.
    fn variable_names(&self) -> Vec<String>;

    /// Return information about the array `name`.
    ///
    /// # Errors
    /// Returns [`SourceError::UnknownArray`] if the array does not exist.
    fn array_info(&self, name: &str) -> Result<ArrayInfo, SourceError>;

    /// Retrieve the elements of `subset` of the array `name` in C-contiguous order.
    ///
    /// # Errors
    /// Returns a [`SourceError`] if the array does not exist, `subset` is out of bounds, or there is an underlying
    /// error.
    fn retrieve_subset(&self, name: &str, subset: &ArraySubset)
        -> Result<ArrayValues, SourceError>;

    /// Retrieve all elements of the array `name` in C-contiguous order.
    ///
    /// # Errors
    /// Returns a [`SourceError`] if the array does not exist or there is an underlying error.
    fn retrieve(&self, name: &str) -> Result<ArrayValues, SourceError> {
        let info = self.array_info(name)?;
        self.retrieve_subset(name, &ArraySubset::new_with_shape(info.shape().to_vec()))
    }
}
