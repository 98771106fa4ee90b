//! An in-memory source.

use std::collections::BTreeMap;

use crate::{
    array_subset::ArraySubset,
    data_type::DataType,
    values::{ArrayValues, SubsetValuesError},
};

use super::{ArrayInfo, Representation, SourceError, SourceTraits};

#[derive(Debug)]
struct MemoryArray {
    info: ArrayInfo,
    values: ArrayValues,
    is_coordinate: bool,
}

/// An in-memory source.
///
/// Arrays are added with [`add_coordinate`](MemorySource::add_coordinate) and
/// [`add_variable`](MemorySource::add_variable), and encoding attributes with
/// [`set_attribute`](MemorySource::set_attribute).
#[derive(Debug)]
pub struct MemorySource {
    representation: Representation,
    arrays: BTreeMap<String, MemoryArray>,
}

impl MemorySource {
    /// Create a new empty memory source with the given `representation`.
    #[must_use]
    pub fn new(representation: Representation) -> Self {
        Self {
            representation,
            arrays: BTreeMap::default(),
        }
    }

    /// Create a new empty memory source holding values in their on-disk encoding.
    #[must_use]
    pub fn stored() -> Self {
        Self::new(Representation::Stored)
    }

    /// Create a new empty memory source holding decoded values.
    #[must_use]
    pub fn labelled() -> Self {
        Self::new(Representation::Labelled)
    }

    fn check_values(data_type: DataType, values: &ArrayValues) -> Result<(), SourceError> {
        if values.matches_data_type(data_type) {
            Ok(())
        } else {
            Err(SourceError::IncompatibleDataType {
                kind: values.kind_name(),
                data_type,
            })
        }
    }

    fn check_name(&self, name: &str) -> Result<(), SourceError> {
        if self.arrays.contains_key(name) {
            Err(SourceError::ArrayExists(name.to_string()))
        } else {
            Ok(())
        }
    }

    /// Add a one-dimensional coordinate `name` with `data_type` and `values`.
    ///
    /// # Errors
    /// Returns a [`SourceError`] if an array named `name` already exists or `values` do not match `data_type`.
    pub fn add_coordinate(
        &mut self,
        name: &str,
        data_type: DataType,
        values: impl Into<ArrayValues>,
    ) -> Result<&mut Self, SourceError> {
        let values = values.into();
        self.check_name(name)?;
        Self::check_values(data_type, &values)?;
        let info = ArrayInfo::new(
            vec![name.to_string()],
            vec![values.len() as u64],
            data_type,
            serde_json::Map::default(),
        )?;
        self.arrays.insert(
            name.to_string(),
            MemoryArray {
                info,
                values,
                is_coordinate: true,
            },
        );
        Ok(self)
    }

    /// Add a variable `name` over the coordinates `dimensions` with `data_type` and `values` in C-contiguous order.
    ///
    /// A variable with no dimensions is a scalar with one element.
    ///
    /// # Errors
    /// Returns a [`SourceError`] if an array named `name` already exists, a dimension is not a coordinate of the
    /// source, `values` do not match `data_type`, or the number of values does not match the shape of the dimensions.
    pub fn add_variable(
        &mut self,
        name: &str,
        dimensions: &[&str],
        data_type: DataType,
        values: impl Into<ArrayValues>,
    ) -> Result<&mut Self, SourceError> {
        let values = values.into();
        self.check_name(name)?;
        Self::check_values(data_type, &values)?;
        let shape = dimensions
            .iter()
            .map(|dimension| match self.arrays.get(*dimension) {
                Some(array) if array.is_coordinate => Ok(array.values.len() as u64),
                _ => Err(SourceError::MissingDimension((*dimension).to_string())),
            })
            .collect::<Result<Vec<_>, _>>()?;
        let expected: u64 = shape.iter().product();
        if values.len() as u64 != expected {
            return Err(SubsetValuesError::InvalidLength {
                got: values.len() as u64,
                expected,
            }
            .into());
        }
        let info = ArrayInfo::new(
            dimensions.iter().map(ToString::to_string).collect(),
            shape,
            data_type,
            serde_json::Map::default(),
        )?;
        self.arrays.insert(
            name.to_string(),
            MemoryArray {
                info,
                values,
                is_coordinate: false,
            },
        );
        Ok(self)
    }

    /// Set the attribute `key` of the array `name` to `value`.
    ///
    /// # Errors
    /// Returns [`SourceError::UnknownArray`] if the array does not exist.
    pub fn set_attribute(
        &mut self,
        name: &str,
        key: &str,
        value: impl Into<serde_json::Value>,
    ) -> Result<&mut Self, SourceError> {
        self.arrays
            .get_mut(name)
            .ok_or_else(|| SourceError::UnknownArray(name.to_string()))?
            .info
            .attributes_mut()
            .insert(key.to_string(), value.into());
        Ok(self)
    }

    fn array(&self, name: &str) -> Result<&MemoryArray, SourceError> {
        self.arrays
            .get(name)
            .ok_or_else(|| SourceError::UnknownArray(name.to_string()))
    }
}

impl SourceTraits for MemorySource {
    fn representation(&self) -> Representation {
        self.representation
    }

    fn coordinate_names(&self) -> Vec<String> {
        self.arrays
            .iter()
            .filter(|(_, array)| array.is_coordinate)
            .map(|(name, _)| name.clone())
            .collect()
    }

    fn variable_names(&self) -> Vec<String> {
        self.arrays
            .iter()
            .filter(|(_, array)| !array.is_coordinate)
            .map(|(name, _)| name.clone())
            .collect()
    }

    fn array_info(&self, name: &str) -> Result<ArrayInfo, SourceError> {
        Ok(self.array(name)?.info.clone())
    }

    fn retrieve_subset(
        &self,
        name: &str,
        subset: &ArraySubset,
    ) -> Result<ArrayValues, SourceError> {
        let array = self.array(name)?;
        Ok(array.values.extract_subset(array.info.shape(), subset)?)
    }

    fn retrieve(&self, name: &str) -> Result<ArrayValues, SourceError> {
        Ok(self.array(name)?.values.clone())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn source() -> MemorySource {
        let mut source = MemorySource::stored();
        source
            .add_coordinate("y", DataType::Int32, vec![0i32, 1])
            .unwrap()
            .add_coordinate("x", DataType::Float64, vec![0.5f64, 1.5, 2.5])
            .unwrap()
            .add_variable("data", &["y", "x"], DataType::UInt8, vec![0u8, 1, 2, 3, 4, 5])
            .unwrap();
        source
    }

    #[test]
    fn memory_source_arrays() {
        let source = source();
        assert_eq!(source.representation(), Representation::Stored);
        assert_eq!(source.coordinate_names(), vec!["x", "y"]);
        assert_eq!(source.variable_names(), vec!["data"]);
        let info = source.array_info("data").unwrap();
        assert_eq!(info.dimensions(), &["y", "x"]);
        assert_eq!(info.shape(), &[2, 3]);
        assert_eq!(info.data_type(), DataType::UInt8);
        assert!(source.array_info("z").is_err());
    }

    #[test]
    fn memory_source_retrieve() {
        let source = source();
        assert_eq!(
            source
                .retrieve_subset("data", &ArraySubset::new_with_ranges(&[1..2, 1..3]))
                .unwrap(),
            ArrayValues::from(vec![4u8, 5])
        );
        assert_eq!(
            source.retrieve("y").unwrap(),
            ArrayValues::from(vec![0i32, 1])
        );
        assert!(source
            .retrieve_subset("data", &ArraySubset::new_with_ranges(&[1..3, 0..3]))
            .is_err());
    }

    #[test]
    fn memory_source_validation() {
        let mut source = source();
        assert!(matches!(
            source.add_variable("bad", &["z"], DataType::UInt8, vec![0u8]),
            Err(SourceError::MissingDimension(_))
        ));
        assert!(matches!(
            source.add_variable("bad", &["x"], DataType::UInt8, vec![0u8]),
            Err(SourceError::InvalidValues(_))
        ));
        assert!(matches!(
            source.add_variable("bad", &["y"], DataType::UInt8, vec![0.0f64, 1.0]),
            Err(SourceError::IncompatibleDataType { .. })
        ));
        assert!(matches!(
            source.add_coordinate("x", DataType::Int8, vec![0i8]),
            Err(SourceError::ArrayExists(_))
        ));
        assert!(source
            .add_variable("scalar", &[], DataType::Int64, vec![7i64])
            .is_ok());
    }

    #[test]
    fn memory_source_attributes() {
        let mut source = source();
        source
            .set_attribute("data", "scale_factor", 0.5)
            .unwrap()
            .set_attribute("data", "dtype", "uint8")
            .unwrap();
        let info = source.array_info("data").unwrap();
        assert_eq!(info.attributes().get("scale_factor"), Some(&json!(0.5)));
        assert!(source.set_attribute("z", "units", "m").is_err());
    }
}
