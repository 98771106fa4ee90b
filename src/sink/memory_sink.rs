//! An in-memory sink.

use std::collections::BTreeMap;

use parking_lot::Mutex;

use crate::{array_subset::ArraySubset, values::ArrayValues};

use super::{ArrayDeclaration, SinkError, SinkTraits};

#[derive(Debug)]
struct MemorySinkArray {
    declaration: ArrayDeclaration,
    values: ArrayValues,
}

/// An in-memory sink.
///
/// Arrays are initialised with their fill value.
#[derive(Debug, Default)]
pub struct MemorySink {
    arrays: Mutex<BTreeMap<String, MemorySinkArray>>,
}

impl MemorySink {
    /// Create a new empty memory sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the names of the declared arrays.
    #[must_use]
    pub fn array_names(&self) -> Vec<String> {
        self.arrays.lock().keys().cloned().collect()
    }

    /// Return the declaration of the array `name`.
    #[must_use]
    pub fn declaration(&self, name: &str) -> Option<ArrayDeclaration> {
        self.arrays
            .lock()
            .get(name)
            .map(|array| array.declaration.clone())
    }

    /// Return the elements of the array `name` in C-contiguous order.
    #[must_use]
    pub fn retrieve(&self, name: &str) -> Option<ArrayValues> {
        self.arrays.lock().get(name).map(|array| array.values.clone())
    }
}

impl SinkTraits for MemorySink {
    fn create_array(&self, declaration: &ArrayDeclaration) -> Result<(), SinkError> {
        let invalid = |reason: &str| {
            SinkError::InvalidDeclaration(declaration.name.clone(), reason.to_string())
        };
        let dimensionality = declaration.shape.len();
        if declaration.dimensions.len() != dimensionality {
            return Err(invalid("dimension names do not match the shape"));
        }
        if declaration.extensible.len() != dimensionality {
            return Err(invalid("extensible flags do not match the shape"));
        }
        if let Some(chunk_shape) = &declaration.chunk_shape {
            if chunk_shape.dimensionality() != dimensionality {
                return Err(invalid("chunk shape does not match the shape"));
            }
        }
        let num_elements = usize::try_from(declaration.shape.iter().product::<u64>())
            .map_err(|_| invalid("too many elements"))?;
        let values = ArrayValues::filled(
            declaration.data_type,
            num_elements,
            declaration.fill_value.as_ref(),
        )?;
        self.arrays.lock().insert(
            declaration.name.clone(),
            MemorySinkArray {
                declaration: declaration.clone(),
                values,
            },
        );
        Ok(())
    }

    fn store_array_subset(
        &self,
        name: &str,
        subset: &ArraySubset,
        values: &ArrayValues,
    ) -> Result<(), SinkError> {
        let mut arrays = self.arrays.lock();
        let array = arrays
            .get_mut(name)
            .ok_or_else(|| SinkError::UnknownArray(name.to_string()))?;
        let data_type = array.declaration.data_type;
        if !values.matches_data_type(data_type) {
            return Err(SinkError::IncompatibleDataType {
                name: name.to_string(),
                kind: values.kind_name(),
                data_type,
            });
        }
        array
            .values
            .store_subset(&array.declaration.shape, subset, values)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::{codec::Encoding, data_type::DataType, values::ScalarValue};

    use super::*;

    fn declaration() -> ArrayDeclaration {
        ArrayDeclaration {
            name: "data".to_string(),
            shape: vec![2, 3],
            data_type: DataType::Int16,
            fill_value: Some(ScalarValue::Int(-1)),
            chunk_shape: Some(vec![1, 3].try_into().unwrap()),
            extensible: vec![false, false],
            dimensions: vec!["y".to_string(), "x".to_string()],
            dimension_scale: false,
            encoding: Encoding::new(DataType::Int16),
        }
    }

    #[test]
    fn memory_sink_create_store() {
        let sink = MemorySink::new();
        sink.create_array(&declaration()).unwrap();
        assert_eq!(sink.array_names(), vec!["data"]);
        assert_eq!(sink.retrieve("data"), Some(ArrayValues::Int(vec![-1; 6])));
        sink.store_array_subset(
            "data",
            &ArraySubset::new_with_ranges(&[1..2, 0..2]),
            &ArrayValues::Int(vec![5, 6]),
        )
        .unwrap();
        assert_eq!(
            sink.retrieve("data"),
            Some(ArrayValues::Int(vec![-1, -1, -1, 5, 6, -1]))
        );
        assert_eq!(sink.declaration("data"), Some(declaration()));
    }

    #[test]
    fn memory_sink_errors() {
        let sink = MemorySink::new();
        let subset = ArraySubset::new_with_ranges(&[0..1, 0..1]);
        assert!(matches!(
            sink.store_array_subset("data", &subset, &ArrayValues::Int(vec![0])),
            Err(SinkError::UnknownArray(_))
        ));
        sink.create_array(&declaration()).unwrap();
        assert!(matches!(
            sink.store_array_subset("data", &subset, &ArrayValues::Float(vec![0.0])),
            Err(SinkError::IncompatibleDataType { .. })
        ));
        assert!(matches!(
            sink.store_array_subset("data", &subset, &ArrayValues::Int(vec![0, 1])),
            Err(SinkError::InvalidValues(_))
        ));
        assert!(sink
            .store_array_subset(
                "data",
                &ArraySubset::new_with_ranges(&[0..3, 0..1]),
                &ArrayValues::Int(vec![0; 3])
            )
            .is_err());

        let mut invalid = declaration();
        invalid.extensible = vec![true];
        assert!(matches!(
            sink.create_array(&invalid),
            Err(SinkError::InvalidDeclaration(..))
        ));
        let mut invalid = declaration();
        invalid.fill_value = Some(ScalarValue::from("x"));
        assert!(matches!(
            sink.create_array(&invalid),
            Err(SinkError::IncompatibleFillValue(_))
        ));
    }
}
