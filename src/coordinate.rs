//! Unified coordinates.
//!
//! An [`Axis`] is the unified coordinate of one dimension across all sources: the sorted union of the on-disk
//! values of every source coordinate with its name.
//! [`unify_coordinates`] builds the axes of a set of sources.

use std::collections::BTreeMap;

use crate::{
    codec::{cast, decode, encode, Encoding, EncodingError},
    merge::MergeError,
    source::{Representation, Source, SourceTraits},
    values::ArrayValues,
};

/// Unified axes by name.
pub type Axes = BTreeMap<String, Axis>;

/// Encodings by array name.
pub type Encodings = BTreeMap<String, Encoding>;

/// A unified coordinate axis.
///
/// The values are held in their on-disk encoding, are unique, and are in ascending order.
#[derive(Clone, Debug, PartialEq)]
pub struct Axis {
    name: String,
    values: ArrayValues,
    encoding: Encoding,
}

impl Axis {
    /// Create a new axis.
    ///
    /// `values` are sorted and duplicates are removed.
    #[must_use]
    pub fn new(name: impl Into<String>, values: &ArrayValues, encoding: Encoding) -> Self {
        Self {
            name: name.into(),
            values: values.sorted_unique(),
            encoding,
        }
    }

    /// Return the name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the on-disk values.
    #[must_use]
    pub const fn values(&self) -> &ArrayValues {
        &self.values
    }

    /// Return the encoding.
    #[must_use]
    pub const fn encoding(&self) -> &Encoding {
        &self.encoding
    }

    /// Return the number of elements.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.values.len() as u64
    }

    /// Returns true if the axis has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Return the decoded values.
    ///
    /// # Errors
    /// Returns [`EncodingError`] if the values cannot be decoded.
    pub fn decoded(&self) -> Result<ArrayValues, EncodingError> {
        decode(&self.values, &self.encoding)
    }

    /// Return a copy of the axis with only the elements where `mask` is true.
    #[must_use]
    pub fn filtered(&self, mask: &[bool]) -> Self {
        Self {
            name: self.name.clone(),
            values: self.values.filter(mask),
            encoding: self.encoding.clone(),
        }
    }
}

/// Normalise `values` of a source with `representation` to their on-disk `encoding`.
///
/// Decoded values (of a labelled source, or datetimes) are encoded, and stored values are cast to the on-disk data
/// type.
///
/// # Errors
/// Returns [`EncodingError`] if the values cannot be encoded or cast.
pub fn normalise(
    representation: Representation,
    values: &ArrayValues,
    encoding: &Encoding,
) -> Result<ArrayValues, EncodingError> {
    if representation == Representation::Labelled || matches!(values, ArrayValues::DateTime(_)) {
        encode(values, encoding)
    } else {
        cast(values, encoding.data_type())
    }
}

/// Return the encoding of the array `name` of `source` from `encodings`, or derive it from the source.
pub(crate) fn encoding_of(
    source: &dyn SourceTraits,
    name: &str,
    encodings: &Encodings,
) -> Result<Encoding, MergeError> {
    if let Some(encoding) = encodings.get(name) {
        Ok(encoding.clone())
    } else {
        let info = source.array_info(name)?;
        Ok(Encoding::from_attributes(
            info.data_type(),
            info.attributes(),
        )?)
    }
}

/// Retrieve the coordinate `name` of `source` normalised to its on-disk encoding.
pub(crate) fn normalised_coordinate(
    source: &dyn SourceTraits,
    name: &str,
    encodings: &Encodings,
) -> Result<ArrayValues, MergeError> {
    let encoding = encoding_of(source, name, encodings)?;
    let values = source.retrieve(name)?;
    Ok(normalise(source.representation(), &values, &encoding)?)
}

/// Unify the coordinates of `sources`.
///
/// Each axis is the sorted union of the unique on-disk values of every source coordinate with its name.
/// The order of `sources` does not change the values of an axis.
///
/// # Errors
/// Returns [`MergeError`] if a coordinate cannot be retrieved or normalised, or two sources hold a coordinate in
/// incompatible representations.
pub fn unify_coordinates(sources: &[Source], encodings: &Encodings) -> Result<Axes, MergeError> {
    let mut axes = Axes::new();
    for source in sources {
        for name in source.coordinate_names() {
            let values = normalised_coordinate(source.as_ref(), &name, encodings)?;
            if let Some(axis) = axes.get_mut(&name) {
                axis.values = axis.values.sorted_union(&values)?;
            } else {
                let encoding = encoding_of(source.as_ref(), &name, encodings)?;
                axes.insert(name.clone(), Axis::new(name, &values, encoding));
            }
        }
    }
    Ok(axes)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{data_type::DataType, source::MemorySource};

    use super::*;

    fn time_source(values: Vec<i64>) -> Source {
        let mut source = MemorySource::stored();
        source
            .add_coordinate("time", DataType::Int64, values)
            .unwrap();
        Arc::new(source)
    }

    #[test]
    fn coordinate_union() {
        let sources = vec![time_source(vec![1, 2, 3]), time_source(vec![3, 4, 5])];
        let axes = unify_coordinates(&sources, &Encodings::new()).unwrap();
        let time = axes.get("time").unwrap();
        assert_eq!(time.values(), &ArrayValues::Int(vec![1, 2, 3, 4, 5]));
        assert_eq!(time.len(), 5);
        assert_eq!(time.encoding().data_type(), DataType::Int64);
    }

    #[test]
    fn coordinate_union_order_independent() {
        let a = time_source(vec![7, 1, 3]);
        let b = time_source(vec![2, 3, 9]);
        let forward = unify_coordinates(&[a.clone(), b.clone()], &Encodings::new()).unwrap();
        let reverse = unify_coordinates(&[b, a], &Encodings::new()).unwrap();
        assert_eq!(
            forward.get("time").unwrap().values(),
            reverse.get("time").unwrap().values()
        );
        assert_eq!(
            forward.get("time").unwrap().values(),
            &ArrayValues::Int(vec![1, 2, 3, 7, 9])
        );
    }

    #[test]
    fn coordinate_labelled_datetimes_are_encoded() {
        let mut source = MemorySource::labelled();
        let datetimes = ["2000-01-01", "2000-01-02"]
            .into_iter()
            .map(|s| crate::codec::parse_datetime(s).unwrap())
            .collect::<Vec<_>>();
        source
            .add_coordinate("time", DataType::DateTime, datetimes.clone())
            .unwrap();
        let axes = unify_coordinates(&[Arc::new(source)], &Encodings::new()).unwrap();
        let time = axes.get("time").unwrap();
        assert_eq!(time.encoding().data_type(), DataType::Int64);
        assert_eq!(
            time.values(),
            &ArrayValues::Int(vec![946_684_800, 946_771_200])
        );
        assert_eq!(time.decoded().unwrap(), ArrayValues::from(datetimes));
    }

    #[test]
    fn coordinate_stored_cast_to_encoding() {
        let mut source = MemorySource::stored();
        source
            .add_coordinate("x", DataType::Int16, vec![3i16, 1])
            .unwrap();
        let mut encodings = Encodings::new();
        encodings.insert("x".to_string(), Encoding::new(DataType::UInt8));
        let axes = unify_coordinates(&[Arc::new(source)], &encodings).unwrap();
        assert_eq!(axes.get("x").unwrap().values(), &ArrayValues::UInt(vec![1, 3]));
    }

    #[test]
    fn coordinate_filtered() {
        let axis = Axis::new("x", &ArrayValues::Int(vec![3, 1, 2]), Encoding::new(DataType::Int8));
        assert_eq!(axis.values(), &ArrayValues::Int(vec![1, 2, 3]));
        let filtered = axis.filtered(&[true, false, true]);
        assert_eq!(filtered.values(), &ArrayValues::Int(vec![1, 3]));
        assert_eq!(axis.len(), 3);
    }
}
