//! Array and scalar values.
//!
//! [`ArrayValues`] is a flat buffer of elements in C-contiguous order.
//! Elements are held in one of five widened representations, and the concrete width is carried by an accompanying
//! [`DataType`].

use std::cmp::Ordering;

use chrono::NaiveDateTime;
use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    array_subset::{ArraySubset, IncompatibleArrayShapeError},
    data_type::DataType,
    selector::Selector,
};

/// A flat buffer of array elements.
#[derive(Clone, Debug, PartialEq, From)]
pub enum ArrayValues {
    /// Signed integers.
    Int(Vec<i64>),
    /// Unsigned integers.
    UInt(Vec<u64>),
    /// Floating point numbers.
    Float(Vec<f64>),
    /// Strings.
    String(Vec<String>),
    /// Datetimes. [`None`] is a missing datetime.
    DateTime(Vec<Option<NaiveDateTime>>),
}

/// A single value.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, PartialOrd, Display, From)]
#[serde(untagged)]
pub enum ScalarValue {
    /// A signed integer.
    #[display("{_0}")]
    Int(i64),
    /// An unsigned integer.
    #[display("{_0}")]
    UInt(u64),
    /// A floating point number.
    #[display("{_0}")]
    Float(f64),
    /// A datetime.
    #[display("{_0}")]
    DateTime(NaiveDateTime),
    /// A string.
    #[display("{_0}")]
    String(String),
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl ScalarValue {
    /// Return the numeric value as an `f64`, or [`None`] for strings and datetimes.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::UInt(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::String(_) | Self::DateTime(_) => None,
        }
    }

    /// Return the integer value as an `i128`, or [`None`] for non-integers.
    #[must_use]
    pub fn as_i128(&self) -> Option<i128> {
        match self {
            Self::Int(v) => Some(i128::from(*v)),
            Self::UInt(v) => Some(i128::from(*v)),
            _ => None,
        }
    }
}

/// Two value buffers (or a value buffer and a value) with incompatible representations.
#[derive(Copy, Clone, Debug, Error)]
#[error("incompatible values: {0} and {1}")]
pub struct IncompatibleValuesError(&'static str, &'static str);

impl IncompatibleValuesError {
    /// Create a new incompatible values error.
    #[must_use]
    pub const fn new(lhs: &'static str, rhs: &'static str) -> Self {
        Self(lhs, rhs)
    }
}

/// An error reading or writing a subset of a value buffer.
#[derive(Clone, Debug, Error)]
pub enum SubsetValuesError {
    /// The value representations differ.
    #[error(transparent)]
    IncompatibleValues(#[from] IncompatibleValuesError),
    /// The subset is not within the array shape.
    #[error(transparent)]
    IncompatibleArrayShape(#[from] IncompatibleArrayShapeError),
    /// The number of elements does not match.
    #[error("got {got} elements, expected {expected}")]
    InvalidLength {
        /// The number of elements supplied.
        got: u64,
        /// The number of elements expected.
        expected: u64,
    },
    /// The axis order is not a permutation of the dimensions.
    #[error("invalid axis order {0:?}")]
    InvalidAxisOrder(Vec<usize>),
}

macro_rules! from_vec_widened {
    ( $t:ty, $variant:ident, $w:ty ) => {
        impl From<Vec<$t>> for ArrayValues {
            fn from(values: Vec<$t>) -> Self {
                Self::$variant(values.into_iter().map(<$w>::from).collect())
            }
        }
    };
}

from_vec_widened!(i8, Int, i64);
from_vec_widened!(i16, Int, i64);
from_vec_widened!(i32, Int, i64);
from_vec_widened!(u8, UInt, u64);
from_vec_widened!(u16, UInt, u64);
from_vec_widened!(u32, UInt, u64);
from_vec_widened!(f32, Float, f64);

impl From<Vec<&str>> for ArrayValues {
    fn from(values: Vec<&str>) -> Self {
        Self::String(values.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<NaiveDateTime>> for ArrayValues {
    fn from(values: Vec<NaiveDateTime>) -> Self {
        Self::DateTime(values.into_iter().map(Some).collect())
    }
}

fn union_sorted<T: Clone>(a: &[T], b: &[T], cmp: impl Fn(&T, &T) -> Ordering) -> Vec<T> {
    let mut out: Vec<T> = a.iter().chain(b).cloned().collect();
    out.sort_by(&cmp);
    out.dedup_by(|x, y| cmp(x, y) == Ordering::Equal);
    out
}

fn positions_in<T: Clone>(a: &[T], b: &[T], cmp: impl Fn(&T, &T) -> Ordering) -> Vec<u64> {
    let mut sorted = b.to_vec();
    sorted.sort_by(&cmp);
    a.iter()
        .enumerate()
        .filter(|&(_, value)| sorted.binary_search_by(|candidate| cmp(candidate, value)).is_ok())
        .map(|(position, _)| position as u64)
        .collect()
}

fn strictly_increasing<T>(values: &[T], cmp: impl Fn(&T, &T) -> Ordering) -> bool {
    values
        .windows(2)
        .all(|pair| cmp(&pair[0], &pair[1]) == Ordering::Less)
}

fn gather<T: Clone>(values: &[T], positions: impl Iterator<Item = u64>) -> Vec<T> {
    positions
        .filter_map(|position| values.get(usize::try_from(position).ok()?).cloned())
        .collect()
}

fn scatter<T: Clone>(values: &mut [T], positions: impl Iterator<Item = u64>, src: &[T]) {
    for (position, value) in std::iter::zip(positions, src) {
        if let Some(dst) = usize::try_from(position)
            .ok()
            .and_then(|position| values.get_mut(position))
        {
            dst.clone_from(value);
        }
    }
}

/// Apply a generic expression to the buffer of a value buffer, producing a value buffer of the same representation.
macro_rules! map_values {
    ( $values:expr, |$v:ident| $body:expr ) => {
        match $values {
            ArrayValues::Int($v) => ArrayValues::Int($body),
            ArrayValues::UInt($v) => ArrayValues::UInt($body),
            ArrayValues::Float($v) => ArrayValues::Float($body),
            ArrayValues::String($v) => ArrayValues::String($body),
            ArrayValues::DateTime($v) => ArrayValues::DateTime($body),
        }
    };
}

impl ArrayValues {
    /// Return the name of the value representation.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::UInt(_) => "uint",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::DateTime(_) => "datetime",
        }
    }

    /// Return the number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Int(v) => v.len(),
            Self::UInt(v) => v.len(),
            Self::Float(v) => v.len(),
            Self::String(v) => v.len(),
            Self::DateTime(v) => v.len(),
        }
    }

    /// Returns true if there are no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return true if the value representation is the natural representation of `data_type`.
    #[must_use]
    pub const fn matches_data_type(&self, data_type: DataType) -> bool {
        match self {
            Self::Int(_) => data_type.is_signed_integer(),
            Self::UInt(_) => data_type.is_unsigned_integer(),
            Self::Float(_) => data_type.is_float(),
            Self::String(_) => matches!(data_type, DataType::String),
            Self::DateTime(_) => matches!(data_type, DataType::DateTime),
        }
    }

    /// Create `len` elements of `data_type` set to `fill_value`.
    ///
    /// Without a fill value, elements are zero (`NaN` for floats), empty strings, or missing datetimes.
    ///
    /// # Errors
    /// Returns [`IncompatibleValuesError`] if `fill_value` cannot represent an element of `data_type`.
    pub fn filled(
        data_type: DataType,
        len: usize,
        fill_value: Option<&ScalarValue>,
    ) -> Result<Self, IncompatibleValuesError> {
        let incompatible = |fill_value: &ScalarValue| {
            IncompatibleValuesError::new(data_type.name(), fill_value.kind_name())
        };
        Ok(match (data_type, fill_value) {
            (DataType::String, None) => Self::String(vec![String::new(); len]),
            (DataType::String, Some(ScalarValue::String(s))) => Self::String(vec![s.clone(); len]),
            (DataType::DateTime, None) => Self::DateTime(vec![None; len]),
            (DataType::DateTime, Some(ScalarValue::DateTime(dt))) => {
                Self::DateTime(vec![Some(*dt); len])
            }
            (data_type, None) if data_type.is_signed_integer() => Self::Int(vec![0; len]),
            (data_type, None) if data_type.is_unsigned_integer() => Self::UInt(vec![0; len]),
            (_, None) => Self::Float(vec![f64::NAN; len]),
            (data_type, Some(fill_value)) if data_type.is_signed_integer() => {
                let v = fill_value
                    .as_i128()
                    .and_then(|v| i64::try_from(v).ok())
                    .ok_or_else(|| incompatible(fill_value))?;
                Self::Int(vec![v; len])
            }
            (data_type, Some(fill_value)) if data_type.is_unsigned_integer() => {
                let v = fill_value
                    .as_i128()
                    .and_then(|v| u64::try_from(v).ok())
                    .ok_or_else(|| incompatible(fill_value))?;
                Self::UInt(vec![v; len])
            }
            (data_type, Some(fill_value)) if data_type.is_float() => {
                Self::Float(vec![fill_value.as_f64().ok_or_else(|| incompatible(fill_value))?; len])
            }
            (_, Some(fill_value)) => return Err(incompatible(fill_value)),
        })
    }

    /// Return the element at `position`.
    #[must_use]
    pub fn get(&self, position: usize) -> Option<ScalarValue> {
        match self {
            Self::Int(v) => v.get(position).copied().map(ScalarValue::Int),
            Self::UInt(v) => v.get(position).copied().map(ScalarValue::UInt),
            Self::Float(v) => v.get(position).copied().map(ScalarValue::Float),
            Self::String(v) => v.get(position).cloned().map(ScalarValue::String),
            Self::DateTime(v) => v.get(position).copied().flatten().map(ScalarValue::DateTime),
        }
    }

    /// Return the sorted union of the unique elements of `self` and `other`.
    ///
    /// # Errors
    /// Returns [`IncompatibleValuesError`] if the value representations differ.
    pub fn sorted_union(&self, other: &Self) -> Result<Self, IncompatibleValuesError> {
        Ok(match (self, other) {
            (Self::Int(a), Self::Int(b)) => Self::Int(union_sorted(a, b, Ord::cmp)),
            (Self::UInt(a), Self::UInt(b)) => Self::UInt(union_sorted(a, b, Ord::cmp)),
            (Self::Float(a), Self::Float(b)) => Self::Float(union_sorted(a, b, f64::total_cmp)),
            (Self::String(a), Self::String(b)) => Self::String(union_sorted(a, b, Ord::cmp)),
            (Self::DateTime(a), Self::DateTime(b)) => {
                Self::DateTime(union_sorted(a, b, Ord::cmp))
            }
            _ => {
                return Err(IncompatibleValuesError::new(
                    self.kind_name(),
                    other.kind_name(),
                ))
            }
        })
    }

    /// Return the unique elements of `self` in ascending order.
    #[must_use]
    pub fn sorted_unique(&self) -> Self {
        match self {
            Self::Int(v) => Self::Int(union_sorted(v, &[], Ord::cmp)),
            Self::UInt(v) => Self::UInt(union_sorted(v, &[], Ord::cmp)),
            Self::Float(v) => Self::Float(union_sorted(v, &[], f64::total_cmp)),
            Self::String(v) => Self::String(union_sorted(v, &[], Ord::cmp)),
            Self::DateTime(v) => Self::DateTime(union_sorted(v, &[], Ord::cmp)),
        }
    }

    /// Return the ascending positions of the elements of `self` that occur in `other`.
    ///
    /// # Errors
    /// Returns [`IncompatibleValuesError`] if the value representations differ.
    pub fn positions_in(&self, other: &Self) -> Result<Vec<u64>, IncompatibleValuesError> {
        Ok(match (self, other) {
            (Self::Int(a), Self::Int(b)) => positions_in(a, b, Ord::cmp),
            (Self::UInt(a), Self::UInt(b)) => positions_in(a, b, Ord::cmp),
            (Self::Float(a), Self::Float(b)) => positions_in(a, b, f64::total_cmp),
            (Self::String(a), Self::String(b)) => positions_in(a, b, Ord::cmp),
            (Self::DateTime(a), Self::DateTime(b)) => positions_in(a, b, Ord::cmp),
            _ => {
                return Err(IncompatibleValuesError::new(
                    self.kind_name(),
                    other.kind_name(),
                ))
            }
        })
    }

    /// Returns true if every element is strictly greater than the one before it.
    #[must_use]
    pub fn is_strictly_increasing(&self) -> bool {
        match self {
            Self::Int(v) => strictly_increasing(v, Ord::cmp),
            Self::UInt(v) => strictly_increasing(v, Ord::cmp),
            Self::Float(v) => strictly_increasing(v, f64::total_cmp),
            Self::String(v) => strictly_increasing(v, Ord::cmp),
            Self::DateTime(v) => strictly_increasing(v, Ord::cmp),
        }
    }

    /// Return the elements at the positions of `selector`.
    #[must_use]
    pub fn select(&self, selector: &Selector) -> Self {
        map_values!(self, |v| gather(v, selector.iter()))
    }

    /// Return the elements where `mask` is true.
    ///
    /// Elements beyond the end of `mask` are dropped.
    #[must_use]
    pub fn filter(&self, mask: &[bool]) -> Self {
        let positions = mask
            .iter()
            .enumerate()
            .filter(|&(_, &keep)| keep)
            .map(|(position, _)| position as u64);
        map_values!(self, |v| gather(v, positions))
    }

    /// Extract the elements of `subset` from `self`, an array with `array_shape`.
    ///
    /// # Errors
    /// Returns [`SubsetValuesError`] if `subset` is out of bounds or `self` does not hold `array_shape` elements.
    pub fn extract_subset(
        &self,
        array_shape: &[u64],
        subset: &ArraySubset,
    ) -> Result<Self, SubsetValuesError> {
        self.check_len(array_shape.iter().product())?;
        let positions = subset.iter_linearised_indices(array_shape)?;
        Ok(map_values!(self, |v| gather(v, positions)))
    }

    /// Store `values` into the elements of `subset` of `self`, an array with `array_shape`.
    ///
    /// # Errors
    /// Returns [`SubsetValuesError`] if `subset` is out of bounds, the number of elements of `self` or `values` is
    /// incorrect, or the value representations differ.
    pub fn store_subset(
        &mut self,
        array_shape: &[u64],
        subset: &ArraySubset,
        values: &Self,
    ) -> Result<(), SubsetValuesError> {
        self.check_len(array_shape.iter().product())?;
        values.check_len(subset.num_elements())?;
        let positions = subset.iter_linearised_indices(array_shape)?;
        match (self, values) {
            (Self::Int(dst), Self::Int(src)) => scatter(dst, positions, src),
            (Self::UInt(dst), Self::UInt(src)) => scatter(dst, positions, src),
            (Self::Float(dst), Self::Float(src)) => scatter(dst, positions, src),
            (Self::String(dst), Self::String(src)) => scatter(dst, positions, src),
            (Self::DateTime(dst), Self::DateTime(src)) => scatter(dst, positions, src),
            (dst, src) => {
                return Err(IncompatibleValuesError::new(dst.kind_name(), src.kind_name()).into())
            }
        }
        Ok(())
    }

    /// Permute the axes of `self`, an array with `shape`.
    ///
    /// Axis `i` of the output is axis `order[i]` of the input.
    ///
    /// # Errors
    /// Returns [`SubsetValuesError`] if `order` is not a permutation of the dimensions of `shape`
    /// or `self` does not hold `shape` elements.
    pub fn permuted(&self, shape: &[u64], order: &[usize]) -> Result<Self, SubsetValuesError> {
        let mut sorted_order = order.to_vec();
        sorted_order.sort_unstable();
        if sorted_order.len() != shape.len() || sorted_order.iter().enumerate().any(|(i, &o)| i != o)
        {
            return Err(SubsetValuesError::InvalidAxisOrder(order.to_vec()));
        }
        self.check_len(shape.iter().product())?;

        let invalid_length = || SubsetValuesError::InvalidLength {
            got: self.len() as u64,
            expected: shape.iter().product(),
        };
        let shape_usize = shape
            .iter()
            .map(|&extent| usize::try_from(extent))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| invalid_length())?;
        let indices = ndarray::ArrayD::from_shape_vec(shape_usize, (0..self.len() as u64).collect())
            .map_err(|_| invalid_length())?;
        let indices_permuted = indices.permuted_axes(order);
        Ok(map_values!(self, |v| gather(v, indices_permuted.iter().copied())))
    }

    fn check_len(&self, expected: u64) -> Result<(), SubsetValuesError> {
        let got = self.len() as u64;
        if got == expected {
            Ok(())
        } else {
            Err(SubsetValuesError::InvalidLength { got, expected })
        }
    }
}

impl ScalarValue {
    /// Return the name of the value representation.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::UInt(_) => "uint",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::DateTime(_) => "datetime",
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn values_sorted_union() {
        let a = ArrayValues::from(vec![1i64, 2, 3]);
        let b = ArrayValues::from(vec![5i64, 3, 4]);
        assert_eq!(
            a.sorted_union(&b).unwrap(),
            ArrayValues::Int(vec![1, 2, 3, 4, 5])
        );
        let c = ArrayValues::from(vec![1.5f64]);
        assert!(a.sorted_union(&c).is_err());
    }

    #[test]
    fn values_sorted_union_float_duplicates() {
        let a = ArrayValues::from(vec![0.5f64, 0.25]);
        let b = ArrayValues::from(vec![0.25f64, 1.0]);
        assert_eq!(
            a.sorted_union(&b).unwrap(),
            ArrayValues::Float(vec![0.25, 0.5, 1.0])
        );
    }

    #[test]
    fn values_positions_in() {
        let local = ArrayValues::from(vec![10i64, 20, 30, 40]);
        let global = ArrayValues::from(vec![10i64, 30, 40, 50]);
        assert_eq!(local.positions_in(&global).unwrap(), vec![0, 2, 3]);
        assert_eq!(global.positions_in(&local).unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn values_strictly_increasing() {
        assert!(ArrayValues::from(vec![1u8, 2, 3]).is_strictly_increasing());
        assert!(!ArrayValues::from(vec![1u8, 1, 3]).is_strictly_increasing());
        assert!(!ArrayValues::from(vec!["b", "a"]).is_strictly_increasing());
        assert!(ArrayValues::from(Vec::<i64>::new()).is_strictly_increasing());
    }

    #[test]
    fn values_select_filter() {
        let values = ArrayValues::from(vec!["a", "b", "c", "d"]);
        assert_eq!(
            values.select(&Selector::Indices(vec![0, 3])),
            ArrayValues::from(vec!["a", "d"])
        );
        assert_eq!(
            values.select(&Selector::Range(1..3)),
            ArrayValues::from(vec!["b", "c"])
        );
        assert_eq!(
            values.filter(&[true, false, true, false]),
            ArrayValues::from(vec!["a", "c"])
        );
    }

    #[test]
    fn values_subsets() {
        let mut values = ArrayValues::from(vec![0i32; 16]);
        let subset = ArraySubset::new_with_ranges(&[1..3, 1..3]);
        values
            .store_subset(&[4, 4], &subset, &ArrayValues::from(vec![1i32, 2, 3, 4]))
            .unwrap();
        assert_eq!(
            values,
            ArrayValues::from(vec![0i32, 0, 0, 0, 0, 1, 2, 0, 0, 3, 4, 0, 0, 0, 0, 0])
        );
        assert_eq!(
            values.extract_subset(&[4, 4], &subset).unwrap(),
            ArrayValues::from(vec![1i32, 2, 3, 4])
        );
        assert!(values
            .store_subset(&[4, 4], &subset, &ArrayValues::from(vec![1i32, 2]))
            .is_err());
        assert!(values
            .store_subset(&[4, 4], &subset, &ArrayValues::from(vec![1.0f32; 4]))
            .is_err());
        assert!(values.extract_subset(&[4, 2], &subset).is_err());
    }

    #[test]
    fn values_permuted() {
        // 2x3 -> 3x2
        let values = ArrayValues::from(vec![0u16, 1, 2, 3, 4, 5]);
        assert_eq!(
            values.permuted(&[2, 3], &[1, 0]).unwrap(),
            ArrayValues::from(vec![0u16, 3, 1, 4, 2, 5])
        );
        assert_eq!(values.permuted(&[2, 3], &[0, 1]).unwrap(), values);
        assert!(values.permuted(&[2, 3], &[0, 0]).is_err());
        assert!(values.permuted(&[2, 2], &[1, 0]).is_err());
        assert!(ArrayValues::Int(vec![])
            .permuted(&[0, u64::MAX], &[1, 0])
            .is_err());
    }

    #[test]
    fn scalar_value_serde() {
        let datetime = NaiveDate::from_ymd_opt(2000, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        for value in [
            ScalarValue::DateTime(datetime),
            ScalarValue::String("abc".to_string()),
            ScalarValue::Int(-3),
            ScalarValue::Float(0.5),
        ] {
            let json = serde_json::to_value(&value).unwrap();
            assert_eq!(serde_json::from_value::<ScalarValue>(json).unwrap(), value);
        }
        assert_eq!(
            serde_json::from_str::<ScalarValue>("\"2000-01-02T03:04:05\"").unwrap(),
            ScalarValue::DateTime(datetime)
        );
    }

    #[test]
    fn values_filled() {
        assert_eq!(
            ArrayValues::filled(DataType::Int16, 2, Some(&ScalarValue::Int(-1))).unwrap(),
            ArrayValues::Int(vec![-1, -1])
        );
        assert_eq!(
            ArrayValues::filled(DataType::UInt8, 2, None).unwrap(),
            ArrayValues::UInt(vec![0, 0])
        );
        assert!(ArrayValues::filled(DataType::UInt8, 2, Some(&ScalarValue::Int(-1))).is_err());
        assert!(ArrayValues::filled(DataType::String, 1, Some(&ScalarValue::Int(0))).is_err());
        let ArrayValues::Float(nan) = ArrayValues::filled(DataType::Float32, 1, None).unwrap() else {
            panic!()
        };
        assert!(nan[0].is_nan());
    }

    #[test]
    fn values_get_and_datetime() {
        let dt = NaiveDate::from_ymd_opt(2020, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let values = ArrayValues::DateTime(vec![Some(dt), None]);
        assert_eq!(values.get(0), Some(ScalarValue::DateTime(dt)));
        assert_eq!(values.get(1), None);
        assert!(values.matches_data_type(DataType::DateTime));
        assert_eq!(ScalarValue::Int(3).to_string(), "3");
    }
}
