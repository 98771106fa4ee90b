//! Encoding and decoding of array values.
//!
//! An [`Encoding`] describes the relationship between the values of an array held on disk and its decoded values:
//!  - a linear `scale_factor`/`add_offset` transformation packing floating point values into integers,
//!  - a `missing_value` sentinel standing in for `NaN` or a missing datetime, and
//!  - datetimes stored as a number of time `units` since a reference datetime in a `calendar`.
//!
//! [`encode`] and [`decode`] apply an encoding, and [`cast`] converts values between data types.
//! Decoding an encoded value reproduces it exactly, except for the quantisation of a scale factor.

mod datetime;
mod encoding;

pub use datetime::{
    check_calendar, parse_datetime, TimeUnit, TimeUnits, DEFAULT_CALENDAR, DEFAULT_TIME_UNITS,
};
pub use encoding::{Encoding, EncodingConflictError, ENCODING_ATTRIBUTES};

use thiserror::Error;

use crate::{
    data_type::{DataType, UnsupportedDataTypeError},
    values::{ArrayValues, ScalarValue},
};

/// An invalid encoding error.
#[derive(Clone, Debug, Error)]
pub enum EncodingError {
    /// A floating point array has no encoding to an on-disk data type.
    #[error("{0} arrays must have a dtype encoding attribute")]
    FloatWithoutEncoding(DataType),
    /// A scale factor is assigned to a non-integer on-disk data type.
    #[error("a scale_factor requires an integer data type, not {0}")]
    ScaleFactorNonInteger(DataType),
    /// A scale factor is not numeric.
    #[error("scale_factor must be numeric")]
    ScaleFactorNotNumeric,
    /// An encoding attribute is an array with more than one element.
    #[error("encoding attribute {0} has more than one element")]
    MultiElementAttribute(String),
    /// An encoding attribute has the wrong type.
    #[error("encoding attribute {0} has an invalid type")]
    InvalidAttribute(String),
    /// An unsupported data type.
    #[error(transparent)]
    UnsupportedDataType(#[from] UnsupportedDataTypeError),
    /// An unsupported calendar.
    #[error("unsupported calendar {0}")]
    UnsupportedCalendar(String),
    /// Malformed time units.
    #[error("invalid time units {0}")]
    InvalidUnits(String),
    /// A datetime outside of the representable range.
    #[error("datetime out of range: {0}")]
    DateTimeOutOfRange(String),
    /// Values that cannot be converted to a data type.
    #[error("cannot cast {from} values to {to}")]
    IncompatibleCast {
        /// The value representation.
        from: &'static str,
        /// The target data type.
        to: DataType,
    },
}

#[allow(clippy::cast_possible_truncation)]
fn saturate(value: i128, data_type: DataType) -> i128 {
    let (min, max) = data_type.integer_bounds().unwrap_or((i128::MIN, i128::MAX));
    value.clamp(min, max)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn saturate_float(value: f64, data_type: DataType) -> i128 {
    // `as` truncates toward zero, saturates, and maps NaN to zero
    saturate(value as i128, data_type)
}

#[allow(clippy::cast_possible_truncation)]
fn to_float(value: f64, data_type: DataType) -> f64 {
    if data_type == DataType::Float32 {
        f64::from(value as f32)
    } else {
        value
    }
}

/// Cast `values` to `data_type`.
///
/// Integer targets saturate to the range of `data_type`, and floating point values are truncated toward zero.
/// `float32` targets are rounded to single precision.
///
/// # Errors
/// Returns [`EncodingError::IncompatibleCast`] if strings or datetimes are cast to another data type, or numbers are
/// cast to strings or datetimes.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn cast(values: &ArrayValues, data_type: DataType) -> Result<ArrayValues, EncodingError> {
    let incompatible = || EncodingError::IncompatibleCast {
        from: values.kind_name(),
        to: data_type,
    };
    Ok(match values {
        ArrayValues::String(v) if data_type == DataType::String => ArrayValues::String(v.clone()),
        ArrayValues::DateTime(v) if data_type == DataType::DateTime => {
            ArrayValues::DateTime(v.clone())
        }
        ArrayValues::String(_) | ArrayValues::DateTime(_) => return Err(incompatible()),
        _ if !data_type.is_integer() && !data_type.is_float() => return Err(incompatible()),
        ArrayValues::Int(v) if data_type.is_signed_integer() => ArrayValues::Int(
            v.iter()
                .map(|&x| saturate(i128::from(x), data_type) as i64)
                .collect(),
        ),
        ArrayValues::Int(v) if data_type.is_unsigned_integer() => ArrayValues::UInt(
            v.iter()
                .map(|&x| saturate(i128::from(x), data_type) as u64)
                .collect(),
        ),
        ArrayValues::Int(v) => {
            ArrayValues::Float(v.iter().map(|&x| to_float(x as f64, data_type)).collect())
        }
        ArrayValues::UInt(v) if data_type.is_signed_integer() => ArrayValues::Int(
            v.iter()
                .map(|&x| saturate(i128::from(x), data_type) as i64)
                .collect(),
        ),
        ArrayValues::UInt(v) if data_type.is_unsigned_integer() => ArrayValues::UInt(
            v.iter()
                .map(|&x| saturate(i128::from(x), data_type) as u64)
                .collect(),
        ),
        ArrayValues::UInt(v) => {
            ArrayValues::Float(v.iter().map(|&x| to_float(x as f64, data_type)).collect())
        }
        ArrayValues::Float(v) if data_type.is_signed_integer() => ArrayValues::Int(
            v.iter()
                .map(|&x| saturate_float(x, data_type) as i64)
                .collect(),
        ),
        ArrayValues::Float(v) if data_type.is_unsigned_integer() => ArrayValues::UInt(
            v.iter()
                .map(|&x| saturate_float(x, data_type) as u64)
                .collect(),
        ),
        ArrayValues::Float(v) => {
            ArrayValues::Float(v.iter().map(|&x| to_float(x, data_type)).collect())
        }
    })
}

/// Cast a single value to `data_type`.
///
/// # Errors
/// See [`cast`].
pub fn cast_scalar(value: &ScalarValue, data_type: DataType) -> Result<ScalarValue, EncodingError> {
    let values = match value {
        ScalarValue::Int(v) => ArrayValues::Int(vec![*v]),
        ScalarValue::UInt(v) => ArrayValues::UInt(vec![*v]),
        ScalarValue::Float(v) => ArrayValues::Float(vec![*v]),
        ScalarValue::String(v) => ArrayValues::String(vec![v.clone()]),
        ScalarValue::DateTime(v) => ArrayValues::DateTime(vec![Some(*v)]),
    };
    cast(&values, data_type)?
        .get(0)
        .ok_or(EncodingError::IncompatibleCast {
            from: value.kind_name(),
            to: data_type,
        })
}

#[allow(clippy::cast_precision_loss)]
fn to_f64(values: &ArrayValues, data_type: DataType) -> Result<Vec<f64>, EncodingError> {
    match values {
        ArrayValues::Int(v) => Ok(v.iter().map(|&x| x as f64).collect()),
        ArrayValues::UInt(v) => Ok(v.iter().map(|&x| x as f64).collect()),
        ArrayValues::Float(v) => Ok(v.clone()),
        ArrayValues::String(_) | ArrayValues::DateTime(_) => Err(EncodingError::IncompatibleCast {
            from: values.kind_name(),
            to: data_type,
        }),
    }
}

/// Encode decoded `values` to their on-disk representation.
///
/// - Datetimes are converted to a number of time units since a reference datetime, and missing datetimes become the
///   missing value.
/// - Otherwise, with a scale factor, values become `round((x - add_offset) / scale_factor)`, and `NaN` becomes an
///   integer missing value.
///
/// The result is then cast to the on-disk data type.
///
/// # Errors
/// Returns [`EncodingError`] if the time units are malformed or the values cannot be cast to the on-disk data type.
pub fn encode(values: &ArrayValues, encoding: &Encoding) -> Result<ArrayValues, EncodingError> {
    let data_type = encoding.data_type();
    let missing_value = encoding.missing_value().and_then(ScalarValue::as_i128);

    let encoded = if let ArrayValues::DateTime(v) = values {
        let units = match encoding.time_units()? {
            Some(units) => units,
            None => encoding
                .units()
                .unwrap_or(DEFAULT_TIME_UNITS)
                .parse::<TimeUnits>()?,
        };
        let missing_value = missing_value
            .and_then(|missing_value| i64::try_from(missing_value).ok())
            .unwrap_or(i64::MIN);
        ArrayValues::Int(
            v.iter()
                .map(|datetime| datetime.map_or(missing_value, |datetime| units.encode(datetime)))
                .collect(),
        )
    } else if let Some(scale_factor) = encoding.scale_factor() {
        let add_offset = encoding.add_offset().unwrap_or(0.0);
        #[allow(clippy::cast_precision_loss)]
        let missing_value = missing_value.map(|missing_value| missing_value as f64);
        ArrayValues::Float(
            to_f64(values, data_type)?
                .into_iter()
                .map(|x| {
                    let x = ((x - add_offset) / scale_factor).round();
                    match missing_value {
                        Some(missing_value) if x.is_nan() => missing_value,
                        _ => x,
                    }
                })
                .collect(),
        )
    } else {
        return cast(values, data_type);
    };
    cast(&encoded, data_type)
}

/// Decode on-disk `values` to their decoded representation.
///
/// - With a calendar, values are converted from a number of time units since a reference datetime to datetimes, and
///   missing values become missing datetimes.
/// - Otherwise, with a scale factor, values become `x * scale_factor + add_offset`, and missing values become `NaN`.
/// - Otherwise, values are cast to the decoded data type.
///
/// # Errors
/// Returns [`EncodingError`] if the time units are malformed, a datetime is out of range, or the values cannot be cast
/// to the decoded data type.
pub fn decode(values: &ArrayValues, encoding: &Encoding) -> Result<ArrayValues, EncodingError> {
    let missing_value = encoding.missing_value().and_then(ScalarValue::as_i128);

    if let Some(units) = encoding.time_units()? {
        let ArrayValues::Int(v) = cast(values, DataType::Int64)? else {
            return Err(EncodingError::IncompatibleCast {
                from: values.kind_name(),
                to: DataType::Int64,
            });
        };
        let datetimes = v
            .into_iter()
            .map(|x| {
                if Some(i128::from(x)) == missing_value {
                    Ok(None)
                } else {
                    units.decode(x).map(Some)
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ArrayValues::DateTime(datetimes))
    } else if let Some(scale_factor) = encoding.scale_factor() {
        let decoded_data_type = encoding.decoded_data_type();
        let add_offset = encoding.add_offset().unwrap_or(0.0);
        let is_missing: Vec<bool> = match values {
            ArrayValues::Int(v) => v
                .iter()
                .map(|&x| Some(i128::from(x)) == missing_value)
                .collect(),
            ArrayValues::UInt(v) => v
                .iter()
                .map(|&x| Some(i128::from(x)) == missing_value)
                .collect(),
            _ => vec![false; values.len()],
        };
        let decoded = std::iter::zip(to_f64(values, decoded_data_type)?, is_missing)
            .map(|(x, is_missing)| {
                if is_missing {
                    f64::NAN
                } else {
                    to_float(x * scale_factor + add_offset, decoded_data_type)
                }
            })
            .collect();
        Ok(ArrayValues::Float(decoded))
    } else {
        cast(values, encoding.decoded_data_type())
    }
}
