use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::{data_type::DataType, values::ScalarValue};

use super::{
    cast_scalar,
    datetime::{check_calendar, TimeUnits, DEFAULT_CALENDAR, DEFAULT_TIME_UNITS},
    EncodingError,
};

/// The encoding of an array.
///
/// Describes how the decoded values of an array map to the values held on disk.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Encoding {
    data_type: DataType,
    decoded_data_type: DataType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    scale_factor: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    add_offset: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    missing_value: Option<ScalarValue>,
    #[serde(
        rename = "_FillValue",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    fill_value: Option<ScalarValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    units: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    calendar: Option<String>,
}

/// Two encodings of the same array with different on-disk data types.
#[derive(Copy, Clone, Debug, Error)]
#[error("on-disk data type {other} conflicts with {data_type}")]
pub struct EncodingConflictError {
    data_type: DataType,
    other: DataType,
}

/// The attributes of an array that describe its encoding.
pub const ENCODING_ATTRIBUTES: [&str; 7] = [
    "units",
    "calendar",
    "dtype",
    "missing_value",
    "_FillValue",
    "add_offset",
    "scale_factor",
];

fn attribute<'a>(
    attributes: &'a serde_json::Map<String, Value>,
    name: &str,
) -> Result<Option<&'a Value>, EncodingError> {
    match attributes.get(name) {
        Some(Value::Array(elements)) => match elements.as_slice() {
            [element] => Ok(Some(element)),
            _ => Err(EncodingError::MultiElementAttribute(name.to_string())),
        },
        Some(Value::Null) | None => Ok(None),
        Some(value) => Ok(Some(value)),
    }
}

fn string_attribute(
    attributes: &serde_json::Map<String, Value>,
    name: &str,
) -> Result<Option<String>, EncodingError> {
    attribute(attributes, name)?
        .map(|value| {
            value
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| EncodingError::InvalidAttribute(name.to_string()))
        })
        .transpose()
}

fn scalar_attribute(
    attributes: &serde_json::Map<String, Value>,
    name: &str,
) -> Result<Option<ScalarValue>, EncodingError> {
    attribute(attributes, name)?
        .map(|value| match value {
            Value::String(s) => Ok(ScalarValue::String(s.clone())),
            Value::Number(n) => n
                .as_i64()
                .map(ScalarValue::Int)
                .or_else(|| n.as_u64().map(ScalarValue::UInt))
                .or_else(|| n.as_f64().map(ScalarValue::Float))
                .ok_or_else(|| EncodingError::InvalidAttribute(name.to_string())),
            _ => Err(EncodingError::InvalidAttribute(name.to_string())),
        })
        .transpose()
}

fn integer_sentinel(data_type: DataType) -> Option<ScalarValue> {
    let (min, max) = data_type.integer_bounds()?;
    if data_type.is_signed_integer() {
        i64::try_from(min).ok().map(ScalarValue::Int)
    } else {
        u64::try_from(max).ok().map(ScalarValue::UInt)
    }
}

impl Encoding {
    /// Create a new encoding with no transformation between `data_type` on disk and its decoded values.
    #[must_use]
    pub fn new(data_type: DataType) -> Self {
        Self {
            data_type,
            decoded_data_type: data_type,
            scale_factor: None,
            add_offset: None,
            missing_value: None,
            fill_value: None,
            units: None,
            calendar: None,
        }
    }

    /// Derive the encoding of an array from its data type and [encoding attributes](ENCODING_ATTRIBUTES).
    ///
    /// Attribute values may be JSON scalars or single-element JSON arrays.
    ///
    /// # Errors
    /// Returns [`EncodingError`] if
    ///  - an attribute is a multi-element array or has the wrong type,
    ///  - the array is floating point without a `dtype` attribute or with a `dtype` that is not recognised,
    ///  - the `scale_factor` is not numeric or the on-disk data type is not an integer,
    ///  - the calendar is not supported, or
    ///  - the time units are malformed.
    pub fn from_attributes(
        array_data_type: DataType,
        attributes: &serde_json::Map<String, Value>,
    ) -> Result<Self, EncodingError> {
        let mut units = string_attribute(attributes, "units")?;
        let mut calendar = string_attribute(attributes, "calendar")?;
        let dtype = string_attribute(attributes, "dtype")?
            .map(|dtype| DataType::from_str(&dtype))
            .transpose()?;
        let scale_factor = attribute(attributes, "scale_factor")?
            .map(|value| value.as_f64().ok_or(EncodingError::ScaleFactorNotNumeric))
            .transpose()?;
        let add_offset = attribute(attributes, "add_offset")?
            .map(|value| {
                value
                    .as_f64()
                    .ok_or_else(|| EncodingError::InvalidAttribute("add_offset".to_string()))
            })
            .transpose()?;
        let mut missing_value = scalar_attribute(attributes, "missing_value")?;
        let mut fill_value = scalar_attribute(attributes, "_FillValue")?;

        let data_type = if array_data_type == DataType::String {
            DataType::String
        } else if array_data_type == DataType::DateTime {
            calendar = Some(DEFAULT_CALENDAR.to_string());
            units = Some(DEFAULT_TIME_UNITS.to_string());
            missing_value = Some(ScalarValue::Int(i64::MIN));
            fill_value = missing_value.clone();
            DataType::Int64
        } else if calendar.is_some() {
            units.get_or_insert_with(|| DEFAULT_TIME_UNITS.to_string());
            missing_value = Some(ScalarValue::Int(i64::MIN));
            fill_value = missing_value.clone();
            DataType::Int64
        } else if let Some(dtype) = dtype {
            dtype
        } else if array_data_type.is_float() {
            return Err(EncodingError::FloatWithoutEncoding(array_data_type));
        } else {
            array_data_type
        };

        if scale_factor.is_some() && !data_type.is_integer() {
            return Err(EncodingError::ScaleFactorNonInteger(data_type));
        }

        if data_type.is_integer() {
            if missing_value.is_none() {
                missing_value.clone_from(&fill_value);
            }
            if missing_value.is_none() {
                missing_value = integer_sentinel(data_type);
                fill_value.clone_from(&missing_value);
            }
        }
        if data_type.is_integer() || data_type.is_float() {
            missing_value = missing_value
                .map(|value| cast_scalar(&value, data_type))
                .transpose()?;
            fill_value = fill_value
                .map(|value| cast_scalar(&value, data_type))
                .transpose()?;
        }

        if let Some(calendar) = &calendar {
            check_calendar(calendar)?;
            if let Some(units) = &units {
                TimeUnits::from_str(units)?;
            }
        }

        let mut encoding = Self {
            data_type,
            decoded_data_type: data_type,
            scale_factor,
            add_offset,
            missing_value,
            fill_value,
            units,
            calendar,
        };
        encoding.derive_decoded_data_type();
        Ok(encoding)
    }

    /// Set the scale factor.
    #[must_use]
    pub fn with_scale_factor(mut self, scale_factor: f64) -> Self {
        self.scale_factor = Some(scale_factor);
        self.derive_decoded_data_type();
        self
    }

    /// Set the add offset.
    #[must_use]
    pub fn with_add_offset(mut self, add_offset: f64) -> Self {
        self.add_offset = Some(add_offset);
        self
    }

    /// Set the missing value.
    #[must_use]
    pub fn with_missing_value(mut self, missing_value: ScalarValue) -> Self {
        self.missing_value = Some(missing_value);
        self
    }

    /// Set the fill value.
    #[must_use]
    pub fn with_fill_value(mut self, fill_value: ScalarValue) -> Self {
        self.fill_value = Some(fill_value);
        self
    }

    /// Set the time units.
    #[must_use]
    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self.derive_decoded_data_type();
        self
    }

    /// Set the calendar.
    #[must_use]
    pub fn with_calendar(mut self, calendar: impl Into<String>) -> Self {
        self.calendar = Some(calendar.into());
        self.derive_decoded_data_type();
        self
    }

    /// Return the on-disk data type.
    #[must_use]
    pub const fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Return the decoded data type.
    #[must_use]
    pub const fn decoded_data_type(&self) -> DataType {
        self.decoded_data_type
    }

    /// Return the scale factor.
    #[must_use]
    pub const fn scale_factor(&self) -> Option<f64> {
        self.scale_factor
    }

    /// Return the add offset.
    #[must_use]
    pub const fn add_offset(&self) -> Option<f64> {
        self.add_offset
    }

    /// Return the missing value.
    #[must_use]
    pub const fn missing_value(&self) -> Option<&ScalarValue> {
        self.missing_value.as_ref()
    }

    /// Return the fill value.
    #[must_use]
    pub const fn fill_value(&self) -> Option<&ScalarValue> {
        self.fill_value.as_ref()
    }

    /// Return the units.
    #[must_use]
    pub fn units(&self) -> Option<&str> {
        self.units.as_deref()
    }

    /// Return the calendar.
    #[must_use]
    pub fn calendar(&self) -> Option<&str> {
        self.calendar.as_deref()
    }

    /// Return the time units if the encoding has a calendar.
    ///
    /// # Errors
    /// Returns [`EncodingError::InvalidUnits`] if the units are malformed.
    pub fn time_units(&self) -> Result<Option<TimeUnits>, EncodingError> {
        if self.calendar.is_none() {
            return Ok(None);
        }
        TimeUnits::from_str(self.units.as_deref().unwrap_or(DEFAULT_TIME_UNITS)).map(Some)
    }

    /// Merge `other` into this encoding.
    ///
    /// Fields of `self` that are set are kept, and unset fields are taken from `other`.
    ///
    /// # Errors
    /// Returns [`EncodingConflictError`] and leaves `self` unchanged if the on-disk data types differ.
    pub fn merge(&mut self, other: &Self) -> Result<(), EncodingConflictError> {
        if self.data_type != other.data_type {
            return Err(EncodingConflictError {
                data_type: self.data_type,
                other: other.data_type,
            });
        }
        self.scale_factor = self.scale_factor.or(other.scale_factor);
        self.add_offset = self.add_offset.or(other.add_offset);
        if self.missing_value.is_none() {
            self.missing_value.clone_from(&other.missing_value);
        }
        if self.fill_value.is_none() {
            self.fill_value.clone_from(&other.fill_value);
        }
        if self.units.is_none() {
            self.units.clone_from(&other.units);
        }
        if self.calendar.is_none() {
            self.calendar.clone_from(&other.calendar);
        }
        self.derive_decoded_data_type();
        Ok(())
    }

    fn derive_decoded_data_type(&mut self) {
        self.decoded_data_type = if self.data_type == DataType::String {
            DataType::String
        } else if self.scale_factor.is_some() {
            if self.data_type.element_size() > 2 {
                DataType::Float64
            } else {
                DataType::Float32
            }
        } else if self.calendar.is_some() && self.units.is_some() {
            DataType::DateTime
        } else {
            self.data_type
        };
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn attributes(value: Value) -> serde_json::Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn encoding_string() {
        let encoding = Encoding::from_attributes(DataType::String, &attributes(json!({}))).unwrap();
        assert_eq!(encoding.data_type(), DataType::String);
        assert_eq!(encoding.decoded_data_type(), DataType::String);
        assert_eq!(encoding.missing_value(), None);
    }

    #[test]
    fn encoding_labelled_datetime() {
        let encoding =
            Encoding::from_attributes(DataType::DateTime, &attributes(json!({}))).unwrap();
        assert_eq!(encoding.data_type(), DataType::Int64);
        assert_eq!(encoding.decoded_data_type(), DataType::DateTime);
        assert_eq!(encoding.calendar(), Some("gregorian"));
        assert_eq!(encoding.units(), Some("seconds since 1970-01-01 00:00:00"));
        assert_eq!(encoding.missing_value(), Some(&ScalarValue::Int(i64::MIN)));
        assert_eq!(encoding.fill_value(), Some(&ScalarValue::Int(i64::MIN)));
    }

    #[test]
    fn encoding_calendar_attribute() {
        let encoding = Encoding::from_attributes(
            DataType::Int32,
            &attributes(json!({"calendar": "standard", "units": ["hours since 2000-01-01"]})),
        )
        .unwrap();
        assert_eq!(encoding.data_type(), DataType::Int64);
        assert_eq!(encoding.decoded_data_type(), DataType::DateTime);
        assert_eq!(encoding.units(), Some("hours since 2000-01-01"));

        let encoding =
            Encoding::from_attributes(DataType::Int64, &attributes(json!({"calendar": "gregorian"})))
                .unwrap();
        assert_eq!(encoding.units(), Some(DEFAULT_TIME_UNITS));

        assert!(Encoding::from_attributes(
            DataType::Int64,
            &attributes(json!({"calendar": "360_day"}))
        )
        .is_err());
        assert!(Encoding::from_attributes(
            DataType::Int64,
            &attributes(json!({"calendar": "gregorian", "units": "furlongs"}))
        )
        .is_err());
    }

    #[test]
    fn encoding_scale_factor() {
        let encoding = Encoding::from_attributes(
            DataType::Float64,
            &attributes(json!({"dtype": "int16", "scale_factor": 0.1, "add_offset": 273.15})),
        )
        .unwrap();
        assert_eq!(encoding.data_type(), DataType::Int16);
        assert_eq!(encoding.decoded_data_type(), DataType::Float32);
        assert_eq!(encoding.scale_factor(), Some(0.1));
        assert_eq!(encoding.add_offset(), Some(273.15));
        assert_eq!(encoding.missing_value(), Some(&ScalarValue::Int(-32768)));

        let encoding = Encoding::from_attributes(
            DataType::Float64,
            &attributes(json!({"dtype": "int32", "scale_factor": 0.1})),
        )
        .unwrap();
        assert_eq!(encoding.decoded_data_type(), DataType::Float64);
    }

    #[test]
    fn encoding_invalid() {
        assert!(matches!(
            Encoding::from_attributes(DataType::Float32, &attributes(json!({}))),
            Err(EncodingError::FloatWithoutEncoding(DataType::Float32))
        ));
        assert!(matches!(
            Encoding::from_attributes(
                DataType::Float32,
                &attributes(json!({"dtype": "float32", "scale_factor": 0.1}))
            ),
            Err(EncodingError::ScaleFactorNonInteger(DataType::Float32))
        ));
        assert!(matches!(
            Encoding::from_attributes(
                DataType::Int16,
                &attributes(json!({"scale_factor": "0.1"}))
            ),
            Err(EncodingError::ScaleFactorNotNumeric)
        ));
        assert!(matches!(
            Encoding::from_attributes(
                DataType::Int16,
                &attributes(json!({"missing_value": [1, 2]}))
            ),
            Err(EncodingError::MultiElementAttribute(_))
        ));
        assert!(matches!(
            Encoding::from_attributes(DataType::Int16, &attributes(json!({"dtype": "complex"}))),
            Err(EncodingError::UnsupportedDataType(_))
        ));
    }

    #[test]
    fn encoding_integer_missing_values() {
        let encoding = Encoding::from_attributes(
            DataType::Int16,
            &attributes(json!({"_FillValue": -9999})),
        )
        .unwrap();
        assert_eq!(encoding.missing_value(), Some(&ScalarValue::Int(-9999)));
        assert_eq!(encoding.fill_value(), Some(&ScalarValue::Int(-9999)));

        let encoding =
            Encoding::from_attributes(DataType::UInt16, &attributes(json!({}))).unwrap();
        assert_eq!(encoding.missing_value(), Some(&ScalarValue::UInt(65535)));

        let encoding = Encoding::from_attributes(
            DataType::Int16,
            &attributes(json!({"missing_value": [-1]})),
        )
        .unwrap();
        assert_eq!(encoding.missing_value(), Some(&ScalarValue::Int(-1)));
        assert_eq!(encoding.fill_value(), None);
    }

    #[test]
    fn encoding_merge() {
        let mut first = Encoding::new(DataType::Int16).with_missing_value(ScalarValue::Int(-1));
        let second = Encoding::new(DataType::Int16)
            .with_missing_value(ScalarValue::Int(-2))
            .with_scale_factor(0.5);
        first.merge(&second).unwrap();
        assert_eq!(first.missing_value(), Some(&ScalarValue::Int(-1)));
        assert_eq!(first.scale_factor(), Some(0.5));
        assert_eq!(first.decoded_data_type(), DataType::Float32);

        let third = Encoding::new(DataType::Int32);
        assert!(first.merge(&third).is_err());
        assert_eq!(first.data_type(), DataType::Int16);
    }

    #[test]
    fn encoding_serde() {
        let encoding = Encoding::new(DataType::Int16).with_fill_value(ScalarValue::Int(0));
        let json = serde_json::to_value(&encoding).unwrap();
        assert_eq!(
            json,
            json!({"data_type": "int16", "decoded_data_type": "int16", "_FillValue": 0})
        );
        let deserialized: Encoding = serde_json::from_value(json).unwrap();
        assert_eq!(deserialized, encoding);
    }
}
