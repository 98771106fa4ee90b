//! Selections.
//!
//! A [`Selection`] restricts a merge to part of its axes and arrays.
//! Axes are filtered by an [`AxisPredicate`] over their decoded values with [`filter_axis`], and coordinates and
//! variables are included or excluded by name.

use std::{cmp::Ordering, collections::BTreeMap};

use chrono::{NaiveDateTime, TimeDelta};
use thiserror::Error;

use crate::{
    codec::{parse_datetime, EncodingError},
    coordinate::{Axes, Axis},
    values::{ArrayValues, ScalarValue},
};

/// A predicate over the decoded values of an axis.
#[derive(Clone, Debug, PartialEq)]
pub enum AxisPredicate {
    /// Keep values in the half-open range `start..stop`.
    ///
    /// An open end is unbounded. For datetime axes an open `start` is one second before the first value and an open
    /// `stop` is one second after the last value.
    Range {
        /// The inclusive lower bound.
        start: Option<ScalarValue>,
        /// The exclusive upper bound.
        stop: Option<ScalarValue>,
    },
    /// Keep values equal to any of these values.
    Values(Vec<ScalarValue>),
    /// Keep values where the mask is true.
    Mask(Vec<bool>),
}

impl AxisPredicate {
    /// Create a range predicate.
    #[must_use]
    pub fn range(start: Option<ScalarValue>, stop: Option<ScalarValue>) -> Self {
        Self::Range { start, stop }
    }
}

/// A selection error.
#[derive(Clone, Debug, Error)]
pub enum SelectionError {
    /// No axis has the name.
    #[error("unknown axis {0}")]
    UnknownAxis(String),
    /// A value cannot be compared with the values of an axis.
    #[error("value {value} cannot be compared with the values of axis {axis}")]
    IncompatibleValue {
        /// The axis name.
        axis: String,
        /// The value.
        value: String,
    },
    /// A mask has a different length to its axis.
    #[error("mask of length {got} does not match the length {expected} of axis {axis}")]
    MaskLength {
        /// The axis name.
        axis: String,
        /// The mask length.
        got: u64,
        /// The axis length.
        expected: u64,
    },
    /// The axis values cannot be decoded.
    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

/// Compare two values of compatible representations.
fn compare(lhs: &ScalarValue, rhs: &ScalarValue) -> Option<Ordering> {
    match (lhs, rhs) {
        (ScalarValue::String(lhs), ScalarValue::String(rhs)) => Some(lhs.cmp(rhs)),
        (ScalarValue::DateTime(lhs), ScalarValue::DateTime(rhs)) => Some(lhs.cmp(rhs)),
        _ => match (lhs.as_i128(), rhs.as_i128()) {
            (Some(lhs), Some(rhs)) => Some(lhs.cmp(&rhs)),
            _ => lhs.as_f64()?.partial_cmp(&rhs.as_f64()?),
        },
    }
}

/// Coerce `value` to the representation of the `decoded` values of `axis`.
fn coerce(
    axis: &str,
    decoded: &ArrayValues,
    value: &ScalarValue,
) -> Result<ScalarValue, SelectionError> {
    let incompatible = || SelectionError::IncompatibleValue {
        axis: axis.to_string(),
        value: value.to_string(),
    };
    match (decoded, value) {
        (ArrayValues::DateTime(_), ScalarValue::DateTime(_))
        | (ArrayValues::String(_), ScalarValue::String(_))
        | (
            ArrayValues::Int(_) | ArrayValues::UInt(_) | ArrayValues::Float(_),
            ScalarValue::Int(_) | ScalarValue::UInt(_) | ScalarValue::Float(_),
        ) => Ok(value.clone()),
        (ArrayValues::DateTime(_), ScalarValue::String(datetime)) => parse_datetime(datetime)
            .map(ScalarValue::DateTime)
            .ok_or_else(incompatible),
        _ => Err(incompatible()),
    }
}

/// Return the open range bounds of datetime `values`.
fn datetime_bounds(
    values: &[Option<NaiveDateTime>],
) -> (Option<ScalarValue>, Option<ScalarValue>) {
    let one_second = TimeDelta::seconds(1);
    let first = values
        .iter()
        .flatten()
        .next()
        .and_then(|first| first.checked_sub_signed(one_second));
    let last = values
        .iter()
        .flatten()
        .next_back()
        .and_then(|last| last.checked_add_signed(one_second));
    (first.map(ScalarValue::DateTime), last.map(ScalarValue::DateTime))
}

/// Return a copy of `axis` with only the values matching `predicate`.
///
/// Values retain their order and on-disk encoding.
///
/// # Errors
/// Returns a [`SelectionError`] if
///  - the axis values cannot be decoded,
///  - a predicate value cannot be compared with the decoded values of the axis, or
///  - a mask does not match the length of the axis.
pub fn filter_axis(axis: &Axis, predicate: &AxisPredicate) -> Result<Axis, SelectionError> {
    let mask = match predicate {
        AxisPredicate::Mask(mask) => {
            if mask.len() as u64 != axis.len() {
                return Err(SelectionError::MaskLength {
                    axis: axis.name().to_string(),
                    got: mask.len() as u64,
                    expected: axis.len(),
                });
            }
            mask.clone()
        }
        AxisPredicate::Range { start, stop } => {
            let decoded = axis.decoded()?;
            let (start_default, stop_default) = match &decoded {
                ArrayValues::DateTime(values) => datetime_bounds(values),
                _ => (None, None),
            };
            let start = start
                .as_ref()
                .map(|start| coerce(axis.name(), &decoded, start))
                .transpose()?
                .or(start_default);
            let stop = stop
                .as_ref()
                .map(|stop| coerce(axis.name(), &decoded, stop))
                .transpose()?
                .or(stop_default);
            (0..decoded.len())
                .map(|position| {
                    decoded.get(position).is_some_and(|value| {
                        start.as_ref().map_or(true, |start| {
                            compare(&value, start).is_some_and(Ordering::is_ge)
                        }) && stop.as_ref().map_or(true, |stop| {
                            compare(&value, stop).is_some_and(Ordering::is_lt)
                        })
                    })
                })
                .collect()
        }
        AxisPredicate::Values(values) => {
            let decoded = axis.decoded()?;
            let values = values
                .iter()
                .map(|value| coerce(axis.name(), &decoded, value))
                .collect::<Result<Vec<_>, _>>()?;
            (0..decoded.len())
                .map(|position| {
                    decoded.get(position).is_some_and(|element| {
                        values
                            .iter()
                            .any(|value| compare(&element, value) == Some(Ordering::Equal))
                    })
                })
                .collect()
        }
    };
    Ok(axis.filtered(&mask))
}

/// Filter the axis `name` of `axes` with `predicate`.
///
/// # Errors
/// Returns [`SelectionError::UnknownAxis`] if there is no axis `name`, or see [`filter_axis`].
pub fn filter_coordinates(
    axes: &Axes,
    name: &str,
    predicate: &AxisPredicate,
) -> Result<Axis, SelectionError> {
    let axis = axes
        .get(name)
        .ok_or_else(|| SelectionError::UnknownAxis(name.to_string()))?;
    filter_axis(axis, predicate)
}

/// A selection of part of a merge.
///
/// Applied in order: axis predicates, included coordinates, excluded coordinates, included variables, then excluded
/// variables.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Selection {
    predicates: BTreeMap<String, AxisPredicate>,
    include_coordinates: Option<Vec<String>>,
    exclude_coordinates: Vec<String>,
    include_variables: Option<Vec<String>>,
    exclude_variables: Option<Vec<String>>,
}

impl Selection {
    /// Create an empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter the axis `name` with `predicate`. Replaces any existing predicate for the axis.
    #[must_use]
    pub fn with_predicate(mut self, name: impl Into<String>, predicate: AxisPredicate) -> Self {
        self.predicates.insert(name.into(), predicate);
        self
    }

    /// Keep only these coordinates, and the variables using only these coordinates.
    #[must_use]
    pub fn include_coordinates<S: Into<String>>(
        mut self,
        names: impl IntoIterator<Item = S>,
    ) -> Self {
        self.include_coordinates = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Drop these coordinates, and the variables using them.
    #[must_use]
    pub fn exclude_coordinates<S: Into<String>>(
        mut self,
        names: impl IntoIterator<Item = S>,
    ) -> Self {
        self.exclude_coordinates = names.into_iter().map(Into::into).collect();
        self
    }

    /// Keep only these variables, and the coordinates they use.
    #[must_use]
    pub fn include_variables<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.include_variables = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Drop these variables, and the coordinates no other variable uses.
    #[must_use]
    pub fn exclude_variables<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.exclude_variables = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Return the axis predicates.
    #[must_use]
    pub const fn predicates(&self) -> &BTreeMap<String, AxisPredicate> {
        &self.predicates
    }

    /// Return the included coordinates, if restricted.
    #[must_use]
    pub fn included_coordinates(&self) -> Option<&[String]> {
        self.include_coordinates.as_deref()
    }

    /// Return the excluded coordinates.
    #[must_use]
    pub fn excluded_coordinates(&self) -> &[String] {
        &self.exclude_coordinates
    }

    /// Return the included variables, if restricted.
    #[must_use]
    pub fn included_variables(&self) -> Option<&[String]> {
        self.include_variables.as_deref()
    }

    /// Return the excluded variables, if any were given.
    #[must_use]
    pub fn excluded_variables(&self) -> Option<&[String]> {
        self.exclude_variables.as_deref()
    }
}
