#![allow(clippy::cast_precision_loss)]

use std::cmp::Ordering;

use enum_display::EnumDisplay;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::{StacError, StacResult};

/// Every integer up to this magnitude converts to `f64` without rounding.
const MAX_EXACT_INTEGER: u64 = 1 << 53;

/// Comparable type a column is coerced to.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, EnumDisplay, Serialize, Deserialize)]
#[enum_display(case = "Kebab")]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Boolean,
    Integer,
    Float,
    String,
}

/// A single attribute value used as a label class.
///
/// Values within one column always share a [`ValueKind`], except for `Null` which stands
/// for a missing or `null` attribute and sorts before everything else.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl ColumnValue {
    #[must_use]
    pub fn kind(&self) -> Option<ValueKind> {
        match self {
            Self::Null => None,
            Self::Bool(_) => Some(ValueKind::Boolean),
            Self::Integer(_) => Some(ValueKind::Integer),
            Self::Float(_) => Some(ValueKind::Float),
            Self::String(_) => Some(ValueKind::String),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Bool(_) => 1,
            Self::Integer(_) | Self::Float(_) => 2,
            Self::String(_) => 3,
        }
    }

    /// Integers are widened to floats, everything else is returned unchanged.
    ///
    /// Returns `None` for an integer beyond 2^53, which has no exact `f64` counterpart.
    #[must_use]
    pub fn widen_to_float(self) -> Option<Self> {
        match self {
            Self::Integer(v) if v.unsigned_abs() > MAX_EXACT_INTEGER => None,
            Self::Integer(v) => Some(Self::Float(v as f64)),
            other => Some(other),
        }
    }

    /// Converts a raw JSON attribute into a scalar value.
    ///
    /// `column` is only used for error reporting.
    pub fn from_json(column: &str, value: Option<&JsonValue>) -> StacResult<Self> {
        Ok(match value {
            None | Some(JsonValue::Null) => Self::Null,
            Some(JsonValue::Bool(v)) => Self::Bool(*v),
            Some(JsonValue::Number(n)) => match n.as_i64() {
                Some(v) => Self::Integer(v),
                // u64 above i64::MAX or a real number
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Some(JsonValue::String(v)) => Self::String(v.clone()),
            Some(JsonValue::Array(_)) => {
                return Err(StacError::UnsupportedColumnValue {
                    column: column.to_string(),
                    found: "array",
                });
            }
            Some(JsonValue::Object(_)) => {
                return Err(StacError::UnsupportedColumnValue {
                    column: column.to_string(),
                    found: "object",
                });
            }
        })
    }
}

impl Ord for ColumnValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Integer(a), Self::Integer(b)) => a.cmp(b),
            (Self::Float(a), Self::Float(b)) => a.total_cmp(b),
            (Self::Integer(a), Self::Float(b)) => (*a as f64).total_cmp(b),
            (Self::Float(a), Self::Integer(b)) => a.total_cmp(&(*b as f64)),
            (Self::String(a), Self::String(b)) => a.cmp(b),
            (a, b) => a.rank().cmp(&b.rank()),
        }
    }
}

impl PartialOrd for ColumnValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ColumnValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ColumnValue {}

impl From<&str> for ColumnValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<i64> for ColumnValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for ColumnValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for ColumnValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::ErrorKind;

    #[test]
    fn null_sorts_first() {
        let mut values = vec![
            ColumnValue::from("water"),
            ColumnValue::Null,
            ColumnValue::from("road"),
        ];
        values.sort();
        assert_eq!(
            values,
            vec![
                ColumnValue::Null,
                ColumnValue::from("road"),
                ColumnValue::from("water")
            ]
        );
    }

    #[test]
    fn numbers_compare_across_widths() {
        assert!(ColumnValue::from(2_i64) < ColumnValue::from(2.5));
        assert_eq!(ColumnValue::from(3_i64), ColumnValue::from(3.0));
        assert!(ColumnValue::from(-1.5) < ColumnValue::from(0_i64));
    }

    #[test]
    fn widening_keeps_exact_integers_only() {
        assert_eq!(
            ColumnValue::from(1_i64 << 53).widen_to_float(),
            Some(ColumnValue::Float(9_007_199_254_740_992.0))
        );
        assert_eq!(
            ColumnValue::from(-(1_i64 << 53)).widen_to_float(),
            Some(ColumnValue::Float(-9_007_199_254_740_992.0))
        );
        assert_eq!(ColumnValue::from((1_i64 << 53) + 1).widen_to_float(), None);
        assert_eq!(ColumnValue::from(i64::MIN).widen_to_float(), None);
        assert_eq!(
            ColumnValue::from("road").widen_to_float(),
            Some(ColumnValue::from("road"))
        );
    }

    #[test]
    fn from_json() {
        assert_eq!(
            ColumnValue::from_json("c", Some(&json!(7))).unwrap(),
            ColumnValue::Integer(7)
        );
        assert_eq!(
            ColumnValue::from_json("c", Some(&json!(u64::MAX))).unwrap().kind(),
            Some(ValueKind::Float)
        );
        assert_eq!(
            ColumnValue::from_json("c", None).unwrap(),
            ColumnValue::Null
        );
        let err = ColumnValue::from_json("c", Some(&json!([1, 2]))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedColumnValue);
    }

    #[test]
    fn serializes_as_plain_json() {
        let values = vec![
            ColumnValue::Null,
            ColumnValue::from(true),
            ColumnValue::from(4_i64),
            ColumnValue::from(0.5),
            ColumnValue::from("road"),
        ];
        assert_eq!(
            serde_json::to_value(&values).unwrap(),
            json!([null, true, 4, 0.5, "road"])
        );
    }

    #[test]
    fn kind_display() {
        assert_eq!(ValueKind::Integer.to_string(), "integer");
        assert_eq!(ValueKind::String.to_string(), "string");
    }
}
