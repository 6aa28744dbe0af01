use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::value::{ColumnValue, ValueKind};
use crate::{StacError, StacResult};

/// All values of one attribute column, coerced to a single [`ValueKind`].
#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    name: String,
    kind: Option<ValueKind>,
    values: Vec<ColumnValue>,
}

impl Column {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: None,
            values: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Coerced type of the column, `None` while only nulls have been seen.
    #[must_use]
    pub fn kind(&self) -> Option<ValueKind> {
        self.kind
    }

    #[must_use]
    pub fn values(&self) -> &[ColumnValue] {
        &self.values
    }

    /// Appends one raw attribute, `None` meaning the feature does not have it.
    pub fn push_json(&mut self, value: Option<&JsonValue>) -> StacResult<()> {
        let value = ColumnValue::from_json(&self.name, value)?;
        self.push(value)
    }

    /// Appends one value, widening integers to floats when the column mixes both.
    ///
    /// Integers that would lose precision as floats cannot be mixed with floats.
    pub fn push(&mut self, value: ColumnValue) -> StacResult<()> {
        let Some(found) = value.kind() else {
            self.values.push(value);
            return Ok(());
        };
        let value = match (self.kind, found) {
            (None, _) => {
                self.kind = Some(found);
                value
            }
            (Some(expected), found) if expected == found => value,
            (Some(ValueKind::Float), ValueKind::Integer) => value
                .widen_to_float()
                .ok_or_else(|| self.mixed(ValueKind::Float, ValueKind::Integer))?,
            (Some(ValueKind::Integer), ValueKind::Float) => {
                let widened = self
                    .values
                    .iter()
                    .cloned()
                    .map(ColumnValue::widen_to_float)
                    .collect::<Option<Vec<_>>>()
                    .ok_or_else(|| self.mixed(ValueKind::Integer, ValueKind::Float))?;
                self.kind = Some(ValueKind::Float);
                self.values = widened;
                value
            }
            (Some(expected), found) => return Err(self.mixed(expected, found)),
        };
        self.values.push(value);
        Ok(())
    }

    fn mixed(&self, expected: ValueKind, found: ValueKind) -> StacError {
        StacError::InconsistentColumnType {
            column: self.name.clone(),
            expected,
            found,
        }
    }

    /// Distinct values and their occurrence counts.
    #[must_use]
    pub fn summarize(&self) -> AttributeSummary {
        let mut counts = BTreeMap::<&ColumnValue, u64>::new();
        for value in &self.values {
            *counts.entry(value).or_default() += 1;
        }
        let classes: Vec<ColumnValue> = counts.keys().map(|v| (*v).clone()).collect();
        let mut counts: Vec<ClassCount> = counts
            .into_iter()
            .map(|(name, count)| ClassCount {
                name: name.clone(),
                count,
            })
            .collect();
        // most frequent first, ties keep the ascending value order
        counts.sort_by(|a, b| b.count.cmp(&a.count));

        AttributeSummary {
            name: self.name.clone(),
            classes,
            counts,
        }
    }
}

/// Categorical summary of one attribute column.
#[derive(Clone, Debug, PartialEq)]
pub struct AttributeSummary {
    pub name: String,
    /// Distinct values, strictly ascending.
    pub classes: Vec<ColumnValue>,
    /// Occurrences per distinct value, most frequent first.
    pub counts: Vec<ClassCount>,
}

impl AttributeSummary {
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|c| c.count).sum()
    }

    #[must_use]
    pub fn to_classes(&self) -> LabelClasses {
        LabelClasses {
            name: self.name.clone(),
            classes: self.classes.clone(),
        }
    }

    #[must_use]
    pub fn to_overview(&self) -> LabelOverview {
        LabelOverview {
            property_key: self.name.clone(),
            counts: self.counts.clone(),
        }
    }
}

/// Entry of `label:classes`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabelClasses {
    pub name: String,
    pub classes: Vec<ColumnValue>,
}

/// Entry of `label:overviews`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabelOverview {
    pub property_key: String,
    pub counts: Vec<ClassCount>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassCount {
    pub name: ColumnValue,
    pub count: u64,
}
