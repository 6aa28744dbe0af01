//! Label metadata derived from the attribute table of an annotation file.
//!
//! Produces the `properties` block of a STAC item using the
//! [label extension](https://github.com/stac-extensions/label).

use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::annotation::AnnotationFile;
use crate::{OneOrMany, StacResult};

mod summary;
mod value;

pub use summary::{AttributeSummary, ClassCount, Column, LabelClasses, LabelOverview};
pub use value::{ColumnValue, ValueKind};

/// Columns describing the feature itself rather than its label.
pub const STRUCTURAL_COLUMNS: [&str; 2] = ["id", "geometry"];

/// Only vector annotations are supported.
pub const LABEL_TYPE: &str = "vector";

/// Annotations are drawn by hand.
pub const LABEL_METHOD: &str = "manual";

pub const LABEL_PROPERTIES_VERSION: &str = "1";

/// The label-extension `properties` block of a STAC item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabelProperties {
    // The key is misspelled in every item produced so far, consumers depend on it.
    pub datatime: String,
    #[serde(rename = "label:type")]
    pub label_type: String,
    #[serde(rename = "label:description")]
    pub description: String,
    #[serde(rename = "label:properties")]
    pub properties: Vec<String>,
    #[serde(rename = "label:classes")]
    pub classes: Vec<LabelClasses>,
    #[serde(rename = "label:tasks")]
    pub tasks: Vec<String>,
    #[serde(rename = "label:methods")]
    pub methods: Vec<String>,
    pub version: String,
    #[serde(rename = "label:overviews")]
    pub overviews: Vec<LabelOverview>,
}

impl LabelProperties {
    /// Builds the block from per-column summaries, stamping the current time.
    #[must_use]
    pub fn new(summaries: &[AttributeSummary], description: &str, tasks: Vec<String>) -> Self {
        Self {
            datatime: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            label_type: LABEL_TYPE.to_string(),
            description: description.to_string(),
            properties: summaries.iter().map(|s| s.name.clone()).collect(),
            classes: summaries.iter().map(AttributeSummary::to_classes).collect(),
            tasks,
            methods: vec![LABEL_METHOD.to_string()],
            version: LABEL_PROPERTIES_VERSION.to_string(),
            overviews: summaries.iter().map(AttributeSummary::to_overview).collect(),
        }
    }
}

/// Reads the attribute table of the annotation file at `path` and derives its label metadata.
///
/// `tasks` may be a single task type or a list of them; blank entries are dropped.
pub fn analyze_labels<P, T>(path: P, description: &str, tasks: T) -> StacResult<LabelProperties>
where
    P: AsRef<Path>,
    T: Into<OneOrMany<String>>,
{
    let annotations = AnnotationFile::open(path)?;
    labels_of(&annotations, description, tasks.into())
}

pub(crate) fn labels_of(
    annotations: &AnnotationFile,
    description: &str,
    tasks: OneOrMany<String>,
) -> StacResult<LabelProperties> {
    let columns = read_columns(annotations)?;
    for column in &columns {
        debug!(
            "Label column {} of {}: {} values of type {}",
            column.name(),
            annotations.path().display(),
            column.values().len(),
            column.kind().map_or_else(|| "null".to_string(), |k| k.to_string()),
        );
    }
    let summaries: Vec<AttributeSummary> = columns.iter().map(Column::summarize).collect();
    Ok(LabelProperties::new(
        &summaries,
        description,
        tasks.into_non_blank(),
    ))
}

/// Non-structural attribute columns in order of first appearance.
///
/// Every column has one value per feature; features lacking an attribute contribute a null.
pub fn read_columns(annotations: &AnnotationFile) -> StacResult<Vec<Column>> {
    let mut names: Vec<&str> = Vec::new();
    for row in annotations.attribute_rows().flatten() {
        for key in row.keys() {
            if !STRUCTURAL_COLUMNS.contains(&key.as_str()) && !names.contains(&key.as_str()) {
                names.push(key.as_str());
            }
        }
    }

    names
        .into_iter()
        .map(|name| {
            let mut column = Column::new(name);
            for row in annotations.attribute_rows() {
                column.push_json(row.and_then(|r| r.get(name)))?;
            }
            Ok(column)
        })
        .collect()
}
