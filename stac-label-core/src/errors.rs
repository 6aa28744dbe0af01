use std::path::PathBuf;

use crate::labels::ValueKind;

/// Errors that can occur while deriving a STAC label item from an annotation file.
#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum StacError {
    /// The annotation file does not exist.
    #[error("Annotation file not found: {0}")]
    FileNotFound(PathBuf),

    /// The annotation file exists but could not be read.
    #[error("IO error {0}: {1}")]
    Io(#[source] std::io::Error, PathBuf),

    /// The annotation file could not be parsed as vector data.
    #[error("Unable to parse {1} as GeoJSON: {0}")]
    UnreadableFormat(#[source] geojson::Error, PathBuf),

    /// The annotation file contains no feature with a usable geometry.
    #[error("Annotation file {0} has no features, its extent is undefined")]
    EmptyDataset(PathBuf),

    /// The item identifier cannot be used to name the output file.
    #[error("Invalid STAC item identifier {0:?}: it must be non-empty and usable as a file name")]
    InvalidIdentifier(String),

    /// A column holds values that cannot be coerced to a single comparable type.
    #[error("Column {column:?} mixes {expected} and {found} values")]
    InconsistentColumnType {
        column: String,
        expected: ValueKind,
        found: ValueKind,
    },

    /// A column holds a nested value (array or object) which cannot be a label class.
    #[error("Column {column:?} holds a nested {found} value which cannot be used as a label class")]
    UnsupportedColumnValue { column: String, found: &'static str },

    /// The item document could not be serialized.
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    /// The item document could not be persisted.
    #[error("Unable to write STAC item {1}: {0}")]
    WriteFailure(#[source] std::io::Error, PathBuf),
}

/// Fieldless discriminant of [`StacError`], for callers that render messages per kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    FileNotFound,
    Io,
    UnreadableFormat,
    EmptyDataset,
    InvalidIdentifier,
    InconsistentColumnType,
    UnsupportedColumnValue,
    Serialization,
    WriteFailure,
}

impl StacError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::FileNotFound(_) => ErrorKind::FileNotFound,
            Self::Io(..) => ErrorKind::Io,
            Self::UnreadableFormat(..) => ErrorKind::UnreadableFormat,
            Self::EmptyDataset(_) => ErrorKind::EmptyDataset,
            Self::InvalidIdentifier(_) => ErrorKind::InvalidIdentifier,
            Self::InconsistentColumnType { .. } => ErrorKind::InconsistentColumnType,
            Self::UnsupportedColumnValue { .. } => ErrorKind::UnsupportedColumnValue,
            Self::Serialization(_) => ErrorKind::Serialization,
            Self::WriteFailure(..) => ErrorKind::WriteFailure,
        }
    }
}

pub type StacResult<T> = Result<T, StacError>;
