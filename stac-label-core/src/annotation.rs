//! Loading of vector annotation files.
//!
//! Annotations are stored as [GeoJSON](https://datatracker.ietf.org/doc/html/rfc7946).
//! A `FeatureCollection`, a single `Feature`, or a bare `Geometry` are accepted;
//! the latter is treated as one feature without attributes.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read as _};
use std::path::{Path, PathBuf};

use geojson::{Feature, GeoJson, JsonObject};

use crate::{StacError, StacResult};

/// Features of an annotation file, read fresh from disk.
#[derive(Clone, Debug)]
pub struct AnnotationFile {
    path: PathBuf,
    features: Vec<Feature>,
}

impl AnnotationFile {
    /// Reads and parses the annotation file at `path`.
    ///
    /// The file handle is only held while reading.
    pub fn open<P: AsRef<Path>>(path: P) -> StacResult<Self> {
        let path = path.as_ref();
        let bytes = read_bytes(path)?;
        let value = serde_json::from_slice(&bytes)
            .map_err(|e| StacError::UnreadableFormat(geojson::Error::MalformedJson(e), path.into()))?;
        let geojson = GeoJson::from_json_value(value)
            .map_err(|e| StacError::UnreadableFormat(e, path.into()))?;

        let features = match geojson {
            GeoJson::FeatureCollection(fc) => fc.features,
            GeoJson::Feature(feature) => vec![feature],
            GeoJson::Geometry(geometry) => vec![Feature {
                bbox: None,
                geometry: Some(geometry),
                id: None,
                properties: None,
                foreign_members: None,
            }],
        };

        Ok(Self {
            path: path.to_path_buf(),
            features,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Attribute table rows, one per feature. Features without properties yield `None`.
    pub fn attribute_rows(&self) -> impl Iterator<Item = Option<&JsonObject>> {
        self.features.iter().map(|f| f.properties.as_ref())
    }
}

fn read_bytes(path: &Path) -> StacResult<Vec<u8>> {
    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => StacError::FileNotFound(path.to_path_buf()),
        _ => StacError::Io(e, path.to_path_buf()),
    })?;
    let mut bytes = Vec::new();
    BufReader::new(file)
        .read_to_end(&mut bytes)
        .map_err(|e| StacError::Io(e, path.to_path_buf()))?;
    Ok(bytes)
}

/// Size of the file on disk, in bytes.
pub(crate) fn file_size(path: &Path) -> StacResult<u64> {
    path.metadata().map(|m| m.len()).map_err(|e| match e.kind() {
        ErrorKind::NotFound => StacError::FileNotFound(path.to_path_buf()),
        _ => StacError::Io(e, path.to_path_buf()),
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use tempfile::NamedTempFile;

    use super::*;
    use crate::ErrorKind as StacErrorKind;

    fn write_tmp(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn reads_bare_geometry_as_single_feature() {
        let file = write_tmp(r#"{"type": "Point", "coordinates": [1.0, 2.0]}"#);
        let annotations = AnnotationFile::open(file.path()).unwrap();
        assert_eq!(annotations.len(), 1);
        assert!(annotations.features()[0].properties.is_none());
    }

    #[test]
    fn reads_single_feature() {
        let file = write_tmp(
            r#"{"type": "Feature", "properties": {"class": "road"},
                "geometry": {"type": "Point", "coordinates": [1.0, 2.0]}}"#,
        );
        let annotations = AnnotationFile::open(file.path()).unwrap();
        assert_eq!(annotations.len(), 1);
        let rows: Vec<_> = annotations.attribute_rows().collect();
        assert_eq!(rows[0].unwrap()["class"], "road");
    }

    #[test]
    fn missing_file() {
        let err = AnnotationFile::open("does/not/exist.geojson").unwrap_err();
        assert_eq!(err.kind(), StacErrorKind::FileNotFound);
    }

    #[test]
    fn not_json() {
        let file = write_tmp("this is not json");
        let err = AnnotationFile::open(file.path()).unwrap_err();
        assert_eq!(err.kind(), StacErrorKind::UnreadableFormat);
    }

    #[test]
    fn json_but_not_geojson() {
        let file = write_tmp(r#"{"hello": "world"}"#);
        let err = AnnotationFile::open(file.path()).unwrap_err();
        assert_eq!(err.kind(), StacErrorKind::UnreadableFormat);
    }

    #[test]
    fn size_of_missing_file() {
        let err = file_size(Path::new("does/not/exist.geojson")).unwrap_err();
        assert_eq!(err.kind(), StacErrorKind::FileNotFound);
    }
}
