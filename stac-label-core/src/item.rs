//! The STAC item document.

use std::fs::File;
use std::io::{self, Write as _};
use std::path::Path;

#[cfg(feature = "cli")]
use clap::ValueEnum;
use enum_display::EnumDisplay;
use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use tempfile::NamedTempFile;

use crate::extent::BoundingBox;
use crate::labels::LabelProperties;
use crate::{StacError, StacResult};

pub const STAC_VERSION: &str = "1.0.0";
pub const LABEL_EXTENSION_SCHEMA: &str =
    "https://stac-extensions.github.io/label/v1.0.1/schema.json";
pub const GEOJSON_MEDIA_TYPE: &str = "application/geo+json";

/// Suffix appended to the item id to name the output file.
pub const ITEM_FILE_SUFFIX: &str = "_stac_item.geojson";

/// Name of the file an item with the given id is written to.
#[must_use]
pub fn item_file_name(id: &str) -> String {
    format!("{id}{ITEM_FILE_SUFFIX}")
}

/// How the item `geometry` is derived from its bounding box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, EnumDisplay, Serialize, Deserialize)]
#[enum_display(case = "Kebab")]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "cli", derive(ValueEnum))]
pub enum GeometryMode {
    /// A closed polygon ring around the horizontal extent.
    #[default]
    Polygon,
    /// The bbox array itself as polygon coordinates. Not valid GeoJSON, kept for older consumers.
    RawBbox,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ItemGeometry {
    Polygon { coordinates: PolygonCoordinates },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PolygonCoordinates {
    Rings(Vec<Vec<[f64; 2]>>),
    RawBbox(Vec<f64>),
}

impl ItemGeometry {
    #[must_use]
    pub fn from_bbox(bbox: &BoundingBox, mode: GeometryMode) -> Self {
        let coordinates = match mode {
            GeometryMode::Polygon => PolygonCoordinates::Rings(vec![bbox.exterior_ring()]),
            GeometryMode::RawBbox => PolygonCoordinates::RawBbox(bbox.to_vec()),
        };
        Self::Polygon { coordinates }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub rel: String,
    pub href: String,
}

impl Link {
    #[must_use]
    pub fn source(href: impl Into<String>) -> Self {
        Self {
            rel: "source".to_string(),
            href: href.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemAssets {
    pub labels: LabelAsset,
}

/// Descriptor of the annotation file itself.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabelAsset {
    pub href: String,
    pub title: String,
    #[serde(rename = "type")]
    pub media_type: String,
    #[serde(rename = "file:size")]
    pub file_size: u64,
    pub roles: Vec<String>,
}

/// A STAC item describing one annotation file.
///
/// Field order is the key order of the written document.
#[serde_with::skip_serializing_none]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub stac_version: String,
    pub stac_extensions: Vec<String>,
    #[serde(rename = "type")]
    pub item_type: String,
    pub id: String,
    pub bbox: BoundingBox,
    pub geometry: ItemGeometry,
    pub properties: LabelProperties,
    pub links: Vec<Link>,
    pub assets: ItemAssets,
    pub collection: Option<String>,
}

impl CatalogItem {
    /// Serializes the item with 4-space indentation.
    pub fn to_json_bytes(&self) -> StacResult<Vec<u8>> {
        let mut buf = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut ser)?;
        buf.push(b'\n');
        Ok(buf)
    }

    /// Writes the item to `destination`, replacing any existing file.
    ///
    /// The document is written to a temporary file next to the destination and renamed
    /// over it, so readers never observe a partially written item.
    pub fn write_to(&self, destination: &Path) -> StacResult<()> {
        let bytes = self.to_json_bytes()?;
        let dir = match destination.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let to_err = |e| StacError::WriteFailure(e, destination.to_path_buf());

        let mut tmp = NamedTempFile::new_in(dir).map_err(to_err)?;
        tmp.write_all(&bytes).map_err(to_err)?;
        tmp.as_file().sync_all().map_err(to_err)?;
        set_document_permissions(tmp.as_file()).map_err(to_err)?;
        tmp.persist(destination).map_err(|e| to_err(e.error))?;
        Ok(())
    }
}

/// `NamedTempFile` creates files readable by the owner only.
#[cfg(unix)]
fn set_document_permissions(file: &File) -> io::Result<()> {
    use std::fs::Permissions;
    use std::os::unix::fs::PermissionsExt as _;
    file.set_permissions(Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn set_document_permissions(_file: &File) -> io::Result<()> {
    Ok(())
}
