//! Assembly of a STAC item from an annotation file and user supplied identifiers.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::annotation::{AnnotationFile, file_size};
use crate::extent::extent_of;
use crate::item::{
    CatalogItem, GEOJSON_MEDIA_TYPE, GeometryMode, ItemAssets, ItemGeometry,
    LABEL_EXTENSION_SCHEMA, LabelAsset, Link, STAC_VERSION, item_file_name,
};
use crate::labels::labels_of;
use crate::{OneOrMany, StacError, StacResult};

/// Everything the user supplies to describe one annotation file.
#[serde_with::skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblyRequest {
    /// Vector annotation file to describe.
    pub annotation_path: PathBuf,
    /// STAC item id, also used to name the output file.
    pub item_id: String,
    /// Title of the label asset.
    pub asset_title: String,
    /// Link to the hosted annotation file. Defaults to `annotation_path`.
    pub asset_link: Option<String>,
    pub collection_id: Option<String>,
    pub label_description: String,
    /// Task types, usually `classification` or `segmentation`.
    pub label_tasks: OneOrMany<String>,
    /// Link to the data the annotations were drawn on.
    pub source_link: Option<String>,
}

impl AssemblyRequest {
    #[must_use]
    pub fn new(annotation_path: impl Into<PathBuf>, item_id: impl Into<String>) -> Self {
        Self {
            annotation_path: annotation_path.into(),
            item_id: item_id.into(),
            ..Default::default()
        }
    }

    /// Asset link override if set and not blank, the annotation path otherwise.
    #[must_use]
    pub fn effective_asset_href(&self) -> String {
        non_blank(self.asset_link.as_deref()).map_or_else(
            || self.annotation_path.to_string_lossy().into_owned(),
            ToString::to_string,
        )
    }

    #[must_use]
    pub fn effective_collection(&self) -> Option<String> {
        non_blank(self.collection_id.as_deref()).map(ToString::to_string)
    }

    #[must_use]
    pub fn effective_source_link(&self) -> Option<String> {
        non_blank(self.source_link.as_deref()).map(ToString::to_string)
    }

    /// Checks that the item id can name an output file.
    pub fn validate_id(&self) -> StacResult<()> {
        validate_id(&self.item_id)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Rejects ids that are blank or would escape the output directory.
pub fn validate_id(id: &str) -> StacResult<()> {
    let invalid = id.trim().is_empty()
        || id == "."
        || id == ".."
        || id.contains(['/', '\\', '\0']);
    if invalid {
        Err(StacError::InvalidIdentifier(id.to_string()))
    } else {
        Ok(())
    }
}

/// Output settings, passed explicitly on every invocation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblerConfig {
    /// Directory the item file is written to.
    pub output_dir: PathBuf,
    pub geometry: GeometryMode,
    /// Roles of the label asset.
    pub asset_roles: Vec<String>,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            geometry: GeometryMode::default(),
            asset_roles: Vec::new(),
        }
    }
}

impl AssemblerConfig {
    /// Path the item with the given id is written to.
    #[must_use]
    pub fn item_path(&self, id: &str) -> PathBuf {
        self.output_dir.join(item_file_name(id))
    }
}

/// Builds the STAC item for `request` without writing it.
///
/// The annotation file is read once for both the extent and the label metadata.
pub fn assemble_item(request: &AssemblyRequest, config: &AssemblerConfig) -> StacResult<CatalogItem> {
    request.validate_id()?;

    let path = request.annotation_path.as_path();
    let annotations = AnnotationFile::open(path)?;
    let bbox = extent_of(&annotations)?;
    let properties = labels_of(
        &annotations,
        &request.label_description,
        request.label_tasks.clone(),
    )?;
    let file_size = file_size(path)?;

    if request.asset_title.trim().is_empty() {
        warn!("STAC item {} has no label asset title", request.item_id);
    }

    debug!(
        "Assembled STAC item {} from {} ({file_size} bytes)",
        request.item_id,
        path.display()
    );

    Ok(CatalogItem {
        stac_version: STAC_VERSION.to_string(),
        stac_extensions: vec![LABEL_EXTENSION_SCHEMA.to_string()],
        item_type: "Feature".to_string(),
        id: request.item_id.clone(),
        geometry: ItemGeometry::from_bbox(&bbox, config.geometry),
        bbox,
        properties,
        links: request
            .effective_source_link()
            .map(Link::source)
            .into_iter()
            .collect(),
        assets: ItemAssets {
            labels: LabelAsset {
                href: request.effective_asset_href(),
                title: request.asset_title.clone(),
                media_type: GEOJSON_MEDIA_TYPE.to_string(),
                file_size,
                roles: config.asset_roles.clone(),
            },
        },
        collection: request.effective_collection(),
    })
}

/// Builds the STAC item for `request` and writes it to
/// `<output_dir>/<item_id>_stac_item.geojson`, replacing any existing file.
///
/// Nothing is written unless the item could be fully assembled.
pub fn assemble_and_persist(
    request: &AssemblyRequest,
    config: &AssemblerConfig,
) -> StacResult<PathBuf> {
    let item = assemble_item(request, config)?;
    let destination = config.item_path(&item.id);
    persist(&item, &destination)?;
    Ok(destination)
}

fn persist(item: &CatalogItem, destination: &Path) -> StacResult<()> {
    if destination.exists() {
        warn!("Replacing existing STAC item {}", destination.display());
    }
    item.write_to(destination)?;
    info!("Wrote STAC item {} to {}", item.id, destination.display());
    Ok(())
}
