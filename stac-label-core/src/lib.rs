//! Derives [STAC](https://stacspec.org) items using the
//! [label extension](https://github.com/stac-extensions/label) from vector annotation files.
//!
//! The pipeline has three parts:
//! - [`compute_extent`] computes the bounding box of all annotated geometries
//! - [`analyze_labels`] summarizes every attribute column into label classes and counts
//! - [`assemble_and_persist`] combines both with user supplied identifiers into a
//!   [`CatalogItem`] and writes it as `<item_id>_stac_item.geojson`
#![forbid(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod annotation;

mod assemble;
pub use assemble::{
    AssemblerConfig, AssemblyRequest, assemble_and_persist, assemble_item, validate_id,
};

mod errors;
pub use errors::{ErrorKind, StacError, StacResult};

mod extent;
pub use extent::{BoundingBox, compute_extent};

mod item;
pub use item::{
    CatalogItem, GEOJSON_MEDIA_TYPE, GeometryMode, ITEM_FILE_SUFFIX, ItemAssets, ItemGeometry,
    LABEL_EXTENSION_SCHEMA, LabelAsset, Link, PolygonCoordinates, STAC_VERSION, item_file_name,
};

pub mod labels;
pub use labels::{LabelProperties, analyze_labels};

mod one_or_many;
pub use one_or_many::OneOrMany;
