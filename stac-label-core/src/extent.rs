//! Spatial extent of an annotation file.
//!
//! Coordinates are taken as stored in the file, no reprojection is performed.

use std::path::Path;

use geojson::Value;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

use crate::annotation::AnnotationFile;
use crate::{StacError, StacResult};

/// Minimal axis-aligned envelope of all feature geometries.
///
/// Serializes as `[min_x, min_y, max_x, max_y]`, or as
/// `[min_x, min_y, min_z, max_x, max_y, max_z]` when the extent is three-dimensional.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
    /// `(min_z, max_z)`, only set when every position carries an elevation.
    pub z: Option<(f64, f64)>,
}

impl BoundingBox {
    #[must_use]
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
            z: None,
        }
    }

    #[must_use]
    pub fn with_z(self, min_z: f64, max_z: f64) -> Self {
        Self {
            z: Some((min_z, max_z)),
            ..self
        }
    }

    #[must_use]
    pub fn dimensions(&self) -> usize {
        if self.z.is_some() { 3 } else { 2 }
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<f64> {
        match self.z {
            Some((min_z, max_z)) => vec![
                self.min_x, self.min_y, min_z, self.max_x, self.max_y, max_z,
            ],
            None => vec![self.min_x, self.min_y, self.max_x, self.max_y],
        }
    }

    /// True if the horizontal part of `position` lies within the box, and so does
    /// its elevation when both the box and the position have one.
    #[must_use]
    pub fn contains(&self, position: &[f64]) -> bool {
        let [x, y, rest @ ..] = position else {
            return false;
        };
        let horizontal =
            self.min_x <= *x && *x <= self.max_x && self.min_y <= *y && *y <= self.max_y;
        match (self.z, rest.first()) {
            (Some((min_z, max_z)), Some(z)) => horizontal && min_z <= *z && *z <= max_z,
            _ => horizontal,
        }
    }

    /// Closed exterior ring of the horizontal extent, counter-clockwise.
    #[must_use]
    pub fn exterior_ring(&self) -> Vec<[f64; 2]> {
        vec![
            [self.min_x, self.min_y],
            [self.max_x, self.min_y],
            [self.max_x, self.max_y],
            [self.min_x, self.max_y],
            [self.min_x, self.min_y],
        ]
    }
}

impl Serialize for BoundingBox {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_vec().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for BoundingBox {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let values = Vec::<f64>::deserialize(deserializer)?;
        match values.as_slice() {
            [min_x, min_y, max_x, max_y] => Ok(Self::new(*min_x, *min_y, *max_x, *max_y)),
            [min_x, min_y, min_z, max_x, max_y, max_z] => {
                Ok(Self::new(*min_x, *min_y, *max_x, *max_y).with_z(*min_z, *max_z))
            }
            _ => Err(serde::de::Error::invalid_length(
                values.len(),
                &"a bounding box of 4 or 6 numbers",
            )),
        }
    }
}

/// Running envelope over positions.
#[derive(Debug)]
struct Envelope {
    min: [f64; 3],
    max: [f64; 3],
    positions: usize,
    all_have_z: bool,
}

impl Default for Envelope {
    fn default() -> Self {
        Self {
            min: [f64::MAX; 3],
            max: [f64::MIN; 3],
            positions: 0,
            all_have_z: true,
        }
    }
}

impl Envelope {
    fn extend(&mut self, position: &[f64]) {
        if position.len() < 2 {
            return;
        }
        self.positions += 1;
        for (axis, value) in position.iter().take(3).enumerate() {
            self.min[axis] = f64::min(self.min[axis], *value);
            self.max[axis] = f64::max(self.max[axis], *value);
        }
        if position.len() < 3 {
            self.all_have_z = false;
        }
    }

    fn extend_all<'a>(&mut self, positions: impl IntoIterator<Item = &'a Vec<f64>>) {
        for position in positions {
            self.extend(position);
        }
    }

    fn extend_by_geometry(&mut self, value: &Value) {
        match value {
            Value::Point(point) => self.extend(point),
            Value::MultiPoint(points) | Value::LineString(points) => self.extend_all(points),
            Value::MultiLineString(lines) | Value::Polygon(lines) => {
                lines.iter().for_each(|line| self.extend_all(line));
            }
            Value::MultiPolygon(polygons) => {
                for polygon in polygons {
                    polygon.iter().for_each(|ring| self.extend_all(ring));
                }
            }
            Value::GeometryCollection(geometries) => {
                for geometry in geometries {
                    self.extend_by_geometry(&geometry.value);
                }
            }
        }
    }

    fn finish(self) -> Option<BoundingBox> {
        if self.positions == 0 {
            return None;
        }
        let bbox = BoundingBox::new(self.min[0], self.min[1], self.max[0], self.max[1]);
        Some(if self.all_have_z {
            bbox.with_z(self.min[2], self.max[2])
        } else {
            bbox
        })
    }
}

/// Computes the bounding box covering every feature of the annotation file at `path`.
///
/// Features without a geometry are skipped.
pub fn compute_extent<P: AsRef<Path>>(path: P) -> StacResult<BoundingBox> {
    let annotations = AnnotationFile::open(path)?;
    extent_of(&annotations)
}

pub(crate) fn extent_of(annotations: &AnnotationFile) -> StacResult<BoundingBox> {
    let mut envelope = Envelope::default();
    for geometry in annotations.features().iter().filter_map(|f| f.geometry.as_ref()) {
        envelope.extend_by_geometry(&geometry.value);
    }
    let bbox = envelope
        .finish()
        .ok_or_else(|| StacError::EmptyDataset(annotations.path().to_path_buf()))?;
    debug!(
        "Extent of {} ({} features): {:?}",
        annotations.path().display(),
        annotations.len(),
        bbox.to_vec()
    );
    Ok(bbox)
}
