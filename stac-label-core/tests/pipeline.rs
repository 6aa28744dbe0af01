use std::fs;
use std::path::Path;

use approx::assert_relative_eq;
use insta::assert_json_snapshot;
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{Value, json};
use stac_label_core::annotation::AnnotationFile;
use stac_label_core::labels::{ColumnValue, read_columns};
use stac_label_core::{
    AssemblerConfig, AssemblyRequest, CatalogItem, ErrorKind, GeometryMode, OneOrMany,
    analyze_labels, assemble_and_persist, assemble_item, compute_extent,
};
use tempfile::TempDir;

const DATA: &str = "tests/fixtures/data.geojson";
const MIXED: &str = "tests/fixtures/mixed_geometries.geojson";
const ELEVATION: &str = "tests/fixtures/elevation.geojson";

fn output_config() -> (TempDir, AssemblerConfig) {
    let dir = TempDir::new().unwrap();
    let config = AssemblerConfig {
        output_dir: dir.path().to_path_buf(),
        ..Default::default()
    };
    (dir, config)
}

fn request(path: &str, id: &str) -> AssemblyRequest {
    AssemblyRequest {
        asset_title: "Manhattan annotations".to_string(),
        label_description: "Roads and water bodies".to_string(),
        label_tasks: OneOrMany::from("segmentation"),
        ..AssemblyRequest::new(path, id)
    }
}

fn all_positions(value: &Value, out: &mut Vec<Vec<f64>>) {
    match value {
        Value::Array(items) if items.iter().all(Value::is_number) => {
            out.push(items.iter().filter_map(Value::as_f64).collect());
        }
        Value::Array(items) => items.iter().for_each(|v| all_positions(v, out)),
        _ => {}
    }
}

#[rstest]
#[case(DATA, 3)]
#[case(MIXED, 4)]
#[case(ELEVATION, 2)]
fn extent_contains_every_position(#[case] path: &str, #[case] features: usize) {
    let bbox = compute_extent(path).unwrap();
    let annotations = AnnotationFile::open(path).unwrap();
    assert_eq!(annotations.len(), features);

    assert!(bbox.min_x <= bbox.max_x);
    assert!(bbox.min_y <= bbox.max_y);
    if let Some((min_z, max_z)) = bbox.z {
        assert!(min_z <= max_z);
    }

    let mut positions = Vec::new();
    for geometry in annotations.features().iter().filter_map(|f| f.geometry.as_ref()) {
        let value = serde_json::to_value(geometry).unwrap();
        all_positions(&value["coordinates"], &mut positions);
    }
    assert!(!positions.is_empty());
    for position in &positions {
        assert!(bbox.contains(position), "{position:?} is outside {bbox:?}");
    }
}

#[test]
fn extent_of_polygons() {
    let bbox = compute_extent(DATA).unwrap();
    assert_relative_eq!(bbox.min_x, -74.02);
    assert_relative_eq!(bbox.min_y, 40.70);
    assert_relative_eq!(bbox.max_x, -73.96);
    assert_relative_eq!(bbox.max_y, 40.76);
    assert_eq!(bbox.z, None);
}

#[test]
fn extent_with_elevation() {
    let bbox = compute_extent(ELEVATION).unwrap();
    assert_eq!(bbox.to_vec(), vec![7.65, 45.97, 1608.0, 7.75, 46.02, 4478.0]);
}

#[test]
fn road_and_water_scenario() {
    let labels = analyze_labels(DATA, "", "classification").unwrap();
    assert_eq!(labels.properties, vec!["class"]);
    assert_eq!(
        serde_json::to_value(&labels.classes).unwrap(),
        json!([{"name": "class", "classes": ["road", "water"]}])
    );
    assert_eq!(
        serde_json::to_value(&labels.overviews).unwrap(),
        json!([{"property_key": "class", "counts": [
            {"name": "road", "count": 2},
            {"name": "water", "count": 1}
        ]}])
    );
    assert_eq!(labels.tasks, vec!["classification"]);
}

#[test]
fn label_invariants() {
    let annotations = AnnotationFile::open(MIXED).unwrap();
    let labels = analyze_labels(MIXED, "Street furniture", OneOrMany::default()).unwrap();

    assert_eq!(
        labels.properties,
        vec!["kind", "height", "confidence", "verified"]
    );
    assert_eq!(labels.properties.len(), read_columns(&annotations).unwrap().len());
    assert!(labels.tasks.is_empty());

    for (classes, overview) in labels.classes.iter().zip(&labels.overviews) {
        assert!(labels.properties.contains(&classes.name));
        assert_eq!(classes.name, overview.property_key);

        let total: u64 = overview.counts.iter().map(|c| c.count).sum();
        assert_eq!(total, annotations.len() as u64, "counts of {}", classes.name);
        assert!(
            classes.classes.windows(2).all(|w| w[0] < w[1]),
            "classes of {} are not strictly ascending",
            classes.name
        );
    }

    let height = &labels.classes[1];
    assert_eq!(
        height.classes,
        vec![ColumnValue::Null, ColumnValue::from(2.5), ColumnValue::from(12.0)]
    );
    let verified = &labels.classes[3];
    assert_eq!(
        serde_json::to_value(&verified.classes).unwrap(),
        json!([null, false, true])
    );
}

#[test]
fn full_item() {
    let mut request = request(DATA, "manhattan");
    request.collection_id = Some("nyc-labels".to_string());
    request.source_link = Some("https://example.com/imagery/scene.tif".to_string());

    let mut item = assemble_item(&request, &AssemblerConfig::default()).unwrap();
    assert_eq!(
        item.assets.labels.file_size,
        fs::metadata(DATA).unwrap().len()
    );
    item.assets.labels.file_size = 0;
    item.properties.datatime = "2024-01-01T00:00:00.000000Z".to_string();

    assert_json_snapshot!(item, @r#"
    {
      "stac_version": "1.0.0",
      "stac_extensions": [
        "https://stac-extensions.github.io/label/v1.0.1/schema.json"
      ],
      "type": "Feature",
      "id": "manhattan",
      "bbox": [
        -74.02,
        40.7,
        -73.96,
        40.76
      ],
      "geometry": {
        "type": "Polygon",
        "coordinates": [
          [
            [
              -74.02,
              40.7
            ],
            [
              -73.96,
              40.7
            ],
            [
              -73.96,
              40.76
            ],
            [
              -74.02,
              40.76
            ],
            [
              -74.02,
              40.7
            ]
          ]
        ]
      },
      "properties": {
        "datatime": "2024-01-01T00:00:00.000000Z",
        "label:type": "vector",
        "label:description": "Roads and water bodies",
        "label:properties": [
          "class"
        ],
        "label:classes": [
          {
            "name": "class",
            "classes": [
              "road",
              "water"
            ]
          }
        ],
        "label:tasks": [
          "segmentation"
        ],
        "label:methods": [
          "manual"
        ],
        "version": "1",
        "label:overviews": [
          {
            "property_key": "class",
            "counts": [
              {
                "name": "road",
                "count": 2
              },
              {
                "name": "water",
                "count": 1
              }
            ]
          }
        ]
      },
      "links": [
        {
          "rel": "source",
          "href": "https://example.com/imagery/scene.tif"
        }
      ],
      "assets": {
        "labels": {
          "href": "tests/fixtures/data.geojson",
          "title": "Manhattan annotations",
          "type": "application/geo+json",
          "file:size": 0,
          "roles": []
        }
      },
      "collection": "nyc-labels"
    }
    "#);
}

#[test]
fn persisted_document_layout() {
    let (dir, config) = output_config();
    let path = assemble_and_persist(&request(DATA, "manhattan"), &config).unwrap();
    assert_eq!(path, dir.path().join("manhattan_stac_item.geojson"));

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("{\n    \"stac_version\": \"1.0.0\",\n    \"stac_extensions\": [\n"));

    let item: CatalogItem = serde_json::from_str(&text).unwrap();
    assert_eq!(item.id, "manhattan");
    assert_eq!(item.assets.labels.href, DATA);
    assert!(item.links.is_empty());

    let value: Value = serde_json::from_str(&text).unwrap();
    let keys: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
    assert_eq!(
        keys,
        vec![
            "stac_version",
            "stac_extensions",
            "type",
            "id",
            "bbox",
            "geometry",
            "properties",
            "links",
            "assets"
        ]
    );
}

#[rstest]
#[case(Some("nyc-labels"), Some("nyc-labels"))]
#[case(Some(""), None)]
#[case(Some("   "), None)]
#[case(None, None)]
fn collection_key(#[case] collection: Option<&str>, #[case] expected: Option<&str>) {
    let (_dir, config) = output_config();
    let mut request = request(DATA, "manhattan");
    request.collection_id = collection.map(ToString::to_string);
    let path = assemble_and_persist(&request, &config).unwrap();

    let value: Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
    assert_eq!(value.get("collection").and_then(Value::as_str), expected);
}

#[test]
fn asset_link_override() {
    let mut request = request(DATA, "manhattan");
    request.asset_link = Some(String::new());
    let item = assemble_item(&request, &AssemblerConfig::default()).unwrap();
    assert_eq!(item.assets.labels.href, DATA);

    request.asset_link = Some("https://example.com/labels/data.geojson".to_string());
    let item = assemble_item(&request, &AssemblerConfig::default()).unwrap();
    assert_eq!(
        item.assets.labels.href,
        "https://example.com/labels/data.geojson"
    );
}

#[test]
fn repeated_runs_only_differ_in_timestamp() {
    fn without_timestamp(text: &str) -> String {
        text.lines()
            .filter(|line| !line.trim_start().starts_with("\"datatime\""))
            .collect::<Vec<_>>()
            .join("\n")
    }

    let (_dir, config) = output_config();
    let request = request(DATA, "manhattan");
    let path = assemble_and_persist(&request, &config).unwrap();
    let first = fs::read_to_string(&path).unwrap();
    let again = assemble_and_persist(&request, &config).unwrap();
    assert_eq!(path, again);
    let second = fs::read_to_string(&path).unwrap();

    assert_eq!(without_timestamp(&first), without_timestamp(&second));
    assert_eq!(fs::read_dir(config.output_dir).unwrap().count(), 1);
}

#[test]
fn overwrites_existing_item() {
    let (_dir, config) = output_config();
    let destination = config.item_path("manhattan");
    fs::write(&destination, "stale").unwrap();

    assemble_and_persist(&request(DATA, "manhattan"), &config).unwrap();
    let item: CatalogItem =
        serde_json::from_str(&fs::read_to_string(&destination).unwrap()).unwrap();
    assert_eq!(item.id, "manhattan");
}

#[test]
fn raw_bbox_geometry() {
    let config = AssemblerConfig {
        geometry: GeometryMode::RawBbox,
        ..Default::default()
    };
    let item = assemble_item(&request(DATA, "manhattan"), &config).unwrap();
    let value = serde_json::to_value(&item).unwrap();
    assert_eq!(value["geometry"]["type"], "Polygon");
    assert_eq!(value["geometry"]["coordinates"], value["bbox"]);
}

#[test]
fn geometry_of_three_dimensional_extent_stays_planar() {
    let item = assemble_item(&request(ELEVATION, "alps"), &AssemblerConfig::default()).unwrap();
    let value = serde_json::to_value(&item).unwrap();
    assert_eq!(value["bbox"].as_array().unwrap().len(), 6);
    assert_eq!(
        value["geometry"]["coordinates"][0][0],
        json!([7.65, 45.97])
    );
}

#[test]
fn asset_roles_from_config() {
    let config = AssemblerConfig {
        asset_roles: vec!["labels".to_string(), "labels-vector".to_string()],
        ..Default::default()
    };
    let item = assemble_item(&request(DATA, "manhattan"), &config).unwrap();
    assert_eq!(item.assets.labels.roles, vec!["labels", "labels-vector"]);
}

#[rstest]
#[case::empty_id("does/not/exist.geojson", "", ErrorKind::InvalidIdentifier)]
#[case::missing_file("does/not/exist.geojson", "item", ErrorKind::FileNotFound)]
#[case::no_features("tests/fixtures/empty.geojson", "item", ErrorKind::EmptyDataset)]
#[case::not_geojson("tests/fixtures/not_geojson.csv", "item", ErrorKind::UnreadableFormat)]
#[case::mixed_column("tests/fixtures/inconsistent.geojson", "item", ErrorKind::InconsistentColumnType)]
fn failures_write_nothing(#[case] path: &str, #[case] id: &str, #[case] kind: ErrorKind) {
    let (_dir, config) = output_config();
    let err = assemble_and_persist(&request(path, id), &config).unwrap_err();
    assert_eq!(err.kind(), kind, "{err}");
    assert_eq!(fs::read_dir(&config.output_dir).unwrap().count(), 0);
}

#[test]
fn write_failure() {
    let (dir, _) = output_config();
    let config = AssemblerConfig {
        output_dir: dir.path().join("missing").join("dir"),
        ..Default::default()
    };
    let err = assemble_and_persist(&request(DATA, "manhattan"), &config).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::WriteFailure);
    assert!(!Path::new(&config.output_dir).exists());
}

#[test]
fn missing_file_for_each_stage() {
    assert_eq!(
        compute_extent("does/not/exist.geojson").unwrap_err().kind(),
        ErrorKind::FileNotFound
    );
    assert_eq!(
        analyze_labels("does/not/exist.geojson", "", OneOrMany::default())
            .unwrap_err()
            .kind(),
        ErrorKind::FileNotFound
    );
    assert_eq!(
        compute_extent("tests/fixtures/empty.geojson")
            .unwrap_err()
            .kind(),
        ErrorKind::EmptyDataset
    );
}
