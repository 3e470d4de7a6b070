use serde_json::{Value, json};
use std::path::Path;

use crate::analysis::save_json;
use crate::domain::{Coordinate, Polygon};
use crate::error::Result;

/// A named set of points or a boundary ring to draw on a map
#[derive(Debug, Clone, Copy)]
pub enum MapLayer<'a> {
    Points {
        name: &'a str,
        points: &'a [Coordinate],
    },
    Boundary {
        name: &'a str,
        polygon: &'a Polygon,
    },
}

/// Build a GeoJSON `FeatureCollection` for the given layers.
///
/// Positions are written in GeoJSON (lon, lat) order. Every feature
/// carries a `layer` property so map tools can style layers separately.
pub fn feature_collection(layers: &[MapLayer<'_>]) -> Value {
    let mut features = Vec::new();

    for layer in layers {
        match *layer {
            MapLayer::Points { name, points } => {
                features.extend(points.iter().map(|p| {
                    json!({
                        "type": "Feature",
                        "properties": { "layer": name },
                        "geometry": { "type": "Point", "coordinates": [p.lon, p.lat] },
                    })
                }));
            }
            MapLayer::Boundary { name, polygon } => {
                let mut ring: Vec<[f64; 2]> =
                    polygon.vertices().iter().map(|p| [p.lon, p.lat]).collect();
                ring.push(ring[0]);
                features.push(json!({
                    "type": "Feature",
                    "properties": { "layer": name },
                    "geometry": { "type": "Polygon", "coordinates": [ring] },
                }));
            }
        }
    }

    json!({ "type": "FeatureCollection", "features": features })
}

/// Write layers to a GeoJSON file
pub fn write_map(path: &Path, layers: &[MapLayer<'_>]) -> Result<()> {
    save_json(path, &feature_collection(layers))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::parse_boundary;
    use std::fs;
    use tempfile::tempdir;

    fn square() -> Polygon {
        Polygon::new(vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 2.0),
            Coordinate::new(1.0, 2.0),
            Coordinate::new(1.0, 0.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_points_written_lon_lat() {
        let points = [Coordinate::new(40.75, -73.98)];
        let collection = feature_collection(&[MapLayer::Points {
            name: "stores",
            points: &points,
        }]);

        let feature = &collection["features"][0];
        assert_eq!(feature["properties"]["layer"], "stores");
        assert_eq!(feature["geometry"]["coordinates"][0], -73.98);
        assert_eq!(feature["geometry"]["coordinates"][1], 40.75);
    }

    #[test]
    fn test_boundary_ring_is_closed() {
        let polygon = square();
        let collection = feature_collection(&[MapLayer::Boundary {
            name: "area",
            polygon: &polygon,
        }]);
        let ring = collection["features"][0]["geometry"]["coordinates"][0]
            .as_array()
            .unwrap();
        assert_eq!(ring.len(), 5);
        assert_eq!(ring[0], ring[4]);
    }

    #[test]
    fn test_written_boundary_reloads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("map.geojson");
        let polygon = square();
        let cloud = [Coordinate::new(0.5, 1.0)];

        write_map(
            &path,
            &[
                MapLayer::Boundary {
                    name: "area",
                    polygon: &polygon,
                },
                MapLayer::Points {
                    name: "cloud",
                    points: &cloud,
                },
            ],
        )
        .unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["features"].as_array().unwrap().len(), 2);

        // Only the polygon layer is areal; point features are not boundaries
        let only_boundary = json!({
            "type": "FeatureCollection",
            "features": [value["features"][0].clone()],
        });
        let reloaded = parse_boundary("area", &only_boundary.to_string())
            .unwrap()
            .into_single_polygon()
            .unwrap();
        assert_eq!(reloaded, polygon);
    }
}
