use serde_json::Value;

use crate::domain::{Coordinate, Polygon};
use crate::error::{Result, StoreReachError};

/// One contiguous piece of a boundary
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryPart {
    /// Outer ring in (lat, lon) order
    pub exterior: Vec<Coordinate>,
    /// Number of interior rings the source declared
    pub holes: usize,
}

/// A named boundary as read from disk; may be composite
#[derive(Debug, Clone, PartialEq)]
pub struct Boundary {
    pub name: String,
    pub parts: Vec<BoundaryPart>,
}

impl Boundary {
    pub fn is_single(&self) -> bool {
        self.parts.len() == 1 && self.parts[0].holes == 0
    }

    /// Every part's exterior ring as a polygon
    pub fn polygons(&self) -> Result<Vec<Polygon>> {
        self.parts
            .iter()
            .map(|p| Polygon::new(p.exterior.clone()))
            .collect()
    }

    /// The boundary as a single ring.
    ///
    /// Ray casting over several rings (or a ring with holes) gives wrong
    /// answers, so composite boundaries are rejected outright.
    pub fn into_single_polygon(self) -> Result<Polygon> {
        let Boundary { name, mut parts } = self;
        if parts.len() != 1 {
            return Err(StoreReachError::UnsupportedGeometry {
                name,
                reason: format!(
                    "{} separate polygons; only single-part boundaries are supported",
                    parts.len()
                ),
            });
        }

        let part = parts.remove(0);
        if part.holes > 0 {
            return Err(StoreReachError::UnsupportedGeometry {
                name,
                reason: format!("polygon has {} interior ring(s)", part.holes),
            });
        }
        Polygon::new(part.exterior)
    }
}

/// Parse GeoJSON text into a boundary.
///
/// Accepts a bare `Polygon`/`MultiPolygon`, a `Feature` wrapping one, or a
/// `FeatureCollection` of them. Positions are read as (lon, lat) and
/// reordered to (lat, lon); any altitude is ignored.
pub fn parse_boundary(name: &str, text: &str) -> Result<Boundary> {
    let document: Value = serde_json::from_str(text).map_err(|source| StoreReachError::Json {
        context: format!("boundary {name}"),
        source,
    })?;

    let mut parts = Vec::new();
    collect_parts(name, &document, &mut parts)?;

    if parts.is_empty() {
        return Err(invalid(name, "no polygon geometry found"));
    }

    Ok(Boundary {
        name: name.to_string(),
        parts,
    })
}

fn collect_parts(name: &str, value: &Value, parts: &mut Vec<BoundaryPart>) -> Result<()> {
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid(name, "object without a \"type\" member"))?;

    match kind {
        "FeatureCollection" => {
            let features = value
                .get("features")
                .and_then(Value::as_array)
                .ok_or_else(|| invalid(name, "FeatureCollection without features"))?;
            for feature in features {
                collect_parts(name, feature, parts)?;
            }
        }
        "Feature" => match value.get("geometry") {
            Some(Value::Null) | None => {}
            Some(geometry) => collect_parts(name, geometry, parts)?,
        },
        "Polygon" => {
            let rings = coordinates(name, value)?;
            parts.push(parse_polygon(name, rings)?);
        }
        "MultiPolygon" => {
            let polygons = coordinates(name, value)?;
            let polygons = polygons
                .as_array()
                .ok_or_else(|| invalid(name, "MultiPolygon coordinates must be an array"))?;
            for rings in polygons {
                parts.push(parse_polygon(name, rings)?);
            }
        }
        other => {
            return Err(StoreReachError::UnsupportedGeometry {
                name: name.to_string(),
                reason: format!("{other} is not an areal geometry"),
            });
        }
    }

    Ok(())
}

fn coordinates<'a>(name: &str, geometry: &'a Value) -> Result<&'a Value> {
    geometry
        .get("coordinates")
        .ok_or_else(|| invalid(name, "geometry without coordinates"))
}

fn parse_polygon(name: &str, rings: &Value) -> Result<BoundaryPart> {
    let rings = rings
        .as_array()
        .ok_or_else(|| invalid(name, "polygon rings must be an array"))?;
    let (exterior, interiors) = rings
        .split_first()
        .ok_or_else(|| invalid(name, "polygon without an exterior ring"))?;

    Ok(BoundaryPart {
        exterior: parse_ring(name, exterior)?,
        holes: interiors.len(),
    })
}

fn parse_ring(name: &str, ring: &Value) -> Result<Vec<Coordinate>> {
    let positions = ring
        .as_array()
        .ok_or_else(|| invalid(name, "ring must be an array of positions"))?;

    positions
        .iter()
        .map(|position| {
            let pair = position
                .as_array()
                .filter(|p| p.len() >= 2)
                .ok_or_else(|| invalid(name, "position must hold at least two numbers"))?;
            let lon = pair[0]
                .as_f64()
                .ok_or_else(|| invalid(name, "longitude is not a number"))?;
            let lat = pair[1]
                .as_f64()
                .ok_or_else(|| invalid(name, "latitude is not a number"))?;
            Ok(Coordinate::from_lon_lat(lon, lat))
        })
        .collect()
}

fn invalid(name: &str, reason: &str) -> StoreReachError {
    StoreReachError::InvalidBoundary {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE: &str = r#"{
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": {"name": "Manhattan"},
            "geometry": {
                "type": "Polygon",
                "coordinates": [[
                    [-74.02, 40.70], [-73.93, 40.70], [-73.93, 40.80],
                    [-74.02, 40.80], [-74.02, 40.70]
                ]]
            }
        }]
    }"#;

    #[test]
    fn test_parse_feature_collection_reorders() {
        let boundary = parse_boundary("manhattan", SIMPLE).unwrap();
        assert!(boundary.is_single());
        assert_eq!(boundary.parts[0].exterior.len(), 5);
        assert_eq!(
            boundary.parts[0].exterior[1],
            Coordinate::new(40.70, -73.93)
        );

        let polygon = boundary.into_single_polygon().unwrap();
        assert_eq!(polygon.vertices().len(), 4);
        assert_eq!(polygon.bounding_box().min_lat, 40.70);
        assert_eq!(polygon.bounding_box().min_lon, -74.02);
    }

    #[test]
    fn test_bare_polygon_with_altitude() {
        let text = r#"{"type": "Polygon", "coordinates": [[[0, 0, 5], [1, 0, 5], [1, 1, 5], [0, 0, 5]]]}"#;
        let boundary = parse_boundary("tri", text).unwrap();
        assert_eq!(boundary.parts[0].exterior[1], Coordinate::new(0.0, 1.0));
    }

    #[test]
    fn test_multipolygon_rejected_as_single() {
        let text = r#"{
            "type": "Feature",
            "geometry": {
                "type": "MultiPolygon",
                "coordinates": [
                    [[[0, 0], [1, 0], [1, 1], [0, 0]]],
                    [[[5, 5], [6, 5], [6, 6], [5, 5]]]
                ]
            }
        }"#;
        let boundary = parse_boundary("islands", text).unwrap();
        assert_eq!(boundary.parts.len(), 2);
        assert_eq!(boundary.polygons().unwrap().len(), 2);
        assert!(matches!(
            boundary.into_single_polygon(),
            Err(StoreReachError::UnsupportedGeometry { .. })
        ));
    }

    #[test]
    fn test_holes_rejected_as_single() {
        let text = r#"{"type": "Polygon", "coordinates": [
            [[0, 0], [10, 0], [10, 10], [0, 10], [0, 0]],
            [[4, 4], [6, 4], [6, 6], [4, 4]]
        ]}"#;
        let boundary = parse_boundary("donut", text).unwrap();
        assert_eq!(boundary.parts[0].holes, 1);
        assert!(matches!(
            boundary.into_single_polygon(),
            Err(StoreReachError::UnsupportedGeometry { .. })
        ));
    }

    #[test]
    fn test_non_areal_geometry() {
        let text = r#"{"type": "LineString", "coordinates": [[0, 0], [1, 1]]}"#;
        assert!(matches!(
            parse_boundary("line", text),
            Err(StoreReachError::UnsupportedGeometry { .. })
        ));
    }

    #[test]
    fn test_malformed_position() {
        let text = r#"{"type": "Polygon", "coordinates": [[[0], [1, 0], [1, 1]]]}"#;
        assert!(matches!(
            parse_boundary("bad", text),
            Err(StoreReachError::InvalidBoundary { .. })
        ));
    }
}
