use geo::{BoundingRect, Coord, LineString};
use std::collections::HashSet;

use super::Coordinate;
use crate::error::{Result, StoreReachError};

/// Axis-aligned extent of a polygon's vertices, in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn contains(&self, point: Coordinate) -> bool {
        point.lat >= self.min_lat
            && point.lat <= self.max_lat
            && point.lon >= self.min_lon
            && point.lon <= self.max_lon
    }
}

/// A single closed ring of (lat, lon) vertices.
///
/// The ring is implicitly closed: the last vertex connects back to the
/// first. A duplicated closing vertex (as GeoJSON stores rings) is dropped
/// on construction. Self-intersecting rings are not detected and give
/// meaningless containment results.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    vertices: Vec<Coordinate>,
    bbox: BoundingBox,
}

impl Polygon {
    pub fn new(mut vertices: Vec<Coordinate>) -> Result<Self> {
        vertices.dedup();
        if vertices.len() > 1 && vertices.first() == vertices.last() {
            vertices.pop();
        }

        let distinct = count_distinct(&vertices);
        if distinct < 3 {
            return Err(StoreReachError::DegeneratePolygon { vertices: distinct });
        }

        let ring: LineString<f64> = vertices
            .iter()
            .map(|c| Coord { x: c.lon, y: c.lat })
            .collect();
        let rect = ring
            .bounding_rect()
            .ok_or(StoreReachError::DegeneratePolygon {
                vertices: vertices.len(),
            })?;

        let bbox = BoundingBox {
            min_lat: rect.min().y,
            max_lat: rect.max().y,
            min_lon: rect.min().x,
            max_lon: rect.max().x,
        };

        Ok(Self { vertices, bbox })
    }

    pub fn vertices(&self) -> &[Coordinate] {
        &self.vertices
    }

    pub fn bounding_box(&self) -> BoundingBox {
        self.bbox
    }
}

fn count_distinct(vertices: &[Coordinate]) -> usize {
    let keys: HashSet<(u64, u64)> = vertices
        .iter()
        .map(|c| (c.lat.to_bits(), c.lon.to_bits()))
        .collect();
    keys.len()
}
