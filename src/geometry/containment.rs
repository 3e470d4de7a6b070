use crate::domain::{Coordinate, Polygon};

/// Ray-casting point-in-polygon test.
///
/// Casts a ray along the latitude axis and counts edge crossings; an odd
/// count means inside. Edges parallel to the ray (equal longitude at both
/// ends) never produce a crossing and are skipped before the intercept is
/// computed.
///
/// Points lying exactly on an edge may be reported either way depending on
/// which edge they sit on. Only single-ring polygons are meaningful here.
pub fn contains(point: Coordinate, polygon: &Polygon) -> bool {
    let vertices = polygon.vertices();
    let n = vertices.len();
    let (x, y) = (point.lat, point.lon);

    let mut inside = false;
    let (mut p1x, mut p1y) = (vertices[0].lat, vertices[0].lon);

    for i in 1..=n {
        let (p2x, p2y) = (vertices[i % n].lat, vertices[i % n].lon);

        if p1y != p2y && y > p1y.min(p2y) && y <= p1y.max(p2y) && x <= p1x.max(p2x) {
            let x_intercept = (y - p1y) * (p2x - p1x) / (p2y - p1y) + p1x;
            if p1x == p2x || x <= x_intercept {
                inside = !inside;
            }
        }

        p1x = p2x;
        p1y = p2y;
    }

    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rectangle() -> Polygon {
        Polygon::new(vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 10.0),
            Coordinate::new(10.0, 10.0),
            Coordinate::new(10.0, 0.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_rectangle_inside_and_outside() {
        let polygon = rectangle();
        assert!(contains(Coordinate::new(5.0, 5.0), &polygon));
        assert!(!contains(Coordinate::new(15.0, 15.0), &polygon));
    }

    #[test]
    fn test_outside_bounding_box_is_outside() {
        let polygon = rectangle();
        let outside = [
            (-0.5, 5.0),
            (10.5, 5.0),
            (5.0, -0.5),
            (5.0, 10.5),
            (-3.0, -3.0),
            (20.0, -7.0),
            (1e6, 1e6),
        ];
        let bbox = polygon.bounding_box();
        for (lat, lon) in outside {
            let point = Coordinate::new(lat, lon);
            assert!(!bbox.contains(point));
            assert!(!contains(point, &polygon), "({lat}, {lon})");
        }
    }

    #[test]
    fn test_concave_notch() {
        // U shape opening towards high latitude
        let polygon = Polygon::new(vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 9.0),
            Coordinate::new(9.0, 9.0),
            Coordinate::new(9.0, 6.0),
            Coordinate::new(3.0, 6.0),
            Coordinate::new(3.0, 3.0),
            Coordinate::new(9.0, 3.0),
            Coordinate::new(9.0, 0.0),
        ])
        .unwrap();

        assert!(contains(Coordinate::new(1.0, 4.5), &polygon));
        assert!(contains(Coordinate::new(6.0, 1.5), &polygon));
        assert!(contains(Coordinate::new(6.0, 7.5), &polygon));
        assert!(!contains(Coordinate::new(6.0, 4.5), &polygon));
    }

    #[test]
    fn test_triangle() {
        let polygon = Polygon::new(vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(4.0, 0.0),
            Coordinate::new(0.0, 4.0),
        ])
        .unwrap();

        assert!(contains(Coordinate::new(1.0, 1.0), &polygon));
        assert!(!contains(Coordinate::new(3.0, 3.0), &polygon));
    }
}
