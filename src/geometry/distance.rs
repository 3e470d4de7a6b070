use geo::VincentyDistance;

use crate::domain::Coordinate;
use crate::error::{Result, StoreReachError};

pub const METERS_PER_MILE: f64 = 1609.344;
pub const FEET_PER_MILE: f64 = 5280.0;

/// Ellipsoidal (WGS84) distance between two coordinates in miles, using
/// Vincenty's inverse formula.
///
/// # Errors
/// * `DistanceDidNotConverge` - nearly antipodal points where the iteration fails
pub fn geodesic_miles(from: Coordinate, to: Coordinate) -> Result<f64> {
    let meters = from
        .to_point()
        .vincenty_distance(&to.to_point())
        .map_err(|_| StoreReachError::DistanceDidNotConverge {
            from: from.to_string(),
            to: to.to_string(),
        })?;
    Ok(meters / METERS_PER_MILE)
}

/// The closest entry of a target list
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestTarget {
    /// Position in the target slice (first one wins on ties)
    pub index: usize,
    pub coordinate: Coordinate,
    pub miles: f64,
}

/// Brute-force scan for the target nearest to `point`.
///
/// # Errors
/// * `EmptyTargetSet` - `targets` is empty
pub fn nearest_target(point: Coordinate, targets: &[Coordinate]) -> Result<NearestTarget> {
    let mut best: Option<NearestTarget> = None;

    for (index, &target) in targets.iter().enumerate() {
        let miles = geodesic_miles(point, target)?;
        if best.is_none_or(|b| miles < b.miles) {
            best = Some(NearestTarget {
                index,
                coordinate: target,
                miles,
            });
        }
    }

    best.ok_or(StoreReachError::EmptyTargetSet)
}

/// Distance in miles from `point` to the nearest of `targets`.
pub fn nearest_distance(point: Coordinate, targets: &[Coordinate]) -> Result<f64> {
    nearest_target(point, targets).map(|n| n.miles)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn targets() -> Vec<Coordinate> {
        vec![
            Coordinate::new(40.7580, -73.9855),
            Coordinate::new(40.7128, -74.0060),
            Coordinate::new(40.7831, -73.9712),
            Coordinate::new(40.7306, -73.9866),
        ]
    }

    #[test]
    fn test_empty_targets_fail() {
        let result = nearest_distance(Coordinate::new(40.75, -73.98), &[]);
        assert!(matches!(result, Err(StoreReachError::EmptyTargetSet)));
    }

    #[test]
    fn test_zero_when_point_is_a_target() {
        let targets = targets();
        let d = nearest_distance(targets[2], &targets).unwrap();
        assert_eq!(d, 0.0);
    }

    #[test]
    fn test_order_independent() {
        let point = Coordinate::new(40.7400, -73.9900);
        let forward = targets();
        let mut reversed = forward.clone();
        reversed.reverse();
        let mut rotated = forward.clone();
        rotated.rotate_left(1);

        let a = nearest_distance(point, &forward).unwrap();
        let b = nearest_distance(point, &reversed).unwrap();
        let c = nearest_distance(point, &rotated).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn test_nearest_target_index() {
        let point = Coordinate::new(40.7310, -73.9870);
        let nearest = nearest_target(point, &targets()).unwrap();
        assert_eq!(nearest.index, 3);
        assert!(nearest.miles < 0.1);
    }

    #[test]
    fn test_one_degree_latitude() {
        // One degree of latitude near 40N is about 69 miles
        let d = geodesic_miles(Coordinate::new(40.0, -74.0), Coordinate::new(41.0, -74.0)).unwrap();
        assert!((d - 69.0).abs() < 0.2, "got {d}");
    }
}
