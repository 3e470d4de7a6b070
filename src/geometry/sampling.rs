use rand::Rng;
use tracing::debug;

use super::containment::contains;
use crate::domain::{BoundingBox, Coordinate, PointCloud, Polygon};
use crate::error::{Result, StoreReachError};

/// Controls for rejection sampling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplerOptions {
    /// Lower bound on the cloud size; sampling stops once the cloud holds
    /// more than this many points, so `target + 1` points are returned.
    pub target: usize,
    /// Maximum number of candidate draws before giving up. `None` keeps
    /// drawing until the target is exceeded, however long that takes.
    pub max_attempts: Option<u64>,
}

impl SamplerOptions {
    pub fn new(target: usize) -> Self {
        Self {
            target,
            max_attempts: None,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u64) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }
}

/// Sample more than `n` points uniformly inside `polygon`.
///
/// Unbounded: a polygon that covers a tiny fraction of its bounding box
/// makes this arbitrarily slow. Use [`sample_with_rng`] with a
/// `max_attempts` budget when that matters.
pub fn sample(polygon: &Polygon, n: usize) -> PointCloud {
    let mut rng = rand::rng();
    let bbox = polygon.bounding_box();
    let mut cloud = PointCloud::with_capacity(n + 1);

    while cloud.len() <= n {
        let candidate = draw(&bbox, &mut rng);
        if contains(candidate, polygon) {
            cloud.push(candidate);
        }
    }

    cloud
}

/// Rejection-sample with a caller-supplied RNG and an optional draw budget.
///
/// # Algorithm
/// 1. Draw a uniform point in the polygon's bounding box
/// 2. Keep it if the ray-casting test says it is inside, otherwise redraw
/// 3. Stop once the cloud size exceeds `options.target`
///
/// # Errors
/// * `SamplingDidNotConverge` - the budget ran out first
pub fn sample_with_rng<R: Rng + ?Sized>(
    polygon: &Polygon,
    options: &SamplerOptions,
    rng: &mut R,
) -> Result<PointCloud> {
    let bbox = polygon.bounding_box();
    let mut cloud = PointCloud::with_capacity(options.target + 1);
    let mut attempts: u64 = 0;

    while cloud.len() <= options.target {
        if let Some(limit) = options.max_attempts
            && attempts >= limit
        {
            return Err(StoreReachError::SamplingDidNotConverge {
                accepted: cloud.len(),
                attempts,
            });
        }
        attempts += 1;

        let candidate = draw(&bbox, rng);
        if contains(candidate, polygon) {
            cloud.push(candidate);
        }
    }

    debug!(
        accepted = cloud.len(),
        attempts,
        acceptance = cloud.len() as f64 / attempts as f64,
        "sampling finished"
    );

    Ok(cloud)
}

fn draw<R: Rng + ?Sized>(bbox: &BoundingBox, rng: &mut R) -> Coordinate {
    let lat = rng.random_range(bbox.min_lat..=bbox.max_lat);
    let lon = rng.random_range(bbox.min_lon..=bbox.max_lon);
    Coordinate::new(lat, lon)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rectangle() -> Polygon {
        Polygon::new(vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 10.0),
            Coordinate::new(10.0, 10.0),
            Coordinate::new(10.0, 0.0),
        ])
        .unwrap()
    }

    fn sliver() -> Polygon {
        Polygon::new(vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(10.0, 10.0),
            Coordinate::new(10.0, 10.000001),
        ])
        .unwrap()
    }

    #[test]
    fn test_sample_exceeds_target() {
        let polygon = rectangle();
        let cloud = sample(&polygon, 200);
        assert_eq!(cloud.len(), 201);
        assert!(cloud.iter().all(|&p| contains(p, &polygon)));
    }

    #[test]
    fn test_sample_triangle_points_inside() {
        let polygon = Polygon::new(vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(4.0, 0.0),
            Coordinate::new(0.0, 4.0),
        ])
        .unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let cloud = sample_with_rng(&polygon, &SamplerOptions::new(300), &mut rng).unwrap();

        assert!(cloud.len() > 300);
        for p in &cloud {
            assert!(contains(*p, &polygon));
            assert!(p.lat + p.lon <= 4.0);
        }
    }

    #[test]
    fn test_seeded_sampling_is_reproducible() {
        let polygon = rectangle();
        let options = SamplerOptions::new(50);
        let a = sample_with_rng(&polygon, &options, &mut StdRng::seed_from_u64(42)).unwrap();
        let b = sample_with_rng(&polygon, &options, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_budget_exhausted() {
        let polygon = sliver();
        let options = SamplerOptions::new(1000).with_max_attempts(100);
        let mut rng = StdRng::seed_from_u64(1);

        match sample_with_rng(&polygon, &options, &mut rng) {
            Err(StoreReachError::SamplingDidNotConverge { accepted, attempts }) => {
                assert_eq!(attempts, 100);
                assert!(accepted < 1000);
            }
            other => panic!("expected SamplingDidNotConverge, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_target_returns_one_point() {
        let polygon = rectangle();
        let mut rng = StdRng::seed_from_u64(3);
        let cloud = sample_with_rng(&polygon, &SamplerOptions::new(0), &mut rng).unwrap();
        assert_eq!(cloud.len(), 1);
    }
}
