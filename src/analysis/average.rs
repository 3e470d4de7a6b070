use tracing::{debug, warn};

use crate::domain::{Coordinate, PointCloud};
use crate::error::{Result, StoreReachError};
use crate::geometry::distance::{FEET_PER_MILE, nearest_distance};

/// Mean distance, in whole feet, from each cloud point to its nearest chain
/// location.
///
/// Distances are averaged in miles and converted to feet once at the end;
/// the result is truncated, not rounded.
///
/// # Errors
/// * `EmptyTargetSet` - the chain has no locations
/// * `EmptyPointCloud` - nothing to average over
pub fn average_distance(cloud: &PointCloud, locations: &[Coordinate]) -> Result<u64> {
    if locations.is_empty() {
        return Err(StoreReachError::EmptyTargetSet);
    }
    if cloud.is_empty() {
        return Err(StoreReachError::EmptyPointCloud);
    }

    let mut total_miles = 0.0;
    for &point in cloud {
        total_miles += nearest_distance(point, locations)?;
    }

    let mean_miles = total_miles / cloud.len() as f64;
    Ok((mean_miles * FEET_PER_MILE) as u64)
}

/// Outcome for one chain in a batch comparison
#[derive(Debug)]
pub struct ChainDistance {
    pub chain: String,
    pub feet: Result<u64>,
}

/// Average distance for several chains against the same cloud.
///
/// A failing chain does not stop the others. Successful chains come first,
/// nearest first; failures keep their input order at the end.
pub fn rank_chains<S: AsRef<str>>(
    cloud: &PointCloud,
    chains: &[(S, Vec<Coordinate>)],
) -> Vec<ChainDistance> {
    let mut results: Vec<ChainDistance> = chains
        .iter()
        .map(|(chain, locations)| {
            let chain = chain.as_ref().to_string();
            let feet = average_distance(cloud, locations);
            match &feet {
                Ok(ft) => debug!(chain = %chain, feet = ft, "chain distance"),
                Err(e) => warn!(chain = %chain, error = %e, "skipping chain"),
            }
            ChainDistance { chain, feet }
        })
        .collect();

    results.sort_by_key(|r| match r.feet {
        Ok(ft) => (0, ft),
        Err(_) => (1, 0),
    });
    results
}
