pub mod containment;
pub mod distance;
pub mod sampling;

pub use containment::contains;
pub use distance::{NearestTarget, geodesic_miles, nearest_distance, nearest_target};
pub use sampling::{SamplerOptions, sample, sample_with_rng};
