pub mod coordinate;
pub mod point_cloud;
pub mod polygon;

pub use coordinate::Coordinate;
pub use point_cloud::PointCloud;
pub use polygon::{BoundingBox, Polygon};
