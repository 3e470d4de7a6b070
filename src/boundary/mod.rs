pub mod geojson;
pub mod loader;

pub use geojson::{Boundary, BoundaryPart, parse_boundary};
pub use loader::{boundary_path, load_boundary, load_single_polygon};
