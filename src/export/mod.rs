pub mod geojson;

pub use geojson::{MapLayer, feature_collection, write_map};
