pub mod average;
pub mod records;

pub use average::{ChainDistance, average_distance, rank_chains};
pub use records::{
    ChainLocationsRecord, DistanceRecord, load_json, load_records, save_json, save_records,
};
