use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::domain::Coordinate;
use crate::error::{Result, StoreReachError};

/// One row of a chain comparison table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistanceRecord {
    pub chain: String,
    pub feet: u64,
}

/// Cached directory results for one chain in one area
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainLocationsRecord {
    pub chain: String,
    pub area: String,
    pub locations: Vec<Coordinate>,
}

/// Write any serializable value as pretty-printed JSON
pub fn save_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).map_err(|source| StoreReachError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, value).map_err(|source| StoreReachError::Json {
        context: path.display().to_string(),
        source,
    })?;
    writer.flush().map_err(|source| StoreReachError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(())
}

pub fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).map_err(|source| StoreReachError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_reader(BufReader::new(file)).map_err(|source| StoreReachError::Json {
        context: path.display().to_string(),
        source,
    })
}

pub fn save_records(path: &Path, records: &[DistanceRecord]) -> Result<()> {
    save_json(path, records)
}

pub fn load_records(path: &Path) -> Result<Vec<DistanceRecord>> {
    load_json(path)
}
