use std::path::{Path, PathBuf};
use tracing::debug;

use super::geojson::{Boundary, parse_boundary};
use crate::domain::Polygon;
use crate::error::{Result, StoreReachError};

/// Where a named boundary is expected to live:
/// `{dir}/{name lowercased, spaces to underscores}.geojson`
pub fn boundary_path(dir: &Path, name: &str) -> PathBuf {
    let stem = name.trim().to_lowercase().replace(' ', "_");
    dir.join(format!("{stem}.geojson"))
}

/// Load a named boundary from `dir`.
///
/// Falls back to treating `name` as a file path so one-off files can be
/// used without copying them into the boundary directory.
///
/// # Errors
/// * `BoundaryNotFound` - neither location has a file
/// * `InvalidBoundary` / `UnsupportedGeometry` - the file is not usable
pub fn load_boundary(dir: &Path, name: &str) -> Result<Boundary> {
    let named = boundary_path(dir, name);
    let path = if named.is_file() {
        named
    } else if Path::new(name).is_file() {
        PathBuf::from(name)
    } else {
        return Err(StoreReachError::BoundaryNotFound {
            name: name.to_string(),
            path: named,
        });
    };

    debug!(boundary = name, path = %path.display(), "loading boundary");
    let text = std::fs::read_to_string(&path).map_err(|source| StoreReachError::Io {
        path: path.clone(),
        source,
    })?;

    parse_boundary(name, &text)
}

/// Load a boundary that must be a single ring without holes
pub fn load_single_polygon(dir: &Path, name: &str) -> Result<Polygon> {
    load_boundary(dir, name)?.into_single_polygon()
}
