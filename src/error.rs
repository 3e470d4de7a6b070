use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreReachError>;

#[derive(Debug, Error)]
pub enum StoreReachError {
    #[error(
        "no directory API key configured (set [directory].api_key or STORE_DIRECTORY_API_KEY)"
    )]
    MissingCredentials,

    #[error("boundary \"{name}\" not found (looked for {path})")]
    BoundaryNotFound { name: String, path: PathBuf },

    #[error("invalid boundary \"{name}\": {reason}")]
    InvalidBoundary { name: String, reason: String },

    #[error("unsupported geometry in boundary \"{name}\": {reason}")]
    UnsupportedGeometry { name: String, reason: String },

    #[error("polygon needs at least 3 distinct vertices, got {vertices}")]
    DegeneratePolygon { vertices: usize },

    #[error("nearest distance requested against an empty target set")]
    EmptyTargetSet,

    #[error("average distance requested over an empty point cloud")]
    EmptyPointCloud,

    #[error("sampling did not converge: accepted {accepted} points in {attempts} attempts")]
    SamplingDidNotConverge { accepted: usize, attempts: u64 },

    #[error("geodesic distance did not converge between {from} and {to}")]
    DistanceDidNotConverge { from: String, to: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error for {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
