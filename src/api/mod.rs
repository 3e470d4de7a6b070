pub mod directory;
pub mod http;

pub use directory::{DirectoryApi, Enumerator, LookupOutcome, ProbeState, business_id, slugify};
pub use http::HttpDirectory;
