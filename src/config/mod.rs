use serde::Deserialize;
use std::path::PathBuf;

use crate::error::{Result, StoreReachError};

/// Environment variable consulted when no API key is set in the config file
pub const API_KEY_ENV: &str = "STORE_DIRECTORY_API_KEY";

fn default_boundary_dir() -> PathBuf {
    PathBuf::from("boundaries")
}
fn default_samples() -> usize {
    1000
}
fn default_verbose() -> bool {
    false
}

#[derive(Debug, Deserialize)]
pub struct FileConfig {
    #[serde(default = "default_boundary_dir")]
    pub boundary_dir: PathBuf,
    #[serde(default)]
    pub boundary: Option<String>,
    #[serde(default = "default_samples")]
    pub samples: usize,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub max_attempts: Option<u64>,
    #[serde(default)]
    pub area: Option<String>,
    #[serde(default)]
    pub chains: Vec<String>,
    #[serde(default)]
    pub output: Option<PathBuf>,
    #[serde(default = "default_verbose")]
    pub verbose: bool,
    #[serde(default)]
    pub directory: Option<DirectoryConfig>,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            boundary_dir: default_boundary_dir(),
            boundary: None,
            samples: default_samples(),
            seed: None,
            max_attempts: None,
            area: None,
            chains: Vec::new(),
            output: None,
            verbose: default_verbose(),
            directory: None,
        }
    }
}

fn default_api_url() -> String {
    "https://api.yelp.com/v3".to_string()
}

fn default_site_url() -> String {
    "https://www.yelp.com".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_consecutive_unavailable() -> u32 {
    5
}

/// Connection settings for the business directory.
///
/// Passed explicitly into whatever builds a directory client; nothing
/// holds a shared client.
#[derive(Debug, Deserialize, Clone)]
pub struct DirectoryConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_site_url")]
    pub site_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Stop enumerating after this many present-but-positionless ids in a row
    #[serde(default = "default_max_consecutive_unavailable")]
    pub max_consecutive_unavailable: u32,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            site_url: default_site_url(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
            max_consecutive_unavailable: default_max_consecutive_unavailable(),
        }
    }
}

impl DirectoryConfig {
    /// API key from the config, else from the environment
    pub fn resolve_api_key(&self) -> Result<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|k| !k.trim().is_empty())
            .ok_or(StoreReachError::MissingCredentials)
    }
}

/// Result of searching the standard config locations
#[derive(Debug, Default)]
pub struct ConfigDiscovery {
    /// First config that parsed, with where it came from
    pub found: Option<(PathBuf, FileConfig)>,
    /// Files that existed but failed to read or parse, checked before `found`
    pub rejected: Vec<(PathBuf, String)>,
}

impl FileConfig {
    /// Search the standard locations for a config file.
    ///
    /// Nothing is logged here: this runs before logging is set up, since the
    /// config itself can turn on verbose output. Callers report `rejected`.
    pub fn discover() -> ConfigDiscovery {
        Self::discover_in(&get_config_paths())
    }

    pub fn discover_in(paths: &[PathBuf]) -> ConfigDiscovery {
        let mut discovery = ConfigDiscovery::default();

        for path in paths.iter().filter(|p| p.is_file()) {
            let parsed: std::result::Result<FileConfig, String> = std::fs::read_to_string(path)
                .map_err(|e| e.to_string())
                .and_then(|contents| toml::from_str(&contents).map_err(|e| e.to_string()));
            match parsed {
                Ok(config) => {
                    discovery.found = Some((path.clone(), config));
                    break;
                }
                Err(reason) => discovery.rejected.push((path.clone(), reason)),
            }
        }

        discovery
    }
}

/// Candidate config files, most specific first
fn get_config_paths() -> Vec<PathBuf> {
    let mut paths = vec![
        PathBuf::from("storereach.toml"),
        PathBuf::from(".storereach.toml"),
    ];

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("storereach").join("config.toml"));
        paths.push(config_dir.join("storereach.toml"));
    }

    // XDG-style location, which differs from config_dir() on macOS and Windows
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".storereach.toml"));
        let xdg = home.join(".config").join("storereach").join("config.toml");
        if !paths.contains(&xdg) {
            paths.push(xdg);
        }
    }

    paths
}
