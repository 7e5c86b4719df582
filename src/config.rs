use std::path::{Path, PathBuf};
use std::time::Duration;

use color_eyre::eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};

/// Default per-request timeout. Uploads of large lossless files need the headroom.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;

const DEFAULT_ITUNES_LIBRARY: &str = "~/Music/iTunes/iTunes Music Library.xml";

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub itunes_library: Option<String>,
    #[serde(default)]
    pub music_directory: Option<String>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

/// Where local tracks and playlists are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibraryLocation {
    ItunesXml(PathBuf),
    Directory(PathBuf),
}

impl Config {
    /// Load config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .wrap_err(format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .wrap_err(format!("Failed to parse config file: {}", path.display()))
    }

    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|path| path.join("audiobox-sync").join("config.toml"))
    }

    /// Load the default config file, or an empty config when there is none.
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.is_file() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Expand ~ to home directory
    fn expand_path(path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        PathBuf::from(path)
    }

    /// The configured library, falling back to the default iTunes export.
    pub fn library(&self) -> LibraryLocation {
        if let Some(directory) = &self.music_directory {
            return LibraryLocation::Directory(Self::expand_path(directory));
        }
        let xml = self
            .itunes_library
            .as_deref()
            .unwrap_or(DEFAULT_ITUNES_LIBRARY);
        LibraryLocation::ItunesXml(Self::expand_path(xml))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }
}
