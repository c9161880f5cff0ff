//! Layered configuration.
//!
//! Sources, later ones winning:
//! 1. built-in defaults;
//! 2. a TOML, YAML or JSON file (an explicit path, or `config.toml` in the
//!    platform config directory if it exists);
//! 3. `LONGBOX_` environment variables, with `__` separating sections
//!    (`LONGBOX_LIBRARY__COMICS_DIRECTORY=/srv/comics`).

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const ENV_PREFIX: &str = "LONGBOX_";
const CONFIG_FILENAME: &str = "config.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub library: LibraryConfig,
    pub catalog: CatalogConfig,
    pub import: ImportConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Root directory scanned for comic archives
    pub comics_directory: PathBuf,
    /// Where cover images are written
    pub media_directory: PathBuf,
    /// SQLite database file
    pub database: PathBuf,
}
impl Default for LibraryConfig {
    fn default() -> Self {
        let data = project_dirs().map(|dirs| dirs.data_dir().to_path_buf()).unwrap_or_else(|| PathBuf::from("longbox"));
        Self {
            comics_directory: data.join("comics"),
            media_directory: data.join("media"),
            database: data.join("library.sqlite3"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Directory of catalog JSON documents. Without one, imports run offline.
    pub directory: Option<PathBuf>,
    /// Upper bound on a single catalog lookup
    pub timeout_secs: u64,
}
impl Default for CatalogConfig {
    fn default() -> Self {
        Self { directory: None, timeout_secs: 30 }
    }
}
impl CatalogConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Keep leftover filename tokens (scan group, "digital", ...) on issues
    pub retain_scan_info: bool,
    /// Read every page to record its byte size
    pub calculate_page_sizes: bool,
    /// Image served in place of a page that can't be read
    pub default_page_image: Option<PathBuf>,
}
impl Default for ImportConfig {
    fn default() -> Self {
        Self { retain_scan_info: true, calculate_page_sizes: false, default_page_image: None }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "longbox")
}

impl Config {
    /// Load configuration from every source and validate it.
    ///
    /// An explicit `path` must exist; the platform default is skipped
    /// silently when absent.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config: Self = match Self::figment(path)?.extract() {
            Ok(config) => config,
            Err(err) => exn::bail!(ErrorKind::Load(err.to_string())),
        };
        config.validate()?;
        tracing::debug!(?config, "Loaded configuration");
        Ok(config)
    }

    fn figment(path: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        let file = match path {
            Some(path) if !path.is_file() => exn::bail!(ErrorKind::NotFound(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILENAME)).filter(|path| path.is_file()),
        };
        if let Some(file) = file {
            tracing::debug!(path = %file.display(), "Reading config file");
            figment = match file.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase).as_deref() {
                Some("toml") => figment.merge(Toml::file_exact(&file)),
                Some("yaml" | "yml") => figment.merge(Yaml::file_exact(&file)),
                Some("json") => figment.merge(Json::file_exact(&file)),
                _ => exn::bail!(ErrorKind::UnsupportedFormat(file)),
            };
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Reject settings that would only fail later, half-way through an import.
    pub fn validate(&self) -> Result<()> {
        for (name, dir) in [
            ("library.comics_directory", &self.library.comics_directory),
            ("library.media_directory", &self.library.media_directory),
        ] {
            if !dir.is_absolute() {
                exn::bail!(ErrorKind::Invalid(format!("{name} must be an absolute path, got {}", dir.display())));
            }
        }
        if self.catalog.timeout_secs == 0 {
            exn::bail!(ErrorKind::Invalid("catalog.timeout_secs must be greater than zero".to_string()));
        }
        Ok(())
    }
}
