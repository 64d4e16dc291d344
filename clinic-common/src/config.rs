//! Configuration loading
//!
//! Every setting resolves in the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

pub const ENV_DATABASE: &str = "CLINIC_PORTAL_DATABASE";
pub const ENV_BIND: &str = "CLINIC_PORTAL_BIND";
pub const ENV_UPLOADS: &str = "CLINIC_PORTAL_UPLOADS";
pub const ENV_SERVICE_KEY: &str = "CLINIC_PORTAL_SERVICE_KEY";
pub const ENV_SEMESTER: &str = "CLINIC_PORTAL_SEMESTER";
pub const ENV_CONFIG_FILE: &str = "CLINIC_PORTAL_CONFIG";

pub const DEFAULT_BIND: &str = "127.0.0.1:5740";
pub const DEFAULT_SEMESTER: &str = "Spring 2026";

/// Resolved settings for the portal service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalConfig {
    /// Socket address the HTTP server binds to
    pub bind: String,
    /// SQLite database file
    pub database_path: PathBuf,
    /// Directory uploaded files are written to and served from
    pub uploads_dir: PathBuf,
    /// Key required in `x-api-key`; `None` disables the check
    pub service_key: Option<String>,
    /// Semester label new records are filed under when none is given
    pub default_semester: String,
}

/// Values supplied on the command line; `None` falls through to lower tiers
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_file: Option<PathBuf>,
    pub bind: Option<String>,
    pub database_path: Option<PathBuf>,
    pub uploads_dir: Option<PathBuf>,
    pub service_key: Option<String>,
    pub default_semester: Option<String>,
}

/// Shape of `config.toml`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub bind: Option<String>,
    pub database_path: Option<PathBuf>,
    pub uploads_dir: Option<PathBuf>,
    pub service_key: Option<String>,
    pub default_semester: Option<String>,
}

impl FileConfig {
    /// Parse a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Invalid config file {}: {}", path.display(), e)))
    }
}

impl PortalConfig {
    /// Resolve every setting through CLI > env > file > default
    pub fn resolve(overrides: ConfigOverrides) -> Result<Self> {
        let file = match overrides
            .config_file
            .clone()
            .or_else(|| std::env::var(ENV_CONFIG_FILE).ok().map(PathBuf::from))
        {
            // An explicitly named file must exist and parse
            Some(path) => FileConfig::load(&path)?,
            None => match find_config_file() {
                Some(path) => {
                    tracing::info!("Using config file {}", path.display());
                    FileConfig::load(&path)?
                }
                None => FileConfig::default(),
            },
        };

        let data_dir = default_data_dir();

        let bind = overrides
            .bind
            .or_else(|| env_string(ENV_BIND))
            .or(file.bind)
            .unwrap_or_else(|| DEFAULT_BIND.to_string());

        let database_path = overrides
            .database_path
            .or_else(|| env_string(ENV_DATABASE).map(PathBuf::from))
            .or(file.database_path)
            .unwrap_or_else(|| data_dir.join("clinic-portal.db"));

        let uploads_dir = overrides
            .uploads_dir
            .or_else(|| env_string(ENV_UPLOADS).map(PathBuf::from))
            .or(file.uploads_dir)
            .unwrap_or_else(|| data_dir.join("uploads"));

        // An empty key at any tier means "no key"
        let service_key = overrides
            .service_key
            .or_else(|| std::env::var(ENV_SERVICE_KEY).ok())
            .or(file.service_key)
            .filter(|k| !k.trim().is_empty());

        let default_semester = overrides
            .default_semester
            .or_else(|| env_string(ENV_SEMESTER))
            .or(file.default_semester)
            .unwrap_or_else(|| DEFAULT_SEMESTER.to_string());

        if bind.parse::<std::net::SocketAddr>().is_err() {
            return Err(Error::Config(format!("Invalid bind address: {}", bind)));
        }

        Ok(Self {
            bind,
            database_path,
            uploads_dir,
            service_key,
            default_semester,
        })
    }

    /// Create the database parent directory and the uploads directory
    pub fn ensure_directories(&self) -> Result<()> {
        if let Some(parent) = self.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::create_dir_all(&self.uploads_dir)?;
        Ok(())
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// First existing config file among the per-user and system locations
fn find_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("clinic-portal").join("config.toml"));
    let system_config = PathBuf::from("/etc/clinic-portal/config.toml");

    user_config
        .into_iter()
        .chain(std::iter::once(system_config))
        .find(|p| p.exists())
}

/// OS-dependent data directory for the database and uploads
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("clinic-portal"))
        .unwrap_or_else(|| PathBuf::from("./clinic_portal_data"))
}
