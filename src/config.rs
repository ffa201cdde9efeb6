//! Runtime configuration: license key, listen port, certificate directory.
//!
//! Supports LOCAL_LICENSE_CERT_DIR env var override for the cert directory.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

pub const DEFAULT_PORT: u16 = 444;
pub const DEFAULT_CERT_DIR: &str = "/root/back_certs/";
pub const CERT_DIR_ENV: &str = "LOCAL_LICENSE_CERT_DIR";

/// Status reported by the license endpoints when no key is configured.
pub const VALID_STATUS: &str = "VALID";

/// Settings the server is started with. Built once and shared read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub license_key: Option<String>,
    pub port: u16,
    pub cert_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            license_key: None,
            port: DEFAULT_PORT,
            cert_dir: default_cert_dir(),
        }
    }
}

/// Optional TOML file; every key may be omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub license_key: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub cert_dir: Option<PathBuf>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let s = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&s).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Values given on the command line; these take precedence over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub license_key: Option<String>,
    pub port: Option<u16>,
    pub cert_dir: Option<PathBuf>,
}

/// Cert directory from LOCAL_LICENSE_CERT_DIR, else the built-in default.
pub fn default_cert_dir() -> PathBuf {
    match std::env::var_os(CERT_DIR_ENV) {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => PathBuf::from(DEFAULT_CERT_DIR),
    }
}

impl Config {
    /// Merge command line over file over defaults. An empty key counts as unset.
    pub fn resolve(file: ConfigFile, overrides: Overrides) -> Self {
        let defaults = Config::default();
        let license_key = overrides
            .license_key
            .or(file.license_key)
            .filter(|k| !k.is_empty());
        Self {
            license_key,
            port: overrides.port.or(file.port).unwrap_or(defaults.port),
            cert_dir: overrides
                .cert_dir
                .or(file.cert_dir)
                .unwrap_or(defaults.cert_dir),
        }
    }

    /// Status string the license endpoints report.
    pub fn license_status(&self) -> &str {
        self.license_key.as_deref().unwrap_or(VALID_STATUS)
    }
}
