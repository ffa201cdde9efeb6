//! CLI definitions and startup.

use anyhow::Result;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

use crate::config::{Config, ConfigFile, Overrides};

#[derive(Parser, Debug)]
#[command(name = "local-license")]
#[command(version, disable_version_flag = true)]
#[command(about = "HTTPS license responder with SNI certificate selection")]
pub struct Cli {
    /// License key returned by the license endpoints; VALID when omitted
    pub license_key: Option<String>,

    /// Port to listen on (default 444)
    pub port: Option<u16>,

    /// Directory holding <name>.crt / <name>.key pairs
    #[arg(long, value_name = "DIR")]
    pub cert_dir: Option<PathBuf>,

    /// TOML file with license_key, port and cert_dir
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print version
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    pub version: (),
}

impl Cli {
    /// Merge the optional config file with the command line.
    pub fn resolve_config(&self) -> Result<Config> {
        let file = match &self.config {
            Some(path) => ConfigFile::load(path)?,
            None => ConfigFile::default(),
        };
        let overrides = Overrides {
            license_key: self.license_key.clone(),
            port: self.port,
            cert_dir: self.cert_dir.clone(),
        };
        Ok(Config::resolve(file, overrides))
    }
}

/// Parse arguments, then run the server on a fresh tokio runtime.
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    match &config.license_key {
        Some(key) => tracing::info!(license = %key, "License key set"),
        None => tracing::info!("No license key provided"),
    }
    tracing::info!(port = config.port, cert_dir = %config.cert_dir.display(), "Using configuration");

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(crate::serve::run(config))
}
