//! Certificate loading errors and warnings.

use std::path::PathBuf;
use thiserror::Error;

/// Conditions that make TLS unavailable. The caller falls back to plaintext.
#[derive(Debug, Error)]
pub enum CertError {
    #[error("cannot read certificate directory {}: {source}", path.display())]
    DirectoryUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no valid certificate pairs found")]
    NoValidCertificates,
}

/// Recoverable problems found while loading; the affected file or pair is dropped.
#[derive(Debug, Error)]
pub enum LoadWarning {
    #[error("no key file found for certificate {domain} ({})", path.display())]
    UnmatchedCertificate { domain: String, path: PathBuf },

    #[error("no certificate file found for key {domain} ({})", path.display())]
    UnmatchedKey { domain: String, path: PathBuf },

    #[error("could not load certificate pair for {domain}: {reason}")]
    KeyPairLoadFailure { domain: String, reason: String },

    #[error("could not parse certificate for {domain}: {reason}")]
    CertificateParseFailure { domain: String, reason: String },
}

impl LoadWarning {
    /// Base name of the file or pair the warning refers to.
    pub fn domain(&self) -> &str {
        match self {
            Self::UnmatchedCertificate { domain, .. }
            | Self::UnmatchedKey { domain, .. }
            | Self::KeyPairLoadFailure { domain, .. }
            | Self::CertificateParseFailure { domain, .. } => domain,
        }
    }
}

/// Problems reading the optional TOML config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
