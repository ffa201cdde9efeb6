//! Certificate/key pair discovery and loading.

use rustls::crypto::CryptoProvider;
use rustls::pki_types::CertificateDer;
use rustls::sign::CertifiedKey;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::domain;
use crate::error::{CertError, LoadWarning};

/// Suffix of certificate files in the cert directory.
pub const CERT_SUFFIX: &str = ".crt";
/// Suffix of private key files in the cert directory.
pub const KEY_SUFFIX: &str = ".key";

/// A certificate and key file sharing the same base name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificatePair {
    pub domain: String,
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

/// Outcome of a directory scan: pairs sorted by base name, plus what was left over.
#[derive(Debug, Default)]
pub struct ScanResult {
    pub pairs: Vec<CertificatePair>,
    pub warnings: Vec<LoadWarning>,
}

/// A usable keypair and the domain patterns its leaf certificate covers.
#[derive(Clone)]
pub struct LoadedCertificate {
    /// Base file name the pair was loaded from.
    pub domain: String,
    /// Common name first, then DNS SANs, wildcards kept verbatim.
    pub domains: Vec<String>,
    pub key: Arc<CertifiedKey>,
}

impl fmt::Debug for LoadedCertificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedCertificate")
            .field("domain", &self.domain)
            .field("domains", &self.domains)
            .finish()
    }
}

/// Scan `dir` (non-recursively) and pair `<name>.crt` with `<name>.key`.
///
/// Unpaired files become warnings; only an unreadable directory is an error.
pub fn scan_pairs(dir: &Path) -> Result<ScanResult, CertError> {
    let unavailable = |source: std::io::Error| CertError::DirectoryUnavailable {
        path: dir.to_path_buf(),
        source,
    };

    let mut certs: BTreeMap<String, PathBuf> = BTreeMap::new();
    let mut keys: BTreeMap<String, PathBuf> = BTreeMap::new();

    for entry in fs::read_dir(dir).map_err(unavailable)? {
        let entry = entry.map_err(unavailable)?;
        let path = entry.path();
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if !path.is_file() {
            if name.ends_with(CERT_SUFFIX) || name.ends_with(KEY_SUFFIX) {
                tracing::warn!(path = %path.display(), "Skipping entry: not a regular file");
            }
            continue;
        }
        if let Some(base) = name.strip_suffix(CERT_SUFFIX) {
            certs.insert(base.to_string(), path);
        } else if let Some(base) = name.strip_suffix(KEY_SUFFIX) {
            keys.insert(base.to_string(), path);
        }
    }

    let mut result = ScanResult::default();
    for (domain, cert_path) in certs {
        match keys.remove(&domain) {
            Some(key_path) => result.pairs.push(CertificatePair {
                domain,
                cert_path,
                key_path,
            }),
            None => result.warnings.push(LoadWarning::UnmatchedCertificate {
                domain,
                path: cert_path,
            }),
        }
    }
    for (domain, path) in keys {
        result
            .warnings
            .push(LoadWarning::UnmatchedKey { domain, path });
    }

    Ok(result)
}

/// Load one pair into a keypair and read the domains its leaf certificate covers.
pub fn load_pair(
    pair: &CertificatePair,
    provider: &CryptoProvider,
) -> Result<LoadedCertificate, LoadWarning> {
    let load_failure = |reason: String| LoadWarning::KeyPairLoadFailure {
        domain: pair.domain.clone(),
        reason,
    };

    let cert_pem = fs::read(&pair.cert_path)
        .map_err(|e| load_failure(format!("read {}: {e}", pair.cert_path.display())))?;
    let key_pem = fs::read(&pair.key_path)
        .map_err(|e| load_failure(format!("read {}: {e}", pair.key_path.display())))?;

    let chain: Vec<CertificateDer<'static>> = rustls_pemfile::certs(&mut cert_pem.as_slice())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| load_failure(format!("parse cert PEM: {e}")))?;
    let Some(leaf) = chain.first() else {
        return Err(load_failure("no certificate in file".to_string()));
    };

    let domains =
        domain::extract_domains(leaf.as_ref()).map_err(|e| LoadWarning::CertificateParseFailure {
            domain: pair.domain.clone(),
            reason: e.to_string(),
        })?;

    let key = rustls_pemfile::private_key(&mut key_pem.as_slice())
        .map_err(|e| load_failure(format!("parse key PEM: {e}")))?
        .ok_or_else(|| load_failure("no private key in file".to_string()))?;

    let certified_key = CertifiedKey::from_der(chain, key, provider)
        .map_err(|e| load_failure(e.to_string()))?;

    Ok(LoadedCertificate {
        domain: pair.domain.clone(),
        domains,
        key: Arc::new(certified_key),
    })
}

/// Scan `dir` and load every pair, in base-name order.
///
/// Each warning is logged as it is collected, and also returned to the caller.
pub fn load_certificates(
    dir: &Path,
) -> Result<(Vec<LoadedCertificate>, Vec<LoadWarning>), CertError> {
    let ScanResult {
        pairs,
        mut warnings,
    } = scan_pairs(dir)?;
    let provider = rustls::ServerConfig::builder().crypto_provider().clone();

    let mut loaded = Vec::with_capacity(pairs.len());
    for pair in &pairs {
        match load_pair(pair, &provider) {
            Ok(cert) => {
                if cert.domains.is_empty() {
                    tracing::warn!(
                        domain = %cert.domain,
                        "Certificate has no common name or DNS names; usable only as default"
                    );
                }
                tracing::info!(
                    domain = %cert.domain,
                    domains = ?cert.domains,
                    "Loaded certificate for domain"
                );
                loaded.push(cert);
            }
            Err(warning) => warnings.push(warning),
        }
    }

    for warning in &warnings {
        tracing::warn!(domain = %warning.domain(), "{warning}");
    }

    Ok((loaded, warnings))
}
