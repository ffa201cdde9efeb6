//! SNI-based certificate selection for the TLS handshake.
//!
//! The table is built once at startup and never mutated, so the resolver can
//! be shared across every connection without locking.

use rustls::server::{ClientHello, ResolvesServerCert, ServerConfig};
use rustls::sign::CertifiedKey;
use std::path::Path;
use std::sync::Arc;

use crate::cert::{self, LoadedCertificate};
use crate::domain::matches_wildcard;
use crate::error::CertError;

/// How a hostname was resolved to a table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Exact,
    Wildcard,
    Default,
}

/// Loaded certificates ordered by base name. Never empty; entry 0 is the default.
#[derive(Debug)]
pub struct SelectorTable {
    entries: Vec<LoadedCertificate>,
}

impl SelectorTable {
    /// Build the table, sorting entries by base name so the default is stable.
    pub fn build(mut entries: Vec<LoadedCertificate>) -> Result<Self, CertError> {
        if entries.is_empty() {
            return Err(CertError::NoValidCertificates);
        }
        entries.sort_by(|a, b| a.domain.cmp(&b.domain));
        Ok(Self { entries })
    }

    /// Load every pair in `dir` and build a table from what loaded.
    pub fn from_dir(dir: &Path) -> Result<Self, CertError> {
        let (loaded, _warnings) = cert::load_certificates(dir)?;
        Self::build(loaded)
    }

    pub fn entries(&self) -> &[LoadedCertificate] {
        &self.entries
    }

    pub fn default_entry(&self) -> &LoadedCertificate {
        &self.entries[0]
    }

    /// Pick the certificate for `hostname`; never fails.
    pub fn select(&self, hostname: &str) -> &LoadedCertificate {
        let (index, _) = self.lookup(hostname);
        &self.entries[index]
    }

    /// Index of the selected entry and how it matched.
    ///
    /// Exact pattern matches across the whole table win over wildcard
    /// matches; within each pass the first entry in table order wins. An
    /// empty hostname (no SNI) or no match returns the default.
    pub fn lookup(&self, hostname: &str) -> (usize, Selection) {
        if hostname.is_empty() {
            return (0, Selection::Default);
        }

        let exact = self
            .entries
            .iter()
            .position(|e| e.domains.iter().any(|d| d == hostname));
        if let Some(index) = exact {
            return (index, Selection::Exact);
        }

        let wildcard = self
            .entries
            .iter()
            .position(|e| e.domains.iter().any(|d| matches_wildcard(d, hostname)));
        if let Some(index) = wildcard {
            return (index, Selection::Wildcard);
        }

        (0, Selection::Default)
    }
}

/// rustls resolver closed over an immutable [`SelectorTable`].
#[derive(Debug, Clone)]
pub struct SniResolver {
    table: Arc<SelectorTable>,
}

impl SniResolver {
    pub fn new(table: Arc<SelectorTable>) -> Self {
        Self { table }
    }
}

impl ResolvesServerCert for SniResolver {
    fn resolve(&self, client_hello: ClientHello<'_>) -> Option<Arc<CertifiedKey>> {
        let hostname = client_hello.server_name().unwrap_or("");
        let (index, selection) = self.table.lookup(hostname);
        let entry = &self.table.entries[index];
        tracing::debug!(
            hostname = %hostname,
            selected = %entry.domain,
            ?selection,
            "SNI certificate lookup"
        );
        Some(entry.key.clone())
    }
}

/// Server TLS config using SNI selection over `table`.
pub fn tls_config(table: Arc<SelectorTable>) -> Arc<ServerConfig> {
    let mut config = ServerConfig::builder()
        .with_no_client_auth()
        .with_cert_resolver(Arc::new(SniResolver::new(table)));
    config.alpn_protocols = vec![b"http/1.1".to_vec()];
    Arc::new(config)
}
