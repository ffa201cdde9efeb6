//! Domain names covered by a certificate, and hostname matching.

use x509_parser::extensions::GeneralName;
use x509_parser::nom;
use x509_parser::prelude::{FromDer, X509Certificate, X509Error};

/// Read the domain patterns a leaf certificate covers.
///
/// The subject common name comes first (when present, non-empty and readable
/// as a string), followed
/// by every DNS subject alternative name in certificate order. Wildcard entries
/// such as `*.example.com` are kept verbatim. Duplicates are not removed.
pub fn extract_domains(der: &[u8]) -> Result<Vec<String>, X509Error> {
    let (_, cert) = X509Certificate::from_der(der).map_err(|e| match e {
        nom::Err::Error(e) | nom::Err::Failure(e) => e,
        nom::Err::Incomplete(_) => X509Error::InvalidCertificate,
    })?;

    let mut domains = Vec::new();
    // A CN in a string type x509-parser can't convert (BMPString, TeletexString)
    // is skipped; the SANs still apply.
    let common_name = cert
        .subject()
        .iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok());
    if let Some(cn) = common_name {
        if !cn.is_empty() {
            domains.push(cn.to_string());
        }
    }

    if let Some(san) = cert.subject_alternative_name()? {
        for name in san.value.general_names.iter() {
            if let GeneralName::DNSName(dns) = name {
                domains.push(dns.to_string());
            }
        }
    }

    Ok(domains)
}

/// Whether `pattern` is a wildcard (`*.suffix`) matching `host`.
///
/// The host only has to end with `.suffix`; any number of leading labels is
/// accepted, so `*.example.com` also matches `a.b.example.com`. The bare
/// `example.com` never matches.
pub fn matches_wildcard(pattern: &str, host: &str) -> bool {
    match pattern.strip_prefix('*') {
        Some(suffix) if suffix.starts_with('.') => host.ends_with(suffix),
        _ => false,
    }
}
