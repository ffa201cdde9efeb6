//! Shared test helpers.

#![allow(dead_code)]

use rcgen::{
    BasicConstraints, Certificate, CertificateParams, DistinguishedName, DnType, DnValue, IsCa,
    KeyPair,
};
use std::path::Path;
use tempfile::TempDir;

/// Create a temp directory to hold certificate/key pairs.
pub fn temp_cert_dir() -> TempDir {
    tempfile::Builder::new()
        .prefix("local_license_test_")
        .tempdir()
        .expect("temp dir")
}

/// Throwaway CA used to sign leaf certificates.
pub struct TestCa {
    pub cert: Certificate,
    pub key: KeyPair,
}

impl TestCa {
    pub fn new() -> Self {
        let key = KeyPair::generate().expect("generate CA key");
        let mut params = CertificateParams::default();
        params.distinguished_name = DistinguishedName::new();
        params.distinguished_name.push(
            DnType::CommonName,
            DnValue::Utf8String("local-license test CA".to_string()),
        );
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        let cert = params.self_signed(&key).expect("self-sign CA");
        Self { cert, key }
    }

    /// Leaf cert with optional CN and the given SANs; returns (cert PEM, key PEM).
    pub fn issue(&self, common_name: Option<&str>, sans: &[&str]) -> (String, String) {
        let mut subject = DistinguishedName::new();
        if let Some(cn) = common_name {
            subject.push(DnType::CommonName, DnValue::Utf8String(cn.to_string()));
        }
        self.issue_with_subject(subject, sans)
    }

    /// Leaf cert with an explicit subject DN; returns (cert PEM, key PEM).
    pub fn issue_with_subject(&self, subject: DistinguishedName, sans: &[&str]) -> (String, String) {
        let key = KeyPair::generate().expect("generate leaf key");
        let sans: Vec<String> = sans.iter().map(|s| s.to_string()).collect();
        let mut params = CertificateParams::new(sans).expect("leaf params");
        params.distinguished_name = subject;
        params.is_ca = IsCa::NoCa;
        let cert = params
            .signed_by(&key, &self.cert, &self.key)
            .expect("sign leaf");
        (cert.pem(), key.serialize_pem())
    }

    /// Issue a leaf and write it as `<base>.crt` / `<base>.key` in `dir`.
    pub fn write_pair(&self, dir: &Path, base: &str, common_name: Option<&str>, sans: &[&str]) {
        let (cert_pem, key_pem) = self.issue(common_name, sans);
        std::fs::write(dir.join(format!("{base}.crt")), cert_pem).unwrap();
        std::fs::write(dir.join(format!("{base}.key")), key_pem).unwrap();
    }
}
