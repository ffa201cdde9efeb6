//! Recoverable load problems are logged as warnings.

mod common;

use local_license::cert;
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
struct SharedBuf(Arc<Mutex<Vec<u8>>>);

impl io::Write for SharedBuf {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `load_certificates` on `dir` and return what was logged at warn and above.
fn captured_warnings(dir: &Path) -> String {
    let buf = SharedBuf::default();
    let writer = buf.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    tracing::subscriber::with_default(subscriber, || {
        cert::load_certificates(dir).unwrap();
    });
    let bytes = buf.0.lock().unwrap().clone();
    String::from_utf8(bytes).unwrap()
}

#[test]
fn unmatched_and_unparseable_pairs_are_logged() {
    let dir = common::temp_cert_dir();
    let ca = common::TestCa::new();
    ca.write_pair(dir.path(), "good", Some("good.test"), &["good.test"]);
    let (cert_pem, key_pem) = ca.issue(Some("lonely.test"), &["lonely.test"]);
    std::fs::write(dir.path().join("lonely.crt"), cert_pem).unwrap();
    std::fs::write(
        dir.path().join("bad.crt"),
        "-----BEGIN CERTIFICATE-----\nAAAA\n-----END CERTIFICATE-----\n",
    )
    .unwrap();
    std::fs::write(dir.path().join("bad.key"), key_pem).unwrap();

    let logs = captured_warnings(dir.path());
    assert!(logs.contains("WARN"), "{logs}");
    assert!(
        logs.contains("no key file found for certificate lonely"),
        "{logs}"
    );
    assert!(logs.contains("domain=lonely"), "{logs}");
    assert!(logs.contains("could not parse certificate for bad"), "{logs}");
    assert!(logs.contains("domain=bad"), "{logs}");
    assert!(!logs.contains("domain=good"), "{logs}");
}

#[test]
fn orphan_key_is_logged() {
    let dir = common::temp_cert_dir();
    let (_, key_pem) = common::TestCa::new().issue(Some("orphan.test"), &["orphan.test"]);
    std::fs::write(dir.path().join("orphan.key"), key_pem).unwrap();

    let logs = captured_warnings(dir.path());
    assert!(logs.contains("no certificate file found for key orphan"), "{logs}");
    assert!(logs.contains("domain=orphan"), "{logs}");
}

#[test]
fn suffixed_directory_is_logged_as_skipped() {
    let dir = common::temp_cert_dir();
    std::fs::create_dir(dir.path().join("nested.crt")).unwrap();
    std::fs::create_dir(dir.path().join("plain-dir")).unwrap();

    let logs = captured_warnings(dir.path());
    assert!(logs.contains("Skipping entry: not a regular file"), "{logs}");
    assert!(logs.contains("nested.crt"), "{logs}");
    assert!(!logs.contains("plain-dir"), "{logs}");
}

#[cfg(unix)]
#[test]
fn dangling_symlink_is_logged_as_skipped() {
    let dir = common::temp_cert_dir();
    std::os::unix::fs::symlink(
        dir.path().join("missing-target.pem"),
        dir.path().join("dangling.key"),
    )
    .unwrap();

    let logs = captured_warnings(dir.path());
    assert!(logs.contains("Skipping entry: not a regular file"), "{logs}");
    assert!(logs.contains("dangling.key"), "{logs}");
}
