use std::fmt;
use std::fs::{self, File};
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use hiretop::clock::{Clock, SystemClock};
use hiretop::config::{AppConfig, DocumentConfig};
use hiretop::documents::{is_safe_locator, BlobError, BlobStore};
use hiretop::error::AppError;
use hiretop::notify::{Notification, Notifier, NotifyError};
use hiretop::store::MemoryStore;
use hiretop::talent::SkillCatalog;
use hiretop::HireTop;
use hmac::{Hmac, Mac};
use metrics_exporter_prometheus::PrometheusHandle;
use sha2::Sha256;
use tracing::info;

type HmacSha256 = Hmac<Sha256>;

pub(crate) type ApiApp = HireTop<MemoryStore, LocalBlobStore, TracingNotifier>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) blobs: Arc<LocalBlobStore>,
}

/// Filesystem blob store. Download links are signed with HMAC-SHA256 over
/// `locator:expires` and verified by the `/files` route.
pub(crate) struct LocalBlobStore {
    root: PathBuf,
    url_prefix: String,
    secret: Vec<u8>,
    clock: Arc<dyn Clock>,
}

impl LocalBlobStore {
    pub(crate) fn new(config: &DocumentConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub(crate) fn with_clock(config: &DocumentConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            root: config.root.clone(),
            url_prefix: config.url_prefix.trim_end_matches('/').to_string(),
            secret: config.signing_secret.as_bytes().to_vec(),
            clock,
        }
    }

    fn path_for(&self, locator: &str) -> Result<PathBuf, BlobError> {
        if !is_safe_locator(locator) {
            return Err(BlobError::InvalidPath);
        }
        Ok(self.root.join(locator))
    }

    fn mac(&self, locator: &str, expires: i64) -> Result<HmacSha256, BlobError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret).map_err(|_| BlobError::Signing)?;
        mac.update(locator.as_bytes());
        mac.update(b":");
        mac.update(expires.to_string().as_bytes());
        Ok(mac)
    }

    /// Checks a link produced by [`BlobStore::signed_url`]. Expired links never verify.
    pub(crate) fn verify(&self, locator: &str, expires: i64, signature: &str) -> bool {
        if expires < self.clock.now().timestamp() {
            return false;
        }
        let Ok(expected) = hex::decode(signature) else {
            return false;
        };
        self.mac(locator, expires)
            .map(|mac| mac.verify_slice(&expected).is_ok())
            .unwrap_or(false)
    }
}

impl fmt::Debug for LocalBlobStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalBlobStore")
            .field("root", &self.root)
            .field("url_prefix", &self.url_prefix)
            .finish_non_exhaustive()
    }
}

impl BlobStore for LocalBlobStore {
    fn put(&self, bytes: &[u8], suggested_path: &str) -> Result<String, BlobError> {
        let path = self.path_for(suggested_path)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, bytes)?;
        Ok(suggested_path.to_string())
    }

    fn get(&self, locator: &str) -> Result<Box<dyn Read + Send>, BlobError> {
        let path = self.path_for(locator)?;
        match File::open(path) {
            Ok(file) => Ok(Box::new(file)),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(BlobError::Missing),
            Err(err) => Err(err.into()),
        }
    }

    fn exists(&self, locator: &str) -> Result<bool, BlobError> {
        Ok(self.path_for(locator)?.is_file())
    }

    fn delete(&self, locator: &str) -> Result<(), BlobError> {
        match fs::remove_file(self.path_for(locator)?) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn signed_url(&self, locator: &str, ttl: Duration) -> Result<String, BlobError> {
        if !self.exists(locator)? {
            return Err(BlobError::Missing);
        }
        let ttl = chrono::Duration::from_std(ttl).map_err(|_| BlobError::Signing)?;
        let expires = (self.clock.now() + ttl).timestamp();
        let signature = hex::encode(self.mac(locator, expires)?.finalize().into_bytes());
        Ok(format!(
            "{}/{locator}?expires={expires}&signature={signature}",
            self.url_prefix
        ))
    }
}

/// Logs every notification instead of delivering it. Context values stay out of the log.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        info!(
            to = %notification.to,
            subject = %notification.subject,
            template = %notification.template,
            "notification queued"
        );
        Ok(())
    }
}

/// Skill catalog seeded into the store: a CSV export when given, the standard set otherwise.
pub(crate) fn skill_catalog(path: Option<&Path>) -> Result<SkillCatalog, AppError> {
    match path {
        Some(path) => Ok(SkillCatalog::from_path(path)?),
        None => Ok(SkillCatalog::standard()),
    }
}

pub(crate) fn build_app(
    config: &AppConfig,
    blobs: Arc<LocalBlobStore>,
    catalog: SkillCatalog,
) -> Arc<ApiApp> {
    Arc::new(
        HireTop::new(
            Arc::new(MemoryStore::with_skills(catalog)),
            blobs,
            Arc::new(TracingNotifier),
            config.hiring.clone(),
        )
        .with_link_ttl(config.documents.signed_url_ttl),
    )
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use hiretop::clock::FixedClock;

    fn store(root: &Path, clock: Arc<FixedClock>) -> LocalBlobStore {
        let config = DocumentConfig {
            root: root.to_path_buf(),
            url_prefix: "/files/".to_string(),
            signing_secret: "test-secret".to_string(),
            signed_url_ttl: Duration::from_secs(900),
        };
        LocalBlobStore::with_clock(&config, clock)
    }

    fn start() -> Arc<FixedClock> {
        Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap(),
        ))
    }

    fn query_value<'a>(url: &'a str, key: &str) -> &'a str {
        url.split(['?', '&'])
            .find_map(|pair| pair.strip_prefix(&format!("{key}=")))
            .expect("query parameter present")
    }

    #[test]
    fn stores_reads_and_deletes_files_under_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        let blobs = store(dir.path(), start());

        let locator = blobs.put(b"%PDF-1.7", "cvs/a.pdf").expect("stored");
        assert!(dir.path().join("cvs/a.pdf").is_file());

        let mut bytes = Vec::new();
        blobs
            .get(&locator)
            .expect("opened")
            .read_to_end(&mut bytes)
            .expect("read");
        assert_eq!(bytes, b"%PDF-1.7");

        blobs.delete(&locator).expect("deleted");
        blobs.delete(&locator).expect("deleting twice is fine");
        assert!(matches!(blobs.get(&locator), Err(BlobError::Missing)));
    }

    #[test]
    fn rejects_locators_escaping_the_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        let blobs = store(dir.path(), start());
        assert!(matches!(
            blobs.put(b"x", "../outside.pdf"),
            Err(BlobError::InvalidPath)
        ));
        assert!(matches!(blobs.get("/etc/passwd"), Err(BlobError::InvalidPath)));
    }

    #[test]
    fn signed_urls_verify_until_they_expire() {
        let dir = tempfile::tempdir().expect("tempdir");
        let clock = start();
        let blobs = store(dir.path(), clock.clone());
        blobs.put(b"%PDF", "cvs/b.pdf").expect("stored");

        let url = blobs
            .signed_url("cvs/b.pdf", Duration::from_secs(60))
            .expect("signed");
        assert!(url.starts_with("/files/cvs/b.pdf?expires="));
        let expires: i64 = query_value(&url, "expires").parse().expect("timestamp");
        let signature = query_value(&url, "signature");

        assert!(blobs.verify("cvs/b.pdf", expires, signature));
        assert!(!blobs.verify("cvs/other.pdf", expires, signature));
        assert!(!blobs.verify("cvs/b.pdf", expires + 1, signature));
        assert!(!blobs.verify("cvs/b.pdf", expires, "not-hex"));

        clock.advance(chrono::Duration::seconds(61));
        assert!(!blobs.verify("cvs/b.pdf", expires, signature));
    }

    #[test]
    fn missing_files_are_not_signed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let blobs = store(dir.path(), start());
        assert!(matches!(
            blobs.signed_url("cvs/missing.pdf", Duration::from_secs(60)),
            Err(BlobError::Missing)
        ));
    }

    #[test]
    fn tracing_notifier_accepts_everything() {
        let notification = Notification::new("awa@example.com", "Hello", "emails/test");
        assert!(TracingNotifier.send(&notification).is_ok());
    }
}
