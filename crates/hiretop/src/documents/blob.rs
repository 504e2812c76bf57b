use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ServiceError;

/// Largest accepted upload (5 MiB).
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
pub const CV_FOLDER: &str = "cvs";
pub const LOGO_FOLDER: &str = "companies";

/// Storage for uploaded documents, addressed by opaque locators.
pub trait BlobStore: Send + Sync {
    /// Stores `bytes` at (or near) `suggested_path` and returns the locator to persist.
    fn put(&self, bytes: &[u8], suggested_path: &str) -> Result<String, BlobError>;
    fn get(&self, locator: &str) -> Result<Box<dyn Read + Send>, BlobError>;
    fn exists(&self, locator: &str) -> Result<bool, BlobError>;
    fn delete(&self, locator: &str) -> Result<(), BlobError>;
    fn signed_url(&self, locator: &str, ttl: Duration) -> Result<String, BlobError>;
}

/// Blob store failure. Messages never include the locator.
#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    #[error("document not found")]
    Missing,
    #[error("invalid document path")]
    InvalidPath,
    #[error("document storage unavailable")]
    Io(#[from] std::io::Error),
    #[error("document link could not be signed")]
    Signing,
}

/// A file submitted by a client, before it reaches the blob store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentUpload {
    pub file_name: String,
    #[serde(default)]
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl DocumentUpload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes: bytes.into(),
        }
    }

    pub fn pdf(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            content_type: Some(mime::APPLICATION_PDF.to_string()),
            ..Self::new(file_name, bytes)
        }
    }

    /// Extension taken from the file name, then the declared content type, then `bin`.
    pub fn extension(&self) -> String {
        let from_name = Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()));
        if let Some(ext) = from_name {
            return ext.to_ascii_lowercase();
        }

        self.content_type
            .as_deref()
            .and_then(mime_guess::get_mime_extensions_str)
            .and_then(|extensions| extensions.first())
            .map(|ext| ext.to_string())
            .unwrap_or_else(|| "bin".to_string())
    }

    pub(crate) fn validate(&self) -> Result<(), ServiceError> {
        if self.bytes.is_empty() {
            return Err(ServiceError::Validation(
                "uploaded document is empty".to_string(),
            ));
        }
        if self.bytes.len() > MAX_UPLOAD_BYTES {
            return Err(ServiceError::Validation(
                "uploaded document exceeds the 5 MB limit".to_string(),
            ));
        }
        Ok(())
    }
}

/// Validates and stores an upload under `folder/<uuid>.<ext>`.
pub fn store_upload<B>(blobs: &B, folder: &str, upload: &DocumentUpload) -> Result<String, ServiceError>
where
    B: BlobStore + ?Sized,
{
    upload.validate()?;
    let path = format!(
        "{}/{}.{}",
        folder.trim_matches('/'),
        Uuid::new_v4(),
        upload.extension()
    );
    Ok(blobs.put(&upload.bytes, &path)?)
}

/// Removes a blob, ignoring a missing one.
pub(crate) fn discard<B>(blobs: &B, locator: &str)
where
    B: BlobStore + ?Sized,
{
    if let Err(err) = blobs.delete(locator) {
        tracing::warn!(error = %err, "failed to discard orphaned document");
    }
}

/// Locator validation shared by stores: relative, no parent traversal.
pub fn is_safe_locator(locator: &str) -> bool {
    !locator.is_empty()
        && !locator.starts_with('/')
        && !locator.contains('\\')
        && locator
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != "..")
}

/// In-process store used by tests and the demo.
#[derive(Debug, Default, Clone)]
pub struct MemoryBlobStore {
    blobs: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryBlobStore {
    pub fn len(&self) -> usize {
        self.blobs.lock().expect("blob mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn read_all(&self, locator: &str) -> Option<Vec<u8>> {
        self.blobs
            .lock()
            .expect("blob mutex poisoned")
            .get(locator)
            .cloned()
    }
}

impl BlobStore for MemoryBlobStore {
    fn put(&self, bytes: &[u8], suggested_path: &str) -> Result<String, BlobError> {
        if !is_safe_locator(suggested_path) {
            return Err(BlobError::InvalidPath);
        }
        self.blobs
            .lock()
            .expect("blob mutex poisoned")
            .insert(suggested_path.to_string(), bytes.to_vec());
        Ok(suggested_path.to_string())
    }

    fn get(&self, locator: &str) -> Result<Box<dyn Read + Send>, BlobError> {
        let bytes = self.read_all(locator).ok_or(BlobError::Missing)?;
        Ok(Box::new(Cursor::new(bytes)))
    }

    fn exists(&self, locator: &str) -> Result<bool, BlobError> {
        Ok(self
            .blobs
            .lock()
            .expect("blob mutex poisoned")
            .contains_key(locator))
    }

    fn delete(&self, locator: &str) -> Result<(), BlobError> {
        self.blobs
            .lock()
            .expect("blob mutex poisoned")
            .remove(locator);
        Ok(())
    }

    fn signed_url(&self, locator: &str, ttl: Duration) -> Result<String, BlobError> {
        if !self.exists(locator)? {
            return Err(BlobError::Missing);
        }
        Ok(format!("memory://{locator}?ttl={}", ttl.as_secs()))
    }
}
