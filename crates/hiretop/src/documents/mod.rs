//! Uploaded documents: the blob store port and who may read what.

pub mod access;
pub mod blob;
pub mod service;

pub use access::DocumentAccessPolicy;
pub(crate) use blob::discard;
pub use blob::{
    is_safe_locator, store_upload, BlobError, BlobStore, DocumentUpload, MemoryBlobStore,
    CV_FOLDER, LOGO_FOLDER, MAX_UPLOAD_BYTES,
};
pub use service::{Disposition, DocumentDownload, DocumentService, DEFAULT_LINK_TTL};
