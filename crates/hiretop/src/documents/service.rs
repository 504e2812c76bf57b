use std::fmt;
use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use super::access::DocumentAccessPolicy;
use super::blob::{BlobError, BlobStore};
use crate::applications::ApplicationId;
use crate::error::ServiceError;
use crate::identity::{Actor, UserId};
use crate::store::HiringStore;

/// Lifetime of signed download links unless configured otherwise.
pub const DEFAULT_LINK_TTL: Duration = Duration::from_secs(15 * 60);

/// How the client should present a downloaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Disposition {
    #[default]
    Inline,
    Attachment,
}

impl Disposition {
    pub const fn label(self) -> &'static str {
        match self {
            Disposition::Inline => "inline",
            Disposition::Attachment => "attachment",
        }
    }
}

/// An authorized document, ready to stream.
pub struct DocumentDownload {
    pub file_name: String,
    pub content_type: String,
    pub content_disposition: String,
    pub body: Box<dyn Read + Send>,
}

impl DocumentDownload {
    fn new(locator: &str, disposition: Disposition, body: Box<dyn Read + Send>) -> Self {
        let file_name = locator
            .rsplit('/')
            .next()
            .unwrap_or(locator)
            .replace('"', "");
        let content_type = mime_guess::from_path(&file_name)
            .first()
            .unwrap_or(mime::APPLICATION_PDF)
            .to_string();
        let content_disposition = format!("{}; filename=\"{file_name}\"", disposition.label());
        Self {
            file_name,
            content_type,
            content_disposition,
            body,
        }
    }

    pub fn into_bytes(mut self) -> Result<Vec<u8>, ServiceError> {
        let mut bytes = Vec::new();
        self.body
            .read_to_end(&mut bytes)
            .map_err(|err| ServiceError::Storage(BlobError::Io(err)))?;
        Ok(bytes)
    }
}

impl fmt::Debug for DocumentDownload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentDownload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("content_disposition", &self.content_disposition)
            .finish_non_exhaustive()
    }
}

/// Serves CVs attached to applications and talent profiles.
pub struct DocumentService<S, B> {
    store: Arc<S>,
    blobs: Arc<B>,
    policy: DocumentAccessPolicy<S>,
    link_ttl: Duration,
}

impl<S, B> DocumentService<S, B>
where
    S: HiringStore + 'static,
    B: BlobStore + 'static,
{
    pub fn new(store: Arc<S>, blobs: Arc<B>) -> Self {
        Self {
            policy: DocumentAccessPolicy::new(store.clone()),
            store,
            blobs,
            link_ttl: DEFAULT_LINK_TTL,
        }
    }

    pub fn with_link_ttl(mut self, ttl: Duration) -> Self {
        self.link_ttl = ttl;
        self
    }

    /// Lifetime used for links issued over HTTP.
    pub fn link_ttl(&self) -> Duration {
        self.link_ttl
    }

    pub fn policy(&self) -> &DocumentAccessPolicy<S> {
        &self.policy
    }

    pub fn open_application_document(
        &self,
        actor: &Actor,
        application_id: ApplicationId,
        disposition: Disposition,
    ) -> Result<DocumentDownload, ServiceError> {
        let locator = self.application_locator(actor, application_id)?;
        self.open(&locator, disposition)
    }

    pub fn open_profile_document(
        &self,
        actor: &Actor,
        talent_user_id: UserId,
        disposition: Disposition,
    ) -> Result<DocumentDownload, ServiceError> {
        if !self
            .policy
            .can_access_profile_document(talent_user_id, actor.user_id)?
        {
            debug!(user_id = %actor.user_id, %talent_user_id, "profile document access denied");
            return Err(ServiceError::forbidden());
        }

        let locator = self
            .store
            .profile_for_user(talent_user_id)?
            .and_then(|profile| profile.cv_url)
            .filter(|locator| !locator.trim().is_empty())
            .ok_or_else(|| ServiceError::not_found("document"))?;
        self.open(&locator, disposition)
    }

    pub fn signed_application_document_url(
        &self,
        actor: &Actor,
        application_id: ApplicationId,
        ttl: Duration,
    ) -> Result<String, ServiceError> {
        let locator = self.application_locator(actor, application_id)?;
        self.blobs
            .signed_url(&locator, ttl)
            .map_err(missing_as_not_found)
    }

    fn application_locator(
        &self,
        actor: &Actor,
        application_id: ApplicationId,
    ) -> Result<String, ServiceError> {
        let application = self
            .store
            .fetch_application(application_id)?
            .filter(|application| application.is_live())
            .ok_or_else(|| ServiceError::not_found("application"))?;

        if !self
            .policy
            .can_access_application_document(application.id, actor.user_id)?
        {
            debug!(user_id = %actor.user_id, %application_id, "application document access denied");
            return Err(ServiceError::forbidden());
        }

        application
            .document_url
            .filter(|locator| !locator.trim().is_empty())
            .ok_or_else(|| ServiceError::not_found("document"))
    }

    fn open(&self, locator: &str, disposition: Disposition) -> Result<DocumentDownload, ServiceError> {
        let body = self.blobs.get(locator).map_err(missing_as_not_found)?;
        Ok(DocumentDownload::new(locator, disposition, body))
    }
}

fn missing_as_not_found(err: BlobError) -> ServiceError {
    match err {
        BlobError::Missing => ServiceError::not_found("document"),
        other => ServiceError::Storage(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_metadata_comes_from_the_file_name() {
        let download = DocumentDownload::new(
            "cvs/5d0c.pdf",
            Disposition::Attachment,
            Box::new(std::io::empty()),
        );
        assert_eq!(download.file_name, "5d0c.pdf");
        assert_eq!(download.content_type, "application/pdf");
        assert_eq!(
            download.content_disposition,
            "attachment; filename=\"5d0c.pdf\""
        );
    }

    #[test]
    fn unknown_extensions_fall_back_to_pdf() {
        let download =
            DocumentDownload::new("cvs/resume", Disposition::Inline, Box::new(std::io::empty()));
        assert_eq!(download.content_type, "application/pdf");
        assert!(download.content_disposition.starts_with("inline;"));
    }

    #[test]
    fn missing_blobs_read_as_not_found() {
        match missing_as_not_found(BlobError::Missing) {
            ServiceError::NotFound(message) => assert_eq!(message, "document not found"),
            other => panic!("expected not found, got {other:?}"),
        }
    }
}
