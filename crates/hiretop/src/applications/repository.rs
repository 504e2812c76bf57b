use super::domain::{Application, ApplicationId, ApplicationQuery, ApplicationSummary};
use crate::company::CompanyId;
use crate::error::RepositoryError;
use crate::offers::JobOfferId;
use crate::pagination::{Page, PageRequest};
use crate::talent::TalentProfileId;

/// Partial unique index on `(talent_id, job_offer_id) WHERE deleted_at IS NULL`.
pub const LIVE_APPLICATION_CONSTRAINT: &str = "applications_talent_offer_live_key";

/// Storage abstraction so the engine can be exercised in isolation.
pub trait ApplicationRepository: Send + Sync {
    /// Fails with [`RepositoryError::UniqueViolation`] when a live application already
    /// exists for the same talent and offer.
    fn insert_application(&self, application: Application)
        -> Result<Application, RepositoryError>;
    fn update_application(&self, application: Application) -> Result<(), RepositoryError>;
    /// Raw lookup, soft-deleted rows included.
    fn fetch_application(&self, id: ApplicationId) -> Result<Option<Application>, RepositoryError>;
    fn live_application_for(
        &self,
        talent_id: TalentProfileId,
        job_offer_id: JobOfferId,
    ) -> Result<Option<Application>, RepositoryError>;
    fn summarize(&self, id: ApplicationId) -> Result<Option<ApplicationSummary>, RepositoryError>;
    /// Matching live applications, newest first.
    fn search_applications(
        &self,
        query: &ApplicationQuery,
        page: PageRequest,
    ) -> Result<Page<ApplicationSummary>, RepositoryError>;
    /// Live applications received by a company, newest first.
    fn applications_for_company(
        &self,
        company_id: CompanyId,
    ) -> Result<Vec<ApplicationSummary>, RepositoryError>;
    fn live_applications_for_talent(
        &self,
        talent_id: TalentProfileId,
    ) -> Result<Vec<Application>, RepositoryError>;
}
