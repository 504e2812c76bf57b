use super::domain::{JobOffer, JobOfferId, OfferListing, OfferQuery};
use crate::company::CompanyId;
use crate::error::RepositoryError;
use crate::pagination::{Page, PageRequest};

pub trait OfferRepository: Send + Sync {
    fn insert_offer(&self, offer: JobOffer) -> Result<JobOffer, RepositoryError>;
    fn update_offer(&self, offer: JobOffer) -> Result<(), RepositoryError>;
    /// Raw lookup, soft-deleted rows included. Services decide visibility.
    fn fetch_offer(&self, id: JobOfferId) -> Result<Option<JobOffer>, RepositoryError>;
    /// Matching offers, newest first.
    fn search_offers(
        &self,
        query: &OfferQuery,
        page: PageRequest,
    ) -> Result<Page<OfferListing>, RepositoryError>;
    /// Non-deleted offers of a company, newest first.
    fn offers_for_company(&self, company_id: CompanyId) -> Result<Vec<JobOffer>, RepositoryError>;
}
