use std::sync::Arc;
use std::time::Duration;

use crate::applications::ApplicationService;
use crate::clock::{Clock, SystemClock};
use crate::company::CompanyService;
use crate::config::HiringConfig;
use crate::documents::{BlobStore, DocumentService};
use crate::error::ServiceError;
use crate::identity::{
    company_setup_gate, profile_completion_gate, verified_email_gate, Actor, GateDecision,
    IdentityService,
};
use crate::notify::Notifier;
use crate::offers::OfferService;
use crate::store::HiringStore;
use crate::talent::TalentService;

/// Every hiring service wired over one store, blob store and notifier.
pub struct HireTop<S, B, N> {
    pub identity: IdentityService<S>,
    pub talent: TalentService<S, B>,
    pub companies: CompanyService<S, B, N>,
    pub offers: OfferService<S>,
    pub applications: ApplicationService<S, B, N>,
    pub documents: DocumentService<S, B>,
    store: Arc<S>,
    config: HiringConfig,
}

impl<S, B, N> HireTop<S, B, N>
where
    S: HiringStore + 'static,
    B: BlobStore + 'static,
    N: Notifier + 'static,
{
    pub fn new(store: Arc<S>, blobs: Arc<B>, notifier: Arc<N>, config: HiringConfig) -> Self {
        Self::with_clock(store, blobs, notifier, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<S>,
        blobs: Arc<B>,
        notifier: Arc<N>,
        config: HiringConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            identity: IdentityService::with_clock(store.clone(), clock.clone()),
            talent: TalentService::with_clock(store.clone(), blobs.clone(), clock.clone()),
            companies: CompanyService::with_clock(
                store.clone(),
                blobs.clone(),
                notifier.clone(),
                clock.clone(),
            ),
            offers: OfferService::with_clock(store.clone(), config.clone(), clock.clone()),
            applications: ApplicationService::with_clock(
                store.clone(),
                blobs.clone(),
                notifier,
                config.clone(),
                clock,
            ),
            documents: DocumentService::new(store.clone(), blobs),
            store,
            config,
        }
    }

    /// Sets how long signed document links stay valid.
    pub fn with_link_ttl(mut self, ttl: Duration) -> Self {
        self.documents = self.documents.with_link_ttl(ttl);
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &HiringConfig {
        &self.config
    }

    /// Runs the page-access chain: verified email, company setup, then profile completion.
    pub fn access_gate(&self, actor: &Actor) -> Result<GateDecision, ServiceError> {
        let company = self
            .companies
            .membership()
            .company_for_user(actor.user_id)?;
        let profile = self.talent.profile_for(actor)?;
        let floor = self.config.profile_completion_floor;

        Ok(verified_email_gate(actor)
            .and_then(|| company_setup_gate(actor, company.as_ref()))
            .and_then(|| profile_completion_gate(actor, profile.as_ref(), floor)))
    }
}
