use std::sync::Arc;

use chrono::{DateTime, Months, Utc};
use tracing::info;

use super::domain::{
    JobOffer, JobOfferId, OfferDraft, OfferFilters, OfferListing, OfferPatch, OfferQuery,
    OfferScope, OfferStatus, OpenOffer, DEFAULT_SALARY_CURRENCY,
};
use crate::clock::{Clock, SystemClock};
use crate::company::{CompanyId, MembershipResolver};
use crate::config::HiringConfig;
use crate::error::ServiceError;
use crate::identity::Actor;
use crate::pagination::{Page, PageRequest};
use crate::store::HiringStore;
use crate::talent::service::ensure_skills_exist;

/// Job offer lifecycle: publish, edit, close, soft-delete and list.
pub struct OfferService<S> {
    store: Arc<S>,
    membership: MembershipResolver<S>,
    clock: Arc<dyn Clock>,
    config: HiringConfig,
}

impl<S> OfferService<S>
where
    S: HiringStore + 'static,
{
    pub fn new(store: Arc<S>, config: HiringConfig) -> Self {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<S>, config: HiringConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            membership: MembershipResolver::new(store.clone()),
            store,
            clock,
            config,
        }
    }

    /// Publishes a new offer for `company_id`. Offers start out PUBLISHED and active.
    pub fn create(
        &self,
        actor: &Actor,
        company_id: CompanyId,
        draft: OfferDraft,
    ) -> Result<JobOffer, ServiceError> {
        if self.store.fetch_company(company_id)?.is_none() {
            return Err(ServiceError::not_found("company"));
        }
        self.membership
            .require_membership(actor.user_id, company_id)?;

        let now = self.clock.now();
        let title = required(&draft.title, "title")?;
        let description = required(&draft.description, "description")?;
        validate_salary(draft.salary_min, draft.salary_max)?;
        ensure_skills_exist(self.store.as_ref(), &draft.skill_ids)?;
        let expire_at = match draft.expire_at {
            Some(expire_at) => validate_expiry(expire_at, now)?,
            None => self.default_expiry(now)?,
        };

        let mut skill_ids = draft.skill_ids;
        skill_ids.sort();
        skill_ids.dedup();

        let offer = JobOffer {
            id: JobOfferId::new(),
            company_id,
            title,
            description,
            location: clean(draft.location),
            remote_type: draft.remote_type.unwrap_or_default(),
            contract_type: draft.contract_type.unwrap_or_default(),
            status: OfferStatus::Published,
            skill_ids,
            salary_min: draft.salary_min,
            salary_max: draft.salary_max,
            salary_currency: clean(draft.salary_currency)
                .unwrap_or_else(|| DEFAULT_SALARY_CURRENCY.to_string()),
            salary_visible: draft.salary_visible.unwrap_or(true),
            is_urgent: draft.is_urgent,
            is_active: true,
            published_at: Some(now),
            expire_at,
            closed_at: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        let offer = self.store.insert_offer(offer)?;
        info!(offer_id = %offer.id, %company_id, "job offer published");
        Ok(offer)
    }

    pub fn update(
        &self,
        actor: &Actor,
        offer_id: JobOfferId,
        patch: OfferPatch,
    ) -> Result<JobOffer, ServiceError> {
        let mut offer = self.get(offer_id)?;
        self.membership
            .require_membership(actor.user_id, offer.company_id)?;

        if let Some(title) = patch.title {
            offer.title = required(&title, "title")?;
        }
        if let Some(description) = patch.description {
            offer.description = required(&description, "description")?;
        }
        if patch.location.is_some() {
            offer.location = clean(patch.location);
        }
        if let Some(remote_type) = patch.remote_type {
            offer.remote_type = remote_type;
        }
        if let Some(contract_type) = patch.contract_type {
            offer.contract_type = contract_type;
        }
        if let Some(min) = patch.salary_min {
            offer.salary_min = Some(min);
        }
        if let Some(max) = patch.salary_max {
            offer.salary_max = Some(max);
        }
        validate_salary(offer.salary_min, offer.salary_max)?;
        if let Some(currency) = clean(patch.salary_currency) {
            offer.salary_currency = currency;
        }
        if let Some(visible) = patch.salary_visible {
            offer.salary_visible = visible;
        }
        if let Some(is_urgent) = patch.is_urgent {
            offer.is_urgent = is_urgent;
        }
        if let Some(expire_at) = patch.expire_at {
            offer.expire_at = expire_at;
        }
        if let Some(mut skill_ids) = patch.skill_ids {
            ensure_skills_exist(self.store.as_ref(), &skill_ids)?;
            skill_ids.sort();
            skill_ids.dedup();
            offer.skill_ids = skill_ids;
        }
        offer.updated_at = self.clock.now();

        self.store.update_offer(offer.clone())?;
        Ok(offer)
    }

    /// Closes the offer. Closing twice simply reapplies the change.
    pub fn close(&self, actor: &Actor, offer_id: JobOfferId) -> Result<JobOffer, ServiceError> {
        let mut offer = self.get(offer_id)?;
        self.membership
            .require_membership(actor.user_id, offer.company_id)?;

        let now = self.clock.now();
        offer.status = OfferStatus::Closed;
        offer.is_active = false;
        offer.closed_at = Some(now);
        offer.updated_at = now;

        self.store.update_offer(offer.clone())?;
        info!(offer_id = %offer.id, "job offer closed");
        Ok(offer)
    }

    pub fn soft_delete(&self, actor: &Actor, offer_id: JobOfferId) -> Result<(), ServiceError> {
        let mut offer = self.get(offer_id)?;
        self.membership
            .require_membership(actor.user_id, offer.company_id)?;

        let now = self.clock.now();
        offer.deleted_at = Some(now);
        offer.updated_at = now;
        self.store.update_offer(offer)?;
        info!(%offer_id, "job offer deleted");
        Ok(())
    }

    /// Visible offer by id; soft-deleted offers are not found.
    pub fn get(&self, offer_id: JobOfferId) -> Result<JobOffer, ServiceError> {
        self.store
            .fetch_offer(offer_id)?
            .filter(|offer| !offer.is_deleted())
            .ok_or_else(|| ServiceError::not_found("job offer"))
    }

    pub fn list_published(
        &self,
        filters: OfferFilters,
        page: u32,
    ) -> Result<Page<OfferListing>, ServiceError> {
        let query = OfferQuery {
            scope: OfferScope::Published,
            filters,
            now: self.clock.now(),
        };
        let page = PageRequest::new(page, self.config.offer_page_size);
        Ok(self.store.search_offers(&query, page)?)
    }

    pub fn list_for_company(
        &self,
        actor: &Actor,
        company_id: CompanyId,
        filters: OfferFilters,
        page: u32,
    ) -> Result<Page<OfferListing>, ServiceError> {
        self.membership
            .require_membership(actor.user_id, company_id)?;
        let query = OfferQuery {
            scope: OfferScope::Company(company_id),
            filters,
            now: self.clock.now(),
        };
        let page = PageRequest::new(page, self.config.page_size);
        Ok(self.store.search_offers(&query, page)?)
    }

    /// Offers a recruiter can still filter applications by.
    pub fn open_offers_for_company(
        &self,
        company_id: CompanyId,
    ) -> Result<Vec<OpenOffer>, ServiceError> {
        Ok(self
            .store
            .offers_for_company(company_id)?
            .into_iter()
            .filter(|offer| offer.status != OfferStatus::Closed)
            .map(|offer| OpenOffer {
                id: offer.id,
                title: offer.title,
            })
            .collect())
    }

    fn default_expiry(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, ServiceError> {
        now.checked_add_months(Months::new(self.config.offer_lifetime_months))
            .ok_or_else(|| ServiceError::Validation("offer lifetime is out of range".to_string()))
    }
}

fn required(value: &str, field: &str) -> Result<String, ServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ServiceError::Validation(format!("{field} is required")))
    } else {
        Ok(trimmed.to_string())
    }
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

fn validate_salary(min: Option<u32>, max: Option<u32>) -> Result<(), ServiceError> {
    match (min, max) {
        (Some(min), Some(max)) if min > max => Err(ServiceError::Validation(
            "minimum salary cannot exceed maximum salary".to_string(),
        )),
        _ => Ok(()),
    }
}

fn validate_expiry(
    expire_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, ServiceError> {
    if expire_at <= now {
        Err(ServiceError::Validation(
            "expiry date must be in the future".to_string(),
        ))
    } else {
        Ok(expire_at)
    }
}
