use std::sync::Arc;

use crate::applications::{ApplicationId, ApplicationRepository};
use crate::company::CompanyRepository;
use crate::error::ServiceError;
use crate::identity::UserId;
use crate::talent::TalentRepository;

/// Decides who may read a stored CV. Answers are plain booleans; the caller maps `false`
/// to an authorization failure.
pub struct DocumentAccessPolicy<S> {
    store: Arc<S>,
}

impl<S> Clone for DocumentAccessPolicy<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S> DocumentAccessPolicy<S>
where
    S: ApplicationRepository + TalentRepository + CompanyRepository + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Owning talent, or a member of the company the application was sent to.
    pub fn can_access_application_document(
        &self,
        application_id: ApplicationId,
        requester: UserId,
    ) -> Result<bool, ServiceError> {
        let Some(application) = self.store.fetch_application(application_id)? else {
            return Ok(false);
        };

        let owner = self
            .store
            .fetch_profile(application.talent_id)?
            .map(|profile| profile.user_id == requester)
            .unwrap_or(false);
        if owner {
            return Ok(true);
        }
        Ok(self.store.is_member(requester, application.company_id)?)
    }

    /// Owner, or a member of any company the talent has a live application with.
    pub fn can_access_profile_document(
        &self,
        talent_user_id: UserId,
        requester: UserId,
    ) -> Result<bool, ServiceError> {
        if talent_user_id == requester {
            return Ok(true);
        }
        let Some(profile) = self.store.profile_for_user(talent_user_id)? else {
            return Ok(false);
        };

        for application in self.store.live_applications_for_talent(profile.id)? {
            if self.store.is_member(requester, application.company_id)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
