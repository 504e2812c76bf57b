use std::sync::Arc;

use tracing::debug;

use super::domain::{Company, CompanyId};
use super::repository::CompanyRepository;
use crate::error::ServiceError;
use crate::identity::UserId;

/// Answers which company a user acts for and whether they may act for a given one.
pub struct MembershipResolver<S> {
    store: Arc<S>,
}

impl<S> Clone for MembershipResolver<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S> MembershipResolver<S>
where
    S: CompanyRepository + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn company_for_user(&self, user_id: UserId) -> Result<Option<Company>, ServiceError> {
        Ok(self.store.companies_for_user(user_id)?.into_iter().next())
    }

    pub fn resolve_company_for_user(&self, user_id: UserId) -> Result<Company, ServiceError> {
        self.company_for_user(user_id)?.ok_or_else(|| {
            ServiceError::NotFound("no company is associated with this account".to_string())
        })
    }

    pub fn is_member(&self, user_id: UserId, company_id: CompanyId) -> Result<bool, ServiceError> {
        Ok(self.store.is_member(user_id, company_id)?)
    }

    pub fn require_membership(
        &self,
        user_id: UserId,
        company_id: CompanyId,
    ) -> Result<(), ServiceError> {
        if self.is_member(user_id, company_id)? {
            Ok(())
        } else {
            debug!(%user_id, %company_id, "membership check failed");
            Err(ServiceError::forbidden())
        }
    }
}
