use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::domain::{
    Company, CompanyDraft, CompanyId, CompanyMember, CompanyPatch, Invitation, MemberInvite,
    MemberView,
};
use super::membership::MembershipResolver;
use crate::applications::{ApplicationStatus, ApplicationSummary};
use crate::clock::{Clock, SystemClock};
use crate::documents::{discard, store_upload, BlobStore, LOGO_FOLDER};
use crate::error::{RepositoryError, ServiceError};
use crate::identity::domain::normalize_email;
use crate::identity::password::{hash_password, temporary_password};
use crate::identity::service::account_conflict;
use crate::identity::{Actor, RoleName, User, UserId};
use crate::notify::{dispatch, Notification, Notifier};
use crate::offers::JobOffer;
use crate::store::HiringStore;
use crate::talent::domain::normalize_text;

const DASHBOARD_LATEST: usize = 5;
pub const MEMBER_INVITATION_TEMPLATE: &str = "emails/member_invitation";

/// Recruiter home page figures for one company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompanyDashboard {
    pub company: Company,
    pub total_applications: u64,
    pub total_posts: u64,
    pub accepted_applications: u64,
    pub members_count: u64,
    pub latest_posts: Vec<JobOffer>,
    pub latest_applications: Vec<ApplicationSummary>,
}

/// Company creation, settings and team management.
pub struct CompanyService<S, B, N> {
    store: Arc<S>,
    blobs: Arc<B>,
    notifier: Arc<N>,
    membership: MembershipResolver<S>,
    clock: Arc<dyn Clock>,
}

impl<S, B, N> CompanyService<S, B, N>
where
    S: HiringStore + 'static,
    B: BlobStore + 'static,
    N: Notifier + 'static,
{
    pub fn new(store: Arc<S>, blobs: Arc<B>, notifier: Arc<N>) -> Self {
        Self::with_clock(store, blobs, notifier, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<S>,
        blobs: Arc<B>,
        notifier: Arc<N>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            membership: MembershipResolver::new(store.clone()),
            store,
            blobs,
            notifier,
            clock,
        }
    }

    pub fn membership(&self) -> &MembershipResolver<S> {
        &self.membership
    }

    pub fn company(&self, company_id: CompanyId) -> Result<Company, ServiceError> {
        self.store
            .fetch_company(company_id)?
            .ok_or_else(|| ServiceError::not_found("company"))
    }

    /// Creates the company with the actor as admin and first member.
    pub fn create_company(
        &self,
        actor: &Actor,
        draft: CompanyDraft,
    ) -> Result<Company, ServiceError> {
        actor.require_role(RoleName::CompanyAdmin)?;
        let name = required_name(&draft.name)?;
        if self.store.company_by_name(&name)?.is_some() {
            return Err(company_exists());
        }

        let now = self.clock.now();
        let company = Company {
            id: CompanyId::new(),
            admin_id: actor.user_id,
            name,
            country: normalize_text(draft.country),
            address: normalize_text(draft.address),
            description: normalize_text(draft.description),
            logo_url: None,
            created_at: now,
            updated_at: now,
        };
        let admin = CompanyMember {
            company_id: company.id,
            user_id: actor.user_id,
            joined_at: now,
        };

        let company = self
            .store
            .insert_with_admin(company, admin)
            .map_err(name_conflict)?;
        info!(company_id = %company.id, admin_id = %actor.user_id, "company created");
        Ok(company)
    }

    pub fn update_company(
        &self,
        actor: &Actor,
        company_id: CompanyId,
        patch: CompanyPatch,
    ) -> Result<Company, ServiceError> {
        let mut company = self.company(company_id)?;
        self.membership
            .require_membership(actor.user_id, company_id)?;

        if let Some(name) = &patch.name {
            company.name = required_name(name)?;
        }
        if patch.country.is_some() {
            company.country = normalize_text(patch.country);
        }
        if patch.address.is_some() {
            company.address = normalize_text(patch.address);
        }
        if patch.description.is_some() {
            company.description = normalize_text(patch.description);
        }
        let uploaded = match &patch.logo {
            Some(logo) => Some(store_upload(self.blobs.as_ref(), LOGO_FOLDER, logo)?),
            None => None,
        };
        if let Some(locator) = &uploaded {
            company.logo_url = Some(locator.clone());
        }
        company.updated_at = self.clock.now();

        if let Err(err) = self.store.update_company(company.clone()) {
            if let Some(locator) = &uploaded {
                discard(self.blobs.as_ref(), locator);
            }
            return Err(name_conflict(err));
        }
        Ok(company)
    }

    /// Creates a RECRUITER account with a temporary credential and adds it to the company.
    /// The notification is best-effort and reported in the result.
    pub fn invite_member(
        &self,
        actor: &Actor,
        company_id: CompanyId,
        invite: MemberInvite,
    ) -> Result<Invitation, ServiceError> {
        let company = self.company(company_id)?;
        self.membership
            .require_membership(actor.user_id, company_id)?;

        let first_name = invite.first_name.trim();
        let last_name = invite.last_name.trim();
        let email = normalize_email(&invite.email);
        if first_name.is_empty() || last_name.is_empty() || email.is_empty() {
            return Err(ServiceError::Validation(
                "first name, last name and email are all required".to_string(),
            ));
        }
        if !email.contains('@') {
            return Err(ServiceError::Validation(
                "a valid email address is required".to_string(),
            ));
        }

        let temporary_password = temporary_password();
        let now = self.clock.now();
        let user = User {
            id: UserId::new(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email,
            password_hash: hash_password(&temporary_password)?,
            email_verified_at: None,
            roles: BTreeSet::from([RoleName::Recruiter]),
            created_at: now,
        };
        let member = CompanyMember {
            company_id,
            user_id: user.id,
            joined_at: now,
        };
        let user = self
            .store
            .insert_invited_member(user, member.clone())
            .map_err(account_conflict)?;
        info!(%company_id, user_id = %user.id, invited_by = %actor.user_id, "member invited");

        let notification = Notification::new(
            user.email.clone(),
            format!("You have been invited to join {}", company.name),
            MEMBER_INVITATION_TEMPLATE,
        )
        .with("company_name", company.name.clone())
        .with("first_name", user.first_name.clone())
        .with("temporary_password", temporary_password.clone());
        let notification = dispatch(self.notifier.as_ref(), &notification);

        Ok(Invitation {
            user,
            member,
            temporary_password,
            notification,
        })
    }

    pub fn members(&self, company_id: CompanyId) -> Result<Vec<MemberView>, ServiceError> {
        let company = self.company(company_id)?;
        let mut views = Vec::new();
        for member in self.store.members(company_id)? {
            let Some(user) = self.store.fetch_user(member.user_id)? else {
                warn!(%company_id, user_id = %member.user_id, "member row without a user account");
                continue;
            };
            views.push(MemberView {
                user_id: user.id,
                full_name: user.full_name(),
                email: user.email,
                is_admin: user.id == company.admin_id,
                joined_at: member.joined_at,
            });
        }
        Ok(views)
    }

    pub fn dashboard(&self, actor: &Actor) -> Result<CompanyDashboard, ServiceError> {
        let company = self.membership.resolve_company_for_user(actor.user_id)?;
        let offers = self.store.offers_for_company(company.id)?;
        let applications = self.store.applications_for_company(company.id)?;
        let members_count = self.store.members(company.id)?.len() as u64;

        let accepted_applications = applications
            .iter()
            .filter(|summary| summary.application.status == ApplicationStatus::Accepted)
            .count() as u64;

        Ok(CompanyDashboard {
            total_applications: applications.len() as u64,
            total_posts: offers.len() as u64,
            accepted_applications,
            members_count,
            latest_posts: offers.into_iter().take(DASHBOARD_LATEST).collect(),
            latest_applications: applications.into_iter().take(DASHBOARD_LATEST).collect(),
            company,
        })
    }
}

fn required_name(name: &str) -> Result<String, ServiceError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ServiceError::Validation(
            "company name is required".to_string(),
        ));
    }
    Ok(name.to_string())
}

fn company_exists() -> ServiceError {
    ServiceError::Conflict("a company with this name already exists".to_string())
}

fn name_conflict(err: RepositoryError) -> ServiceError {
    match err {
        RepositoryError::UniqueViolation { .. } => company_exists(),
        other => other.into(),
    }
}
