use std::sync::Arc;

use tracing::{info, warn};

use super::domain::{
    parse_disponibility, Application, ApplicationFilters, ApplicationId, ApplicationQuery,
    ApplicationScope, ApplicationStatus, ApplicationSummary, ApplicationUpdate, ApplyRequest,
    ScopeKey, StatusChange,
};
use crate::clock::{Clock, SystemClock};
use crate::company::MembershipResolver;
use crate::config::HiringConfig;
use crate::documents::{discard, store_upload, BlobStore, DocumentUpload, CV_FOLDER};
use crate::error::{RepositoryError, ServiceError};
use crate::identity::{Actor, RoleName};
use crate::notify::{dispatch, Notification, NotificationResult, Notifier};
use crate::offers::JobOfferId;
use crate::pagination::{Page, PageRequest};
use crate::store::HiringStore;
use crate::talent::domain::normalize_text;
use crate::talent::TalentProfile;

pub const APPLY_APPROVED_TEMPLATE: &str = "emails/apply_approved";
const APPLY_APPROVED_SUBJECT: &str = "Application accepted";

/// Talent submissions against offers and the company-side review of them.
pub struct ApplicationService<S, B, N> {
    store: Arc<S>,
    blobs: Arc<B>,
    notifier: Arc<N>,
    membership: MembershipResolver<S>,
    clock: Arc<dyn Clock>,
    config: HiringConfig,
}

impl<S, B, N> ApplicationService<S, B, N>
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
            membership: MembershipResolver::new(store.clone()),
            store,
            blobs,
            notifier,
            clock,
            config,
        }
    }

    pub fn apply(
        &self,
        actor: &Actor,
        job_offer_id: JobOfferId,
        request: ApplyRequest,
    ) -> Result<Application, ServiceError> {
        let offer = self
            .store
            .fetch_offer(job_offer_id)?
            .filter(|offer| !offer.is_deleted())
            .ok_or_else(|| ServiceError::not_found("job offer"))?;
        actor.require_role(RoleName::Talent)?;
        let profile = self.store.profile_for_user(actor.user_id)?.ok_or_else(|| {
            ServiceError::Validation("must complete talent profile before applying".to_string())
        })?;
        if self
            .store
            .live_application_for(profile.id, offer.id)?
            .is_some()
        {
            return Err(already_applied());
        }

        let now = self.clock.now();
        if !offer.is_open(now) {
            return Err(ServiceError::Validation(
                "offer is no longer accepting applications".to_string(),
            ));
        }
        let disponible_at = match request.disponibility.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => Some(parse_disponibility(raw)?),
            _ => None,
        };

        let (document_url, uploaded) = match self.resolve_document(
            &profile,
            request.use_profile_cv,
            request.document.as_ref(),
        )? {
            Some(resolved) => (Some(resolved.locator), resolved.uploaded),
            None => (None, false),
        };

        let application = Application {
            id: ApplicationId::new(),
            talent_id: profile.id,
            job_offer_id: offer.id,
            company_id: offer.company_id,
            message: normalize_text(request.message),
            document_url,
            status: ApplicationStatus::Pending,
            disponible_at,
            applied_at: now,
            updated_at: now,
            deleted_at: None,
        };

        match self.store.insert_application(application.clone()) {
            Ok(stored) => {
                info!(
                    application_id = %stored.id,
                    job_offer_id = %offer.id,
                    talent_id = %profile.id,
                    "application submitted"
                );
                Ok(stored)
            }
            Err(err) => {
                if uploaded {
                    if let Some(locator) = &application.document_url {
                        discard(self.blobs.as_ref(), locator);
                    }
                }
                Err(match err {
                    RepositoryError::UniqueViolation { .. } => already_applied(),
                    other => other.into(),
                })
            }
        }
    }

    /// Talent-side edit of message, document and availability.
    pub fn update_application(
        &self,
        actor: &Actor,
        application_id: ApplicationId,
        update: ApplicationUpdate,
    ) -> Result<Application, ServiceError> {
        let (mut application, profile) = self.owned_application(actor, application_id)?;

        if update.message.is_some() {
            application.message = normalize_text(update.message);
        }
        if let Some(raw) = update.disponibility.as_deref().map(str::trim) {
            application.disponible_at = if raw.is_empty() {
                None
            } else {
                Some(parse_disponibility(raw)?)
            };
        }

        let mut uploaded = None;
        let use_profile_cv = update.use_profile_cv.unwrap_or(false);
        if use_profile_cv || update.document.is_some() {
            let resolved =
                self.resolve_document(&profile, use_profile_cv, update.document.as_ref())?;
            if let Some(resolved) = &resolved {
                if resolved.uploaded {
                    uploaded = Some(resolved.locator.clone());
                }
            }
            application.document_url = resolved.map(|resolved| resolved.locator);
        }
        application.updated_at = self.clock.now();

        if let Err(err) = self.store.update_application(application.clone()) {
            if let Some(locator) = &uploaded {
                discard(self.blobs.as_ref(), locator);
            }
            return Err(err.into());
        }
        Ok(application)
    }

    /// Soft-deletes the application; the talent may apply to the offer again afterwards.
    pub fn delete_application(
        &self,
        actor: &Actor,
        application_id: ApplicationId,
    ) -> Result<(), ServiceError> {
        let (mut application, _) = self.owned_application(actor, application_id)?;
        let now = self.clock.now();
        application.deleted_at = Some(now);
        application.updated_at = now;
        self.store.update_application(application)?;
        info!(%application_id, "application withdrawn");
        Ok(())
    }

    /// Company-side status change. Accepting notifies the talent, best-effort.
    pub fn confirm_or_revoke_apply(
        &self,
        actor: &Actor,
        application_id: ApplicationId,
        status: ApplicationStatus,
    ) -> Result<StatusChange, ServiceError> {
        let mut application = self.live_application(application_id)?;
        self.membership
            .require_membership(actor.user_id, application.company_id)?;

        let previous = application.status;
        if !self.config.transitions.allows(previous, status) {
            return Err(ServiceError::Validation(format!(
                "cannot move an application from {previous} to {status}"
            )));
        }
        application.status = status;
        application.updated_at = self.clock.now();
        self.store.update_application(application.clone())?;
        info!(
            %application_id,
            from = previous.label(),
            to = status.label(),
            reviewer_id = %actor.user_id,
            "application status changed"
        );

        let notification = if status == ApplicationStatus::Accepted {
            Some(self.notify_accepted(application_id))
        } else {
            None
        };
        Ok(StatusChange {
            application,
            notification,
        })
    }

    pub fn list_applications(
        &self,
        filters: ApplicationFilters,
        scope: ApplicationScope<'_>,
        page: u32,
    ) -> Result<Page<ApplicationSummary>, ServiceError> {
        let page = PageRequest::new(page, self.config.page_size);
        let scope = match scope {
            ApplicationScope::Company(company_id) => ScopeKey::Company(company_id),
            ApplicationScope::Talent(actor) => {
                actor.require_role(RoleName::Talent)?;
                match self.store.profile_for_user(actor.user_id)? {
                    Some(profile) => ScopeKey::Talent(profile.id),
                    None => return Ok(Page::empty(page)),
                }
            }
        };
        let query = ApplicationQuery { scope, filters };
        Ok(self.store.search_applications(&query, page)?)
    }

    /// Readable by the owning talent and by members of the receiving company.
    pub fn get_application(
        &self,
        actor: &Actor,
        application_id: ApplicationId,
    ) -> Result<ApplicationSummary, ServiceError> {
        let summary = self
            .store
            .summarize(application_id)?
            .filter(|summary| summary.application.is_live())
            .ok_or_else(|| ServiceError::not_found("application"))?;
        if summary.talent_user_id != actor.user_id {
            self.membership
                .require_membership(actor.user_id, summary.application.company_id)?;
        }
        Ok(summary)
    }

    pub fn membership(&self) -> &MembershipResolver<S> {
        &self.membership
    }

    fn live_application(&self, application_id: ApplicationId) -> Result<Application, ServiceError> {
        self.store
            .fetch_application(application_id)?
            .filter(Application::is_live)
            .ok_or_else(|| ServiceError::not_found("application"))
    }

    fn owned_application(
        &self,
        actor: &Actor,
        application_id: ApplicationId,
    ) -> Result<(Application, TalentProfile), ServiceError> {
        let application = self.live_application(application_id)?;
        match self.store.profile_for_user(actor.user_id)? {
            Some(profile) if profile.id == application.talent_id => Ok((application, profile)),
            _ => Err(ServiceError::forbidden()),
        }
    }

    /// Profile CV reference when requested, otherwise a fresh upload, otherwise nothing.
    fn resolve_document(
        &self,
        profile: &TalentProfile,
        use_profile_cv: bool,
        document: Option<&DocumentUpload>,
    ) -> Result<Option<ResolvedDocument>, ServiceError> {
        if use_profile_cv {
            return Ok(profile.cv_url.clone().map(|locator| ResolvedDocument {
                locator,
                uploaded: false,
            }));
        }
        match document {
            Some(upload) => Ok(Some(ResolvedDocument {
                locator: store_upload(self.blobs.as_ref(), CV_FOLDER, upload)?,
                uploaded: true,
            })),
            None => Ok(None),
        }
    }

    /// Runs after the status is committed, so every failure is reported in the result.
    fn notify_accepted(&self, application_id: ApplicationId) -> NotificationResult {
        let summary = match self.store.summarize(application_id) {
            Ok(Some(summary)) => summary,
            Ok(None) => return undelivered(application_id, "application summary is missing"),
            Err(err) => return undelivered(application_id, &err.to_string()),
        };
        let notification = Notification::new(
            summary.talent_email.clone(),
            APPLY_APPROVED_SUBJECT,
            APPLY_APPROVED_TEMPLATE,
        )
        .with("first_name", summary.talent_first_name.clone())
        .with("job_title", summary.job_title.clone())
        .with("company_name", summary.company_name.clone());
        dispatch(self.notifier.as_ref(), &notification)
    }
}

fn undelivered(application_id: ApplicationId, reason: &str) -> NotificationResult {
    warn!(%application_id, reason, "acceptance notification not sent");
    NotificationResult::Failed {
        reason: reason.to_string(),
    }
}

struct ResolvedDocument {
    locator: String,
    uploaded: bool,
}

fn already_applied() -> ServiceError {
    ServiceError::Conflict("already applied to this offer".to_string())
}
