use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::applications::{
    Application, ApplicationId, ApplicationQuery, ApplicationRepository, ApplicationSummary,
    ApplyRequest,
};
use crate::app::HireTop;
use crate::clock::FixedClock;
use crate::company::{
    Company, CompanyDraft, CompanyId, CompanyMember, CompanyRepository, MemberInvite,
};
use crate::config::HiringConfig;
use crate::documents::{DocumentUpload, MemoryBlobStore};
use crate::error::RepositoryError;
use crate::identity::{Actor, Registration, RoleName, User, UserId, UserRepository};
use crate::notify::MemoryNotifier;
use crate::offers::{JobOffer, JobOfferId, OfferDraft, OfferListing, OfferQuery, OfferRepository};
use crate::pagination::{Page, PageRequest};
use crate::store::MemoryStore;
use crate::talent::{
    EducationDraft, ExperienceDraft, ProfileDraft, Skill, SkillCatalog, SkillId,
    SkillRepository, SkillSelection, TalentProfile, TalentProfileId, TalentRepository,
};

pub(super) type TestApp<S = MemoryStore> = HireTop<S, MemoryBlobStore, MemoryNotifier>;

pub(super) fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap()
}

pub(super) struct World<S = MemoryStore> {
    pub(super) app: Arc<TestApp<S>>,
    pub(super) store: Arc<S>,
    pub(super) blobs: Arc<MemoryBlobStore>,
    pub(super) notifier: MemoryNotifier,
    pub(super) clock: Arc<FixedClock>,
}

pub(super) fn build_world() -> World {
    build_world_with(HiringConfig::default())
}

pub(super) fn build_world_with(config: HiringConfig) -> World {
    build_world_over(MemoryStore::with_skills(SkillCatalog::standard()), config)
}

pub(super) fn build_world_over<S>(store: S, config: HiringConfig) -> World<S>
where
    S: crate::store::HiringStore + 'static,
{
    assemble(store, config, MemoryNotifier::default())
}

/// World whose notifier rejects every message with `reason`.
pub(super) fn build_world_with_failing_mail(reason: &str) -> World {
    assemble(
        MemoryStore::with_skills(SkillCatalog::standard()),
        HiringConfig::default(),
        MemoryNotifier::failing(reason),
    )
}

fn assemble<S>(store: S, config: HiringConfig, notifier: MemoryNotifier) -> World<S>
where
    S: crate::store::HiringStore + 'static,
{
    let store = Arc::new(store);
    let blobs = Arc::new(MemoryBlobStore::default());
    let clock = Arc::new(FixedClock::new(start()));
    let app = Arc::new(HireTop::with_clock(
        store.clone(),
        blobs.clone(),
        Arc::new(notifier.clone()),
        config,
        clock.clone(),
    ));
    World {
        app,
        store,
        blobs,
        notifier,
        clock,
    }
}

impl<S> World<S>
where
    S: crate::store::HiringStore + 'static,
{
    pub(super) fn verified_account(&self, first_name: &str, email: &str, role: RoleName) -> Actor {
        let user = self
            .app
            .identity
            .register(
                Registration {
                    first_name: first_name.to_string(),
                    last_name: "Ndiaye".to_string(),
                    email: email.to_string(),
                    password: "correct horse battery".to_string(),
                },
                role,
            )
            .expect("registration succeeds");
        self.app
            .identity
            .verify_email(user.id)
            .expect("verification succeeds");
        self.app.identity.actor(user.id).expect("actor resolves")
    }

    /// Talent whose profile scores 100, with its CV stored at `cvs/...`.
    pub(super) fn complete_talent(&self, first_name: &str, email: &str) -> (Actor, TalentProfile) {
        let actor = self.verified_account(first_name, email, RoleName::Talent);
        self.app
            .talent
            .create_profile(
                &actor,
                ProfileDraft {
                    title: Some("Backend engineer".to_string()),
                    phone: Some("+221 77 123 45 67".to_string()),
                    bio: Some("Builds payment systems.".to_string()),
                    location: Some("Dakar".to_string()),
                    skills: vec![SkillSelection {
                        skill_id: SkillId(1),
                        level: Some(3),
                    }],
                    cv: Some(DocumentUpload::pdf("resume.pdf", b"%PDF-1.7 profile".to_vec())),
                    ..ProfileDraft::default()
                },
            )
            .expect("profile created");
        self.app
            .talent
            .add_education(
                &actor,
                EducationDraft {
                    institution: "UCAD".to_string(),
                    degree: "MSc Computer Science".to_string(),
                    description: None,
                    start_at: date(2016, 10, 1),
                    end_at: Some(date(2021, 7, 1)),
                    is_current: false,
                },
            )
            .expect("education added");
        let profile = self
            .app
            .talent
            .add_experience(
                &actor,
                ExperienceDraft {
                    job_title: "Software engineer".to_string(),
                    company_name: "Wave".to_string(),
                    location: Some("Dakar".to_string()),
                    start_at: date(2021, 9, 1),
                    end_at: None,
                    is_current: true,
                    description: None,
                },
            )
            .expect("experience added");
        (actor, profile)
    }

    pub(super) fn company(&self, name: &str, admin_email: &str) -> (Actor, Company) {
        let admin = self.verified_account("Fatou", admin_email, RoleName::CompanyAdmin);
        let company = self
            .app
            .companies
            .create_company(
                &admin,
                CompanyDraft {
                    name: name.to_string(),
                    country: Some("Senegal".to_string()),
                    address: None,
                    description: None,
                },
            )
            .expect("company created");
        (admin, company)
    }

    /// Invited recruiter of `company`, verified so it passes the HTTP boundary.
    pub(super) fn recruiter(&self, admin: &Actor, company: &Company, email: &str) -> Actor {
        let invitation = self
            .app
            .companies
            .invite_member(
                admin,
                company.id,
                MemberInvite {
                    first_name: "Ibrahima".to_string(),
                    last_name: "Sow".to_string(),
                    email: email.to_string(),
                },
            )
            .expect("member invited");
        self.app
            .identity
            .verify_email(invitation.user.id)
            .expect("verification succeeds");
        self.app
            .identity
            .actor(invitation.user.id)
            .expect("actor resolves")
    }

    pub(super) fn offer(&self, member: &Actor, company: &Company, title: &str) -> JobOffer {
        self.app
            .offers
            .create(
                member,
                company.id,
                OfferDraft {
                    title: title.to_string(),
                    description: "Own our settlement services.".to_string(),
                    location: Some("Dakar".to_string()),
                    skill_ids: vec![SkillId(1)],
                    ..OfferDraft::default()
                },
            )
            .expect("offer published")
    }
}

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn with_profile_cv() -> ApplyRequest {
    ApplyRequest {
        message: Some("I would love to join.".to_string()),
        use_profile_cv: true,
        ..ApplyRequest::default()
    }
}

pub(super) fn with_upload(bytes: &[u8]) -> ApplyRequest {
    ApplyRequest {
        document: Some(DocumentUpload::pdf("cover.pdf", bytes.to_vec())),
        ..ApplyRequest::default()
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}

/// Store whose duplicate lookup never sees existing rows, so the insert-time constraint
/// is the only guard left. `failing_summaries` also makes summary lookups error.
#[derive(Default)]
pub(super) struct BlindStore {
    pub(super) inner: MemoryStore,
    pub(super) failing_summaries: bool,
}

impl BlindStore {
    pub(super) fn new() -> Self {
        Self {
            inner: MemoryStore::with_skills(SkillCatalog::standard()),
            failing_summaries: false,
        }
    }

    pub(super) fn with_failing_summaries() -> Self {
        Self {
            failing_summaries: true,
            ..Self::new()
        }
    }
}

impl UserRepository for BlindStore {
    fn insert_user(&self, user: User) -> Result<User, RepositoryError> {
        self.inner.insert_user(user)
    }
    fn update_user(&self, user: User) -> Result<(), RepositoryError> {
        self.inner.update_user(user)
    }
    fn fetch_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        self.inner.fetch_user(id)
    }
    fn user_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        self.inner.user_by_email(email)
    }
}

impl TalentRepository for BlindStore {
    fn insert_profile(&self, profile: TalentProfile) -> Result<TalentProfile, RepositoryError> {
        self.inner.insert_profile(profile)
    }
    fn update_profile(&self, profile: TalentProfile) -> Result<(), RepositoryError> {
        self.inner.update_profile(profile)
    }
    fn fetch_profile(&self, id: TalentProfileId) -> Result<Option<TalentProfile>, RepositoryError> {
        self.inner.fetch_profile(id)
    }
    fn profile_for_user(&self, user_id: UserId) -> Result<Option<TalentProfile>, RepositoryError> {
        self.inner.profile_for_user(user_id)
    }
}

impl SkillRepository for BlindStore {
    fn all_skills(&self) -> Result<Vec<Skill>, RepositoryError> {
        self.inner.all_skills()
    }
    fn fetch_skills(&self, ids: &[SkillId]) -> Result<Vec<Skill>, RepositoryError> {
        self.inner.fetch_skills(ids)
    }
}

impl CompanyRepository for BlindStore {
    fn insert_with_admin(
        &self,
        company: Company,
        admin: CompanyMember,
    ) -> Result<Company, RepositoryError> {
        self.inner.insert_with_admin(company, admin)
    }
    fn update_company(&self, company: Company) -> Result<(), RepositoryError> {
        self.inner.update_company(company)
    }
    fn fetch_company(&self, id: CompanyId) -> Result<Option<Company>, RepositoryError> {
        self.inner.fetch_company(id)
    }
    fn company_by_name(&self, name: &str) -> Result<Option<Company>, RepositoryError> {
        self.inner.company_by_name(name)
    }
    fn companies_for_user(&self, user_id: UserId) -> Result<Vec<Company>, RepositoryError> {
        self.inner.companies_for_user(user_id)
    }
    fn insert_invited_member(
        &self,
        user: User,
        member: CompanyMember,
    ) -> Result<User, RepositoryError> {
        self.inner.insert_invited_member(user, member)
    }
    fn members(&self, company_id: CompanyId) -> Result<Vec<CompanyMember>, RepositoryError> {
        self.inner.members(company_id)
    }
    fn is_member(&self, user_id: UserId, company_id: CompanyId) -> Result<bool, RepositoryError> {
        self.inner.is_member(user_id, company_id)
    }
}

impl OfferRepository for BlindStore {
    fn insert_offer(&self, offer: JobOffer) -> Result<JobOffer, RepositoryError> {
        self.inner.insert_offer(offer)
    }
    fn update_offer(&self, offer: JobOffer) -> Result<(), RepositoryError> {
        self.inner.update_offer(offer)
    }
    fn fetch_offer(&self, id: JobOfferId) -> Result<Option<JobOffer>, RepositoryError> {
        self.inner.fetch_offer(id)
    }
    fn search_offers(
        &self,
        query: &OfferQuery,
        page: PageRequest,
    ) -> Result<Page<OfferListing>, RepositoryError> {
        self.inner.search_offers(query, page)
    }
    fn offers_for_company(&self, company_id: CompanyId) -> Result<Vec<JobOffer>, RepositoryError> {
        self.inner.offers_for_company(company_id)
    }
}

impl ApplicationRepository for BlindStore {
    fn insert_application(
        &self,
        application: Application,
    ) -> Result<Application, RepositoryError> {
        self.inner.insert_application(application)
    }
    fn update_application(&self, application: Application) -> Result<(), RepositoryError> {
        self.inner.update_application(application)
    }
    fn fetch_application(&self, id: ApplicationId) -> Result<Option<Application>, RepositoryError> {
        self.inner.fetch_application(id)
    }
    fn live_application_for(
        &self,
        _talent_id: TalentProfileId,
        _job_offer_id: JobOfferId,
    ) -> Result<Option<Application>, RepositoryError> {
        Ok(None)
    }
    fn summarize(&self, id: ApplicationId) -> Result<Option<ApplicationSummary>, RepositoryError> {
        if self.failing_summaries {
            return Err(RepositoryError::Unavailable("summary view offline".to_string()));
        }
        self.inner.summarize(id)
    }
    fn search_applications(
        &self,
        query: &ApplicationQuery,
        page: PageRequest,
    ) -> Result<Page<ApplicationSummary>, RepositoryError> {
        self.inner.search_applications(query, page)
    }
    fn applications_for_company(
        &self,
        company_id: CompanyId,
    ) -> Result<Vec<ApplicationSummary>, RepositoryError> {
        self.inner.applications_for_company(company_id)
    }
    fn live_applications_for_talent(
        &self,
        talent_id: TalentProfileId,
    ) -> Result<Vec<Application>, RepositoryError> {
        self.inner.live_applications_for_talent(talent_id)
    }
}
