use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::applications::{
    Application, ApplicationId, ApplicationQuery, ApplicationRepository, ApplicationSummary,
    LIVE_APPLICATION_CONSTRAINT,
};
use crate::company::{
    Company, CompanyId, CompanyMember, CompanyRepository, COMPANY_MEMBER_CONSTRAINT,
    COMPANY_NAME_CONSTRAINT,
};
use crate::error::RepositoryError;
use crate::identity::{User, UserId, UserRepository, USER_EMAIL_CONSTRAINT};
use crate::offers::{JobOffer, JobOfferId, OfferListing, OfferQuery, OfferRepository};
use crate::pagination::{Page, PageRequest};
use crate::talent::{
    Skill, SkillCatalog, SkillId, SkillRepository, TalentProfile, TalentProfileId,
    TalentRepository, TALENT_PROFILE_USER_CONSTRAINT,
};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<UserId, User>,
    profiles: HashMap<TalentProfileId, TalentProfile>,
    skills: BTreeMap<SkillId, Skill>,
    companies: HashMap<CompanyId, Company>,
    members: Vec<CompanyMember>,
    offers: HashMap<JobOfferId, JobOffer>,
    applications: HashMap<ApplicationId, Application>,
}

/// Relational store held in process memory.
///
/// All tables sit behind one lock, so each call is a single transaction and unique
/// constraints are checked and written atomically.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_skills(catalog: SkillCatalog) -> Self {
        let store = Self::default();
        store.seed_skills(catalog);
        store
    }

    pub fn seed_skills(&self, catalog: SkillCatalog) {
        let mut tables = self.lock();
        for skill in catalog.into_skills() {
            tables.skills.insert(skill.id, skill);
        }
    }

    /// Every application row, soft-deleted ones included.
    pub fn all_applications(&self) -> Vec<Application> {
        self.lock().applications.values().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().expect("store mutex poisoned")
    }
}

impl Tables {
    fn summarize(&self, application: &Application) -> ApplicationSummary {
        let profile = self.profiles.get(&application.talent_id);
        let user = profile.and_then(|profile| self.users.get(&profile.user_id));
        let offer = self.offers.get(&application.job_offer_id);
        let company = self.companies.get(&application.company_id);

        ApplicationSummary {
            application: application.clone(),
            talent_user_id: profile.map(|profile| profile.user_id).unwrap_or_default(),
            talent_first_name: user.map(|user| user.first_name.clone()).unwrap_or_default(),
            talent_last_name: user.map(|user| user.last_name.clone()).unwrap_or_default(),
            talent_email: user.map(|user| user.email.clone()).unwrap_or_default(),
            job_title: offer.map(|offer| offer.title.clone()).unwrap_or_default(),
            company_name: company
                .map(|company| company.name.clone())
                .unwrap_or_default(),
        }
    }

    fn offer_skills(&self, offer: &JobOffer) -> Vec<Skill> {
        offer
            .skill_ids
            .iter()
            .filter_map(|id| self.skills.get(id).cloned())
            .collect()
    }

    fn listing(&self, offer: &JobOffer, query: &OfferQuery) -> OfferListing {
        let applications_count = self
            .applications
            .values()
            .filter(|application| application.is_live() && application.job_offer_id == offer.id)
            .count() as u64;

        OfferListing {
            offer: offer.clone(),
            status: offer.effective_status(query.now),
            company_name: self
                .companies
                .get(&offer.company_id)
                .map(|company| company.name.clone())
                .unwrap_or_default(),
            skills: self.offer_skills(offer),
            applications_count,
        }
    }

    fn has_email(&self, email: &str, except: Option<UserId>) -> bool {
        self.users
            .values()
            .any(|user| Some(user.id) != except && user.email.eq_ignore_ascii_case(email))
    }

    fn has_company_name(&self, name: &str, except: Option<CompanyId>) -> bool {
        self.companies
            .values()
            .any(|company| Some(company.id) != except && company.name == name)
    }
}

impl UserRepository for MemoryStore {
    fn insert_user(&self, user: User) -> Result<User, RepositoryError> {
        let mut tables = self.lock();
        if tables.has_email(&user.email, None) {
            return Err(RepositoryError::UniqueViolation {
                constraint: USER_EMAIL_CONSTRAINT,
            });
        }
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    fn update_user(&self, user: User) -> Result<(), RepositoryError> {
        let mut tables = self.lock();
        if !tables.users.contains_key(&user.id) {
            return Err(RepositoryError::NotFound);
        }
        if tables.has_email(&user.email, Some(user.id)) {
            return Err(RepositoryError::UniqueViolation {
                constraint: USER_EMAIL_CONSTRAINT,
            });
        }
        tables.users.insert(user.id, user);
        Ok(())
    }

    fn fetch_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.lock().users.get(&id).cloned())
    }

    fn user_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let email = email.trim();
        Ok(self
            .lock()
            .users
            .values()
            .find(|user| user.email.eq_ignore_ascii_case(email))
            .cloned())
    }
}

impl TalentRepository for MemoryStore {
    fn insert_profile(&self, profile: TalentProfile) -> Result<TalentProfile, RepositoryError> {
        let mut tables = self.lock();
        if tables
            .profiles
            .values()
            .any(|existing| existing.user_id == profile.user_id)
        {
            return Err(RepositoryError::UniqueViolation {
                constraint: TALENT_PROFILE_USER_CONSTRAINT,
            });
        }
        tables.profiles.insert(profile.id, profile.clone());
        Ok(profile)
    }

    fn update_profile(&self, profile: TalentProfile) -> Result<(), RepositoryError> {
        let mut tables = self.lock();
        match tables.profiles.get_mut(&profile.id) {
            Some(existing) => {
                *existing = profile;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch_profile(&self, id: TalentProfileId) -> Result<Option<TalentProfile>, RepositoryError> {
        Ok(self.lock().profiles.get(&id).cloned())
    }

    fn profile_for_user(&self, user_id: UserId) -> Result<Option<TalentProfile>, RepositoryError> {
        Ok(self
            .lock()
            .profiles
            .values()
            .find(|profile| profile.user_id == user_id)
            .cloned())
    }
}

impl SkillRepository for MemoryStore {
    fn all_skills(&self) -> Result<Vec<Skill>, RepositoryError> {
        Ok(self.lock().skills.values().cloned().collect())
    }

    fn fetch_skills(&self, ids: &[SkillId]) -> Result<Vec<Skill>, RepositoryError> {
        let tables = self.lock();
        Ok(tables
            .skills
            .values()
            .filter(|skill| ids.contains(&skill.id))
            .cloned()
            .collect())
    }
}

impl CompanyRepository for MemoryStore {
    fn insert_with_admin(
        &self,
        company: Company,
        admin: CompanyMember,
    ) -> Result<Company, RepositoryError> {
        let mut tables = self.lock();
        if tables.has_company_name(&company.name, None) {
            return Err(RepositoryError::UniqueViolation {
                constraint: COMPANY_NAME_CONSTRAINT,
            });
        }
        tables.companies.insert(company.id, company.clone());
        tables.members.push(admin);
        Ok(company)
    }

    fn update_company(&self, company: Company) -> Result<(), RepositoryError> {
        let mut tables = self.lock();
        if !tables.companies.contains_key(&company.id) {
            return Err(RepositoryError::NotFound);
        }
        if tables.has_company_name(&company.name, Some(company.id)) {
            return Err(RepositoryError::UniqueViolation {
                constraint: COMPANY_NAME_CONSTRAINT,
            });
        }
        tables.companies.insert(company.id, company);
        Ok(())
    }

    fn fetch_company(&self, id: CompanyId) -> Result<Option<Company>, RepositoryError> {
        Ok(self.lock().companies.get(&id).cloned())
    }

    fn company_by_name(&self, name: &str) -> Result<Option<Company>, RepositoryError> {
        Ok(self
            .lock()
            .companies
            .values()
            .find(|company| company.name == name)
            .cloned())
    }

    fn companies_for_user(&self, user_id: UserId) -> Result<Vec<Company>, RepositoryError> {
        let tables = self.lock();
        let mut administered: Vec<&Company> = tables
            .companies
            .values()
            .filter(|company| company.admin_id == user_id)
            .collect();
        administered.sort_by_key(|company| company.created_at);

        let mut memberships: Vec<&CompanyMember> = tables
            .members
            .iter()
            .filter(|member| member.user_id == user_id)
            .collect();
        memberships.sort_by_key(|member| member.joined_at);

        let mut companies: Vec<Company> = administered.into_iter().cloned().collect();
        for member in memberships {
            if companies.iter().any(|company| company.id == member.company_id) {
                continue;
            }
            if let Some(company) = tables.companies.get(&member.company_id) {
                companies.push(company.clone());
            }
        }
        Ok(companies)
    }

    fn insert_invited_member(
        &self,
        user: User,
        member: CompanyMember,
    ) -> Result<User, RepositoryError> {
        let mut tables = self.lock();
        if !tables.companies.contains_key(&member.company_id) {
            return Err(RepositoryError::NotFound);
        }
        if tables.has_email(&user.email, None) {
            return Err(RepositoryError::UniqueViolation {
                constraint: USER_EMAIL_CONSTRAINT,
            });
        }
        if tables
            .members
            .iter()
            .any(|existing| {
                existing.company_id == member.company_id && existing.user_id == member.user_id
            })
        {
            return Err(RepositoryError::UniqueViolation {
                constraint: COMPANY_MEMBER_CONSTRAINT,
            });
        }
        tables.users.insert(user.id, user.clone());
        tables.members.push(member);
        Ok(user)
    }

    fn members(&self, company_id: CompanyId) -> Result<Vec<CompanyMember>, RepositoryError> {
        let tables = self.lock();
        let mut members: Vec<CompanyMember> = tables
            .members
            .iter()
            .filter(|member| member.company_id == company_id)
            .cloned()
            .collect();
        members.sort_by_key(|member| member.joined_at);
        Ok(members)
    }

    fn is_member(&self, user_id: UserId, company_id: CompanyId) -> Result<bool, RepositoryError> {
        let tables = self.lock();
        let is_admin = tables
            .companies
            .get(&company_id)
            .map(|company| company.admin_id == user_id)
            .unwrap_or(false);
        Ok(is_admin
            || tables
                .members
                .iter()
                .any(|member| member.company_id == company_id && member.user_id == user_id))
    }
}

impl OfferRepository for MemoryStore {
    fn insert_offer(&self, offer: JobOffer) -> Result<JobOffer, RepositoryError> {
        let mut tables = self.lock();
        if !tables.companies.contains_key(&offer.company_id) {
            return Err(RepositoryError::NotFound);
        }
        tables.offers.insert(offer.id, offer.clone());
        Ok(offer)
    }

    fn update_offer(&self, offer: JobOffer) -> Result<(), RepositoryError> {
        let mut tables = self.lock();
        match tables.offers.get_mut(&offer.id) {
            Some(existing) => {
                *existing = offer;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch_offer(&self, id: JobOfferId) -> Result<Option<JobOffer>, RepositoryError> {
        Ok(self.lock().offers.get(&id).cloned())
    }

    fn search_offers(
        &self,
        query: &OfferQuery,
        page: PageRequest,
    ) -> Result<Page<OfferListing>, RepositoryError> {
        let tables = self.lock();
        let mut matching: Vec<&JobOffer> = tables
            .offers
            .values()
            .filter(|offer| query.matches(offer, &tables.offer_skills(offer)))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let listings = matching
            .into_iter()
            .map(|offer| tables.listing(offer, query))
            .collect();
        Ok(Page::paginate(listings, page))
    }

    fn offers_for_company(&self, company_id: CompanyId) -> Result<Vec<JobOffer>, RepositoryError> {
        let tables = self.lock();
        let mut offers: Vec<JobOffer> = tables
            .offers
            .values()
            .filter(|offer| offer.company_id == company_id && !offer.is_deleted())
            .cloned()
            .collect();
        offers.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(offers)
    }
}

impl ApplicationRepository for MemoryStore {
    fn insert_application(
        &self,
        application: Application,
    ) -> Result<Application, RepositoryError> {
        let mut tables = self.lock();
        let duplicate = tables.applications.values().any(|existing| {
            existing.is_live()
                && existing.talent_id == application.talent_id
                && existing.job_offer_id == application.job_offer_id
        });
        if application.is_live() && duplicate {
            return Err(RepositoryError::UniqueViolation {
                constraint: LIVE_APPLICATION_CONSTRAINT,
            });
        }
        tables.applications.insert(application.id, application.clone());
        Ok(application)
    }

    fn update_application(&self, application: Application) -> Result<(), RepositoryError> {
        let mut tables = self.lock();
        match tables.applications.get_mut(&application.id) {
            Some(existing) => {
                *existing = application;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch_application(&self, id: ApplicationId) -> Result<Option<Application>, RepositoryError> {
        Ok(self.lock().applications.get(&id).cloned())
    }

    fn live_application_for(
        &self,
        talent_id: TalentProfileId,
        job_offer_id: JobOfferId,
    ) -> Result<Option<Application>, RepositoryError> {
        Ok(self
            .lock()
            .applications
            .values()
            .find(|application| {
                application.is_live()
                    && application.talent_id == talent_id
                    && application.job_offer_id == job_offer_id
            })
            .cloned())
    }

    fn summarize(&self, id: ApplicationId) -> Result<Option<ApplicationSummary>, RepositoryError> {
        let tables = self.lock();
        Ok(tables
            .applications
            .get(&id)
            .map(|application| tables.summarize(application)))
    }

    fn search_applications(
        &self,
        query: &ApplicationQuery,
        page: PageRequest,
    ) -> Result<Page<ApplicationSummary>, RepositoryError> {
        let tables = self.lock();
        let mut matching: Vec<ApplicationSummary> = tables
            .applications
            .values()
            .map(|application| tables.summarize(application))
            .filter(|summary| query.matches(summary))
            .collect();
        matching.sort_by(|a, b| b.application.applied_at.cmp(&a.application.applied_at));
        Ok(Page::paginate(matching, page))
    }

    fn applications_for_company(
        &self,
        company_id: CompanyId,
    ) -> Result<Vec<ApplicationSummary>, RepositoryError> {
        let tables = self.lock();
        let mut summaries: Vec<ApplicationSummary> = tables
            .applications
            .values()
            .filter(|application| application.is_live() && application.company_id == company_id)
            .map(|application| tables.summarize(application))
            .collect();
        summaries.sort_by(|a, b| b.application.applied_at.cmp(&a.application.applied_at));
        Ok(summaries)
    }

    fn live_applications_for_talent(
        &self,
        talent_id: TalentProfileId,
    ) -> Result<Vec<Application>, RepositoryError> {
        Ok(self
            .lock()
            .applications
            .values()
            .filter(|application| application.is_live() && application.talent_id == talent_id)
            .cloned()
            .collect())
    }
}
