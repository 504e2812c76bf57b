use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::info;

use super::completion::{completion_score, CompletionScore};
use super::domain::{
    normalize_text, validate_period, EducationDraft, ExperienceDraft, ProfileDraft, ProfilePatch,
    SkillId, SkillLevel, SkillSelection, TalentEducation, TalentExperience, TalentProfile,
    TalentProfileId, TalentSkill,
};
use super::repository::{SkillRepository, TalentRepository};
use crate::clock::{Clock, SystemClock};
use crate::documents::{discard, store_upload, BlobStore, CV_FOLDER};
use crate::error::{RepositoryError, ServiceError};
use crate::identity::{Actor, RoleName};

/// Profile management for talents.
pub struct TalentService<S, B> {
    store: Arc<S>,
    blobs: Arc<B>,
    clock: Arc<dyn Clock>,
}

impl<S, B> TalentService<S, B>
where
    S: TalentRepository + SkillRepository + 'static,
    B: BlobStore + 'static,
{
    pub fn new(store: Arc<S>, blobs: Arc<B>) -> Self {
        Self::with_clock(store, blobs, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<S>, blobs: Arc<B>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            blobs,
            clock,
        }
    }

    pub fn profile_for(&self, actor: &Actor) -> Result<Option<TalentProfile>, ServiceError> {
        Ok(self.store.profile_for_user(actor.user_id)?)
    }

    pub fn completion(&self, actor: &Actor) -> Result<CompletionScore, ServiceError> {
        let profile = self.profile_for(actor)?;
        Ok(completion_score(profile.as_ref()))
    }

    pub fn create_profile(
        &self,
        actor: &Actor,
        draft: ProfileDraft,
    ) -> Result<TalentProfile, ServiceError> {
        actor.require_role(RoleName::Talent)?;
        if self.store.profile_for_user(actor.user_id)?.is_some() {
            return Err(profile_exists());
        }

        let skills = self.resolve_skills(&draft.skills)?;
        let now = self.clock.now();
        let mut profile = TalentProfile::empty(TalentProfileId::new(), actor.user_id, now);
        profile.title = normalize_text(draft.title);
        profile.phone = normalize_text(draft.phone);
        profile.bio = normalize_text(draft.bio);
        profile.location = normalize_text(draft.location);
        profile.linkedin_url = normalize_text(draft.linkedin_url);
        profile.github_url = normalize_text(draft.github_url);
        profile.is_available = draft.is_available.unwrap_or(true);
        profile.skills = skills;
        if let Some(cv) = &draft.cv {
            profile.cv_url = Some(store_upload(self.blobs.as_ref(), CV_FOLDER, cv)?);
        }

        match self.store.insert_profile(profile.clone()) {
            Ok(stored) => {
                info!(profile_id = %stored.id, user_id = %actor.user_id, "talent profile created");
                Ok(stored)
            }
            Err(err) => {
                if let Some(locator) = &profile.cv_url {
                    discard(self.blobs.as_ref(), locator);
                }
                Err(match err {
                    RepositoryError::UniqueViolation { .. } => profile_exists(),
                    other => other.into(),
                })
            }
        }
    }

    pub fn update_profile(
        &self,
        actor: &Actor,
        profile_id: TalentProfileId,
        patch: ProfilePatch,
    ) -> Result<TalentProfile, ServiceError> {
        let mut profile = self.owned_profile(actor, profile_id)?;

        if let Some(selections) = &patch.skills {
            profile.skills = self.resolve_skills(selections)?;
        }
        merge_text(&mut profile.title, patch.title);
        merge_text(&mut profile.phone, patch.phone);
        merge_text(&mut profile.bio, patch.bio);
        merge_text(&mut profile.location, patch.location);
        merge_text(&mut profile.linkedin_url, patch.linkedin_url);
        merge_text(&mut profile.github_url, patch.github_url);
        if let Some(is_available) = patch.is_available {
            profile.is_available = is_available;
        }
        if let Some(cv) = &patch.cv {
            profile.cv_url = Some(store_upload(self.blobs.as_ref(), CV_FOLDER, cv)?);
        }
        profile.updated_at = self.clock.now();

        self.store.update_profile(profile.clone())?;
        Ok(profile)
    }

    pub fn add_experience(
        &self,
        actor: &Actor,
        draft: ExperienceDraft,
    ) -> Result<TalentProfile, ServiceError> {
        let mut profile = self.own_profile(actor)?;
        let job_title = required(&draft.job_title, "job title")?;
        let company_name = required(&draft.company_name, "company name")?;
        let end_at = validate_period(draft.start_at, draft.end_at, draft.is_current)?;

        profile.experiences.push(TalentExperience {
            job_title,
            company_name,
            location: normalize_text(draft.location),
            start_at: draft.start_at,
            end_at,
            is_current: draft.is_current,
            description: normalize_text(draft.description),
        });
        profile.updated_at = self.clock.now();
        self.store.update_profile(profile.clone())?;
        Ok(profile)
    }

    pub fn add_education(
        &self,
        actor: &Actor,
        draft: EducationDraft,
    ) -> Result<TalentProfile, ServiceError> {
        let mut profile = self.own_profile(actor)?;
        let institution = required(&draft.institution, "institution")?;
        let degree = required(&draft.degree, "degree")?;
        let end_at = validate_period(draft.start_at, draft.end_at, draft.is_current)?;

        profile.educations.push(TalentEducation {
            institution,
            degree,
            description: normalize_text(draft.description),
            start_at: draft.start_at,
            end_at,
            is_current: draft.is_current,
        });
        profile.updated_at = self.clock.now();
        self.store.update_profile(profile.clone())?;
        Ok(profile)
    }

    fn own_profile(&self, actor: &Actor) -> Result<TalentProfile, ServiceError> {
        self.store.profile_for_user(actor.user_id)?.ok_or_else(|| {
            ServiceError::Validation("create your talent profile first".to_string())
        })
    }

    fn owned_profile(
        &self,
        actor: &Actor,
        profile_id: TalentProfileId,
    ) -> Result<TalentProfile, ServiceError> {
        let profile = self
            .store
            .fetch_profile(profile_id)?
            .ok_or_else(|| ServiceError::not_found("talent profile"))?;
        if profile.user_id != actor.user_id {
            return Err(ServiceError::forbidden());
        }
        Ok(profile)
    }

    fn resolve_skills(
        &self,
        selections: &[SkillSelection],
    ) -> Result<Vec<TalentSkill>, ServiceError> {
        let mut seen = BTreeSet::new();
        let mut skills = Vec::with_capacity(selections.len());
        for selection in selections {
            if !seen.insert(selection.skill_id) {
                continue;
            }
            let level = match selection.level {
                Some(level) => SkillLevel::try_from(level)?,
                None => SkillLevel::default(),
            };
            skills.push(TalentSkill {
                skill_id: selection.skill_id,
                level,
                is_validated: false,
            });
        }

        let ids: Vec<SkillId> = seen.into_iter().collect();
        ensure_skills_exist(self.store.as_ref(), &ids)?;
        Ok(skills)
    }
}

/// Fails with `Validation` unless every id is in the catalog.
pub(crate) fn ensure_skills_exist<S>(store: &S, ids: &[SkillId]) -> Result<(), ServiceError>
where
    S: SkillRepository + ?Sized,
{
    let mut unique = ids.to_vec();
    unique.sort();
    unique.dedup();
    if unique.is_empty() {
        return Ok(());
    }
    let known = store.fetch_skills(&unique)?;
    if known.len() != unique.len() {
        return Err(ServiceError::Validation(
            "one or more selected skills do not exist".to_string(),
        ));
    }
    Ok(())
}

fn merge_text(field: &mut Option<String>, value: Option<String>) {
    if value.is_some() {
        *field = normalize_text(value);
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

fn profile_exists() -> ServiceError {
    ServiceError::Conflict("a talent profile already exists for this account".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::{DocumentUpload, MemoryBlobStore};
    use crate::identity::UserId;
    use crate::store::MemoryStore;
    use crate::talent::SkillCatalog;
    use chrono::NaiveDate;

    fn service() -> (TalentService<MemoryStore, MemoryBlobStore>, Arc<MemoryBlobStore>) {
        let blobs = Arc::new(MemoryBlobStore::default());
        let store = Arc::new(MemoryStore::with_skills(SkillCatalog::standard()));
        (TalentService::new(store, blobs.clone()), blobs)
    }

    fn actor(role: RoleName) -> Actor {
        Actor {
            user_id: UserId::new(),
            email: "awa@example.com".to_string(),
            roles: [role].into_iter().collect(),
            email_verified: true,
        }
    }

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    #[test]
    fn only_talents_create_one_profile_each() {
        let (talent_service, _) = service();
        match talent_service.create_profile(&actor(RoleName::Recruiter), ProfileDraft::default()) {
            Err(ServiceError::Authorization(_)) => {}
            other => panic!("expected authorization error, got {other:?}"),
        }

        let talent = actor(RoleName::Talent);
        talent_service
            .create_profile(&talent, ProfileDraft::default())
            .expect("first profile");
        match talent_service.create_profile(&talent, ProfileDraft::default()) {
            Err(ServiceError::Conflict(_)) => {}
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn unknown_skills_are_rejected_and_duplicates_collapse() {
        let (talent_service, _) = service();
        let talent = actor(RoleName::Talent);
        let unknown = ProfileDraft {
            skills: vec![SkillSelection {
                skill_id: SkillId(9_999),
                level: None,
            }],
            ..ProfileDraft::default()
        };
        assert!(matches!(
            talent_service.create_profile(&talent, unknown),
            Err(ServiceError::Validation(_))
        ));

        let repeated = ProfileDraft {
            skills: vec![
                SkillSelection {
                    skill_id: SkillId(1),
                    level: Some(3),
                },
                SkillSelection {
                    skill_id: SkillId(1),
                    level: Some(1),
                },
            ],
            ..ProfileDraft::default()
        };
        let profile = talent_service
            .create_profile(&talent, repeated)
            .expect("profile");
        assert_eq!(profile.skills.len(), 1);
        assert_eq!(profile.skills[0].level.value(), 3);
    }

    #[test]
    fn completion_grows_bucket_by_bucket() {
        let (talent_service, blobs) = service();
        let talent = actor(RoleName::Talent);
        assert_eq!(talent_service.completion(&talent).expect("score").value(), 0);

        let profile = talent_service
            .create_profile(
                &talent,
                ProfileDraft {
                    phone: Some("+221 70 123 45 67".to_string()),
                    bio: Some("Designer".to_string()),
                    location: Some("Dakar".to_string()),
                    cv: Some(DocumentUpload::pdf("cv.pdf", b"%PDF".to_vec())),
                    ..ProfileDraft::default()
                },
            )
            .expect("profile");
        assert_eq!(blobs.len(), 1);
        assert!(profile.cv_url.as_deref().is_some_and(|url| url.starts_with("cvs/")));
        assert_eq!(talent_service.completion(&talent).expect("score").value(), 25);

        talent_service
            .add_education(
                &talent,
                EducationDraft {
                    institution: "UCAD".to_string(),
                    degree: "Licence".to_string(),
                    description: None,
                    start_at: date(2016, 10, 1),
                    end_at: Some(date(2019, 7, 1)),
                    is_current: false,
                },
            )
            .expect("education");
        assert_eq!(talent_service.completion(&talent).expect("score").value(), 50);

        let profile = talent_service
            .add_experience(
                &talent,
                ExperienceDraft {
                    job_title: "Designer".to_string(),
                    company_name: "Studio".to_string(),
                    location: None,
                    start_at: date(2020, 1, 1),
                    end_at: Some(date(2024, 1, 1)),
                    is_current: true,
                    description: None,
                },
            )
            .expect("experience");
        assert_eq!(profile.experiences[0].end_at, None);
        assert_eq!(talent_service.completion(&talent).expect("score").value(), 75);
    }

    #[test]
    fn inverted_periods_are_rejected() {
        let (talent_service, _) = service();
        let talent = actor(RoleName::Talent);
        talent_service
            .create_profile(&talent, ProfileDraft::default())
            .expect("profile");
        let result = talent_service.add_education(
            &talent,
            EducationDraft {
                institution: "UCAD".to_string(),
                degree: "Master".to_string(),
                description: None,
                start_at: date(2020, 10, 1),
                end_at: Some(date(2019, 7, 1)),
                is_current: false,
            },
        );
        assert!(matches!(result, Err(ServiceError::Validation(_))));
    }

    #[test]
    fn only_the_owner_updates_a_profile() {
        let (talent_service, _) = service();
        let owner = actor(RoleName::Talent);
        let profile = talent_service
            .create_profile(&owner, ProfileDraft::default())
            .expect("profile");

        let patch = ProfilePatch {
            bio: Some("  ".to_string()),
            title: Some("Lead designer".to_string()),
            ..ProfilePatch::default()
        };
        match talent_service.update_profile(&actor(RoleName::Talent), profile.id, patch.clone()) {
            Err(ServiceError::Authorization(_)) => {}
            other => panic!("expected authorization error, got {other:?}"),
        }

        let updated = talent_service
            .update_profile(&owner, profile.id, patch)
            .expect("updated");
        assert_eq!(updated.title.as_deref(), Some("Lead designer"));
        assert_eq!(updated.bio, None);
    }
}
