use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::documents::DocumentUpload;
use crate::error::ServiceError;
use crate::identity::UserId;
use crate::ids::entity_id;

entity_id!(
    /// Identifier of a talent profile (distinct from the owning user id).
    TalentProfileId
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SkillId(pub u32);

/// Shared reference data attached to profiles and offers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub id: SkillId,
    pub name: String,
    pub category: String,
}

/// Self-assessed proficiency, 1 (beginner) to 3 (expert).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct SkillLevel(u8);

impl SkillLevel {
    pub const BEGINNER: SkillLevel = SkillLevel(1);

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for SkillLevel {
    fn default() -> Self {
        Self::BEGINNER
    }
}

impl TryFrom<u8> for SkillLevel {
    type Error = ServiceError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (1..=3).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ServiceError::Validation(format!(
                "skill level must be between 1 and 3, got {value}"
            )))
        }
    }
}

impl From<SkillLevel> for u8 {
    fn from(level: SkillLevel) -> Self {
        level.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TalentSkill {
    pub skill_id: SkillId,
    pub level: SkillLevel,
    pub is_validated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TalentExperience {
    pub job_title: String,
    pub company_name: String,
    pub location: Option<String>,
    pub start_at: NaiveDate,
    pub end_at: Option<NaiveDate>,
    pub is_current: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TalentEducation {
    pub institution: String,
    pub degree: String,
    pub description: Option<String>,
    pub start_at: NaiveDate,
    pub end_at: Option<NaiveDate>,
    pub is_current: bool,
}

/// Aggregate root owning skills, experiences and educations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TalentProfile {
    pub id: TalentProfileId,
    pub user_id: UserId,
    pub title: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub is_available: bool,
    pub cv_url: Option<String>,
    pub linkedin_url: Option<String>,
    pub github_url: Option<String>,
    pub skills: Vec<TalentSkill>,
    pub experiences: Vec<TalentExperience>,
    pub educations: Vec<TalentEducation>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TalentProfile {
    pub fn empty(id: TalentProfileId, user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id,
            title: None,
            phone: None,
            bio: None,
            location: None,
            is_available: true,
            cv_url: None,
            linkedin_url: None,
            github_url: None,
            skills: Vec::new(),
            experiences: Vec::new(),
            educations: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn skill_ids(&self) -> Vec<SkillId> {
        self.skills.iter().map(|skill| skill.skill_id).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillSelection {
    pub skill_id: SkillId,
    #[serde(default)]
    pub level: Option<u8>,
}

/// First save of a profile.
#[derive(Debug, Clone, Default)]
pub struct ProfileDraft {
    pub title: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub is_available: Option<bool>,
    pub linkedin_url: Option<String>,
    pub github_url: Option<String>,
    pub skills: Vec<SkillSelection>,
    pub cv: Option<DocumentUpload>,
}

/// Partial update; `None` leaves a field untouched, `Some("")` clears it.
#[derive(Debug, Clone, Default)]
pub struct ProfilePatch {
    pub title: Option<String>,
    pub phone: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub is_available: Option<bool>,
    pub linkedin_url: Option<String>,
    pub github_url: Option<String>,
    pub skills: Option<Vec<SkillSelection>>,
    pub cv: Option<DocumentUpload>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExperienceDraft {
    pub job_title: String,
    pub company_name: String,
    #[serde(default)]
    pub location: Option<String>,
    pub start_at: NaiveDate,
    #[serde(default)]
    pub end_at: Option<NaiveDate>,
    #[serde(default)]
    pub is_current: bool,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EducationDraft {
    pub institution: String,
    pub degree: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start_at: NaiveDate,
    #[serde(default)]
    pub end_at: Option<NaiveDate>,
    #[serde(default)]
    pub is_current: bool,
}

/// Trims a submitted text field; blank input is stored as absent.
pub(crate) fn normalize_text(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

pub(crate) fn validate_period(
    start_at: NaiveDate,
    end_at: Option<NaiveDate>,
    is_current: bool,
) -> Result<Option<NaiveDate>, ServiceError> {
    if is_current {
        return Ok(None);
    }
    match end_at {
        Some(end) if end < start_at => Err(ServiceError::Validation(
            "end date cannot be before start date".to_string(),
        )),
        other => Ok(other),
    }
}
