//! Talent profiles, their completion score and the skill catalog.

pub mod completion;
pub mod domain;
pub mod repository;
pub mod service;
pub mod skills;

pub use completion::{completion_score, CompletionBreakdown, CompletionScore};
pub use domain::{
    EducationDraft, ExperienceDraft, ProfileDraft, ProfilePatch, Skill, SkillId, SkillLevel,
    SkillSelection, TalentEducation, TalentExperience, TalentProfile, TalentProfileId,
    TalentSkill,
};
pub use repository::{SkillRepository, TalentRepository, TALENT_PROFILE_USER_CONSTRAINT};
pub use service::TalentService;
pub use skills::SkillCatalog;
