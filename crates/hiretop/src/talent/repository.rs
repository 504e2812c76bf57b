use super::domain::{Skill, SkillId, TalentProfile, TalentProfileId};
use crate::error::RepositoryError;
use crate::identity::UserId;

/// Unique index on `talent_profiles.user_id`.
pub const TALENT_PROFILE_USER_CONSTRAINT: &str = "talent_profiles_user_id_key";

pub trait TalentRepository: Send + Sync {
    /// Fails with [`RepositoryError::UniqueViolation`] when the user already owns a profile.
    fn insert_profile(&self, profile: TalentProfile) -> Result<TalentProfile, RepositoryError>;
    fn update_profile(&self, profile: TalentProfile) -> Result<(), RepositoryError>;
    fn fetch_profile(&self, id: TalentProfileId) -> Result<Option<TalentProfile>, RepositoryError>;
    fn profile_for_user(&self, user_id: UserId) -> Result<Option<TalentProfile>, RepositoryError>;
}

pub trait SkillRepository: Send + Sync {
    fn all_skills(&self) -> Result<Vec<Skill>, RepositoryError>;
    /// Returns the skills that exist among `ids`, in id order.
    fn fetch_skills(&self, ids: &[SkillId]) -> Result<Vec<Skill>, RepositoryError>;
}
