use serde::Serialize;

use super::domain::TalentProfile;

pub const BUCKET_WEIGHT: u8 = 25;

/// Profile completion in steps of 25, from 0 to 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CompletionScore(u8);

impl CompletionScore {
    pub fn value(self) -> u8 {
        self.0
    }

    pub fn is_complete(self) -> bool {
        self.0 == 100
    }
}

/// Which of the four buckets a profile satisfies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CompletionBreakdown {
    pub contact: bool,
    pub skills: bool,
    pub education: bool,
    pub experience: bool,
}

impl CompletionBreakdown {
    pub fn of(profile: &TalentProfile) -> Self {
        let filled = |field: &Option<String>| {
            field
                .as_deref()
                .map(|value| !value.trim().is_empty())
                .unwrap_or(false)
        };

        Self {
            contact: filled(&profile.phone)
                && filled(&profile.bio)
                && filled(&profile.location)
                && filled(&profile.cv_url),
            skills: !profile.skills.is_empty(),
            education: !profile.educations.is_empty(),
            experience: !profile.experiences.is_empty(),
        }
    }

    pub fn score(self) -> CompletionScore {
        let buckets = [self.contact, self.skills, self.education, self.experience];
        let filled = buckets.iter().filter(|bucket| **bucket).count() as u8;
        CompletionScore(filled * BUCKET_WEIGHT)
    }
}

pub fn completion_score(profile: Option<&TalentProfile>) -> CompletionScore {
    match profile {
        Some(profile) => CompletionBreakdown::of(profile).score(),
        None => CompletionScore(0),
    }
}
