use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::company::CompanyId;
use crate::error::ServiceError;
use crate::ids::entity_id;
use crate::talent::{Skill, SkillId};

entity_id!(JobOfferId);

pub const DEFAULT_SALARY_CURRENCY: &str = "XOF";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ContractType {
    Cdi,
    Cdd,
    Freelance,
    #[default]
    Internship,
}

impl ContractType {
    pub const fn label(self) -> &'static str {
        match self {
            ContractType::Cdi => "CDI",
            ContractType::Cdd => "CDD",
            ContractType::Freelance => "FREELANCE",
            ContractType::Internship => "INTERNSHIP",
        }
    }
}

impl FromStr for ContractType {
    type Err = ServiceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "CDI" => Ok(ContractType::Cdi),
            "CDD" => Ok(ContractType::Cdd),
            "FREELANCE" => Ok(ContractType::Freelance),
            "INTERNSHIP" => Ok(ContractType::Internship),
            other => Err(ServiceError::Validation(format!(
                "unknown contract type `{other}`"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RemoteType {
    #[default]
    #[serde(rename = "ON-SITE")]
    OnSite,
    #[serde(rename = "HYBRID")]
    Hybrid,
    #[serde(rename = "REMOTE")]
    Remote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OfferStatus {
    Draft,
    Published,
    Expired,
    Closed,
}

impl OfferStatus {
    pub const fn label(self) -> &'static str {
        match self {
            OfferStatus::Draft => "DRAFT",
            OfferStatus::Published => "PUBLISHED",
            OfferStatus::Expired => "EXPIRED",
            OfferStatus::Closed => "CLOSED",
        }
    }
}

impl fmt::Display for OfferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobOffer {
    pub id: JobOfferId,
    pub company_id: CompanyId,
    pub title: String,
    pub description: String,
    pub location: Option<String>,
    pub remote_type: RemoteType,
    pub contract_type: ContractType,
    /// Stored status. Use [`JobOffer::effective_status`] for anything time-sensitive.
    pub status: OfferStatus,
    pub skill_ids: Vec<SkillId>,
    pub salary_min: Option<u32>,
    pub salary_max: Option<u32>,
    pub salary_currency: String,
    pub salary_visible: bool,
    pub is_urgent: bool,
    pub is_active: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub expire_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl JobOffer {
    /// A published offer past its `expire_at` reads as expired.
    pub fn effective_status(&self, now: DateTime<Utc>) -> OfferStatus {
        match self.status {
            OfferStatus::Published if self.expire_at <= now => OfferStatus::Expired,
            status => status,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Accepting applications right now.
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.effective_status(now) == OfferStatus::Published && self.is_active && !self.is_deleted()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct OfferDraft {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub remote_type: Option<RemoteType>,
    #[serde(default)]
    pub contract_type: Option<ContractType>,
    #[serde(default)]
    pub skill_ids: Vec<SkillId>,
    #[serde(default)]
    pub salary_min: Option<u32>,
    #[serde(default)]
    pub salary_max: Option<u32>,
    #[serde(default)]
    pub salary_currency: Option<String>,
    #[serde(default)]
    pub salary_visible: Option<bool>,
    #[serde(default)]
    pub is_urgent: bool,
    #[serde(default)]
    pub expire_at: Option<DateTime<Utc>>,
}

/// Partial update. Only provided fields change; `skill_ids` replaces the whole set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct OfferPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub remote_type: Option<RemoteType>,
    pub contract_type: Option<ContractType>,
    pub skill_ids: Option<Vec<SkillId>>,
    pub salary_min: Option<u32>,
    pub salary_max: Option<u32>,
    pub salary_currency: Option<String>,
    pub salary_visible: Option<bool>,
    pub is_urgent: Option<bool>,
    pub expire_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct OfferFilters {
    pub search: Option<String>,
    pub contract_type: Option<ContractType>,
    pub location: Option<String>,
    /// Any-of match on skill names.
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferScope {
    /// Talent-facing board: open offers only.
    Published,
    /// Recruiter view: every non-deleted offer of the company.
    Company(CompanyId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferQuery {
    pub scope: OfferScope,
    pub filters: OfferFilters,
    pub now: DateTime<Utc>,
}

impl OfferQuery {
    pub fn matches(&self, offer: &JobOffer, skills: &[Skill]) -> bool {
        if offer.is_deleted() {
            return false;
        }
        let in_scope = match self.scope {
            OfferScope::Published => offer.is_open(self.now),
            OfferScope::Company(company_id) => offer.company_id == company_id,
        };
        if !in_scope {
            return false;
        }

        let filters = &self.filters;
        if let Some(term) = non_blank(&filters.search) {
            let term = term.to_lowercase();
            if !offer.title.to_lowercase().contains(&term)
                && !offer.description.to_lowercase().contains(&term)
            {
                return false;
            }
        }
        if let Some(contract_type) = filters.contract_type {
            if offer.contract_type != contract_type {
                return false;
            }
        }
        if let Some(location) = non_blank(&filters.location) {
            let location = location.to_lowercase();
            let matches = offer
                .location
                .as_deref()
                .map(|value| value.to_lowercase().contains(&location))
                .unwrap_or(false);
            if !matches {
                return false;
            }
        }
        let wanted: Vec<&str> = filters
            .skills
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .collect();
        if !wanted.is_empty()
            && !skills
                .iter()
                .any(|skill| wanted.iter().any(|name| skill.name.eq_ignore_ascii_case(name)))
        {
            return false;
        }
        true
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Offer with the joined data listings display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OfferListing {
    pub offer: JobOffer,
    pub status: OfferStatus,
    pub company_name: String,
    pub skills: Vec<Skill>,
    pub applications_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenOffer {
    pub id: JobOfferId,
    pub title: String,
}
