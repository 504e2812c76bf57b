use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::company::CompanyId;
use crate::documents::DocumentUpload;
use crate::error::ServiceError;
use crate::identity::{Actor, UserId};
use crate::ids::entity_id;
use crate::notify::NotificationResult;
use crate::offers::JobOfferId;
use crate::talent::TalentProfileId;

entity_id!(ApplicationId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ApplicationStatus {
    Pending,
    Reviewed,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "PENDING",
            ApplicationStatus::Reviewed => "REVIEWED",
            ApplicationStatus::Accepted => "ACCEPTED",
            ApplicationStatus::Rejected => "REJECTED",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, ApplicationStatus::Accepted | ApplicationStatus::Rejected)
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ApplicationStatus {
    type Err = ServiceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(ApplicationStatus::Pending),
            "REVIEWED" => Ok(ApplicationStatus::Reviewed),
            "ACCEPTED" => Ok(ApplicationStatus::Accepted),
            "REJECTED" => Ok(ApplicationStatus::Rejected),
            other => Err(ServiceError::Validation(format!(
                "unknown application status `{other}`"
            ))),
        }
    }
}

/// Which company-side status changes are allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionPolicy {
    /// Any status may be set from any status, including reopening a decision.
    #[default]
    Permissive,
    /// Only the review workflow edges: PENDING → REVIEWED → ACCEPTED, PENDING | REVIEWED → REJECTED.
    Strict,
}

impl TransitionPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "permissive" => Some(Self::Permissive),
            "strict" => Some(Self::Strict),
            _ => None,
        }
    }

    pub fn allows(self, from: ApplicationStatus, to: ApplicationStatus) -> bool {
        use ApplicationStatus::*;
        match self {
            TransitionPolicy::Permissive => true,
            TransitionPolicy::Strict => matches!(
                (from, to),
                (Pending, Reviewed) | (Reviewed, Accepted) | (Pending | Reviewed, Rejected)
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub talent_id: TalentProfileId,
    pub job_offer_id: JobOfferId,
    /// Copied from the offer when the application is created.
    pub company_id: CompanyId,
    pub message: Option<String>,
    pub document_url: Option<String>,
    pub status: ApplicationStatus,
    pub disponible_at: Option<NaiveDate>,
    pub applied_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Application {
    pub fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// Talent submission for an offer.
#[derive(Debug, Clone, Default)]
pub struct ApplyRequest {
    pub message: Option<String>,
    pub use_profile_cv: bool,
    pub document: Option<DocumentUpload>,
    /// Earliest availability, `YYYY-MM-DD` or RFC 3339.
    pub disponibility: Option<String>,
}

/// Talent-side edit. Status is only changed by the company side.
#[derive(Debug, Clone, Default)]
pub struct ApplicationUpdate {
    pub message: Option<String>,
    pub use_profile_cv: Option<bool>,
    pub document: Option<DocumentUpload>,
    pub disponibility: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusChange {
    pub application: Application,
    /// Present only when the change triggered a notification.
    pub notification: Option<NotificationResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct ApplicationFilters {
    pub search: Option<String>,
    pub status: Option<ApplicationStatus>,
    pub job_offer_id: Option<JobOfferId>,
}

/// Who a listing is for. The two views never mix.
#[derive(Debug, Clone, Copy)]
pub enum ApplicationScope<'a> {
    Company(CompanyId),
    Talent(&'a Actor),
}

/// Resolved listing scope handed to the repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKey {
    Company(CompanyId),
    Talent(TalentProfileId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationQuery {
    pub scope: ScopeKey,
    pub filters: ApplicationFilters,
}

impl ApplicationQuery {
    pub fn matches(&self, summary: &ApplicationSummary) -> bool {
        let application = &summary.application;
        if !application.is_live() {
            return false;
        }
        let in_scope = match self.scope {
            ScopeKey::Company(company_id) => application.company_id == company_id,
            ScopeKey::Talent(talent_id) => application.talent_id == talent_id,
        };
        if !in_scope {
            return false;
        }
        if let Some(status) = self.filters.status {
            if application.status != status {
                return false;
            }
        }
        if let Some(job_offer_id) = self.filters.job_offer_id {
            if application.job_offer_id != job_offer_id {
                return false;
            }
        }

        let term = match self.filters.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => term.to_lowercase(),
            _ => return true,
        };
        let haystacks: [&str; 2] = match self.scope {
            ScopeKey::Company(_) => [&summary.talent_first_name, &summary.talent_last_name],
            ScopeKey::Talent(_) => [&summary.job_title, &summary.company_name],
        };
        haystacks
            .iter()
            .any(|value| value.to_lowercase().contains(&term))
    }
}

/// Application joined with the names listings display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationSummary {
    pub application: Application,
    pub talent_user_id: UserId,
    pub talent_first_name: String,
    pub talent_last_name: String,
    pub talent_email: String,
    pub job_title: String,
    pub company_name: String,
}

/// Accepts a plain date or an RFC 3339 timestamp. A timestamp keeps the calendar day of
/// its own offset.
pub fn parse_disponibility(raw: &str) -> Result<NaiveDate, ServiceError> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|datetime| datetime.date_naive())
        .map_err(|_| {
            ServiceError::Validation(format!(
                "availability date `{raw}` must be an ISO date (YYYY-MM-DD)"
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ApplicationStatus::*;

    const ALL: [ApplicationStatus; 4] = [Pending, Reviewed, Accepted, Rejected];

    #[test]
    fn permissive_policy_allows_every_pair() {
        for from in ALL {
            for to in ALL {
                assert!(TransitionPolicy::Permissive.allows(from, to));
            }
        }
    }

    #[test]
    fn strict_policy_follows_review_workflow() {
        let allowed = [
            (Pending, Reviewed),
            (Reviewed, Accepted),
            (Pending, Rejected),
            (Reviewed, Rejected),
        ];
        for from in ALL {
            for to in ALL {
                assert_eq!(
                    TransitionPolicy::Strict.allows(from, to),
                    allowed.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
        assert!(Accepted.is_terminal() && Rejected.is_terminal());
    }

    #[test]
    fn parses_policy_and_status_case_insensitively() {
        assert_eq!(TransitionPolicy::parse(" STRICT "), Some(TransitionPolicy::Strict));
        assert_eq!(TransitionPolicy::parse("lenient"), None);
        assert_eq!("accepted".parse::<ApplicationStatus>().expect("parses"), Accepted);
        assert!("HIRED".parse::<ApplicationStatus>().is_err());
    }

    #[test]
    fn disponibility_accepts_dates_and_timestamps() {
        let expected = NaiveDate::from_ymd_opt(2025, 9, 1).expect("valid");
        assert_eq!(parse_disponibility("2025-09-01").expect("date"), expected);
        assert_eq!(
            parse_disponibility("2025-09-01T08:30:00Z").expect("timestamp"),
            expected
        );
        assert_eq!(
            parse_disponibility("2025-09-01T00:30:00+02:00").expect("offset timestamp"),
            expected
        );
        assert_eq!(
            parse_disponibility("2025-08-31T23:00:00-05:00").expect("negative offset"),
            NaiveDate::from_ymd_opt(2025, 8, 31).expect("valid")
        );
        assert!(matches!(
            parse_disponibility("next monday"),
            Err(ServiceError::Validation(_))
        ));
    }
}
