//! Access gates evaluated by the web boundary before it routes into a gated area.
//!
//! Each gate is a pure function of the identity and already-loaded state, so the boundary
//! decides what a [`GateDecision::Redirect`] or [`GateDecision::Deny`] looks like on the wire.

use tracing::debug;

use super::domain::{Actor, RoleName};
use crate::company::Company;
use crate::talent::{completion_score, TalentProfile};

pub const EMAIL_PENDING_PATH: &str = "/auth/register/success";
pub const TALENT_PROFILE_PATH: &str = "/talent/profile";
pub const COMPANY_SETUP_PATH: &str = "/recruiter/configuration";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    Deny(String),
    Redirect(&'static str),
}

impl GateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GateDecision::Allow)
    }

    /// Runs `next` only when this gate allows.
    pub fn and_then(self, next: impl FnOnce() -> GateDecision) -> GateDecision {
        match self {
            GateDecision::Allow => next(),
            other => other,
        }
    }
}

pub fn role_gate(actor: &Actor, allowed: &[RoleName]) -> GateDecision {
    if actor.has_any_role(allowed) {
        GateDecision::Allow
    } else {
        debug!(user_id = %actor.user_id, ?allowed, "role gate denied");
        GateDecision::Deny("you do not have access to this area".to_string())
    }
}

pub fn verified_email_gate(actor: &Actor) -> GateDecision {
    if actor.email_verified {
        GateDecision::Allow
    } else {
        GateDecision::Redirect(EMAIL_PENDING_PATH)
    }
}

/// Talents whose completion score is at or below `floor` must finish their profile first.
pub fn profile_completion_gate(
    actor: &Actor,
    profile: Option<&TalentProfile>,
    floor: u8,
) -> GateDecision {
    if !actor.has_role(RoleName::Talent) {
        return GateDecision::Allow;
    }
    match profile {
        Some(profile) if completion_score(Some(profile)).value() > floor => GateDecision::Allow,
        _ => GateDecision::Redirect(TALENT_PROFILE_PATH),
    }
}

pub fn company_setup_gate(actor: &Actor, company: Option<&Company>) -> GateDecision {
    if actor.has_role(RoleName::CompanyAdmin) && company.is_none() {
        GateDecision::Redirect(COMPANY_SETUP_PATH)
    } else {
        GateDecision::Allow
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::UserId;
    use crate::talent::{TalentProfile, TalentProfileId};
    use chrono::Utc;

    fn actor(roles: &[RoleName], verified: bool) -> Actor {
        Actor {
            user_id: UserId::new(),
            email: "grace@example.com".to_string(),
            roles: roles.iter().copied().collect(),
            email_verified: verified,
        }
    }

    fn contact_only_profile(actor: &Actor) -> TalentProfile {
        let mut profile = TalentProfile::empty(TalentProfileId::new(), actor.user_id, Utc::now());
        profile.phone = Some("+221 77 000 00 00".to_string());
        profile.bio = Some("Backend engineer".to_string());
        profile.location = Some("Dakar".to_string());
        profile.cv_url = Some("cvs/grace.pdf".to_string());
        profile
    }

    #[test]
    fn empty_allow_list_denies_everyone() {
        let admin = actor(&[RoleName::SuperAdmin], true);
        assert!(matches!(role_gate(&admin, &[]), GateDecision::Deny(_)));
        assert!(role_gate(&admin, &[RoleName::Admin, RoleName::SuperAdmin]).is_allowed());
    }

    #[test]
    fn unverified_users_are_redirected() {
        let talent = actor(&[RoleName::Talent], false);
        assert_eq!(
            verified_email_gate(&talent),
            GateDecision::Redirect(EMAIL_PENDING_PATH)
        );
    }

    #[test]
    fn score_at_floor_is_redirected() {
        let talent = actor(&[RoleName::Talent], true);
        let profile = contact_only_profile(&talent);

        assert_eq!(
            profile_completion_gate(&talent, Some(&profile), 25),
            GateDecision::Redirect(TALENT_PROFILE_PATH)
        );
        assert!(profile_completion_gate(&talent, Some(&profile), 0).is_allowed());
        assert_eq!(
            profile_completion_gate(&talent, None, 0),
            GateDecision::Redirect(TALENT_PROFILE_PATH)
        );
    }

    #[test]
    fn recruiters_skip_profile_gate() {
        let recruiter = actor(&[RoleName::Recruiter], true);
        assert!(profile_completion_gate(&recruiter, None, 25).is_allowed());
    }

    #[test]
    fn company_admin_without_company_goes_to_setup() {
        let admin = actor(&[RoleName::CompanyAdmin], true);
        assert_eq!(
            company_setup_gate(&admin, None),
            GateDecision::Redirect(COMPANY_SETUP_PATH)
        );
        let recruiter = actor(&[RoleName::Recruiter], true);
        assert!(company_setup_gate(&recruiter, None).is_allowed());
    }

    #[test]
    fn gates_chain_until_first_refusal() {
        let talent = actor(&[RoleName::Talent], false);
        let decision = role_gate(&talent, &[RoleName::Talent])
            .and_then(|| verified_email_gate(&talent))
            .and_then(|| profile_completion_gate(&talent, None, 25));
        assert_eq!(decision, GateDecision::Redirect(EMAIL_PENDING_PATH));
    }
}
