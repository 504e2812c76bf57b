use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;
use crate::ids::entity_id;

entity_id!(
    /// Identifier of a registered account.
    UserId
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoleName {
    Talent,
    Recruiter,
    CompanyAdmin,
    Admin,
    SuperAdmin,
}

impl RoleName {
    pub const fn label(self) -> &'static str {
        match self {
            RoleName::Talent => "TALENT",
            RoleName::Recruiter => "RECRUITER",
            RoleName::CompanyAdmin => "COMPANY_ADMIN",
            RoleName::Admin => "ADMIN",
            RoleName::SuperAdmin => "SUPER_ADMIN",
        }
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RoleName {
    type Err = ServiceError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "TALENT" => Ok(RoleName::Talent),
            "RECRUITER" => Ok(RoleName::Recruiter),
            "COMPANY_ADMIN" => Ok(RoleName::CompanyAdmin),
            "ADMIN" => Ok(RoleName::Admin),
            "SUPER_ADMIN" => Ok(RoleName::SuperAdmin),
            other => Err(ServiceError::Validation(format!("unknown role `{other}`"))),
        }
    }
}

/// Stored account. The password hash never leaves the crate in API payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub roles: BTreeSet<RoleName>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    pub fn is_verified(&self) -> bool {
        self.email_verified_at.is_some()
    }
}

/// Authenticated identity supplied by the session boundary for one operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Actor {
    pub user_id: UserId,
    pub email: String,
    pub roles: BTreeSet<RoleName>,
    pub email_verified: bool,
}

impl Actor {
    pub fn has_role(&self, role: RoleName) -> bool {
        self.roles.contains(&role)
    }

    pub fn has_any_role(&self, roles: &[RoleName]) -> bool {
        roles.iter().any(|role| self.roles.contains(role))
    }

    pub fn require_role(&self, role: RoleName) -> Result<(), ServiceError> {
        if self.has_role(role) {
            Ok(())
        } else {
            Err(ServiceError::Authorization(format!(
                "this action requires the {} role",
                role.label()
            )))
        }
    }

    pub fn require_verified_email(&self) -> Result<(), ServiceError> {
        if self.email_verified {
            Ok(())
        } else {
            Err(ServiceError::Authorization(
                "verify your email address to continue".to_string(),
            ))
        }
    }
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            roles: user.roles.clone(),
            email_verified: user.is_verified(),
        }
    }
}

/// Fields collected by the sign-up form.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(roles: &[RoleName]) -> Actor {
        Actor {
            user_id: UserId::new(),
            email: "ada@example.com".to_string(),
            roles: roles.iter().copied().collect(),
            email_verified: true,
        }
    }

    #[test]
    fn role_checks_use_set_membership() {
        let actor = actor(&[RoleName::Recruiter, RoleName::CompanyAdmin]);
        assert!(actor.has_role(RoleName::CompanyAdmin));
        assert!(actor.has_any_role(&[RoleName::Talent, RoleName::Recruiter]));
        assert!(!actor.has_any_role(&[RoleName::Talent]));
        assert!(actor.require_role(RoleName::Recruiter).is_ok());
        assert!(matches!(
            actor.require_role(RoleName::Talent),
            Err(ServiceError::Authorization(_))
        ));
    }

    #[test]
    fn role_names_round_trip_through_labels() {
        for role in [
            RoleName::Talent,
            RoleName::Recruiter,
            RoleName::CompanyAdmin,
            RoleName::Admin,
            RoleName::SuperAdmin,
        ] {
            assert_eq!(role.label().parse::<RoleName>().expect("parses"), role);
        }
        assert_eq!(
            serde_json::to_value(RoleName::CompanyAdmin).expect("serializes"),
            "COMPANY_ADMIN"
        );
        assert!("company-admin".parse::<RoleName>().is_ok());
        assert!("owner".parse::<RoleName>().is_err());
    }
}
