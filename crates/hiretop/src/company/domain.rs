use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::documents::DocumentUpload;
use crate::identity::{User, UserId};
use crate::ids::entity_id;
use crate::notify::NotificationResult;

entity_id!(CompanyId);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub admin_id: UserId,
    pub name: String,
    pub country: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Join row linking a user to a company they work for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyMember {
    pub company_id: CompanyId,
    pub user_id: UserId,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CompanyDraft {
    pub name: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CompanyPatch {
    pub name: Option<String>,
    pub country: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
    pub logo: Option<DocumentUpload>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MemberInvite {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// Result of inviting a recruiter. The credential is only returned here, never stored in clear.
#[derive(Debug, Clone)]
pub struct Invitation {
    pub user: User,
    pub member: CompanyMember,
    pub temporary_password: String,
    pub notification: NotificationResult,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberView {
    pub user_id: UserId,
    pub full_name: String,
    pub email: String,
    pub is_admin: bool,
    pub joined_at: DateTime<Utc>,
}
