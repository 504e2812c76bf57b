use super::domain::{Company, CompanyId, CompanyMember};
use crate::error::RepositoryError;
use crate::identity::{User, UserId};

/// Unique index on `companies.name` (exact, case-sensitive).
pub const COMPANY_NAME_CONSTRAINT: &str = "companies_name_key";
/// Primary key of `company_members`, `(company_id, user_id)`.
pub const COMPANY_MEMBER_CONSTRAINT: &str = "company_members_pkey";

pub trait CompanyRepository: Send + Sync {
    /// Inserts the company and its admin membership atomically.
    fn insert_with_admin(
        &self,
        company: Company,
        admin: CompanyMember,
    ) -> Result<Company, RepositoryError>;
    fn update_company(&self, company: Company) -> Result<(), RepositoryError>;
    fn fetch_company(&self, id: CompanyId) -> Result<Option<Company>, RepositoryError>;
    fn company_by_name(&self, name: &str) -> Result<Option<Company>, RepositoryError>;
    /// Companies the user administers first, then those joined as a member.
    fn companies_for_user(&self, user_id: UserId) -> Result<Vec<Company>, RepositoryError>;
    /// Inserts an invited account and its membership atomically.
    fn insert_invited_member(
        &self,
        user: User,
        member: CompanyMember,
    ) -> Result<User, RepositoryError>;
    fn members(&self, company_id: CompanyId) -> Result<Vec<CompanyMember>, RepositoryError>;
    /// True through either the admin relation or a member row.
    fn is_member(&self, user_id: UserId, company_id: CompanyId) -> Result<bool, RepositoryError>;
}
