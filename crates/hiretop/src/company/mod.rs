//! Companies, their members and the membership checks the other services rely on.

pub mod domain;
pub mod membership;
pub mod repository;
pub mod service;

pub use domain::{
    Company, CompanyDraft, CompanyId, CompanyMember, CompanyPatch, Invitation, MemberInvite,
    MemberView,
};
pub use membership::MembershipResolver;
pub use repository::{CompanyRepository, COMPANY_MEMBER_CONSTRAINT, COMPANY_NAME_CONSTRAINT};
pub use service::{CompanyDashboard, CompanyService, MEMBER_INVITATION_TEMPLATE};
