//! Accounts, role sets and the authenticated [`Actor`] every operation receives.

pub mod domain;
pub mod gates;
pub mod password;
pub mod repository;
pub mod service;

pub use domain::{Actor, Registration, RoleName, User, UserId};
pub use gates::{
    company_setup_gate, profile_completion_gate, role_gate, verified_email_gate, GateDecision,
};
pub use repository::{UserRepository, USER_EMAIL_CONSTRAINT};
pub use service::IdentityService;
