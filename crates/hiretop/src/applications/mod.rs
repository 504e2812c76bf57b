//! Application lifecycle: talents apply, companies review, and both sides list.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    parse_disponibility, Application, ApplicationFilters, ApplicationId, ApplicationQuery,
    ApplicationScope, ApplicationStatus, ApplicationSummary, ApplicationUpdate, ApplyRequest,
    ScopeKey, StatusChange, TransitionPolicy,
};
pub use repository::{ApplicationRepository, LIVE_APPLICATION_CONSTRAINT};
pub use router::{application_router, ACTOR_HEADER};
pub use service::{ApplicationService, APPLY_APPROVED_TEMPLATE};
