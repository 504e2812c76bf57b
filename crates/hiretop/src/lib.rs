//! Hiring core for the HireTop job board.
//!
//! Talents build profiles and apply to offers, companies publish offers and judge the
//! applications they receive. Every operation takes the acting identity explicitly and
//! returns a typed [`error::ServiceError`] on failure.

pub mod app;
pub mod applications;
pub mod clock;
pub mod company;
pub mod config;
pub mod documents;
pub mod error;
pub mod identity;
mod ids;
pub mod notify;
pub mod offers;
pub mod pagination;
pub mod store;
pub mod talent;
pub mod telemetry;

pub use app::HireTop;
pub use error::{RepositoryError, ServiceError};
