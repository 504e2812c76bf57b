//! Job offers and their PUBLISHED → CLOSED / EXPIRED lifecycle.

pub mod domain;
pub mod repository;
pub mod service;

pub use domain::{
    ContractType, JobOffer, JobOfferId, OfferDraft, OfferFilters, OfferListing, OfferPatch,
    OfferQuery, OfferScope, OfferStatus, OpenOffer, RemoteType,
};
pub use repository::OfferRepository;
pub use service::OfferService;
