//! Persistence ports bundled for the services, plus the in-memory relational store.

mod memory;

pub use memory::MemoryStore;

use crate::applications::ApplicationRepository;
use crate::company::CompanyRepository;
use crate::identity::UserRepository;
use crate::offers::OfferRepository;
use crate::talent::{SkillRepository, TalentRepository};

/// Every repository port the hiring services need, over one backing store.
pub trait HiringStore:
    UserRepository
    + TalentRepository
    + SkillRepository
    + CompanyRepository
    + OfferRepository
    + ApplicationRepository
{
}

impl<T> HiringStore for T where
    T: UserRepository
        + TalentRepository
        + SkillRepository
        + CompanyRepository
        + OfferRepository
        + ApplicationRepository
{
}
