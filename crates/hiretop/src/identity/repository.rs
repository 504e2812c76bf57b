use super::domain::{User, UserId};
use crate::error::RepositoryError;

/// Unique index on normalised `users.email`.
pub const USER_EMAIL_CONSTRAINT: &str = "users_email_key";

pub trait UserRepository: Send + Sync {
    /// Fails with [`RepositoryError::UniqueViolation`] when the email is taken.
    fn insert_user(&self, user: User) -> Result<User, RepositoryError>;
    fn update_user(&self, user: User) -> Result<(), RepositoryError>;
    fn fetch_user(&self, id: UserId) -> Result<Option<User>, RepositoryError>;
    fn user_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;
}
