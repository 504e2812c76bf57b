use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::info;

use super::domain::{normalize_email, Actor, Registration, RoleName, User, UserId};
use super::password::hash_password;
use super::repository::UserRepository;
use crate::clock::{Clock, SystemClock};
use crate::error::{RepositoryError, ServiceError};

const MINIMUM_PASSWORD_LENGTH: usize = 8;

/// Account registration and identity resolution for the session boundary.
pub struct IdentityService<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S> IdentityService<S>
where
    S: UserRepository + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn register(
        &self,
        registration: Registration,
        role: RoleName,
    ) -> Result<User, ServiceError> {
        let email = normalize_email(&registration.email);
        if !email.contains('@') {
            return Err(ServiceError::Validation(
                "a valid email address is required".to_string(),
            ));
        }
        if registration.password.chars().count() < MINIMUM_PASSWORD_LENGTH {
            return Err(ServiceError::Validation(format!(
                "password must be at least {MINIMUM_PASSWORD_LENGTH} characters"
            )));
        }

        let user = User {
            id: UserId::new(),
            first_name: registration.first_name.trim().to_string(),
            last_name: registration.last_name.trim().to_string(),
            email,
            password_hash: hash_password(&registration.password)?,
            email_verified_at: None,
            roles: BTreeSet::from([role]),
            created_at: self.clock.now(),
        };

        let user = insert_account(self.store.as_ref(), user)?;
        info!(user_id = %user.id, role = role.label(), "user registered");
        Ok(user)
    }

    /// Marks the email as verified. The first verification timestamp is kept.
    pub fn verify_email(&self, user_id: UserId) -> Result<User, ServiceError> {
        let mut user = self.user(user_id)?;
        if user.email_verified_at.is_none() {
            user.email_verified_at = Some(self.clock.now());
            self.store.update_user(user.clone())?;
            info!(user_id = %user.id, "email verified");
        }
        Ok(user)
    }

    pub fn user(&self, user_id: UserId) -> Result<User, ServiceError> {
        self.store
            .fetch_user(user_id)?
            .ok_or_else(|| ServiceError::not_found("user"))
    }

    pub fn actor(&self, user_id: UserId) -> Result<Actor, ServiceError> {
        self.user(user_id).map(|user| Actor::from(&user))
    }

    pub fn grant_role(&self, user_id: UserId, role: RoleName) -> Result<User, ServiceError> {
        let mut user = self.user(user_id)?;
        if user.roles.insert(role) {
            self.store.update_user(user.clone())?;
        }
        Ok(user)
    }
}

/// Inserts a new account, reporting a taken email as a conflict.
pub(crate) fn insert_account<S>(store: &S, user: User) -> Result<User, ServiceError>
where
    S: UserRepository + ?Sized,
{
    store.insert_user(user).map_err(account_conflict)
}

/// Reports a taken email as a conflict.
pub(crate) fn account_conflict(err: RepositoryError) -> ServiceError {
    match err {
        RepositoryError::UniqueViolation { .. } => {
            ServiceError::Conflict("an account already exists for this email".to_string())
        }
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::identity::password::verify_password;
    use crate::store::MemoryStore;
    use chrono::{Duration, TimeZone, Utc};

    fn registration(email: &str) -> Registration {
        Registration {
            first_name: " Ada ".to_string(),
            last_name: "Lovelace".to_string(),
            email: email.to_string(),
            password: "analytical-engine".to_string(),
        }
    }

    fn service() -> (IdentityService<MemoryStore>, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 4, 1, 8, 0, 0).unwrap(),
        ));
        (
            IdentityService::with_clock(Arc::new(MemoryStore::new()), clock.clone()),
            clock,
        )
    }

    #[test]
    fn register_normalises_and_hashes() {
        let (identity, _) = service();
        let user = identity
            .register(registration("  Ada@Example.COM "), RoleName::Talent)
            .expect("registered");

        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.first_name, "Ada");
        assert_eq!(user.roles, BTreeSet::from([RoleName::Talent]));
        assert!(!user.is_verified());
        assert!(verify_password("analytical-engine", &user.password_hash));
    }

    #[test]
    fn duplicate_email_is_a_conflict_regardless_of_case() {
        let (identity, _) = service();
        identity
            .register(registration("ada@example.com"), RoleName::Talent)
            .expect("first registration");

        match identity.register(registration("ADA@example.com"), RoleName::CompanyAdmin) {
            Err(ServiceError::Conflict(message)) => {
                assert_eq!(message, "an account already exists for this email")
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }

    #[test]
    fn short_passwords_and_bad_emails_are_rejected() {
        let (identity, _) = service();
        let mut short = registration("ada@example.com");
        short.password = "short".to_string();
        assert!(matches!(
            identity.register(short, RoleName::Talent),
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            identity.register(registration("not-an-email"), RoleName::Talent),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn verification_keeps_the_first_timestamp() {
        let (identity, clock) = service();
        let user = identity
            .register(registration("ada@example.com"), RoleName::Talent)
            .expect("registered");

        let first = identity.verify_email(user.id).expect("verified");
        clock.advance(Duration::days(3));
        let second = identity.verify_email(user.id).expect("verified again");

        assert_eq!(first.email_verified_at, second.email_verified_at);
        assert!(identity.actor(user.id).expect("actor").email_verified);
    }

    #[test]
    fn unknown_users_are_not_found() {
        let (identity, _) = service();
        match identity.actor(UserId::new()) {
            Err(ServiceError::NotFound(message)) => assert_eq!(message, "user not found"),
            other => panic!("expected not found, got {other:?}"),
        }
    }

    #[test]
    fn granting_a_role_extends_the_set() {
        let (identity, _) = service();
        let user = identity
            .register(registration("ada@example.com"), RoleName::Recruiter)
            .expect("registered");
        let user = identity
            .grant_role(user.id, RoleName::CompanyAdmin)
            .expect("granted");
        assert!(user.roles.contains(&RoleName::Recruiter));
        assert!(user.roles.contains(&RoleName::CompanyAdmin));
    }
}
