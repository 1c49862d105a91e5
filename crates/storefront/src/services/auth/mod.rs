//! Authentication service.
//!
//! Password registration and login, plus issuing and checking the bearer
//! credential described in [`pencraft_core::Credential`]. The credential is
//! unsigned; authorization amounts to "decodes, not expired, user exists".

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Duration, Utc};

use pencraft_core::{Credential, Email};

use crate::db::{RepositoryError, UserStore};
use crate::models::User;

/// Minimum password length, in characters.
const MIN_PASSWORD_LENGTH: usize = 6;

/// A user together with a freshly issued token.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub user: User,
    pub token: String,
}

/// Authentication service.
pub struct AuthService<'a> {
    users: &'a dyn UserStore,
    token_ttl: Duration,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(users: &'a dyn UserStore, token_ttl: Duration) -> Self {
        Self { users, token_ttl }
    }

    // =========================================================================
    // Password Authentication
    // =========================================================================

    /// Register a new user and issue a token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingFields` if any field is blank.
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Authenticated, AuthError> {
        let name = name.trim();
        if name.is_empty() || email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::MissingFields);
        }
        let email = Email::parse(email)?;
        validate_password(password)?;

        let password_hash = hash_password(password)?;

        let user = self
            .users
            .create(name, &email, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "User registered");
        self.authenticated(user)
    }

    /// Login with email and password and issue a token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingFields` if either field is blank.
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<Authenticated, AuthError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::MissingFields);
        }
        let email = Email::parse(email)?;

        let (user, password_hash) = self
            .users
            .get_with_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        self.authenticated(user)
    }

    // =========================================================================
    // Tokens
    // =========================================================================

    /// Build the token for `user`, valid from `now` for the configured TTL.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Token` if encoding fails.
    pub fn issue_token(&self, user: &User, now: DateTime<Utc>) -> Result<String, AuthError> {
        let credential = Credential::issue(
            user.id,
            user.name.clone(),
            user.email.as_str(),
            now,
            self.token_ttl,
        );
        Ok(credential.encode()?)
    }

    /// Resolve a bearer token to its user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Token` for malformed or expired tokens and
    /// `AuthError::UserNotFound` when the user is gone.
    pub async fn authorize(&self, token: &str) -> Result<User, AuthError> {
        self.authorize_at(token, Utc::now()).await
    }

    /// [`Self::authorize`] with an explicit clock.
    ///
    /// # Errors
    ///
    /// See [`Self::authorize`].
    pub async fn authorize_at(&self, token: &str, now: DateTime<Utc>) -> Result<User, AuthError> {
        let credential = Credential::decode_live(token, now)?;
        self.users
            .get_by_id(credential.user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    fn authenticated(&self, user: User) -> Result<Authenticated, AuthError> {
        let token = self.issue_token(&user, Utc::now())?;
        Ok(Authenticated { user, token })
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Пароль должен содержать минимум {MIN_PASSWORD_LENGTH} символов"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pencraft_core::{CredentialError, UserId};

    use super::*;
    use crate::db::memory::MemoryStore;

    fn service(store: &MemoryStore) -> AuthService<'_> {
        AuthService::new(store, Duration::hours(24))
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("secret1").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("secret1", &hash).is_ok());
        assert!(matches!(
            verify_password("secret2", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_password_length_counts_characters() {
        assert!(validate_password("12345").is_err());
        assert!(validate_password("пароль").is_ok());
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let store = MemoryStore::new();
        let auth = service(&store);

        let registered = auth
            .register("Анна", "anna@pencraft.ru", "secret1")
            .await
            .unwrap();
        assert_eq!(registered.user.name, "Анна");

        let logged_in = auth.login("anna@pencraft.ru", "secret1").await.unwrap();
        assert_eq!(logged_in.user.id, registered.user.id);

        let user = auth.authorize(&logged_in.token).await.unwrap();
        assert_eq!(user.id, registered.user.id);
    }

    #[tokio::test]
    async fn test_register_validation() {
        let store = MemoryStore::new();
        let auth = service(&store);

        assert!(matches!(
            auth.register("  ", "a@b.ru", "secret1").await,
            Err(AuthError::MissingFields)
        ));
        assert!(matches!(
            auth.register("Анна", "not-an-email", "secret1").await,
            Err(AuthError::InvalidEmail(_))
        ));
        assert!(matches!(
            auth.register("Анна", "a@b.ru", "12345").await,
            Err(AuthError::WeakPassword(_))
        ));
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let store = MemoryStore::new();
        let auth = service(&store);

        auth.register("Анна", "anna@pencraft.ru", "secret1")
            .await
            .unwrap();
        assert!(matches!(
            auth.register("Другая Анна", "anna@pencraft.ru", "secret2")
                .await,
            Err(AuthError::UserAlreadyExists)
        ));
    }

    #[tokio::test]
    async fn test_login_wrong_password_or_email() {
        let store = MemoryStore::new();
        let auth = service(&store);
        auth.register("Анна", "anna@pencraft.ru", "secret1")
            .await
            .unwrap();

        assert!(matches!(
            auth.login("anna@pencraft.ru", "wrong-password").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("nobody@pencraft.ru", "secret1").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_authorize_rejects_expired_token() {
        let store = MemoryStore::new();
        let auth = service(&store);
        let registered = auth
            .register("Анна", "anna@pencraft.ru", "secret1")
            .await
            .unwrap();

        let later = Utc::now() + Duration::hours(25);
        assert!(matches!(
            auth.authorize_at(&registered.token, later).await,
            Err(AuthError::Token(CredentialError::Expired))
        ));
    }

    #[tokio::test]
    async fn test_authorize_rejects_unknown_user() {
        let store = MemoryStore::new();
        let auth = service(&store);

        let token = Credential::issue(
            UserId::new(404),
            "ghost",
            "ghost@pencraft.ru",
            Utc::now(),
            Duration::hours(1),
        )
        .encode()
        .unwrap();

        assert!(matches!(
            auth.authorize(&token).await,
            Err(AuthError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn test_authorize_rejects_garbage() {
        let store = MemoryStore::new();
        let auth = service(&store);

        assert!(matches!(
            auth.authorize("definitely not a token").await,
            Err(AuthError::Token(CredentialError::Malformed))
        ));
    }
}
