//! Registration, login and token errors.

use thiserror::Error;

use pencraft_core::{CredentialError, EmailError};

use crate::db::RepositoryError;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Blank name, email or password.
    #[error("all fields are required")]
    MissingFields,

    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Password shorter than the minimum; carries the user-facing text.
    #[error("weak password: {0}")]
    WeakPassword(String),

    /// Unknown email or wrong password. The two are not distinguished.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("email already registered")]
    UserAlreadyExists,

    #[error("missing bearer token")]
    MissingToken,

    /// Malformed or expired token.
    #[error("token rejected: {0}")]
    Token(#[from] CredentialError),

    /// The token decoded but its user is gone.
    #[error("token user not found")]
    UserNotFound,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Argon2 failed to hash or parse a stored hash.
    #[error("password hashing failed")]
    PasswordHash,
}
