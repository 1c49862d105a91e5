//! User domain types.

use chrono::{DateTime, Utc};

use pencraft_core::api::UserView;
use pencraft_core::{Email, UserId};

/// A registered storefront user.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    /// Display name given at registration.
    pub name: String,
    pub email: Email,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.to_string(),
        }
    }
}
