//! Core types for PenCraft.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod credential;
pub mod email;
pub mod id;
pub mod money;
pub mod status;

pub use credential::{Credential, CredentialError};
pub use email::{Email, EmailError};
pub use id::*;
pub use money::Money;
pub use status::*;
