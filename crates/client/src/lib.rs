//! PenCraft client - one cart abstraction for guests and signed-in users.
//!
//! Guests keep their cart in client-local storage. Once a token is present
//! the cart lives on the server and every change is a round trip followed by
//! a full re-fetch. [`CartController`] hides the difference.
//!
//! # Modules
//!
//! - [`storage`] - Key/value storage for the cart, token and user
//! - [`api`] - The storefront HTTP API behind a trait
//! - [`controller`] - Mode selection, cart mutations, login merge, checkout
//! - [`summary`] - Totals and labels for rendering a cart
//! - [`filter`] - Catalog filtering and sorting

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod controller;
pub mod error;
pub mod filter;
pub mod storage;
pub mod summary;

pub use api::{CartApi, HttpCartApi};
pub use controller::{CartController, CartMode, MergeReport, Session};
pub use error::ClientError;
pub use filter::{ProductFilter, SortOrder, brand_display_name};
pub use storage::{FileStorage, LocalStorage, MemoryStorage, StorageError};
pub use summary::{CartSummary, SummaryLine};
