//! PenCraft Core - Shared types library.
//!
//! This crate provides common types used across all PenCraft components:
//! - `storefront` - JSON API server for the catalog, cart, auth and orders
//! - `client` - Client-side cart controller (guest and authenticated modes)
//! - `cli` - Command-line tools for migrations and catalog seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows the same
//! pricing and credential rules to run on both sides of the wire.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, money, emails, statuses and credentials
//! - [`pricing`] - Cart totals and the shipping rule
//! - [`plural`] - Russian plural forms for count labels
//! - [`api`] - JSON request/response bodies shared by server and client

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod plural;
pub mod pricing;
pub mod types;

pub use pricing::{CartTotals, ShippingPolicy};
pub use types::*;
