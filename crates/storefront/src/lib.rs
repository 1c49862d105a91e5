//! PenCraft Storefront library.
//!
//! The router, services and repositories live here so the integration tests
//! can drive them without a listener. `main.rs` only wires configuration,
//! [`telemetry`] and the Sentry layers around [`routes::router`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod telemetry;
