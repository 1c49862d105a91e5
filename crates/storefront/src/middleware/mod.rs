//! Storefront middleware.
//!
//! # Order (outermost first)
//!
//! 1. Sentry layers, added by the binary
//! 2. CORS
//! 3. `TraceLayer`, opening the request span with empty `request_id` and
//!    `user_id` fields
//! 4. Request ID, filling the span field and echoing the header
//! 5. Rate limiting, on `/auth/*` only
//!
//! Authentication is an extractor rather than a layer, so public routes
//! never touch the user table.

pub mod auth;
pub mod rate_limit;
pub mod request_id;

pub use auth::RequireAuth;
pub use rate_limit::auth_rate_limiter;
pub use request_id::request_id_middleware;
