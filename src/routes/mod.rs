//! Router Module Index
//!
//! Splits the API by access tier. The gate for each tier is applied as a route layer
//! in `create_router`, so a handler can never be mounted without its check.

/// Routes open to anyone: catalog, cart, sign-up and token issuance.
pub mod public;

/// Routes that need a verified bearer token.
pub mod authenticated;

/// Routes that need a verified bearer token and the admin role.
pub mod admin;
