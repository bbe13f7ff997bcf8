//! Reverse proxy that guards an application against cross-site request forgery.
//!
//! The gateway answers token issuance (`GET /api/csrf-token`) and the diagnostic
//! check (`/api/csrf/validate`) itself. Every other request is classified, and
//! protected mutating requests must echo the issued token in `x-csrf-token` before
//! they are forwarded upstream.

pub mod configuration;
pub mod endpoints;
pub mod gateway;
pub mod guard;
pub mod metric;
pub mod server;
