//! Workflows feature module
//!
//! Exposes each orchestrator operation as an endpoint. Stage rules are
//! enforced by the engine; violations come back as 409 responses.

pub mod routes;
pub mod types;

pub use routes::workflows_routes;
