//! HTTP service hosting the school staff directory and permission documents
//!
//! The service keeps one [`access::PermissionStore`] over the in-memory
//! directory and exposes it under `/admin`, guarded by bearer tokens from the
//! auth provider. Clients reach it through [`access::HttpDirectory`].

pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::AppState;
