//! HTTP surface for the meteorite explorer.
//!
//! # Responsibility
//! - Map each query-layer operation to one JSON GET endpoint.
//! - Own transport concerns: parameter binding, status codes, CORS.
//!
//! # Invariants
//! - Handlers are read-only; no route mutates the store.
//! - Store access happens on the blocking pool, never on async workers.

pub mod error;
pub mod extract;
pub mod routes;
pub mod server;
pub mod state;

pub use error::{ApiError, ErrorResponse, INTERNAL_ERROR_MESSAGE};
pub use extract::{ApiPath, ApiQuery};
pub use routes::{health_routes, meteorite_routes, METEORITES_BASE_PATH};
pub use server::{build_router, HttpServer};
pub use state::AppState;
