//! Core domain logic for the meteorite explorer.
//! Owns the record store, the CSV loader and the query layer; outer crates
//! only translate transport concerns.

pub mod config;
pub mod db;
pub mod loader;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{AppConfig, ConfigError};
pub use loader::{
    load_if_empty, load_into, run_startup_load, CsvSource, LoadError, LoadOutcome, LoadPolicy,
    LoadReport,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::meteorite::{MassBucket, Meteorite, MeteoriteId};
pub use model::page::{Page, PageError, PageRequest, Sort, SortDirection, SortProperty};
pub use repo::meteorite_repo::{
    MeteoriteFilter, MeteoriteRepository, RepoError, RepoResult, SqliteMeteoriteRepository,
};
pub use service::meteorite_service::{MeteoriteService, SearchParams};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
