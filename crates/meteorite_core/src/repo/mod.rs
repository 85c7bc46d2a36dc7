//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the record-store contract used by the query layer and loader.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Bulk inserts are all-or-nothing.
//! - Repository APIs surface duplicate ids as a semantic error
//!   (`DuplicateId`) rather than a bare SQLite failure.

pub mod meteorite_repo;
