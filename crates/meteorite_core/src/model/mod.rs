//! Domain model for meteorite landing records and paged reads.
//!
//! # Responsibility
//! - Define the canonical record stored in the `meteorites` table.
//! - Define page request/response shapes shared by store and API layers.
//!
//! # Invariants
//! - Every record is identified by its externally supplied `id`.
//! - Records are never mutated after load.

pub mod meteorite;
pub mod page;
