//! Meteorite domain model.
//!
//! # Responsibility
//! - Define the record shape persisted per landing event.
//! - Define mass bucketing used by the distribution statistics.
//!
//! # Invariants
//! - `id` is unique and immutable once stored.
//! - Every other field is optional; absent source cells stay `None`.

use serde::{Deserialize, Serialize};

/// Externally supplied record identifier (CSV column `id`).
pub type MeteoriteId = i64;

/// One meteorite landing event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meteorite {
    pub id: MeteoriteId,
    pub name: Option<String>,
    /// Classification code, e.g. `L5` or `H6`.
    pub recclass: Option<String>,
    /// `Fell` when observed falling, `Found` when discovered later.
    pub fall: Option<String>,
    /// Mass in grams.
    pub mass: Option<f64>,
    pub year: Option<i32>,
    pub reclat: Option<f64>,
    pub reclong: Option<f64>,
}

impl Meteorite {
    /// Creates a record with only the identifier set.
    pub fn with_id(id: MeteoriteId) -> Self {
        Self {
            id,
            name: None,
            recclass: None,
            fall: None,
            mass: None,
            year: None,
            reclat: None,
            reclong: None,
        }
    }
}

/// Mass ranges reported by the distribution statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MassBucket {
    /// `mass < 1000` grams.
    UnderOneKg,
    /// `1000 <= mass < 10000` grams.
    OneToTenKg,
    /// `mass >= 10000` grams.
    OverTenKg,
}

impl MassBucket {
    pub const ALL: [MassBucket; 3] = [Self::UnderOneKg, Self::OneToTenKg, Self::OverTenKg];

    /// Upper bound (exclusive, grams) of [`MassBucket::UnderOneKg`].
    pub const ONE_KG: f64 = 1_000.0;
    /// Upper bound (exclusive, grams) of [`MassBucket::OneToTenKg`].
    pub const TEN_KG: f64 = 10_000.0;

    /// Returns the bucket a mass in grams falls into.
    pub fn for_mass(mass: f64) -> Self {
        if mass < Self::ONE_KG {
            Self::UnderOneKg
        } else if mass < Self::TEN_KG {
            Self::OneToTenKg
        } else {
            Self::OverTenKg
        }
    }

    /// Stable label used as the statistics map key.
    pub fn label(self) -> &'static str {
        match self {
            Self::UnderOneKg => "<1kg",
            Self::OneToTenKg => "1-10kg",
            Self::OverTenKg => ">10kg",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|bucket| bucket.label() == label)
    }
}
