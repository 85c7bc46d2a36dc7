//! Meteorite query use-case service.
//!
//! # Responsibility
//! - Translate optional list/search parameters into repository filters.
//! - Expose the statistics aggregations to outer layers.
//!
//! # Invariants
//! - Service layer remains storage-agnostic.
//! - Blank text parameters never become filters.

use crate::model::meteorite::{Meteorite, MeteoriteId};
use crate::model::page::{Page, PageRequest};
use crate::repo::meteorite_repo::{MeteoriteFilter, MeteoriteRepository, RepoResult};
use log::debug;
use std::collections::BTreeMap;

/// Raw search parameters as received from callers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchParams {
    pub name: Option<String>,
    pub recclass: Option<String>,
    pub year: Option<i32>,
    pub fall: Option<String>,
    pub min_mass: Option<f64>,
    pub max_mass: Option<f64>,
}

impl SearchParams {
    /// Converts to a repository filter; empty strings are treated as absent.
    pub fn into_filter(self) -> MeteoriteFilter {
        MeteoriteFilter {
            name: non_empty(self.name),
            recclass: non_empty(self.recclass),
            year: self.year,
            fall: non_empty(self.fall),
            min_mass: self.min_mass,
            max_mass: self.max_mass,
        }
    }
}

/// Query-layer facade over repository implementations.
pub struct MeteoriteService<R: MeteoriteRepository> {
    repo: R,
}

impl<R: MeteoriteRepository> MeteoriteService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn get_meteorite(&self, id: MeteoriteId) -> RepoResult<Option<Meteorite>> {
        debug!("event=get_meteorite module=service id={id}");
        self.repo.get(id)
    }

    /// Lists records, narrowed to a case-insensitive name substring when
    /// `name` is non-blank.
    pub fn list_meteorites(
        &self,
        name: Option<&str>,
        page: &PageRequest,
    ) -> RepoResult<Page<Meteorite>> {
        let filter = match name {
            Some(value) if !value.trim().is_empty() => MeteoriteFilter::by_name(value),
            _ => MeteoriteFilter::default(),
        };
        debug!(
            "event=list_meteorites module=service name_filter={} page={} size={}",
            filter.name.is_some(),
            page.page,
            page.size
        );
        self.repo.list(&filter, page)
    }

    /// Searches with every supplied parameter combined by logical AND.
    pub fn search_meteorites(
        &self,
        params: SearchParams,
        page: &PageRequest,
    ) -> RepoResult<Page<Meteorite>> {
        let filter = params.into_filter();
        debug!(
            "event=search_meteorites module=service filter={:?} page={} size={}",
            filter, page.page, page.size
        );
        self.repo.list(&filter, page)
    }

    pub fn meteorite_trends(&self) -> RepoResult<BTreeMap<i32, u64>> {
        self.repo.year_counts()
    }

    pub fn mass_distribution(&self) -> RepoResult<BTreeMap<String, u64>> {
        self.repo.mass_bucket_counts()
    }

    pub fn classification_breakdown(&self) -> RepoResult<BTreeMap<String, u64>> {
        self.repo.class_counts()
    }

    pub fn count(&self) -> RepoResult<u64> {
        self.repo.count()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.is_empty())
}
