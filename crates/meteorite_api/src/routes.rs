//! Meteorite query routes.
//!
//! # Responsibility
//! - Bind query-string parameters to the query layer.
//! - Emit one `http_request` log line per handled request.
//!
//! # Invariants
//! - Empty query values (`year=`) are treated as absent.
//! - A missing record answers 404 with an empty body.

use crate::error::ApiError;
use crate::extract::{ApiPath, ApiQuery};
use crate::state::AppState;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use log::info;
use meteorite_core::{Meteorite, MeteoriteId, Page, PageRequest, SearchParams};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Instant;

pub const METEORITES_BASE_PATH: &str = "/api/meteorites";

/// Query parameters for `GET /api/meteorites`.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub page: Option<u32>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub size: Option<u32>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub sort: Option<String>,
}

/// Query parameters for `GET /api/meteorites/search`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub recclass: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub year: Option<i32>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub fall: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub min_mass: Option<f64>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub max_mass: Option<f64>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub page: Option<u32>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub size: Option<u32>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub sort: Option<String>,
}

impl SearchQuery {
    fn split(self) -> Result<(SearchParams, PageRequest), ApiError> {
        let page = PageRequest::parse(self.page, self.size, self.sort.as_deref())?;
        let params = SearchParams {
            name: self.name,
            recclass: self.recclass,
            year: self.year,
            fall: self.fall,
            min_mass: self.min_mass,
            max_mass: self.max_mass,
        };
        Ok((params, page))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

fn empty_string_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref() {
        None | Some("") => Ok(None),
        Some(value) => T::from_str(value).map(Some).map_err(de::Error::custom),
    }
}

/// Routes nested under [`METEORITES_BASE_PATH`].
pub fn meteorite_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_meteorites))
        .route("/search", get(search_meteorites))
        .route("/stats/trends", get(meteorite_trends))
        .route("/stats/mass-distribution", get(mass_distribution))
        .route("/stats/classification", get(classification_breakdown))
        .route("/:id", get(get_meteorite))
        .with_state(state)
}

pub fn health_routes() -> Router {
    Router::new().route("/health", get(health))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn list_meteorites(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Json<Page<Meteorite>>, ApiError> {
    let started_at = Instant::now();
    let page = PageRequest::parse(query.page, query.size, query.sort.as_deref())?;
    let name = query.name;
    let result = state
        .with_service(move |service| service.list_meteorites(name.as_deref(), &page))
        .await;
    log_request("list", &result, started_at);
    result.map(Json)
}

async fn get_meteorite(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<MeteoriteId>,
) -> Result<Json<Meteorite>, ApiError> {
    let started_at = Instant::now();
    let result = state
        .with_service(move |service| service.get_meteorite(id))
        .await
        .and_then(|found| found.ok_or(ApiError::NotFound));
    log_request("get", &result, started_at);
    result.map(Json)
}

async fn search_meteorites(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> Result<Json<Page<Meteorite>>, ApiError> {
    let started_at = Instant::now();
    let (params, page) = query.split()?;
    let result = state
        .with_service(move |service| service.search_meteorites(params, &page))
        .await;
    log_request("search", &result, started_at);
    result.map(Json)
}

async fn meteorite_trends(
    State(state): State<AppState>,
) -> Result<Json<BTreeMap<i32, u64>>, ApiError> {
    let started_at = Instant::now();
    let result = state
        .with_service(|service| service.meteorite_trends())
        .await;
    log_request("stats_trends", &result, started_at);
    result.map(Json)
}

async fn mass_distribution(
    State(state): State<AppState>,
) -> Result<Json<BTreeMap<String, u64>>, ApiError> {
    let started_at = Instant::now();
    let result = state
        .with_service(|service| service.mass_distribution())
        .await;
    log_request("stats_mass_distribution", &result, started_at);
    result.map(Json)
}

async fn classification_breakdown(
    State(state): State<AppState>,
) -> Result<Json<BTreeMap<String, u64>>, ApiError> {
    let started_at = Instant::now();
    let result = state
        .with_service(|service| service.classification_breakdown())
        .await;
    log_request("stats_classification", &result, started_at);
    result.map(Json)
}

fn log_request<T>(route: &str, result: &Result<T, ApiError>, started_at: Instant) {
    let duration_ms = started_at.elapsed().as_millis();
    match result {
        Ok(_) => info!(
            "event=http_request module=api route={route} status=ok duration_ms={duration_ms}"
        ),
        Err(err) => info!(
            "event=http_request module=api route={route} status=error code={} duration_ms={duration_ms}",
            err.status().as_u16()
        ),
    }
}
