//! Meteorite repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide keyed lookup, filtered paging, bulk insert and GROUP-BY
//!   aggregations over the `meteorites` table.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - `insert_all` never leaves a partial batch behind.
//! - A NULL column never satisfies a supplied filter on that column.
//! - Page ordering is total: `id ASC` breaks ties for every sort.

use crate::db::DbError;
use crate::model::meteorite::{MassBucket, Meteorite, MeteoriteId};
use crate::model::page::{Page, PageRequest};
use log::warn;
use rusqlite::types::Value;
use rusqlite::{ffi, params, params_from_iter, Connection, ErrorCode, OptionalExtension, Row};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

const METEORITE_SELECT_SQL: &str = "SELECT
    id,
    name,
    recclass,
    fall,
    mass,
    year,
    reclat,
    reclong
FROM meteorites";

const INSERT_SAVEPOINT: &str = "meteorites_insert_all";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for meteorite persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// A bulk insert hit an id that is already stored (or repeated in the batch).
    DuplicateId(MeteoriteId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::DuplicateId(id) => write!(f, "duplicate meteorite id: {id}"),
            Self::InvalidData(message) => {
                write!(f, "invalid persisted meteorite data: {message}")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::DuplicateId(_) => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Optional predicates combined with logical AND; `None` imposes no constraint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeteoriteFilter {
    /// Case-insensitive substring of `name`.
    pub name: Option<String>,
    /// Case-insensitive exact `recclass`.
    pub recclass: Option<String>,
    pub year: Option<i32>,
    /// Case-insensitive exact `fall`.
    pub fall: Option<String>,
    /// Inclusive lower bound on `mass`.
    pub min_mass: Option<f64>,
    /// Inclusive upper bound on `mass`.
    pub max_mass: Option<f64>,
}

impl MeteoriteFilter {
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn is_unconstrained(&self) -> bool {
        *self == Self::default()
    }
}

/// Record-store interface for meteorite reads, bulk load and statistics.
pub trait MeteoriteRepository {
    fn get(&self, id: MeteoriteId) -> RepoResult<Option<Meteorite>>;
    fn list(&self, filter: &MeteoriteFilter, page: &PageRequest) -> RepoResult<Page<Meteorite>>;
    /// Inserts every record or none; returns the number inserted.
    fn insert_all(&self, records: &[Meteorite]) -> RepoResult<usize>;
    fn count(&self) -> RepoResult<u64>;
    /// Record count per non-null `year`.
    fn year_counts(&self) -> RepoResult<BTreeMap<i32, u64>>;
    /// Record count per [`MassBucket`] label over non-null `mass`.
    fn mass_bucket_counts(&self) -> RepoResult<BTreeMap<String, u64>>;
    /// Record count per non-null `recclass`.
    fn class_counts(&self) -> RepoResult<BTreeMap<String, u64>>;
}

/// SQLite-backed meteorite repository.
pub struct SqliteMeteoriteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMeteoriteRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl MeteoriteRepository for SqliteMeteoriteRepository<'_> {
    fn get(&self, id: MeteoriteId) -> RepoResult<Option<Meteorite>> {
        let meteorite = self
            .conn
            .query_row(
                &format!("{METEORITE_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_meteorite_row,
            )
            .optional()?;
        Ok(meteorite)
    }

    fn list(&self, filter: &MeteoriteFilter, page: &PageRequest) -> RepoResult<Page<Meteorite>> {
        let (where_sql, mut bind_values) = build_where_clause(filter);

        let total: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM meteorites{where_sql};"),
            params_from_iter(bind_values.iter()),
            |row| row.get(0),
        )?;

        let sql = format!(
            "{METEORITE_SELECT_SQL}{where_sql} ORDER BY {} LIMIT ? OFFSET ?;",
            order_by_clause(page)
        );
        bind_values.push(Value::Integer(i64::from(page.size)));
        bind_values.push(Value::Integer(to_sql_int(page.offset())?));

        let mut stmt = self.conn.prepare(&sql)?;
        let content = stmt
            .query_map(params_from_iter(bind_values.iter()), parse_meteorite_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(content, page, to_count(total)?))
    }

    fn insert_all(&self, records: &[Meteorite]) -> RepoResult<usize> {
        self.conn
            .execute_batch(&format!("SAVEPOINT {INSERT_SAVEPOINT};"))?;

        match insert_rows(self.conn, records) {
            Ok(inserted) => {
                self.conn
                    .execute_batch(&format!("RELEASE {INSERT_SAVEPOINT};"))?;
                Ok(inserted)
            }
            Err(err) => {
                if let Err(rollback_err) = self.conn.execute_batch(&format!(
                    "ROLLBACK TO {INSERT_SAVEPOINT}; RELEASE {INSERT_SAVEPOINT};"
                )) {
                    warn!(
                        "event=insert_all module=repo status=error error_code=rollback_failed error={}",
                        rollback_err
                    );
                }
                Err(err)
            }
        }
    }

    fn count(&self) -> RepoResult<u64> {
        let total: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM meteorites;", [], |row| row.get(0))?;
        to_count(total)
    }

    fn year_counts(&self) -> RepoResult<BTreeMap<i32, u64>> {
        let mut stmt = self.conn.prepare(
            "SELECT year, COUNT(*)
             FROM meteorites
             WHERE year IS NOT NULL
             GROUP BY year;",
        )?;
        let mut rows = stmt.query([])?;
        let mut counts = BTreeMap::new();
        while let Some(row) = rows.next()? {
            counts.insert(row.get::<_, i32>(0)?, to_count(row.get(1)?)?);
        }
        Ok(counts)
    }

    fn mass_bucket_counts(&self) -> RepoResult<BTreeMap<String, u64>> {
        let sql = format!(
            "SELECT
                CASE
                    WHEN mass < {one_kg} THEN '{under}'
                    WHEN mass < {ten_kg} THEN '{middle}'
                    ELSE '{over}'
                END AS mass_bucket,
                COUNT(*)
             FROM meteorites
             WHERE mass IS NOT NULL
             GROUP BY mass_bucket;",
            one_kg = MassBucket::ONE_KG,
            ten_kg = MassBucket::TEN_KG,
            under = MassBucket::UnderOneKg.label(),
            middle = MassBucket::OneToTenKg.label(),
            over = MassBucket::OverTenKg.label(),
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut counts = BTreeMap::new();
        while let Some(row) = rows.next()? {
            let label: String = row.get(0)?;
            if MassBucket::from_label(&label).is_none() {
                return Err(RepoError::InvalidData(format!(
                    "unexpected mass bucket `{label}`"
                )));
            }
            counts.insert(label, to_count(row.get(1)?)?);
        }
        Ok(counts)
    }

    fn class_counts(&self) -> RepoResult<BTreeMap<String, u64>> {
        let mut stmt = self.conn.prepare(
            "SELECT recclass, COUNT(*)
             FROM meteorites
             WHERE recclass IS NOT NULL
             GROUP BY recclass;",
        )?;
        let mut rows = stmt.query([])?;
        let mut counts = BTreeMap::new();
        while let Some(row) = rows.next()? {
            counts.insert(row.get::<_, String>(0)?, to_count(row.get(1)?)?);
        }
        Ok(counts)
    }
}

fn insert_rows(conn: &Connection, records: &[Meteorite]) -> RepoResult<usize> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO meteorites (
            id,
            name,
            recclass,
            fall,
            mass,
            year,
            reclat,
            reclong
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
    )?;

    for record in records {
        stmt.execute(params![
            record.id,
            record.name.as_deref(),
            record.recclass.as_deref(),
            record.fall.as_deref(),
            record.mass,
            record.year,
            record.reclat,
            record.reclong,
        ])
        .map_err(|err| {
            if is_primary_key_violation(&err) {
                RepoError::DuplicateId(record.id)
            } else {
                RepoError::from(err)
            }
        })?;
    }

    Ok(records.len())
}

fn is_primary_key_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(failure, _) => {
            failure.code == ErrorCode::ConstraintViolation
                && matches!(
                    failure.extended_code,
                    ffi::SQLITE_CONSTRAINT_PRIMARYKEY | ffi::SQLITE_CONSTRAINT_UNIQUE
                )
        }
        _ => false,
    }
}

fn build_where_clause(filter: &MeteoriteFilter) -> (String, Vec<Value>) {
    let mut clauses: Vec<&str> = Vec::new();
    let mut bind_values: Vec<Value> = Vec::new();

    if let Some(name) = filter.name.as_ref() {
        // instr() keeps `%` and `_` literal, unlike LIKE.
        clauses.push("instr(casefold(name), casefold(?)) > 0");
        bind_values.push(Value::Text(name.clone()));
    }
    if let Some(recclass) = filter.recclass.as_ref() {
        clauses.push("casefold(recclass) = casefold(?)");
        bind_values.push(Value::Text(recclass.clone()));
    }
    if let Some(year) = filter.year {
        clauses.push("year = ?");
        bind_values.push(Value::Integer(i64::from(year)));
    }
    if let Some(fall) = filter.fall.as_ref() {
        clauses.push("casefold(fall) = casefold(?)");
        bind_values.push(Value::Text(fall.clone()));
    }
    if let Some(min_mass) = filter.min_mass {
        clauses.push("mass >= ?");
        bind_values.push(Value::Real(min_mass));
    }
    if let Some(max_mass) = filter.max_mass {
        clauses.push("mass <= ?");
        bind_values.push(Value::Real(max_mass));
    }

    if clauses.is_empty() {
        (String::new(), bind_values)
    } else {
        (format!(" WHERE {}", clauses.join(" AND ")), bind_values)
    }
}

fn order_by_clause(page: &PageRequest) -> String {
    let Some(sort) = page.sort.as_ref() else {
        return "id ASC".to_string();
    };

    let mut terms = sort
        .properties
        .iter()
        .map(|property| format!("{} {}", property.column(), sort.direction.keyword()))
        .collect::<Vec<_>>();
    if !sort.properties.iter().any(|property| property.column() == "id") {
        terms.push("id ASC".to_string());
    }
    terms.join(", ")
}

fn parse_meteorite_row(row: &Row<'_>) -> rusqlite::Result<Meteorite> {
    Ok(Meteorite {
        id: row.get("id")?,
        name: row.get("name")?,
        recclass: row.get("recclass")?,
        fall: row.get("fall")?,
        mass: row.get("mass")?,
        year: row.get("year")?,
        reclat: row.get("reclat")?,
        reclong: row.get("reclong")?,
    })
}

fn to_count(value: i64) -> RepoResult<u64> {
    u64::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("negative row count `{value}`")))
}

fn to_sql_int(value: u64) -> RepoResult<i64> {
    i64::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("page offset `{value}` out of range")))
}
