//! CSV resource reading and positional row mapping.
//!
//! # Responsibility
//! - Resolve the bundled or file-backed `Meteorite_landings.csv` content.
//! - Map positional CSV cells to [`Meteorite`] fields.
//!
//! # Invariants
//! - The first line is always a header and never becomes a record.
//! - Empty or unparsable cells become `None`; they never reject the row.
//! - Rows without a usable `id` are skipped, not stored.

use super::{LoadError, LoadResult};
use crate::model::meteorite::Meteorite;
use csv::{ReaderBuilder, StringRecord};
use log::warn;
use std::borrow::Cow;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;

/// File name of the dataset shipped with the crate.
pub const BUNDLED_CSV_NAME: &str = "Meteorite_landings.csv";

const BUNDLED_CSV: &str = include_str!("../../resources/Meteorite_landings.csv");

const NAME_COLUMN: usize = 0;
const ID_COLUMN: usize = 1;
const RECCLASS_COLUMN: usize = 3;
const MASS_COLUMN: usize = 4;
const FALL_COLUMN: usize = 5;
const YEAR_COLUMN: usize = 6;
const RECLAT_COLUMN: usize = 7;
const RECLONG_COLUMN: usize = 8;

/// Where the loader reads its CSV text from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CsvSource {
    /// The dataset compiled into the binary.
    #[default]
    Bundled,
    File(PathBuf),
    /// In-memory CSV text, mainly for tests and embedding callers.
    Inline(String),
}

impl CsvSource {
    /// Reads the whole source as UTF-8 text.
    pub fn read(&self) -> LoadResult<Cow<'_, str>> {
        match self {
            Self::Bundled => Ok(Cow::Borrowed(BUNDLED_CSV)),
            Self::File(path) => std::fs::read_to_string(path)
                .map(Cow::Owned)
                .map_err(|source| LoadError::Io {
                    path: path.clone(),
                    source,
                }),
            Self::Inline(text) => Ok(Cow::Borrowed(text.as_str())),
        }
    }
}

impl Display for CsvSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bundled => write!(f, "bundled:{BUNDLED_CSV_NAME}"),
            Self::File(path) => write!(f, "file:{}", path.display()),
            Self::Inline(_) => write!(f, "inline"),
        }
    }
}

/// Records parsed from one CSV text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedBatch {
    pub records: Vec<Meteorite>,
    /// Data rows dropped because their `id` cell was empty or not an integer.
    pub skipped_rows: usize,
}

/// Parses CSV text (header first) into meteorite records.
///
/// # Errors
/// - Returns [`LoadError::Csv`] when the text is not well-formed CSV.
pub fn parse_meteorites(text: &str) -> LoadResult<ParsedBatch> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut batch = ParsedBatch::default();
    for result in reader.records() {
        let record = result?;
        match parse_row(&record) {
            Some(meteorite) => batch.records.push(meteorite),
            None => {
                batch.skipped_rows += 1;
                let line = record.position().map_or(0, |position| position.line());
                warn!(
                    "event=csv_row_skipped module=loader line={} reason=missing_id",
                    line
                );
            }
        }
    }

    Ok(batch)
}

/// Maps one data row to a record; `None` when the id is unusable.
pub fn parse_row(record: &StringRecord) -> Option<Meteorite> {
    let id = parse_number::<i64>(cell(record, ID_COLUMN))?;

    Some(Meteorite {
        id,
        name: text(record, NAME_COLUMN),
        recclass: text(record, RECCLASS_COLUMN),
        fall: text(record, FALL_COLUMN),
        mass: parse_float(cell(record, MASS_COLUMN)),
        year: parse_number::<i32>(cell(record, YEAR_COLUMN)),
        reclat: parse_float(cell(record, RECLAT_COLUMN)),
        reclong: parse_float(cell(record, RECLONG_COLUMN)),
    })
}

fn cell(record: &StringRecord, index: usize) -> Option<&str> {
    record.get(index).filter(|value| !value.is_empty())
}

fn text(record: &StringRecord, index: usize) -> Option<String> {
    cell(record, index).map(str::to_string)
}

fn parse_number<T: FromStr>(value: Option<&str>) -> Option<T> {
    value.and_then(|raw| raw.trim().parse().ok())
}

fn parse_float(value: Option<&str>) -> Option<f64> {
    parse_number::<f64>(value).filter(|number| number.is_finite())
}
