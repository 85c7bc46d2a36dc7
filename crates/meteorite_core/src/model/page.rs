//! Page request and page envelope types.
//!
//! # Responsibility
//! - Normalize `page`/`size`/`sort` inputs into a bounded request.
//! - Carry one page of results plus total-count metadata.
//!
//! # Invariants
//! - `size` is always within `1..=MAX_PAGE_SIZE`.
//! - Sort properties are restricted to record columns.

use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 2000;

/// Sortable record columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortProperty {
    Id,
    Name,
    Recclass,
    Fall,
    Mass,
    Year,
    Reclat,
    Reclong,
}

impl SortProperty {
    /// Column name in the `meteorites` table.
    pub fn column(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Recclass => "recclass",
            Self::Fall => "fall",
            Self::Mass => "mass",
            Self::Year => "year",
            Self::Reclat => "reclat",
            Self::Reclong => "reclong",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "id" => Some(Self::Id),
            "name" => Some(Self::Name),
            "recclass" => Some(Self::Recclass),
            "fall" => Some(Self::Fall),
            "mass" => Some(Self::Mass),
            "year" => Some(Self::Year),
            "reclat" => Some(Self::Reclat),
            "reclong" => Some(Self::Reclong),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Ordered sort keys; all properties share one direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    pub properties: Vec<SortProperty>,
    pub direction: SortDirection,
}

impl Sort {
    pub fn by(property: SortProperty, direction: SortDirection) -> Self {
        Self {
            properties: vec![property],
            direction,
        }
    }

    /// Parses `property[,property...][,asc|desc]`.
    ///
    /// Returns `Ok(None)` for blank input.
    pub fn parse(value: &str) -> Result<Option<Self>, PageError> {
        let mut tokens: Vec<&str> = value
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .collect();

        let direction = match tokens.last().map(|token| token.to_ascii_lowercase()) {
            Some(last) if last == "asc" => {
                tokens.pop();
                SortDirection::Asc
            }
            Some(last) if last == "desc" => {
                tokens.pop();
                SortDirection::Desc
            }
            _ => SortDirection::Asc,
        };

        if tokens.is_empty() {
            return Ok(None);
        }

        let properties = tokens
            .into_iter()
            .map(|token| {
                SortProperty::parse(token)
                    .ok_or_else(|| PageError::UnknownSortProperty(token.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(Self {
            properties,
            direction,
        }))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    UnknownSortProperty(String),
}

impl Display for PageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownSortProperty(name) => {
                write!(f, "unknown sort property `{name}`")
            }
        }
    }
}

impl Error for PageError {}

/// Bounded slice request: zero-based page index, page size and sort order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
    pub sort: Option<Sort>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
            sort: None,
        }
    }
}

impl PageRequest {
    /// Builds a request, falling back to defaults for missing or zero size and
    /// clamping oversized pages to [`MAX_PAGE_SIZE`].
    pub fn new(page: Option<u32>, size: Option<u32>, sort: Option<Sort>) -> Self {
        let size = match size {
            None | Some(0) => DEFAULT_PAGE_SIZE,
            Some(value) => value.min(MAX_PAGE_SIZE),
        };
        Self {
            page: page.unwrap_or(0),
            size,
            sort,
        }
    }

    /// Like [`PageRequest::new`] but parses a raw `sort` parameter.
    pub fn parse(
        page: Option<u32>,
        size: Option<u32>,
        sort: Option<&str>,
    ) -> Result<Self, PageError> {
        let sort = match sort {
            Some(raw) => Sort::parse(raw)?,
            None => None,
        };
        Ok(Self::new(page, size, sort))
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page) * u64::from(self.size)
    }
}

/// One page of results plus total-count metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_elements: u64,
    pub total_pages: u64,
    pub size: u32,
    pub number: u32,
    pub number_of_elements: usize,
    pub first: bool,
    pub last: bool,
    pub empty: bool,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: &PageRequest, total_elements: u64) -> Self {
        let size = request.size.max(1);
        let total_pages = total_elements.div_ceil(u64::from(size));
        let number = request.page;
        Self {
            number_of_elements: content.len(),
            empty: content.is_empty(),
            first: number == 0,
            last: u64::from(number) + 1 >= total_pages,
            content,
            total_elements,
            total_pages,
            size,
            number,
        }
    }
}
