use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::AppError;
use crate::models::Product;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;
pub const MAX_LIMIT: u64 = 100;

/// Columns a product list may be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Id,
    Title,
    Price,
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    /// Name used in the query string.
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::Title => "title",
            SortField::Price => "price",
            SortField::CreatedAt => "createdAt",
            SortField::UpdatedAt => "updatedAt",
        }
    }

    /// Name of the backing database column.
    pub fn column(&self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::Title => "title",
            SortField::Price => "price",
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
        }
    }

    /// Compare two products on this field alone.
    pub fn compare(&self, a: &Product, b: &Product) -> Ordering {
        match self {
            SortField::Id => a.id.cmp(&b.id),
            SortField::Title => a.title.cmp(&b.title),
            SortField::Price => a.price.total_cmp(&b.price),
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(SortField::Id),
            "title" => Ok(SortField::Title),
            "price" => Ok(SortField::Price),
            "createdAt" => Ok(SortField::CreatedAt),
            "updatedAt" => Ok(SortField::UpdatedAt),
            _ => Err(format!("Unknown sort field: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }

    pub fn apply(&self, ordering: Ordering) -> Ordering {
        match self {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ASC" => Ok(SortOrder::Asc),
            "DESC" => Ok(SortOrder::Desc),
            _ => Err(format!("Unknown sort order: {s}")),
        }
    }
}

/// Parameters of a product list request.
///
/// Ties on the sort field are broken by `id` ascending so pages are stable.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductQuery {
    pub page: u64,
    pub limit: u64,
    pub sort: SortField,
    pub order: SortOrder,
    /// Case-insensitive substring matched against title or description.
    pub keyword: Option<String>,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            sort: SortField::CreatedAt,
            order: SortOrder::Desc,
            keyword: None,
        }
    }
}

impl ProductQuery {
    /// Build from already-validated query parameters, filling in defaults.
    pub fn from_params(params: &Map<String, Value>) -> Result<Self, AppError> {
        let mut query = Self::default();

        if let Some(raw) = param(params, "page") {
            query.page = raw
                .parse::<u64>()
                .ok()
                .filter(|page| *page >= 1)
                .ok_or_else(|| {
                    AppError::invalid_field("page", "Page must be a positive integer", raw.into())
                })?;
        }
        if let Some(raw) = param(params, "limit") {
            query.limit = raw
                .parse::<u64>()
                .ok()
                .filter(|limit| (1..=MAX_LIMIT).contains(limit))
                .ok_or_else(|| {
                    AppError::invalid_field("limit", "Limit must be between 1 and 100", raw.into())
                })?;
        }
        if let Some(raw) = param(params, "sort") {
            query.sort = raw
                .parse()
                .map_err(|e: String| AppError::invalid_field("sort", e, raw.into()))?;
        }
        if let Some(raw) = param(params, "order") {
            query.order = raw
                .parse()
                .map_err(|e: String| AppError::invalid_field("order", e, raw.into()))?;
        }
        query.keyword = param(params, "keyword")
            .filter(|k| !k.is_empty())
            .map(str::to_string);

        Ok(query)
    }

    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }

    /// Whether a product matches the keyword filter (always true without one).
    pub fn matches(&self, product: &Product) -> bool {
        match &self.keyword {
            None => true,
            Some(keyword) => {
                let needle = keyword.to_lowercase();
                product.title.to_lowercase().contains(&needle)
                    || product.description.to_lowercase().contains(&needle)
            }
        }
    }

    /// Total order used for listing: sort field in the requested direction, then id ascending.
    pub fn compare(&self, a: &Product, b: &Product) -> Ordering {
        self.order
            .apply(self.sort.compare(a, b))
            .then_with(|| a.id.cmp(&b.id))
    }
}

fn param<'a>(params: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    params.get(key).and_then(Value::as_str).map(str::trim)
}

/// One page of results plus the unpaginated match count.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

/// Pagination metadata returned alongside a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u64,
    pub total_pages: u64,
    pub total_items: u64,
    pub items_per_page: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl Pagination {
    pub fn new(page: u64, limit: u64, total: u64) -> Self {
        let total_pages = total.div_ceil(limit.max(1));
        Self {
            current_page: page,
            total_pages,
            total_items: total,
            items_per_page: limit,
            has_next_page: page < total_pages,
            has_prev_page: page > 1,
        }
    }
}
