use serde::Serialize;

use crate::{
    config::PaginationConfig,
    error::{Error, Result},
};

/// Resolved page-number pagination: 1-based `page`, clamped `limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    pub fn resolve(page: Option<i64>, limit: Option<i64>, config: &PaginationConfig) -> Self {
        let limit = match limit {
            Some(limit) if limit > 0 => limit.min(config.max_limit),
            _ => config.default_limit,
        };

        Self {
            page: page.filter(|page| *page > 0).unwrap_or(1),
            limit,
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub count: i64,
    pub next: Option<i64>,
    pub previous: Option<i64>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// `total_rows` is the size of the whole filtered set, usually read from a
    /// `COUNT(*) OVER()` column on the first row. A page past the end is
    /// `NotFound`; only the first page may be empty.
    pub fn from_rows(rows: Vec<T>, total_rows: i64, request: PageRequest) -> Result<Self> {
        if rows.is_empty() {
            if request.page == 1 {
                return Ok(Self::no_rows());
            }
            return Err(Error::NotFound(String::from("Invalid page.")));
        }

        let shown = request.offset() + rows.len() as i64;
        let next = (shown < total_rows).then_some(request.page + 1);
        let previous = (request.page > 1).then_some(request.page - 1);

        Ok(Self {
            count: total_rows,
            next,
            previous,
            results: rows,
        })
    }

    pub fn no_rows() -> Self {
        Self {
            count: 0,
            next: None,
            previous: None,
            results: vec![],
        }
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            count: self.count,
            next: self.next,
            previous: self.previous,
            results: self.results.into_iter().map(f).collect(),
        }
    }
}
