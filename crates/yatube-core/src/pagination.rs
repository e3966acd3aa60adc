//! Limit/offset pagination.

use serde::Serialize;

const MAX_OFFSET: u64 = i64::MAX as u64;

/// Page size settings.
#[derive(Debug, Clone, Copy)]
pub struct PaginationConfig {
    pub default_limit: u64,
    pub max_limit: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 100,
        }
    }
}

/// Requested window of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: u64,
    pub offset: u64,
}

impl PageRequest {
    /// Build a request from raw query values.
    ///
    /// Unparsable or non-positive limits fall back to the default, limits
    /// above the maximum are clamped, and a bad offset means 0. Offsets
    /// never exceed `i64::MAX` so they always fit a SQL `BIGINT`.
    pub fn from_query(limit: Option<&str>, offset: Option<&str>, config: PaginationConfig) -> Self {
        let limit = limit
            .and_then(|s| s.trim().parse::<u64>().ok())
            .filter(|&l| l > 0)
            .unwrap_or(config.default_limit)
            .min(config.max_limit.max(1));
        let offset = offset
            .and_then(|s| s.trim().parse::<u64>().ok())
            .unwrap_or(0)
            .min(MAX_OFFSET);

        Self { limit, offset }
    }

    /// Offset of the following page, if there is one.
    pub fn next_offset(&self, count: u64) -> Option<u64> {
        let next = self.offset.checked_add(self.limit)?;
        (next < count).then_some(next)
    }

    /// Offset of the preceding page, if there is one.
    pub fn previous_offset(&self) -> Option<u64> {
        (self.offset > 0).then(|| self.offset.saturating_sub(self.limit))
    }
}

/// One window of a listing plus the total number of rows.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub count: u64,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            count: self.count,
            items: self.items.into_iter().map(f).collect(),
        }
    }
}
