//! JSON bodies exchanged with the mock backend.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use dronewatch_core::DetectionEvent;

/// One page of a listing, `page` is 1-indexed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub status: u16,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub pages: usize,
    pub data: Vec<T>,
}

impl<T: Clone> Page<T> {
    /// Slices `items` for the requested page. Pages past the end are empty.
    pub fn slice(items: &[T], request: PageRequest) -> Self {
        let total = items.len();
        let start = (request.page - 1).saturating_mul(request.limit);
        let data = items
            .iter()
            .skip(start)
            .take(request.limit)
            .cloned()
            .collect();
        Self {
            status: 200,
            total,
            page: request.page,
            limit: request.limit,
            pages: total.div_ceil(request.limit),
            data,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub limit: usize,
}

impl PageRequest {
    /// Zero values are bumped to 1.
    pub fn new(page: usize, limit: usize) -> Self {
        Self {
            page: page.max(1),
            limit: limit.max(1),
        }
    }

    /// Reads `page` and `limit` from a query string map. Missing, non-numeric
    /// and non-positive values fall back to page 1 and `default_limit`.
    pub fn from_query(query: &HashMap<String, String>, default_limit: usize) -> Self {
        let positive = |key: &str| {
            query
                .get(key)
                .and_then(|v| v.trim().parse::<usize>().ok())
                .filter(|v| *v > 0)
        };
        Self::new(
            positive("page").unwrap_or(1),
            positive("limit").unwrap_or(default_limit),
        )
    }
}

/// Response to `DELETE /api/v1/detections/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deleted {
    pub status: u16,
    pub message: String,
    pub deleted: DetectionEvent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
