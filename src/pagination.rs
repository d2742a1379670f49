use crate::{config::AppConfig, errors::ServiceError};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Raw `page`/`limit` query parameters
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// Page number, starting at 1 (default: 1)
    pub page: Option<u64>,
    /// Items per page (default: 20, capped at the configured maximum)
    pub limit: Option<u64>,
}

impl PaginationParams {
    /// Applies defaults and bounds. Zero page or limit is rejected, an
    /// oversized limit is clamped.
    pub fn resolve(&self, config: &AppConfig) -> Result<PageRequest, ServiceError> {
        PageRequest::new(
            self.page,
            self.limit,
            config.default_page_size,
            config.max_page_size,
        )
    }
}

/// Validated page window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl PageRequest {
    pub fn new(
        page: Option<u64>,
        limit: Option<u64>,
        default_limit: u64,
        max_limit: u64,
    ) -> Result<Self, ServiceError> {
        let page = page.unwrap_or(1);
        if page == 0 {
            return Err(ServiceError::BadRequest("page must be at least 1".into()));
        }
        let limit = limit.unwrap_or(default_limit);
        if limit == 0 {
            return Err(ServiceError::BadRequest("limit must be at least 1".into()));
        }
        Ok(Self {
            page,
            limit: limit.min(max_limit.max(1)),
        })
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// Zero-based page index as used by sea-orm paginators.
    pub fn index(&self) -> u64 {
        self.page - 1
    }

    pub fn meta(&self, total_count: u64) -> PaginationMeta {
        PaginationMeta::new(self.page, self.limit, total_count)
    }
}

/// Pagination block of every list response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    pub page: u64,
    pub limit: u64,
    pub total_count: u64,
    pub total_pages: u64,
}

impl PaginationMeta {
    pub fn new(page: u64, limit: u64, total_count: u64) -> Self {
        let total_pages = if total_count == 0 {
            0
        } else {
            total_count.div_ceil(limit)
        };
        Self {
            page,
            limit,
            total_count,
            total_pages,
        }
    }
}

/// A page of items plus its metadata, as returned by services.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total_count: u64) -> Self {
        Self {
            items,
            pagination: request.meta(total_count),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use proptest::prelude::*;

    #[test]
    fn defaults_apply() {
        let req = PageRequest::new(None, None, 20, 100).unwrap();
        assert_eq!(req, PageRequest { page: 1, limit: 20 });
        assert_eq!(req.offset(), 0);
    }

    #[test]
    fn zero_values_are_rejected() {
        assert_matches!(
            PageRequest::new(Some(0), None, 20, 100),
            Err(ServiceError::BadRequest(_))
        );
        assert_matches!(
            PageRequest::new(None, Some(0), 20, 100),
            Err(ServiceError::BadRequest(_))
        );
    }

    #[test]
    fn oversized_limit_is_clamped() {
        let req = PageRequest::new(Some(3), Some(5000), 20, 100).unwrap();
        assert_eq!(req.limit, 100);
        assert_eq!(req.offset(), 200);
    }

    #[test]
    fn meta_serializes_camel_case() {
        let json = serde_json::to_value(PaginationMeta::new(2, 10, 25)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"page": 2, "limit": 10, "totalCount": 25, "totalPages": 3})
        );
    }

    #[test]
    fn empty_result_has_no_pages() {
        assert_eq!(PaginationMeta::new(1, 20, 0).total_pages, 0);
    }

    proptest! {
        #[test]
        fn total_pages_is_ceiling(total in 0u64..10_000, limit in 1u64..500) {
            let meta = PaginationMeta::new(1, limit, total);
            prop_assert_eq!(meta.total_pages, (total + limit - 1) / limit);
            prop_assert!(meta.total_pages * limit >= total);
            if total > 0 {
                prop_assert!((meta.total_pages - 1) * limit < total);
            }
        }

        #[test]
        fn pages_tile_the_result_set(total in 0u64..2_000, limit in 1u64..100) {
            let meta = PaginationMeta::new(1, limit, total);
            let covered: u64 = (1..=meta.total_pages)
                .map(|page| {
                    let req = PageRequest { page, limit };
                    total.saturating_sub(req.offset()).min(limit)
                })
                .sum();
            prop_assert_eq!(covered, total);
        }
    }
}
