use serde::{Deserialize, Serialize};

/// Paginated response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub meta: PaginationMeta,
}

/// Pagination metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PaginationMeta {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, page: i64, limit: i64, total: i64) -> Self {
        let total_pages = if limit > 0 {
            (total + limit - 1) / limit
        } else {
            1
        };
        let has_next = page < total_pages;
        let has_prev = page > 1;

        Self {
            data: items,
            meta: PaginationMeta {
                page,
                limit,
                total,
                total_pages,
                has_next,
                has_prev,
            },
        }
    }
}

/// Helper to normalize pagination params with safe defaults.
pub fn normalize_pagination(page: Option<i64>, limit: Option<i64>) -> (i64, i64) {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(10).clamp(1, 100);
    (page, limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_meta_math() {
        let page = PaginatedResponse::new(vec![1, 2, 3], 2, 3, 7);
        assert_eq!(page.meta.total_pages, 3);
        assert!(page.meta.has_next);
        assert!(page.meta.has_prev);

        let last = PaginatedResponse::new(vec![7], 3, 3, 7);
        assert!(!last.meta.has_next);
    }

    #[test]
    fn empty_result_has_single_phantom_page() {
        let page = PaginatedResponse::<i64>::new(vec![], 1, 10, 0);
        assert_eq!(page.meta.total_pages, 0);
        assert!(!page.meta.has_next);
        assert!(!page.meta.has_prev);
    }

    #[test]
    fn normalize_pagination_clamps() {
        assert_eq!(normalize_pagination(None, None), (1, 10));
        assert_eq!(normalize_pagination(Some(0), Some(0)), (1, 1));
        assert_eq!(normalize_pagination(Some(-3), Some(1000)), (1, 100));
        assert_eq!(normalize_pagination(Some(4), Some(25)), (4, 25));
    }
}
