pub mod comments;
pub mod likes;
pub mod playlists;
pub mod subscriptions;
pub mod videos;

use uuid::Uuid;

use crate::config;
use crate::error::ApiError;

/// Parse a path identifier, rejecting malformed input before any store
/// round-trip
pub fn parse_id(raw: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::bad_request(format!("Invalid {} id", what)))
}

#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub offset: i64,
}

pub fn pagination(page: Option<i64>, limit: Option<i64>) -> Pagination {
    let api = &config::config().api;
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(api.default_page_size).clamp(1, api.max_page_size);
    Pagination {
        page,
        limit,
        offset: (page - 1) * limit,
    }
}

pub fn total_pages(total: i64, limit: i64) -> i64 {
    if total == 0 {
        0
    } else {
        (total + limit - 1) / limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_ids_without_touching_the_store() {
        assert_eq!(parse_id("not-a-uuid", "video").unwrap_err().status_code(), 400);
        assert!(parse_id("e58ed763-928c-4155-bee9-fdbaaadc15f3", "video").is_ok());
    }

    #[test]
    fn pagination_clamps_and_offsets() {
        let p = pagination(Some(3), Some(10));
        assert_eq!((p.page, p.limit, p.offset), (3, 10, 20));

        let p = pagination(Some(-1), Some(0));
        assert_eq!((p.page, p.limit, p.offset), (1, 1, 0));
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(20, 10), 2);
    }
}
