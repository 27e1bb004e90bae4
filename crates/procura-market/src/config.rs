//! Marketplace configuration.

use procura_core::repository::{DEFAULT_PAGE_LIMIT, Pagination};

/// Tunables shared by the lifecycle services.
#[derive(Debug, Clone)]
pub struct MarketConfig {
    /// Page size used when the caller omits `limit` (default: 5).
    pub default_page_limit: u64,
    /// Upper bound applied to any caller-supplied `limit` (default: 100).
    pub max_page_limit: u64,
    /// Cap on the number of approve votes needed to accept a bid
    /// (default: 3). The effective quorum is
    /// `min(max_quorum, responsible count)`.
    pub max_quorum: u64,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            default_page_limit: DEFAULT_PAGE_LIMIT,
            max_page_limit: 100,
            max_quorum: 3,
        }
    }
}

impl MarketConfig {
    /// Parse raw query values into a clamped page.
    pub fn page(&self, limit: Option<&str>, offset: Option<&str>) -> Pagination {
        Pagination::from_query(limit, offset, self.default_page_limit)
            .clamp_limit(self.max_page_limit)
    }

    pub(crate) fn clamp(&self, pagination: Pagination) -> Pagination {
        pagination.clamp_limit(self.max_page_limit)
    }

    /// Quorum for an organization with `responsibles` members.
    pub fn quorum_for(&self, responsibles: u64) -> u64 {
        self.max_quorum.min(responsibles)
    }
}
