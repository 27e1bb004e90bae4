//! Bid visibility rules.
//!
//! Two independent grants decide what a viewer sees of a bid: acting
//! for the bid's author, and owning the tender the bid answers. The
//! store evaluates the same two grants when it lists bids (see
//! [`audience`]).

use procura_core::models::bid::BidStatus;
use procura_core::models::tender::Tender;
use procura_core::repository::BidAudience;
use uuid::Uuid;

/// How a viewer relates to one bid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BidRelation {
    /// The viewer is the author or a responsible of the author's
    /// organization.
    pub author_side: bool,
    /// The viewer is a responsible of the tender's organization.
    pub owns_tender: bool,
}

impl BidRelation {
    /// First grant: the author side sees its bid in any status.
    pub fn authored_by_viewer(&self) -> bool {
        self.author_side
    }

    /// Second grant: the tender owner sees published bids.
    pub fn visible_to_tender_owner(&self, status: BidStatus) -> bool {
        self.owns_tender && status == BidStatus::Published
    }

    /// Whether the bid shows up in the viewer's listing of the tender.
    pub fn can_list(&self, status: BidStatus) -> bool {
        self.authored_by_viewer() || self.visible_to_tender_owner(status)
    }

    /// Status reads are wider for the owner than listings: anything that
    /// has left draft and was not withdrawn.
    pub fn can_read_status(&self, status: BidStatus) -> bool {
        self.authored_by_viewer() || (self.owns_tender && status_readable_by_owner(status))
    }
}

pub fn status_readable_by_owner(status: BidStatus) -> bool {
    !matches!(status, BidStatus::Created | BidStatus::Canceled)
}

/// Listing filter for `viewer_org` on `tender`.
pub fn audience(viewer_org: Uuid, tender: &Tender) -> BidAudience {
    BidAudience {
        organization_id: viewer_org,
        owns_tender: tender.organization_id == viewer_org,
    }
}
