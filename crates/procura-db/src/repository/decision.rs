//! SurrealDB implementation of [`DecisionRepository`].
//!
//! Votes live in `bid_approval`, keyed by `[bid_id, voter_id]` so a
//! repeated vote overwrites itself instead of adding a row. The vote,
//! the count, the quorum evaluation and the approve-and-close cascade
//! run in a single transaction that also writes the bid row
//! (`approvals`), so two voters on the same bid conflict at commit time
//! instead of both observing a stale count.

use procura_core::error::ProcuraResult;
use procura_core::models::bid::{Bid, BidStatus, VoteOutcome};
use procura_core::repository::DecisionRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;
use uuid::Uuid;

use super::CountRow;
use super::bid::{ARCHIVE_ROW as ARCHIVE_BID, BidRow};
use super::tender::ARCHIVE_ROW as ARCHIVE_TENDER;
use crate::error::DbError;
use crate::tx::{self, Guard};

#[derive(Debug, SurrealValue)]
struct TallyRow {
    approvals: u64,
    approval_quorum: Option<u64>,
}

/// Loads `$bid` and `$tender` and checks the decision preconditions.
fn decision_prelude() -> String {
    format!(
        "LET $bid = (SELECT * FROM type::record('bid', $bid_id))[0]; \
         IF !$bid {{ THROW '{missing}'; }}; \
         IF $bid.status != 'Published' {{ THROW '{not_published}'; }}; \
         LET $tender = (SELECT * FROM type::record('tender', $bid.tender_id))[0]; \
         IF !$tender {{ THROW '{tender_missing}:' + $bid.tender_id; }}; \
         IF $tender.status = 'Closed' {{ THROW '{closed}:' + $bid.tender_id; }};",
        missing = Guard::Missing.marker(),
        tender_missing = Guard::TenderMissing.marker(),
        not_published = Guard::BidNotPublished.marker(),
        closed = Guard::TenderClosed.marker(),
    )
}

/// SurrealDB implementation of the decision store.
#[derive(Clone)]
pub struct SurrealDecisionRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealDecisionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn load_bid(&self, bid_id: Uuid) -> Result<(Bid, TallyRow), DbError> {
        let id_str = bid_id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM type::record('bid', $id); \
                 SELECT approvals, approval_quorum FROM type::record('bid', $id);",
            )
            .bind(("id", id_str.clone()))
            .await?;

        let rows: Vec<BidRow> = result.take(0)?;
        let tallies: Vec<TallyRow> = result.take(1)?;
        let not_found = || DbError::NotFound {
            entity: "bid".into(),
            id: id_str.clone(),
        };
        let bid = rows.into_iter().next().ok_or_else(not_found)?.try_into_bid()?;
        let tally = tallies.into_iter().next().ok_or_else(not_found)?;
        Ok((bid, tally))
    }
}

impl<C: Connection> DecisionRepository for SurrealDecisionRepository<C> {
    async fn reject(&self, bid_id: Uuid) -> ProcuraResult<Bid> {
        let query = format!(
            "BEGIN TRANSACTION; \
             {prelude} \
             LET $row = $bid; \
             {ARCHIVE_BID} \
             UPDATE type::record('bid', $bid_id) SET \
                status = 'Rejected', version += 1, updated_at = time::now(); \
             COMMIT TRANSACTION;",
            prelude = decision_prelude(),
        );

        let mut response = self
            .db
            .query(query)
            .bind(("bid_id", bid_id.to_string()))
            .await
            .map_err(|e| tx::into_db_error(tx::from_send_error(e), "bid", bid_id, None))?;
        tx::outcome(response.take_errors())
            .map_err(|f| tx::into_db_error(f, "bid", bid_id, None))?;

        let (bid, _) = self.load_bid(bid_id).await?;
        Ok(bid)
    }

    async fn record_approval(
        &self,
        bid_id: Uuid,
        voter_id: Uuid,
        max_quorum: u64,
    ) -> ProcuraResult<VoteOutcome> {
        let query = format!(
            "BEGIN TRANSACTION; \
             {prelude} \
             UPSERT type::record('bid_approval', [$bid_id, $voter_id]) SET \
                bid_id = $bid_id, voter_id = $voter_id; \
             LET $votes = count(SELECT VALUE id FROM bid_approval WHERE bid_id = $bid_id); \
             LET $responsible = count(SELECT VALUE id FROM responsible_for \
                WHERE out = type::record('organization', $tender.organization_id)); \
             LET $quorum = math::min([$max_quorum, $responsible]); \
             UPDATE type::record('bid', $bid_id) SET \
                approvals = $votes, approval_quorum = $quorum; \
             IF $votes >= $quorum {{ \
                LET $row = $bid; \
                {ARCHIVE_BID} \
                UPDATE type::record('bid', $bid_id) SET \
                    status = 'Approved', version += 1, updated_at = time::now(); \
                LET $row = $tender; \
                {ARCHIVE_TENDER} \
                UPDATE $tender.id SET \
                    status = 'Closed', version += 1, updated_at = time::now(); \
             }}; \
             COMMIT TRANSACTION;",
            prelude = decision_prelude(),
        );

        let mut response = self
            .db
            .query(query)
            .bind(("bid_id", bid_id.to_string()))
            .bind(("voter_id", voter_id.to_string()))
            .bind(("max_quorum", max_quorum))
            .await
            .map_err(|e| tx::into_db_error(tx::from_send_error(e), "bid", bid_id, None))?;
        tx::outcome(response.take_errors())
            .map_err(|f| tx::into_db_error(f, "bid", bid_id, None))?;

        let (bid, tally) = self.load_bid(bid_id).await?;
        let quorum = tally.approval_quorum.unwrap_or(max_quorum);
        let finalized = bid.status == BidStatus::Approved;

        if finalized {
            info!(
                bid_id = %bid_id,
                tender_id = %bid.tender_id,
                votes = tally.approvals,
                quorum,
                "Quorum reached, bid approved and tender closed"
            );
        }

        Ok(VoteOutcome {
            bid,
            votes: tally.approvals,
            quorum,
            finalized,
        })
    }

    async fn approval_count(&self, bid_id: Uuid) -> ProcuraResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM bid_approval \
                 WHERE bid_id = $bid_id GROUP ALL",
            )
            .bind(("bid_id", bid_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }
}
