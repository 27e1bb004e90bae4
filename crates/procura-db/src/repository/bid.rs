//! SurrealDB implementation of [`BidRepository`].

use chrono::{DateTime, Utc};
use procura_core::error::ProcuraResult;
use procura_core::models::bid::{Bid, BidPatch, BidSnapshot, BidStatus, CreateBid};
use procura_core::repository::{BidAudience, BidRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::CountRow;
use crate::error::{DbError, parse_uuid};
use crate::tx::{self, Guard};

#[derive(Debug, SurrealValue)]
pub(super) struct BidRow {
    record_id: String,
    name: String,
    description: String,
    status: String,
    tender_id: String,
    author_type: String,
    author_id: String,
    version: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BidRow {
    pub(super) fn try_into_bid(self) -> Result<Bid, DbError> {
        Ok(Bid {
            id: parse_uuid(&self.record_id, "bid")?,
            name: self.name,
            description: self.description,
            status: self
                .status
                .parse()
                .map_err(|e| DbError::Decode(format!("{e}")))?,
            tender_id: parse_uuid(&self.tender_id, "tender")?,
            author_type: self
                .author_type
                .parse()
                .map_err(|e| DbError::Decode(format!("{e}")))?,
            author_id: parse_uuid(&self.author_id, "employee")?,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct SnapshotRow {
    bid_id: String,
    version: u32,
    name: String,
    description: String,
    status: String,
    archived_at: DateTime<Utc>,
}

impl SnapshotRow {
    fn try_into_snapshot(self) -> Result<BidSnapshot, DbError> {
        Ok(BidSnapshot {
            bid_id: parse_uuid(&self.bid_id, "bid")?,
            version: self.version,
            name: self.name,
            description: self.description,
            status: self
                .status
                .parse()
                .map_err(|e| DbError::Decode(format!("{e}")))?,
            archived_at: self.archived_at,
        })
    }
}

/// Loads `$row` and rejects missing or frozen bids.
fn open_row_prelude() -> String {
    format!(
        "LET $row = (SELECT * FROM type::record('bid', $id))[0]; \
         IF !$row {{ THROW '{missing}'; }}; \
         IF $row.status INSIDE ['Canceled', 'Approved', 'Rejected'] {{ \
            THROW '{terminal}'; \
         }};",
        missing = Guard::Missing.marker(),
        terminal = Guard::BidTerminal.marker(),
    )
}

/// Archives `$row` under its current version.
pub(super) const ARCHIVE_ROW: &str = "\
    CREATE bid_archive SET \
    bid_id = meta::id($row.id), version = $row.version, \
    name = $row.name, description = $row.description, \
    status = $row.status;";

/// The viewer sees bids written by its own members plus, when it owns
/// the tender, every published bid.
const AUDIENCE_CLAUSE: &str = "\
    tender_id = $tender_id AND (\
        author_id INSIDE (\
            SELECT VALUE meta::id(in) FROM responsible_for \
            WHERE out = type::record('organization', $organization_id)\
        ) \
        OR ($owns_tender AND status = 'Published')\
    )";

/// SurrealDB implementation of the Bid repository.
#[derive(Clone)]
pub struct SurrealBidRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealBidRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn mutate(
        &self,
        id: Uuid,
        body: String,
        binds: Vec<(&'static str, String)>,
        version: Option<u32>,
    ) -> ProcuraResult<Bid> {
        let query = format!(
            "BEGIN TRANSACTION; {prelude} {body} COMMIT TRANSACTION;",
            prelude = open_row_prelude(),
        );

        let mut builder = self.db.query(query).bind(("id", id.to_string()));
        for bind in binds {
            builder = builder.bind(bind);
        }
        if let Some(v) = version {
            builder = builder.bind(("version", v));
        }

        let mut response = builder
            .await
            .map_err(|e| tx::into_db_error(tx::from_send_error(e), "bid", id, version))?;
        tx::outcome(response.take_errors())
            .map_err(|f| tx::into_db_error(f, "bid", id, version))?;

        self.get_by_id(id).await
    }
}

impl<C: Connection> BidRepository for SurrealBidRepository<C> {
    async fn create(&self, input: CreateBid) -> ProcuraResult<Bid> {
        let id = Uuid::new_v4();

        self.db
            .query(
                "CREATE type::record('bid', $id) SET \
                 name = $name, description = $description, \
                 status = 'Created', tender_id = $tender_id, \
                 author_type = $author_type, author_id = $author_id, \
                 version = 1",
            )
            .bind(("id", id.to_string()))
            .bind(("name", input.name))
            .bind(("description", input.description))
            .bind(("tender_id", input.tender_id.to_string()))
            .bind(("author_type", input.author_type.as_str()))
            .bind(("author_id", input.author_id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        self.get_by_id(id).await
    }

    async fn get_by_id(&self, id: Uuid) -> ProcuraResult<Bid> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM type::record('bid', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<BidRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "bid".into(),
            id: id_str,
        })?;

        Ok(row.try_into_bid()?)
    }

    async fn list_by_author(
        &self,
        author_id: Uuid,
        pagination: Pagination,
    ) -> ProcuraResult<PaginatedResult<Bid>> {
        let author_str = author_id.to_string();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM bid \
                 WHERE author_id = $author_id GROUP ALL",
            )
            .bind(("author_id", author_str.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM bid \
                 WHERE author_id = $author_id \
                 ORDER BY name ASC, created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("author_id", author_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<BidRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_bid())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn list_for_tender(
        &self,
        tender_id: Uuid,
        audience: BidAudience,
        pagination: Pagination,
    ) -> ProcuraResult<PaginatedResult<Bid>> {
        let tender_str = tender_id.to_string();
        let org_str = audience.organization_id.to_string();

        let mut count_result = self
            .db
            .query(format!(
                "SELECT count() AS total FROM bid WHERE {AUDIENCE_CLAUSE} GROUP ALL"
            ))
            .bind(("tender_id", tender_str.clone()))
            .bind(("organization_id", org_str.clone()))
            .bind(("owns_tender", audience.owns_tender))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(format!(
                "SELECT meta::id(id) AS record_id, * FROM bid \
                 WHERE {AUDIENCE_CLAUSE} \
                 ORDER BY name ASC, created_at ASC \
                 LIMIT $limit START $offset"
            ))
            .bind(("tender_id", tender_str))
            .bind(("organization_id", org_str))
            .bind(("owns_tender", audience.owns_tender))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<BidRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_bid())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn update_status(&self, id: Uuid, status: BidStatus) -> ProcuraResult<Bid> {
        let body = format!(
            "{ARCHIVE_ROW} \
             UPDATE type::record('bid', $id) SET \
             status = $status, version += 1, updated_at = time::now();"
        );
        self.mutate(id, body, vec![("status", status.as_str().to_string())], None)
            .await
    }

    async fn update(&self, id: Uuid, patch: BidPatch) -> ProcuraResult<Bid> {
        let mut sets = Vec::new();
        let mut binds = Vec::new();
        if let Some(name) = patch.name {
            sets.push("name = $name");
            binds.push(("name", name));
        }
        if let Some(description) = patch.description {
            sets.push("description = $description");
            binds.push(("description", description));
        }
        sets.push("version += 1");
        sets.push("updated_at = time::now()");

        let body = format!(
            "{ARCHIVE_ROW} UPDATE type::record('bid', $id) SET {};",
            sets.join(", ")
        );
        self.mutate(id, body, binds, None).await
    }

    async fn rollback(&self, id: Uuid, version: u32) -> ProcuraResult<Bid> {
        let body = format!(
            "LET $snap = (SELECT * FROM bid_archive \
                WHERE bid_id = $id AND version = $version)[0]; \
             IF !$snap {{ THROW '{missing}'; }}; \
             {ARCHIVE_ROW} \
             UPDATE type::record('bid', $id) SET \
                name = $snap.name, description = $snap.description, \
                status = $snap.status, \
                version += 1, updated_at = time::now();",
            missing = Guard::VersionMissing.marker(),
        );
        self.mutate(id, body, Vec::new(), Some(version)).await
    }

    async fn get_version(&self, id: Uuid, version: u32) -> ProcuraResult<BidSnapshot> {
        let mut result = self
            .db
            .query(
                "SELECT * FROM bid_archive \
                 WHERE bid_id = $id AND version = $version",
            )
            .bind(("id", id.to_string()))
            .bind(("version", version))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SnapshotRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::VersionNotFound {
                entity: "bid".into(),
                id: id.to_string(),
                version,
            })?;

        Ok(row.try_into_snapshot()?)
    }

    async fn list_versions(&self, id: Uuid) -> ProcuraResult<Vec<BidSnapshot>> {
        let mut result = self
            .db
            .query(
                "SELECT * FROM bid_archive \
                 WHERE bid_id = $id ORDER BY version ASC",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SnapshotRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows
            .into_iter()
            .map(|row| row.try_into_snapshot())
            .collect::<Result<Vec<_>, DbError>>()?)
    }
}
