//! SurrealDB implementation of [`TenderRepository`].
//!
//! Every version-bumping mutation runs in one transaction that loads the
//! current row, checks it is not closed, archives it into
//! `tender_archive` under its current version, then rewrites it with
//! `version + 1`.

use chrono::{DateTime, Utc};
use procura_core::error::ProcuraResult;
use procura_core::models::tender::{
    CreateTender, ServiceTypeFilter, Tender, TenderPatch, TenderSnapshot, TenderStatus,
};
use procura_core::repository::{PaginatedResult, Pagination, TenderRepository};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;
use uuid::Uuid;

use super::CountRow;
use crate::error::{DbError, parse_uuid};
use crate::tx::{self, Guard};

#[derive(Debug, SurrealValue)]
struct TenderRow {
    record_id: String,
    name: String,
    description: String,
    service_type: String,
    status: String,
    organization_id: String,
    version: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TenderRow {
    fn try_into_tender(self) -> Result<Tender, DbError> {
        Ok(Tender {
            id: parse_uuid(&self.record_id, "tender")?,
            name: self.name,
            description: self.description,
            service_type: self
                .service_type
                .parse()
                .map_err(|e| DbError::Decode(format!("{e}")))?,
            status: self
                .status
                .parse()
                .map_err(|e| DbError::Decode(format!("{e}")))?,
            organization_id: parse_uuid(&self.organization_id, "organization")?,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct SnapshotRow {
    tender_id: String,
    version: u32,
    name: String,
    description: String,
    service_type: String,
    status: String,
    archived_at: DateTime<Utc>,
}

impl SnapshotRow {
    fn try_into_snapshot(self) -> Result<TenderSnapshot, DbError> {
        Ok(TenderSnapshot {
            tender_id: parse_uuid(&self.tender_id, "tender")?,
            version: self.version,
            name: self.name,
            description: self.description,
            service_type: self
                .service_type
                .parse()
                .map_err(|e| DbError::Decode(format!("{e}")))?,
            status: self
                .status
                .parse()
                .map_err(|e| DbError::Decode(format!("{e}")))?,
            archived_at: self.archived_at,
        })
    }
}

/// Loads `$row` and rejects missing or closed tenders. Must run inside
/// a transaction.
fn open_row_prelude() -> String {
    format!(
        "LET $row = (SELECT * FROM type::record('tender', $id))[0]; \
         IF !$row {{ THROW '{missing}'; }}; \
         IF $row.status = 'Closed' {{ THROW '{closed}:' + $id; }};",
        missing = Guard::Missing.marker(),
        closed = Guard::TenderClosed.marker(),
    )
}

/// Archives `$row` under its current version.
pub(super) const ARCHIVE_ROW: &str = "\
    CREATE tender_archive SET \
    tender_id = meta::id($row.id), version = $row.version, \
    name = $row.name, description = $row.description, \
    service_type = $row.service_type, status = $row.status;";

/// SurrealDB implementation of the Tender repository.
#[derive(Clone)]
pub struct SurrealTenderRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealTenderRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// Run a version-bumping transaction built around `body`.
    async fn mutate(
        &self,
        id: Uuid,
        body: String,
        binds: Vec<(&'static str, String)>,
        version: Option<u32>,
    ) -> ProcuraResult<Tender> {
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
            .map_err(|e| tx::into_db_error(tx::from_send_error(e), "tender", id, version))?;
        tx::outcome(response.take_errors())
            .map_err(|f| tx::into_db_error(f, "tender", id, version))?;

        self.get_by_id(id).await
    }

    async fn count(&self, query: &str, binds: Vec<(&'static str, String)>) -> Result<u64, DbError> {
        let mut builder = self.db.query(query);
        for bind in binds {
            builder = builder.bind(bind);
        }
        let mut result = builder.await?;
        let rows: Vec<CountRow> = result.take(0)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }
}

impl<C: Connection> TenderRepository for SurrealTenderRepository<C> {
    async fn create(&self, input: CreateTender) -> ProcuraResult<Tender> {
        let id = Uuid::new_v4();

        self.db
            .query(
                "CREATE type::record('tender', $id) SET \
                 name = $name, description = $description, \
                 service_type = $service_type, status = 'Created', \
                 organization_id = $organization_id, version = 1",
            )
            .bind(("id", id.to_string()))
            .bind(("name", input.name))
            .bind(("description", input.description))
            .bind(("service_type", input.service_type.as_str()))
            .bind(("organization_id", input.organization_id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        self.get_by_id(id).await
    }

    async fn get_by_id(&self, id: Uuid) -> ProcuraResult<Tender> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM type::record('tender', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenderRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tender".into(),
            id: id_str,
        })?;

        Ok(row.try_into_tender()?)
    }

    async fn list_published(
        &self,
        filter: &ServiceTypeFilter,
        pagination: Pagination,
    ) -> ProcuraResult<PaginatedResult<Tender>> {
        let types: Vec<String> = filter.as_strs().into_iter().map(String::from).collect();
        let type_clause = if types.is_empty() {
            ""
        } else {
            "AND service_type INSIDE $types "
        };

        let count_query = format!(
            "SELECT count() AS total FROM tender \
             WHERE status = 'Published' {type_clause}GROUP ALL"
        );
        let mut count_builder = self.db.query(count_query);
        if !types.is_empty() {
            count_builder = count_builder.bind(("types", types.clone()));
        }
        let mut count_result = count_builder.await.map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM tender \
             WHERE status = 'Published' {type_clause}\
             ORDER BY name ASC, created_at ASC \
             LIMIT $limit START $offset"
        );
        let mut builder = self
            .db
            .query(query)
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset));
        if !types.is_empty() {
            builder = builder.bind(("types", types));
        }
        let mut result = builder.await.map_err(DbError::from)?;

        let rows: Vec<TenderRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_tender())
            .collect::<Result<Vec<_>, DbError>>()?;

        debug!(total, returned = items.len(), "Listed published tenders");

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn list_by_organization(
        &self,
        organization_id: Uuid,
        pagination: Pagination,
    ) -> ProcuraResult<PaginatedResult<Tender>> {
        let org_str = organization_id.to_string();

        let total = self
            .count(
                "SELECT count() AS total FROM tender \
                 WHERE organization_id = $organization_id GROUP ALL",
                vec![("organization_id", org_str.clone())],
            )
            .await?;

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM tender \
                 WHERE organization_id = $organization_id \
                 ORDER BY name ASC, created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("organization_id", org_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenderRow> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(|row| row.try_into_tender())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn update_status(&self, id: Uuid, status: TenderStatus) -> ProcuraResult<Tender> {
        let body = format!(
            "{ARCHIVE_ROW} \
             UPDATE type::record('tender', $id) SET \
             status = $status, version += 1, updated_at = time::now();"
        );
        self.mutate(id, body, vec![("status", status.as_str().to_string())], None)
            .await
    }

    async fn update(&self, id: Uuid, patch: TenderPatch) -> ProcuraResult<Tender> {
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
        if let Some(service_type) = patch.service_type {
            sets.push("service_type = $service_type");
            binds.push(("service_type", service_type.as_str().to_string()));
        }
        sets.push("version += 1");
        sets.push("updated_at = time::now()");

        let body = format!(
            "{ARCHIVE_ROW} UPDATE type::record('tender', $id) SET {};",
            sets.join(", ")
        );
        self.mutate(id, body, binds, None).await
    }

    async fn rollback(&self, id: Uuid, version: u32) -> ProcuraResult<Tender> {
        let body = format!(
            "LET $snap = (SELECT * FROM tender_archive \
                WHERE tender_id = $id AND version = $version)[0]; \
             IF !$snap {{ THROW '{missing}'; }}; \
             {ARCHIVE_ROW} \
             UPDATE type::record('tender', $id) SET \
                name = $snap.name, description = $snap.description, \
                service_type = $snap.service_type, status = $snap.status, \
                version += 1, updated_at = time::now();",
            missing = Guard::VersionMissing.marker(),
        );
        self.mutate(id, body, Vec::new(), Some(version)).await
    }

    async fn get_version(&self, id: Uuid, version: u32) -> ProcuraResult<TenderSnapshot> {
        let mut result = self
            .db
            .query(
                "SELECT * FROM tender_archive \
                 WHERE tender_id = $id AND version = $version",
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
                entity: "tender".into(),
                id: id.to_string(),
                version,
            })?;

        Ok(row.try_into_snapshot()?)
    }

    async fn list_versions(&self, id: Uuid) -> ProcuraResult<Vec<TenderSnapshot>> {
        let mut result = self
            .db
            .query(
                "SELECT * FROM tender_archive \
                 WHERE tender_id = $id ORDER BY version ASC",
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
