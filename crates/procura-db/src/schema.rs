//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Enums are stored as strings with
//! ASSERT constraints for validation.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::{debug, info};

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1: initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Employees
-- =======================================================================
DEFINE TABLE employee SCHEMAFULL;
DEFINE FIELD username ON TABLE employee TYPE string;
DEFINE FIELD first_name ON TABLE employee TYPE option<string>;
DEFINE FIELD last_name ON TABLE employee TYPE option<string>;
DEFINE FIELD created_at ON TABLE employee TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE employee TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_employee_username ON TABLE employee \
    COLUMNS username UNIQUE;

-- =======================================================================
-- Organizations
-- =======================================================================
DEFINE TABLE organization SCHEMAFULL;
DEFINE FIELD name ON TABLE organization TYPE string;
DEFINE FIELD description ON TABLE organization TYPE string;
DEFINE FIELD created_at ON TABLE organization TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE organization TYPE datetime \
    DEFAULT time::now();

-- =======================================================================
-- Tenders (+ version archive)
-- =======================================================================
DEFINE TABLE tender SCHEMAFULL;
DEFINE FIELD name ON TABLE tender TYPE string;
DEFINE FIELD description ON TABLE tender TYPE string;
DEFINE FIELD service_type ON TABLE tender TYPE string \
    ASSERT $value IN ['Construction', 'Delivery', 'Manufacture'];
DEFINE FIELD status ON TABLE tender TYPE string \
    ASSERT $value IN ['Created', 'Published', 'Closed'];
DEFINE FIELD organization_id ON TABLE tender TYPE string;
DEFINE FIELD version ON TABLE tender TYPE int DEFAULT 1 \
    ASSERT $value >= 1;
DEFINE FIELD created_at ON TABLE tender TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE tender TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_tender_org ON TABLE tender COLUMNS organization_id;
DEFINE INDEX idx_tender_status_name ON TABLE tender COLUMNS status, name;

DEFINE TABLE tender_archive SCHEMAFULL
    PERMISSIONS
        FOR create FULL
        FOR select FULL
        FOR update NONE
        FOR delete NONE;
DEFINE FIELD tender_id ON TABLE tender_archive TYPE string;
DEFINE FIELD version ON TABLE tender_archive TYPE int;
DEFINE FIELD name ON TABLE tender_archive TYPE string;
DEFINE FIELD description ON TABLE tender_archive TYPE string;
DEFINE FIELD service_type ON TABLE tender_archive TYPE string;
DEFINE FIELD status ON TABLE tender_archive TYPE string;
DEFINE FIELD archived_at ON TABLE tender_archive TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_tender_archive_version ON TABLE tender_archive \
    COLUMNS tender_id, version UNIQUE;

-- =======================================================================
-- Bids (+ version archive)
-- =======================================================================
DEFINE TABLE bid SCHEMAFULL;
DEFINE FIELD name ON TABLE bid TYPE string;
DEFINE FIELD description ON TABLE bid TYPE string;
DEFINE FIELD status ON TABLE bid TYPE string \
    ASSERT $value IN ['Created', 'Published', 'Canceled', 'Approved', \
    'Rejected'];
DEFINE FIELD tender_id ON TABLE bid TYPE string;
DEFINE FIELD author_type ON TABLE bid TYPE string \
    ASSERT $value IN ['User', 'Organization'];
DEFINE FIELD author_id ON TABLE bid TYPE string;
DEFINE FIELD version ON TABLE bid TYPE int DEFAULT 1 \
    ASSERT $value >= 1;
DEFINE FIELD approvals ON TABLE bid TYPE int DEFAULT 0;
DEFINE FIELD approval_quorum ON TABLE bid TYPE option<int>;
DEFINE FIELD created_at ON TABLE bid TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE bid TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_bid_tender ON TABLE bid COLUMNS tender_id;
DEFINE INDEX idx_bid_author ON TABLE bid COLUMNS author_id;

DEFINE TABLE bid_archive SCHEMAFULL
    PERMISSIONS
        FOR create FULL
        FOR select FULL
        FOR update NONE
        FOR delete NONE;
DEFINE FIELD bid_id ON TABLE bid_archive TYPE string;
DEFINE FIELD version ON TABLE bid_archive TYPE int;
DEFINE FIELD name ON TABLE bid_archive TYPE string;
DEFINE FIELD description ON TABLE bid_archive TYPE string;
DEFINE FIELD status ON TABLE bid_archive TYPE string;
DEFINE FIELD archived_at ON TABLE bid_archive TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_bid_archive_version ON TABLE bid_archive \
    COLUMNS bid_id, version UNIQUE;

-- =======================================================================
-- Approval votes (one per bid and voter)
-- =======================================================================
DEFINE TABLE bid_approval SCHEMAFULL;
DEFINE FIELD bid_id ON TABLE bid_approval TYPE string;
DEFINE FIELD voter_id ON TABLE bid_approval TYPE string;
DEFINE FIELD created_at ON TABLE bid_approval TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_bid_approval_voter ON TABLE bid_approval \
    COLUMNS bid_id, voter_id UNIQUE;

-- =======================================================================
-- Feedback (append-only)
-- =======================================================================
DEFINE TABLE bid_feedback SCHEMAFULL
    PERMISSIONS
        FOR create FULL
        FOR select FULL
        FOR update NONE
        FOR delete NONE;
DEFINE FIELD tender_id ON TABLE bid_feedback TYPE string;
DEFINE FIELD bid_id ON TABLE bid_feedback TYPE string;
DEFINE FIELD user_id ON TABLE bid_feedback TYPE string;
DEFINE FIELD description ON TABLE bid_feedback TYPE string;
DEFINE FIELD created_at ON TABLE bid_feedback TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_feedback_tender_time ON TABLE bid_feedback \
    COLUMNS tender_id, created_at;

-- =======================================================================
-- Graph Edge Tables (relations)
-- =======================================================================

-- Employee -> Organization responsibility (membership)
DEFINE TABLE responsible_for TYPE RELATION SCHEMAFULL;
DEFINE FIELD created_at ON TABLE responsible_for TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_responsible_pair ON TABLE responsible_for \
    COLUMNS in, out UNIQUE;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Bring the schema up to date.
///
/// Safe to call on every start: migrations at or below the highest
/// recorded `_migration` version are skipped.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let applied = applied_version(db).await?;
    let pending: Vec<&Migration> = MIGRATIONS.iter().filter(|m| m.version > applied).collect();
    if pending.is_empty() {
        debug!(version = applied, "Schema is up to date");
        return Ok(());
    }

    for migration in pending {
        apply(db, migration).await?;
    }
    Ok(())
}

async fn applied_version<C: Connection>(db: &Surreal<C>) -> Result<u32, DbError> {
    let mut result = db
        .query("SELECT version FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    Ok(records.first().map(|m| m.version).unwrap_or(0))
}

async fn apply<C: Connection>(db: &Surreal<C>, migration: &Migration) -> Result<(), DbError> {
    info!(version = migration.version, name = migration.name, "Applying migration");

    db.query(migration.sql)
        .await?
        .check()
        .map_err(|e| DbError::Migration(format!("v{} {}: {e}", migration.version, migration.name)))?;

    db.query("CREATE _migration SET version = $version, name = $name")
        .bind(("version", migration.version))
        .bind(("name", migration.name))
        .await?
        .check()
        .map_err(|e| DbError::Migration(format!("recording v{}: {e}", migration.version)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_v1_is_nonempty() {
        assert!(!SCHEMA_V1.is_empty());
    }

    #[test]
    fn migrations_are_ordered() {
        for window in MIGRATIONS.windows(2) {
            assert!(
                window[0].version < window[1].version,
                "Migrations must be in ascending version order"
            );
        }
    }

    #[test]
    fn archives_are_unique_per_version() {
        assert!(SCHEMA_V1.contains("COLUMNS tender_id, version UNIQUE"));
        assert!(SCHEMA_V1.contains("COLUMNS bid_id, version UNIQUE"));
        assert!(SCHEMA_V1.contains("COLUMNS bid_id, voter_id UNIQUE"));
    }
}
