//! SurrealDB implementation of [`MembershipRepository`].
//!
//! Membership is the `responsible_for` edge from an `employee` record to
//! an `organization` record.

use chrono::{DateTime, Utc};
use procura_core::error::ProcuraResult;
use procura_core::models::employee::{CreateEmployee, Employee};
use procura_core::models::organization::{CreateOrganization, Organization};
use procura_core::repository::MembershipRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::CountRow;
use crate::error::{DbError, parse_uuid};

#[derive(Debug, SurrealValue)]
struct EmployeeRow {
    record_id: String,
    username: String,
    first_name: Option<String>,
    last_name: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl EmployeeRow {
    fn try_into_employee(self) -> Result<Employee, DbError> {
        Ok(Employee {
            id: parse_uuid(&self.record_id, "employee")?,
            username: self.username,
            first_name: self.first_name,
            last_name: self.last_name,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct OrganizationRow {
    record_id: String,
    name: String,
    description: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrganizationRow {
    fn try_into_organization(self) -> Result<Organization, DbError> {
        Ok(Organization {
            id: parse_uuid(&self.record_id, "organization")?,
            name: self.name,
            description: self.description,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct MembershipRow {
    organization_id: String,
}

/// SurrealDB implementation of the membership store.
#[derive(Clone)]
pub struct SurrealMembershipRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealMembershipRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> MembershipRepository for SurrealMembershipRepository<C> {
    async fn create_employee(&self, input: CreateEmployee) -> ProcuraResult<Employee> {
        let id = Uuid::new_v4();

        self.db
            .query(
                "CREATE type::record('employee', $id) SET \
                 username = $username, first_name = $first_name, \
                 last_name = $last_name",
            )
            .bind(("id", id.to_string()))
            .bind(("username", input.username))
            .bind(("first_name", input.first_name))
            .bind(("last_name", input.last_name))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        self.get_employee(id).await
    }

    async fn get_employee(&self, id: Uuid) -> ProcuraResult<Employee> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM type::record('employee', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<EmployeeRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "employee".into(),
            id: id_str,
        })?;

        Ok(row.try_into_employee()?)
    }

    async fn get_employee_by_username(&self, username: &str) -> ProcuraResult<Employee> {
        let username_owned = username.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM employee WHERE username = $username",
            )
            .bind(("username", username_owned))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<EmployeeRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "employee".into(),
            id: format!("username={username}"),
        })?;

        Ok(row.try_into_employee()?)
    }

    async fn create_organization(&self, input: CreateOrganization) -> ProcuraResult<Organization> {
        let id = Uuid::new_v4();

        self.db
            .query(
                "CREATE type::record('organization', $id) SET \
                 name = $name, description = $description",
            )
            .bind(("id", id.to_string()))
            .bind(("name", input.name))
            .bind(("description", input.description))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        self.get_organization(id).await
    }

    async fn get_organization(&self, id: Uuid) -> ProcuraResult<Organization> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM type::record('organization', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OrganizationRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "organization".into(),
            id: id_str,
        })?;

        Ok(row.try_into_organization()?)
    }

    async fn add_responsible(&self, organization_id: Uuid, user_id: Uuid) -> ProcuraResult<()> {
        // Both ends must exist; the edge table does not enforce it.
        self.get_employee(user_id).await?;
        self.get_organization(organization_id).await?;

        if self.is_responsible_for(user_id, organization_id).await? {
            return Ok(());
        }

        let query = format!(
            "RELATE employee:`{user_id}` -> responsible_for -> organization:`{organization_id}`;"
        );
        self.db
            .query(query)
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        Ok(())
    }

    async fn is_responsible_for(&self, user_id: Uuid, organization_id: Uuid) -> ProcuraResult<bool> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM responsible_for \
                 WHERE in = type::record('employee', $user_id) \
                 AND out = type::record('organization', $organization_id) \
                 GROUP ALL",
            )
            .bind(("user_id", user_id.to_string()))
            .bind(("organization_id", organization_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0) > 0)
    }

    async fn organization_of(&self, user_id: Uuid) -> ProcuraResult<Option<Uuid>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(out) AS organization_id, created_at \
                 FROM responsible_for \
                 WHERE in = type::record('employee', $user_id) \
                 ORDER BY created_at ASC LIMIT 1",
            )
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MembershipRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(parse_uuid(&row.organization_id, "organization")?)),
            None => Ok(None),
        }
    }

    async fn responsible_count(&self, organization_id: Uuid) -> ProcuraResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM responsible_for \
                 WHERE out = type::record('organization', $organization_id) \
                 GROUP ALL",
            )
            .bind(("organization_id", organization_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }
}
