//! Identity and organization lookups shared by every service.

use procura_core::error::{ProcuraError, ProcuraResult};
use procura_core::models::employee::Employee;
use procura_core::repository::{MembershipRepository, require_username};
use tracing::warn;
use uuid::Uuid;

use crate::error::MarketError;

/// Resolves caller-asserted usernames and answers membership questions.
#[derive(Clone)]
pub struct MembershipResolver<M: MembershipRepository> {
    repo: M,
}

impl<M: MembershipRepository> MembershipResolver<M> {
    pub fn new(repo: M) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &M {
        &self.repo
    }

    /// Map a caller-supplied username onto an employee.
    ///
    /// A missing or blank username is `Forbidden`; an unknown one is
    /// `UnknownUser`.
    pub async fn resolve_user(&self, username: Option<&str>) -> ProcuraResult<Employee> {
        let username = require_username(username)?;
        match self.repo.get_employee_by_username(username).await {
            Ok(employee) => Ok(employee),
            Err(ProcuraError::NotFound { .. }) => Err(ProcuraError::UnknownUser {
                username: username.to_string(),
            }),
            Err(e) => Err(e),
        }
    }

    /// Check that an employee id refers to a known employee.
    pub async fn require_employee(&self, user_id: Uuid) -> ProcuraResult<Employee> {
        match self.repo.get_employee(user_id).await {
            Ok(employee) => Ok(employee),
            Err(ProcuraError::NotFound { .. }) => Err(ProcuraError::UnknownUser {
                username: user_id.to_string(),
            }),
            Err(e) => Err(e),
        }
    }

    pub async fn is_responsible_for(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
    ) -> ProcuraResult<bool> {
        self.repo.is_responsible_for(user_id, organization_id).await
    }

    /// Fail with `Forbidden` unless `user_id` is a responsible of
    /// `organization_id`.
    pub async fn require_responsible(
        &self,
        user_id: Uuid,
        organization_id: Uuid,
    ) -> ProcuraResult<()> {
        if self.repo.is_responsible_for(user_id, organization_id).await? {
            return Ok(());
        }
        warn!(
            user_id = %user_id,
            organization_id = %organization_id,
            "Caller is not a responsible of the organization"
        );
        Err(MarketError::NotEnoughPermissions.into())
    }

    pub async fn organization_of(&self, user_id: Uuid) -> ProcuraResult<Option<Uuid>> {
        self.repo.organization_of(user_id).await
    }

    /// The caller's controlling organization, `Forbidden` when it has none.
    pub async fn require_organization(&self, user_id: Uuid) -> ProcuraResult<Uuid> {
        match self.repo.organization_of(user_id).await? {
            Some(organization_id) => Ok(organization_id),
            None => {
                warn!(user_id = %user_id, "Caller has no organization");
                Err(MarketError::NoOrganization.into())
            }
        }
    }

    /// Whether `user_id` may act for the author of a bid: the author
    /// themself, or a responsible of the author's organization.
    pub async fn acts_for_author(&self, user_id: Uuid, author_id: Uuid) -> ProcuraResult<bool> {
        if user_id == author_id {
            return Ok(true);
        }
        match self.repo.organization_of(author_id).await? {
            Some(organization_id) => self.repo.is_responsible_for(user_id, organization_id).await,
            None => Ok(false),
        }
    }

    pub async fn require_author_side(&self, user_id: Uuid, author_id: Uuid) -> ProcuraResult<()> {
        if self.acts_for_author(user_id, author_id).await? {
            return Ok(());
        }
        warn!(
            user_id = %user_id,
            author_id = %author_id,
            "Caller does not act for the bid author"
        );
        Err(MarketError::NotEnoughPermissions.into())
    }
}
