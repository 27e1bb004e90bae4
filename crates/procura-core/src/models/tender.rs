//! Tender domain model.
//!
//! A tender is a work request published by an organization. Its
//! mutable fields (`name`, `description`, `service_type`, `status`) are
//! versioned: every accepted mutation bumps `version` by one and the
//! pre-mutation state is archived as a [`TenderSnapshot`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ProcuraError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TenderStatus {
    Created,
    Published,
    Closed,
}

impl TenderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TenderStatus::Created => "Created",
            TenderStatus::Published => "Published",
            TenderStatus::Closed => "Closed",
        }
    }

    /// `Closed` tenders accept no further edits, status changes or
    /// rollbacks.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TenderStatus::Closed)
    }
}

impl FromStr for TenderStatus {
    type Err = ProcuraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Created" => Ok(TenderStatus::Created),
            "Published" => Ok(TenderStatus::Published),
            "Closed" => Ok(TenderStatus::Closed),
            other => Err(ProcuraError::invalid(format!(
                "incorrect tender status: {other}"
            ))),
        }
    }
}

impl fmt::Display for TenderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ServiceType {
    Construction,
    Delivery,
    Manufacture,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Construction => "Construction",
            ServiceType::Delivery => "Delivery",
            ServiceType::Manufacture => "Manufacture",
        }
    }
}

impl FromStr for ServiceType {
    type Err = ProcuraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Construction" => Ok(ServiceType::Construction),
            "Delivery" => Ok(ServiceType::Delivery),
            "Manufacture" => Ok(ServiceType::Manufacture),
            other => Err(ProcuraError::invalid(format!(
                "incorrect service type: {other}"
            ))),
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of service types used to narrow the public tender listing.
///
/// An empty filter matches every service type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceTypeFilter(Vec<ServiceType>);

impl ServiceTypeFilter {
    pub fn new(types: impl IntoIterator<Item = ServiceType>) -> Self {
        let mut out = Vec::new();
        for t in types {
            if !out.contains(&t) {
                out.push(t);
            }
        }
        Self(out)
    }

    /// Build a filter from raw query values, skipping anything that is
    /// not a recognised service type.
    pub fn from_query<'a>(values: impl IntoIterator<Item = &'a str>) -> Self {
        Self::new(values.into_iter().filter_map(|v| v.parse().ok()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn matches(&self, service_type: ServiceType) -> bool {
        self.0.is_empty() || self.0.contains(&service_type)
    }

    pub fn as_strs(&self) -> Vec<&'static str> {
        self.0.iter().map(ServiceType::as_str).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tender {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub service_type: ServiceType,
    pub status: TenderStatus,
    /// Owning organization; only its members may mutate the tender.
    pub organization_id: Uuid,
    /// Starts at 1 and grows by exactly 1 per accepted mutation.
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a new tender. The tender always starts in
/// [`TenderStatus::Created`] at version 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTender {
    pub organization_id: Uuid,
    pub name: String,
    pub description: String,
    pub service_type: ServiceType,
}

/// Partial edit of a tender's descriptive fields.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TenderPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub service_type: Option<ServiceType>,
}

impl TenderPatch {
    /// Blank strings count as "not provided".
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.filter(|s| !s.trim().is_empty()),
            description: self.description.filter(|s| !s.trim().is_empty()),
            service_type: self.service_type,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.service_type.is_none()
    }
}

/// Archived copy of a tender's mutable fields at `version`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TenderSnapshot {
    pub tender_id: Uuid,
    pub version: u32,
    pub name: String,
    pub description: String,
    pub service_type: ServiceType,
    pub status: TenderStatus,
    pub archived_at: DateTime<Utc>,
}
