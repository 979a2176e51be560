//! Organizational reference data: departments and roles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{DepartmentId, RoleId};

/// An organizational unit that projects and members point at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: DepartmentId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Caller-supplied fields for a department.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl DepartmentDraft {
    #[must_use]
    pub fn into_department(self, id: DepartmentId, now: DateTime<Utc>) -> Department {
        Department {
            id,
            name: self.name,
            description: self.description,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A job role members point at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Caller-supplied fields for a role.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl RoleDraft {
    #[must_use]
    pub fn into_role(self, id: RoleId, now: DateTime<Utc>) -> Role {
        Role {
            id,
            name: self.name,
            description: self.description,
            created_at: now,
            updated_at: now,
        }
    }
}
