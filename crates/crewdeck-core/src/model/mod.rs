//! Entity definitions shared by the store, the coordinator, and the
//! aggregation layer.
//!
//! Five entity kinds make up the domain: tasks, projects, team members,
//! departments, and roles. All of them deserialize from the backend's
//! camelCase wire shape, with the union-typed fields normalized in
//! [`normalize`].

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod ids;
pub mod member;
pub mod normalize;
pub mod org;
pub mod project;
pub mod task;

pub use ids::{DepartmentId, MemberId, ProjectId, RoleId, TaskId};
pub use member::{MemberDraft, TeamMember};
pub use normalize::Tags;
pub use org::{Department, DepartmentDraft, Role, RoleDraft};
pub use project::{Project, ProjectDraft, ProjectStatus, TaskStats};
pub use task::{Priority, Task, TaskDraft, TaskStatus};

/// The five entity collections the system tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Task,
    Project,
    Member,
    Department,
    Role,
}

impl EntityKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Project => "project",
            Self::Member => "member",
            Self::Department => "department",
            Self::Role => "role",
        }
    }

    /// All kinds, in a fixed order usable for iteration.
    pub const ALL: [Self; 5] = [
        Self::Task,
        Self::Project,
        Self::Member,
        Self::Department,
        Self::Role,
    ];
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_display_matches_serde_form() {
        for kind in EntityKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{kind}\""));
        }
    }
}
