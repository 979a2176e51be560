//! Immutable point-in-time views of the store.
//!
//! A [`Snapshot`] owns plain `Vec`s of cloned entities, so holding one never
//! blocks writers and never observes later mutations. All cross-entity
//! lookups tolerate dangling references: deletes do not cascade, so a task
//! may point at a project or assignee that no longer exists, and display
//! helpers resolve those to [`UNKNOWN_LABEL`] instead of failing.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::model::{
    Department, DepartmentId, MemberId, Project, ProjectId, Role, RoleId, Task, TeamMember,
};

/// Display fallback for references that no longer resolve.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// A self-contained copy of every collection, ordered by id.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub tasks: Vec<Task>,
    pub projects: Vec<Project>,
    pub members: Vec<TeamMember>,
    pub departments: Vec<Department>,
    pub roles: Vec<Role>,
}

impl Snapshot {
    // ---- lookups ---------------------------------------------------------

    #[must_use]
    pub fn project(&self, id: &ProjectId) -> Option<&Project> {
        self.projects.iter().find(|p| &p.id == id)
    }

    #[must_use]
    pub fn member(&self, id: &MemberId) -> Option<&TeamMember> {
        self.members.iter().find(|m| &m.id == id)
    }

    #[must_use]
    pub fn department(&self, id: &DepartmentId) -> Option<&Department> {
        self.departments.iter().find(|d| &d.id == id)
    }

    #[must_use]
    pub fn role(&self, id: &RoleId) -> Option<&Role> {
        self.roles.iter().find(|r| &r.id == id)
    }

    pub fn tasks_for_project<'a>(&'a self, id: &'a ProjectId) -> impl Iterator<Item = &'a Task> {
        self.tasks
            .iter()
            .filter(move |task| task.project_id.as_ref() == Some(id))
    }

    pub fn tasks_for_member<'a>(&'a self, id: &'a MemberId) -> impl Iterator<Item = &'a Task> {
        self.tasks
            .iter()
            .filter(move |task| task.assignee_id.as_ref() == Some(id))
    }

    // ---- display resolution ----------------------------------------------

    /// Project name, or [`UNKNOWN_LABEL`] when the reference dangles.
    #[must_use]
    pub fn project_name(&self, id: &ProjectId) -> &str {
        self.project(id).map_or(UNKNOWN_LABEL, |p| p.name.as_str())
    }

    /// Member name, or [`UNKNOWN_LABEL`] when the reference dangles.
    #[must_use]
    pub fn member_name(&self, id: &MemberId) -> &str {
        self.member(id).map_or(UNKNOWN_LABEL, |m| m.name.as_str())
    }

    /// Department name, or [`UNKNOWN_LABEL`] when the reference dangles.
    #[must_use]
    pub fn department_name(&self, id: &DepartmentId) -> &str {
        self.department(id)
            .map_or(UNKNOWN_LABEL, |d| d.name.as_str())
    }

    /// Role name, or [`UNKNOWN_LABEL`] when the reference dangles.
    #[must_use]
    pub fn role_name(&self, id: &RoleId) -> &str {
        self.role(id).map_or(UNKNOWN_LABEL, |r| r.name.as_str())
    }

    // ---- involvement -----------------------------------------------------

    /// Distinct projects the member manages or holds at least one assigned
    /// task in. A project reached both ways counts once.
    #[must_use]
    pub fn member_project_count(&self, id: &MemberId) -> usize {
        let mut seen: BTreeSet<&str> = self
            .projects
            .iter()
            .filter(|p| p.manager_id.as_ref() == Some(id))
            .map(|p| p.id.as_str())
            .collect();
        for task in self.tasks_for_member(id) {
            if let Some(project_id) = &task.project_id {
                seen.insert(project_id.as_str());
            }
        }
        seen.len()
    }
}
