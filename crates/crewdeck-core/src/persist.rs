//! Backend persistence seam and the in-memory reference backend.
//!
//! [`Persistence`] is the one place the system talks to durable storage.
//! The coordinator calls it *before* touching the in-memory store, so a
//! failed call leaves local state exactly as it was. Implementations own id
//! assignment and timestamping; callers hand over drafts and get the
//! materialized entity back.
//!
//! [`MemoryBackend`] is the reference implementation used throughout the
//! test suites. It behaves like a small, well-behaved remote: sequential
//! ids, `updated_at` bumps on update, rejection of deletes for unknown ids,
//! and a switchable offline mode that fails every call.

use std::sync::{Mutex, PoisonError};

use chrono::Utc;

use crate::error::TransportError;
use crate::model::{
    Department, DepartmentDraft, DepartmentId, MemberDraft, MemberId, Project, ProjectDraft,
    ProjectId, Role, RoleDraft, RoleId, Task, TaskDraft, TaskId, TeamMember,
};

/// A durable backend for the five entity collections.
///
/// Every call is synchronous and fallible. `create_*` assigns the id and
/// both timestamps; `update_*` replaces caller-editable fields and bumps
/// `updated_at` while preserving everything else.
pub trait Persistence: Send + Sync {
    /// # Errors
    /// Fails when the backend cannot be reached or refuses the request.
    fn list_tasks(&self) -> Result<Vec<Task>, TransportError>;
    /// # Errors
    /// Fails when the backend cannot be reached or refuses the request.
    fn create_task(&self, draft: &TaskDraft) -> Result<Task, TransportError>;
    /// # Errors
    /// Fails when the backend cannot be reached or refuses the request.
    fn update_task(&self, id: &TaskId, draft: &TaskDraft) -> Result<Task, TransportError>;
    /// # Errors
    /// Fails when the backend cannot be reached or refuses the request.
    fn delete_task(&self, id: &TaskId) -> Result<(), TransportError>;

    /// # Errors
    /// Fails when the backend cannot be reached or refuses the request.
    fn list_projects(&self) -> Result<Vec<Project>, TransportError>;
    /// # Errors
    /// Fails when the backend cannot be reached or refuses the request.
    fn create_project(&self, draft: &ProjectDraft) -> Result<Project, TransportError>;
    /// # Errors
    /// Fails when the backend cannot be reached or refuses the request.
    fn update_project(&self, id: &ProjectId, draft: &ProjectDraft)
    -> Result<Project, TransportError>;
    /// # Errors
    /// Fails when the backend cannot be reached or refuses the request.
    fn delete_project(&self, id: &ProjectId) -> Result<(), TransportError>;

    /// # Errors
    /// Fails when the backend cannot be reached or refuses the request.
    fn list_members(&self) -> Result<Vec<TeamMember>, TransportError>;
    /// # Errors
    /// Fails when the backend cannot be reached or refuses the request.
    fn create_member(&self, draft: &MemberDraft) -> Result<TeamMember, TransportError>;
    /// # Errors
    /// Fails when the backend cannot be reached or refuses the request.
    fn update_member(&self, id: &MemberId, draft: &MemberDraft)
    -> Result<TeamMember, TransportError>;
    /// # Errors
    /// Fails when the backend cannot be reached or refuses the request.
    fn delete_member(&self, id: &MemberId) -> Result<(), TransportError>;

    /// # Errors
    /// Fails when the backend cannot be reached or refuses the request.
    fn list_departments(&self) -> Result<Vec<Department>, TransportError>;
    /// # Errors
    /// Fails when the backend cannot be reached or refuses the request.
    fn create_department(&self, draft: &DepartmentDraft) -> Result<Department, TransportError>;
    /// # Errors
    /// Fails when the backend cannot be reached or refuses the request.
    fn update_department(
        &self,
        id: &DepartmentId,
        draft: &DepartmentDraft,
    ) -> Result<Department, TransportError>;
    /// # Errors
    /// Fails when the backend cannot be reached or refuses the request.
    fn delete_department(&self, id: &DepartmentId) -> Result<(), TransportError>;

    /// # Errors
    /// Fails when the backend cannot be reached or refuses the request.
    fn list_roles(&self) -> Result<Vec<Role>, TransportError>;
    /// # Errors
    /// Fails when the backend cannot be reached or refuses the request.
    fn create_role(&self, draft: &RoleDraft) -> Result<Role, TransportError>;
    /// # Errors
    /// Fails when the backend cannot be reached or refuses the request.
    fn update_role(&self, id: &RoleId, draft: &RoleDraft) -> Result<Role, TransportError>;
    /// # Errors
    /// Fails when the backend cannot be reached or refuses the request.
    fn delete_role(&self, id: &RoleId) -> Result<(), TransportError>;
}

/// Where mutation outcome messages go.
///
/// The coordinator reports every mutation here once its outcome is known.
/// Implementations decide presentation: a UI toast, a log line, or nothing.
pub trait NoticeSink: Send + Sync {
    fn success(&self, message: &str);
    fn failure(&self, message: &str);
}

/// Discards every notice.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentNotices;

impl NoticeSink for SilentNotices {
    fn success(&self, _message: &str) {}
    fn failure(&self, _message: &str) {}
}

/// Forwards notices to the `tracing` subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotices;

impl NoticeSink for LogNotices {
    fn success(&self, message: &str) {
        tracing::info!("{message}");
    }

    fn failure(&self, message: &str) {
        tracing::warn!("{message}");
    }
}

// ---------------------------------------------------------------------------
// In-memory backend
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct MemoryState {
    tasks: Vec<Task>,
    projects: Vec<Project>,
    members: Vec<TeamMember>,
    departments: Vec<Department>,
    roles: Vec<Role>,
    next_seq: u64,
    offline: bool,
}

impl MemoryState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_seq += 1;
        format!("{prefix}-{}", self.next_seq)
    }

    /// Advance the sequence past a seeded id so later creates cannot
    /// collide with it.
    fn absorb_id(&mut self, id: &str) {
        if let Some(digits) = id.rsplit('-').next()
            && let Ok(n) = digits.parse::<u64>()
            && n > self.next_seq
        {
            self.next_seq = n;
        }
    }
}

/// In-process [`Persistence`] implementation.
///
/// Ids are `t-1`, `p-2`, `m-3`, ... drawn from one shared sequence, so an
/// id never repeats across collections within a backend instance.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Put the backend in or out of offline mode. While offline every call
    /// fails with a network transport error.
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Insert a task directly, bypassing the transport path. Test setup.
    pub fn seed_task(&self, task: Task) {
        let mut state = self.lock();
        state.absorb_id(task.id.as_str());
        state.tasks.push(task);
    }

    /// Insert a project directly, bypassing the transport path. Test setup.
    pub fn seed_project(&self, project: Project) {
        let mut state = self.lock();
        state.absorb_id(project.id.as_str());
        state.projects.push(project);
    }

    /// Insert a member directly, bypassing the transport path. Test setup.
    pub fn seed_member(&self, member: TeamMember) {
        let mut state = self.lock();
        state.absorb_id(member.id.as_str());
        state.members.push(member);
    }

    /// Insert a department directly, bypassing the transport path. Test setup.
    pub fn seed_department(&self, department: Department) {
        let mut state = self.lock();
        state.absorb_id(department.id.as_str());
        state.departments.push(department);
    }

    /// Insert a role directly, bypassing the transport path. Test setup.
    pub fn seed_role(&self, role: Role) {
        let mut state = self.lock();
        state.absorb_id(role.id.as_str());
        state.roles.push(role);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn checked(&self) -> Result<std::sync::MutexGuard<'_, MemoryState>, TransportError> {
        let state = self.lock();
        if state.offline {
            return Err(TransportError::Network("backend offline".to_string()));
        }
        Ok(state)
    }
}

fn reject_missing(kind: &str, id: &str) -> TransportError {
    TransportError::Rejected(format!("no {kind} with id {id}"))
}

impl Persistence for MemoryBackend {
    fn list_tasks(&self) -> Result<Vec<Task>, TransportError> {
        Ok(self.checked()?.tasks.clone())
    }

    fn create_task(&self, draft: &TaskDraft) -> Result<Task, TransportError> {
        let mut state = self.checked()?;
        let id = TaskId::new(state.next_id("t"));
        let task = draft.clone().into_task(id, Utc::now());
        state.tasks.push(task.clone());
        Ok(task)
    }

    fn update_task(&self, id: &TaskId, draft: &TaskDraft) -> Result<Task, TransportError> {
        let mut state = self.checked()?;
        let slot = state
            .tasks
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| reject_missing("task", id.as_str()))?;
        let mut updated = draft.clone().into_task(id.clone(), Utc::now());
        updated.created_at = slot.created_at;
        if slot.status.is_done() && updated.status.is_done() {
            updated.completed_at = slot.completed_at;
        }
        *slot = updated.clone();
        Ok(updated)
    }

    fn delete_task(&self, id: &TaskId) -> Result<(), TransportError> {
        let mut state = self.checked()?;
        let before = state.tasks.len();
        state.tasks.retain(|t| &t.id != id);
        if state.tasks.len() == before {
            return Err(reject_missing("task", id.as_str()));
        }
        Ok(())
    }

    fn list_projects(&self) -> Result<Vec<Project>, TransportError> {
        Ok(self.checked()?.projects.clone())
    }

    fn create_project(&self, draft: &ProjectDraft) -> Result<Project, TransportError> {
        let mut state = self.checked()?;
        let id = ProjectId::new(state.next_id("p"));
        let project = draft.clone().into_project(id, Utc::now());
        state.projects.push(project.clone());
        Ok(project)
    }

    fn update_project(
        &self,
        id: &ProjectId,
        draft: &ProjectDraft,
    ) -> Result<Project, TransportError> {
        let mut state = self.checked()?;
        let slot = state
            .projects
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| reject_missing("project", id.as_str()))?;
        let mut updated = draft.clone().into_project(id.clone(), Utc::now());
        updated.created_at = slot.created_at;
        *slot = updated.clone();
        Ok(updated)
    }

    fn delete_project(&self, id: &ProjectId) -> Result<(), TransportError> {
        let mut state = self.checked()?;
        let before = state.projects.len();
        state.projects.retain(|p| &p.id != id);
        if state.projects.len() == before {
            return Err(reject_missing("project", id.as_str()));
        }
        Ok(())
    }

    fn list_members(&self) -> Result<Vec<TeamMember>, TransportError> {
        Ok(self.checked()?.members.clone())
    }

    fn create_member(&self, draft: &MemberDraft) -> Result<TeamMember, TransportError> {
        let mut state = self.checked()?;
        let id = MemberId::new(state.next_id("m"));
        let member = draft.clone().into_member(id, Utc::now());
        state.members.push(member.clone());
        Ok(member)
    }

    fn update_member(
        &self,
        id: &MemberId,
        draft: &MemberDraft,
    ) -> Result<TeamMember, TransportError> {
        let mut state = self.checked()?;
        let slot = state
            .members
            .iter_mut()
            .find(|m| &m.id == id)
            .ok_or_else(|| reject_missing("member", id.as_str()))?;
        let mut updated = draft.clone().into_member(id.clone(), Utc::now());
        updated.created_at = slot.created_at;
        *slot = updated.clone();
        Ok(updated)
    }

    fn delete_member(&self, id: &MemberId) -> Result<(), TransportError> {
        let mut state = self.checked()?;
        let before = state.members.len();
        state.members.retain(|m| &m.id != id);
        if state.members.len() == before {
            return Err(reject_missing("member", id.as_str()));
        }
        Ok(())
    }

    fn list_departments(&self) -> Result<Vec<Department>, TransportError> {
        Ok(self.checked()?.departments.clone())
    }

    fn create_department(&self, draft: &DepartmentDraft) -> Result<Department, TransportError> {
        let mut state = self.checked()?;
        let id = DepartmentId::new(state.next_id("d"));
        let department = draft.clone().into_department(id, Utc::now());
        state.departments.push(department.clone());
        Ok(department)
    }

    fn update_department(
        &self,
        id: &DepartmentId,
        draft: &DepartmentDraft,
    ) -> Result<Department, TransportError> {
        let mut state = self.checked()?;
        let slot = state
            .departments
            .iter_mut()
            .find(|d| &d.id == id)
            .ok_or_else(|| reject_missing("department", id.as_str()))?;
        let mut updated = draft.clone().into_department(id.clone(), Utc::now());
        updated.created_at = slot.created_at;
        *slot = updated.clone();
        Ok(updated)
    }

    fn delete_department(&self, id: &DepartmentId) -> Result<(), TransportError> {
        let mut state = self.checked()?;
        let before = state.departments.len();
        state.departments.retain(|d| &d.id != id);
        if state.departments.len() == before {
            return Err(reject_missing("department", id.as_str()));
        }
        Ok(())
    }

    fn list_roles(&self) -> Result<Vec<Role>, TransportError> {
        Ok(self.checked()?.roles.clone())
    }

    fn create_role(&self, draft: &RoleDraft) -> Result<Role, TransportError> {
        let mut state = self.checked()?;
        let id = RoleId::new(state.next_id("r"));
        let role = draft.clone().into_role(id, Utc::now());
        state.roles.push(role.clone());
        Ok(role)
    }

    fn update_role(&self, id: &RoleId, draft: &RoleDraft) -> Result<Role, TransportError> {
        let mut state = self.checked()?;
        let slot = state
            .roles
            .iter_mut()
            .find(|r| &r.id == id)
            .ok_or_else(|| reject_missing("role", id.as_str()))?;
        let mut updated = draft.clone().into_role(id.clone(), Utc::now());
        updated.created_at = slot.created_at;
        *slot = updated.clone();
        Ok(updated)
    }

    fn delete_role(&self, id: &RoleId) -> Result<(), TransportError> {
        let mut state = self.checked()?;
        let before = state.roles.len();
        state.roles.retain(|r| &r.id != id);
        if state.roles.len() == before {
            return Err(reject_missing("role", id.as_str()));
        }
        Ok(())
    }
}
