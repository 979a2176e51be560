//! The in-memory entity store.
//!
//! One [`EntityStore`] holds every entity collection behind a single
//! [`RwLock`]. Mutation methods are `pub(crate)` so that only the
//! coordinator can write; everything outside this crate reads through
//! cloned [`Snapshot`]s or cloned point lookups and can never observe a
//! half-applied mutation.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::model::{
    Department, DepartmentId, MemberId, Project, ProjectId, Role, RoleId, Task, TaskId,
    TaskStats, TeamMember,
};
use crate::snapshot::Snapshot;

/// All entity collections, keyed by id.
///
/// `BTreeMap` keeps iteration order stable across identical states, which
/// makes snapshots and the aggregations built on them deterministic.
#[derive(Debug, Default)]
pub struct EntityStore {
    tasks: BTreeMap<TaskId, Task>,
    projects: BTreeMap<ProjectId, Project>,
    members: BTreeMap<MemberId, TeamMember>,
    departments: BTreeMap<DepartmentId, Department>,
    roles: BTreeMap<RoleId, Role>,
}

impl EntityStore {
    // ---- reads -----------------------------------------------------------

    #[must_use]
    pub fn task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.get(id)
    }

    #[must_use]
    pub fn project(&self, id: &ProjectId) -> Option<&Project> {
        self.projects.get(id)
    }

    #[must_use]
    pub fn member(&self, id: &MemberId) -> Option<&TeamMember> {
        self.members.get(id)
    }

    #[must_use]
    pub fn department(&self, id: &DepartmentId) -> Option<&Department> {
        self.departments.get(id)
    }

    #[must_use]
    pub fn role(&self, id: &RoleId) -> Option<&Role> {
        self.roles.get(id)
    }

    #[must_use]
    pub fn contains_project(&self, id: &ProjectId) -> bool {
        self.projects.contains_key(id)
    }

    #[must_use]
    pub fn contains_member(&self, id: &MemberId) -> bool {
        self.members.contains_key(id)
    }

    #[must_use]
    pub fn contains_department(&self, id: &DepartmentId) -> bool {
        self.departments.contains_key(id)
    }

    #[must_use]
    pub fn contains_role(&self, id: &RoleId) -> bool {
        self.roles.contains_key(id)
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    pub fn members(&self) -> impl Iterator<Item = &TeamMember> {
        self.members.values()
    }

    /// Task counts for one project, derived from the current task set.
    #[must_use]
    pub fn stats_for_project(&self, id: &ProjectId) -> TaskStats {
        TaskStats::from_tasks(
            self.tasks
                .values()
                .filter(|task| task.project_id.as_ref() == Some(id)),
        )
    }

    /// Number of tasks currently assigned to one member.
    #[must_use]
    pub fn task_count_for_member(&self, id: &MemberId) -> usize {
        self.tasks
            .values()
            .filter(|task| task.assignee_id.as_ref() == Some(id))
            .count()
    }

    /// Clone the entire state into an immutable, self-contained snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tasks: self.tasks.values().cloned().collect(),
            projects: self.projects.values().cloned().collect(),
            members: self.members.values().cloned().collect(),
            departments: self.departments.values().cloned().collect(),
            roles: self.roles.values().cloned().collect(),
        }
    }

    // ---- writes (coordinator only) ---------------------------------------

    pub(crate) fn upsert_task(&mut self, task: Task) -> Option<Task> {
        self.tasks.insert(task.id.clone(), task)
    }

    pub(crate) fn remove_task(&mut self, id: &TaskId) -> bool {
        self.tasks.remove(id).is_some()
    }

    pub(crate) fn upsert_project(&mut self, project: Project) -> Option<Project> {
        self.projects.insert(project.id.clone(), project)
    }

    pub(crate) fn remove_project(&mut self, id: &ProjectId) -> bool {
        self.projects.remove(id).is_some()
    }

    pub(crate) fn upsert_member(&mut self, member: TeamMember) -> Option<TeamMember> {
        self.members.insert(member.id.clone(), member)
    }

    pub(crate) fn remove_member(&mut self, id: &MemberId) -> bool {
        self.members.remove(id).is_some()
    }

    pub(crate) fn upsert_department(&mut self, department: Department) -> Option<Department> {
        self.departments.insert(department.id.clone(), department)
    }

    pub(crate) fn remove_department(&mut self, id: &DepartmentId) -> bool {
        self.departments.remove(id).is_some()
    }

    pub(crate) fn upsert_role(&mut self, role: Role) -> Option<Role> {
        self.roles.insert(role.id.clone(), role)
    }

    pub(crate) fn remove_role(&mut self, id: &RoleId) -> bool {
        self.roles.remove(id).is_some()
    }

    /// Replace every collection at once. Used by hydration.
    pub(crate) fn replace_all(
        &mut self,
        tasks: Vec<Task>,
        projects: Vec<Project>,
        members: Vec<TeamMember>,
        departments: Vec<Department>,
        roles: Vec<Role>,
    ) {
        self.tasks = tasks.into_iter().map(|t| (t.id.clone(), t)).collect();
        self.projects = projects.into_iter().map(|p| (p.id.clone(), p)).collect();
        self.members = members.into_iter().map(|m| (m.id.clone(), m)).collect();
        self.departments = departments.into_iter().map(|d| (d.id.clone(), d)).collect();
        self.roles = roles.into_iter().map(|r| (r.id.clone(), r)).collect();
    }
}

/// Cloneable handle to the shared store.
///
/// Readers take the lock only long enough to clone what they need; no
/// borrow of the locked state ever escapes this type.
#[derive(Debug, Clone, Default)]
pub struct StoreHandle {
    inner: Arc<RwLock<EntityStore>>,
}

impl StoreHandle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clone the full current state.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.read(EntityStore::snapshot)
    }

    #[must_use]
    pub fn task(&self, id: &TaskId) -> Option<Task> {
        self.read(|store| store.task(id).cloned())
    }

    #[must_use]
    pub fn project(&self, id: &ProjectId) -> Option<Project> {
        self.read(|store| store.project(id).cloned())
    }

    #[must_use]
    pub fn member(&self, id: &MemberId) -> Option<TeamMember> {
        self.read(|store| store.member(id).cloned())
    }

    #[must_use]
    pub fn department(&self, id: &DepartmentId) -> Option<Department> {
        self.read(|store| store.department(id).cloned())
    }

    #[must_use]
    pub fn role(&self, id: &RoleId) -> Option<Role> {
        self.read(|store| store.role(id).cloned())
    }

    pub(crate) fn read<R>(&self, f: impl FnOnce(&EntityStore) -> R) -> R {
        let guard = self
            .inner
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    pub(crate) fn write<R>(&self, f: impl FnOnce(&mut EntityStore) -> R) -> R {
        let mut guard = self
            .inner
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TaskDraft, TaskStatus};
    use chrono::{TimeZone, Utc};

    fn task(id: &str, project: Option<&str>, status: TaskStatus) -> Task {
        let now = Utc.with_ymd_and_hms(2026, 8, 25, 12, 0, 0).unwrap();
        TaskDraft {
            title: format!("task {id}"),
            status,
            project_id: project.map(ProjectId::new),
            ..TaskDraft::default()
        }
        .into_task(TaskId::new(id), now)
    }

    #[test]
    fn upsert_returns_replaced_entity() {
        let mut store = EntityStore::default();
        assert!(store.upsert_task(task("t-1", None, TaskStatus::Todo)).is_none());
        let replaced = store.upsert_task(task("t-1", None, TaskStatus::Done));
        assert_eq!(replaced.map(|t| t.status), Some(TaskStatus::Todo));
    }

    #[test]
    fn remove_reports_whether_anything_was_there() {
        let mut store = EntityStore::default();
        store.upsert_task(task("t-1", None, TaskStatus::Todo));
        assert!(store.remove_task(&TaskId::new("t-1")));
        assert!(!store.remove_task(&TaskId::new("t-1")));
    }

    #[test]
    fn stats_for_project_only_count_that_projects_tasks() {
        let mut store = EntityStore::default();
        store.upsert_task(task("t-1", Some("p-1"), TaskStatus::Done));
        store.upsert_task(task("t-2", Some("p-1"), TaskStatus::Todo));
        store.upsert_task(task("t-3", Some("p-2"), TaskStatus::Done));
        store.upsert_task(task("t-4", None, TaskStatus::Done));

        let stats = store.stats_for_project(&ProjectId::new("p-1"));
        assert_eq!(stats.total_tasks, 2);
        assert_eq!(stats.completed_tasks, 1);
        assert_eq!(stats.progress, 50);
    }

    #[test]
    fn snapshot_is_detached_from_later_writes() {
        let handle = StoreHandle::new();
        handle.write(|store| {
            store.upsert_task(task("t-1", None, TaskStatus::Todo));
        });

        let before = handle.snapshot();
        handle.write(|store| {
            store.upsert_task(task("t-2", None, TaskStatus::Todo));
        });

        assert_eq!(before.tasks.len(), 1);
        assert_eq!(handle.snapshot().tasks.len(), 2);
    }

    #[test]
    fn snapshot_lists_tasks_in_id_order() {
        let handle = StoreHandle::new();
        handle.write(|store| {
            store.upsert_task(task("t-9", None, TaskStatus::Todo));
            store.upsert_task(task("t-1", None, TaskStatus::Todo));
            store.upsert_task(task("t-5", None, TaskStatus::Todo));
        });

        let ids: Vec<_> = handle
            .snapshot()
            .tasks
            .iter()
            .map(|t| t.id.as_str().to_string())
            .collect();
        assert_eq!(ids, ["t-1", "t-5", "t-9"]);
    }
}
