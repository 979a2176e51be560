//! The single write path and its consistency cascade.
//!
//! Every mutation moves through the same stages, in order:
//!
//! 1. **validate** against a read of the current store;
//! 2. **persist** through the backend seam; a transport failure stops here
//!    and local state is untouched;
//! 3. **liveness gate**: if the requesting scope was revoked while the
//!    backend call was in flight, the result is discarded locally
//!    ([`Outcome::StaleDiscarded`]) and nothing else happens;
//! 4. **apply** to the store and recompute dependent aggregates inside one
//!    write lock, so no snapshot can see the entity change without its
//!    cascade;
//! 5. **broadcast** one refresh signal, after the lock is released.
//!
//! Deletes never cascade to referencing entities. A task may keep pointing
//! at a deleted project or assignee; readers resolve such references to a
//! fallback label instead of failing.
//!
//! Validation and application take the lock separately (the backend call
//! must not run under it). With concurrent writers a reference validated in
//! step 1 can disappear before step 4; that degrades to the tolerated
//! dangling case above, never to a panic.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::MutationError;
use crate::model::{
    Department, DepartmentDraft, DepartmentId, EntityKind, MemberDraft, MemberId, Project,
    ProjectDraft, ProjectId, Role, RoleDraft, RoleId, Task, TaskDraft, TaskId, TaskStats,
    TeamMember,
};
use crate::persist::{NoticeSink, Persistence, SilentNotices};
use crate::signal::RefreshBus;
use crate::store::{EntityStore, StoreHandle};

// ---------------------------------------------------------------------------
// Liveness
// ---------------------------------------------------------------------------

/// Revocable token a caller passes with each mutation.
///
/// A view that kicks off a mutation and then goes away revokes its token;
/// the coordinator then discards the in-flight result instead of applying
/// it on behalf of a scope that no longer exists. Clones share one flag.
#[derive(Debug, Clone, Default)]
pub struct Liveness {
    revoked: Arc<AtomicBool>,
}

impl Liveness {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark every clone of this token as departed.
    pub fn revoke(&self) {
        self.revoked.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_live(&self) -> bool {
        !self.revoked.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// Mutation outcomes
// ---------------------------------------------------------------------------

/// Aggregates recomputed while applying one mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cascade {
    /// Entity kinds whose stored rows or derived aggregates changed.
    pub touched: Vec<EntityKind>,
    /// Fresh per-project task statistics, for every project the mutation
    /// could have affected.
    pub project_stats: Vec<(ProjectId, TaskStats)>,
    /// Fresh assigned-task counts, for every member the mutation could
    /// have affected.
    pub member_task_counts: Vec<(MemberId, usize)>,
}

/// Proof that a mutation was applied, with what it applied.
///
/// For deletes, `entity` is the entity as last seen before removal.
#[derive(Debug, Clone)]
pub struct Receipt<T> {
    pub entity: T,
    pub cascade: Cascade,
}

/// How a mutation resolved. Staleness is an outcome, not an error: the
/// backend accepted the write, only the local apply was skipped.
#[derive(Debug, Clone)]
pub enum Outcome<T> {
    Applied(Receipt<T>),
    StaleDiscarded,
}

impl<T> Outcome<T> {
    /// The receipt, if the mutation was applied locally.
    #[must_use]
    pub fn applied(self) -> Option<Receipt<T>> {
        match self {
            Self::Applied(receipt) => Some(receipt),
            Self::StaleDiscarded => None,
        }
    }

    #[must_use]
    pub const fn is_stale(&self) -> bool {
        matches!(self, Self::StaleDiscarded)
    }
}

/// Collection sizes after a full hydration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HydrateReport {
    pub tasks: usize,
    pub projects: usize,
    pub members: usize,
    pub departments: usize,
    pub roles: usize,
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

/// Owner of the write path.
///
/// Construct one per backend; hand out [`StoreHandle`]s and the
/// [`RefreshBus`] to readers. All mutations to the shared store go through
/// these methods.
pub struct Coordinator<P: Persistence> {
    store: StoreHandle,
    bus: RefreshBus,
    persistence: P,
    notices: Arc<dyn NoticeSink>,
    notify_success: bool,
}

impl<P: Persistence> Coordinator<P> {
    /// Coordinator with no notice output.
    #[must_use]
    pub fn new(persistence: P) -> Self {
        Self::with_notices(persistence, Arc::new(SilentNotices))
    }

    /// Coordinator reporting mutation outcomes to `notices`.
    #[must_use]
    pub fn with_notices(persistence: P, notices: Arc<dyn NoticeSink>) -> Self {
        Self {
            store: StoreHandle::new(),
            bus: RefreshBus::new(),
            persistence,
            notices,
            notify_success: true,
        }
    }

    /// Coordinator honoring the notice settings in `config`.
    #[must_use]
    pub fn with_config(persistence: P, notices: Arc<dyn NoticeSink>, config: &AppConfig) -> Self {
        let mut coordinator = Self::with_notices(persistence, notices);
        coordinator.notify_success = config.notices.on_success;
        coordinator
    }

    /// A read handle onto the shared store.
    #[must_use]
    pub fn store(&self) -> StoreHandle {
        self.store.clone()
    }

    /// The refresh channel mutations broadcast on.
    #[must_use]
    pub fn bus(&self) -> RefreshBus {
        self.bus.clone()
    }

    /// The backend this coordinator persists through.
    #[must_use]
    pub const fn persistence(&self) -> &P {
        &self.persistence
    }

    // ---- hydration -------------------------------------------------------

    /// Load every collection from the backend and replace the store
    /// wholesale. All-or-nothing: if any list call fails, the store keeps
    /// its previous contents.
    ///
    /// # Errors
    ///
    /// Returns a transport error when any backend list call fails.
    pub fn hydrate(&self) -> Result<HydrateReport, MutationError> {
        let tasks = self.persistence.list_tasks()?;
        let projects = self.persistence.list_projects()?;
        let members = self.persistence.list_members()?;
        let departments = self.persistence.list_departments()?;
        let roles = self.persistence.list_roles()?;

        let report = HydrateReport {
            tasks: tasks.len(),
            projects: projects.len(),
            members: members.len(),
            departments: departments.len(),
            roles: roles.len(),
        };
        self.store.write(|store| {
            store.replace_all(tasks, projects, members, departments, roles);
        });
        info!(
            "hydrated store: {} tasks, {} projects, {} members, {} departments, {} roles",
            report.tasks, report.projects, report.members, report.departments, report.roles
        );
        self.bus.emit();
        Ok(report)
    }

    // ---- tasks -----------------------------------------------------------

    /// Create a task.
    ///
    /// # Errors
    ///
    /// Fails when a referenced project or assignee is unknown, or when the
    /// backend call fails.
    pub fn create_task(
        &self,
        draft: &TaskDraft,
        live: &Liveness,
    ) -> Result<Outcome<Task>, MutationError> {
        let result = self.create_task_inner(draft, live);
        self.report("create task", &result, |task| {
            format!("Task '{}' created", task.title)
        });
        result
    }

    /// Replace a task's caller-editable fields.
    ///
    /// # Errors
    ///
    /// Fails when the task or a referenced project or assignee is unknown,
    /// or when the backend call fails.
    pub fn update_task(
        &self,
        id: &TaskId,
        draft: &TaskDraft,
        live: &Liveness,
    ) -> Result<Outcome<Task>, MutationError> {
        let result = self.update_task_inner(id, draft, live);
        self.report("update task", &result, |task| {
            format!("Task '{}' updated", task.title)
        });
        result
    }

    /// Delete a task. Nothing else is touched: dependent aggregates are
    /// recomputed, but no other entity is modified or removed.
    ///
    /// # Errors
    ///
    /// Fails when the task is unknown or the backend call fails.
    pub fn delete_task(
        &self,
        id: &TaskId,
        live: &Liveness,
    ) -> Result<Outcome<Task>, MutationError> {
        let result = self.delete_task_inner(id, live);
        self.report("delete task", &result, |task| {
            format!("Task '{}' deleted", task.title)
        });
        result
    }

    fn create_task_inner(
        &self,
        draft: &TaskDraft,
        live: &Liveness,
    ) -> Result<Outcome<Task>, MutationError> {
        self.validate_task_refs(draft)?;
        let mut task = self.persistence.create_task(draft)?;
        if !live.is_live() {
            warn!("stale create of task '{}' discarded before apply", task.title);
            return Ok(Outcome::StaleDiscarded);
        }
        reconcile_completion(None, &mut task);
        let cascade = self.store.write(|store| {
            let replaced = store.upsert_task(task.clone());
            task_cascade(store, replaced.as_ref(), Some(&task))
        });
        self.bus.emit();
        Ok(Outcome::Applied(Receipt {
            entity: task,
            cascade,
        }))
    }

    fn update_task_inner(
        &self,
        id: &TaskId,
        draft: &TaskDraft,
        live: &Liveness,
    ) -> Result<Outcome<Task>, MutationError> {
        let prior = self
            .store
            .task(id)
            .ok_or_else(|| MutationError::not_found(EntityKind::Task, id.as_str()))?;
        self.validate_task_refs(draft)?;
        let mut task = self.persistence.update_task(id, draft)?;
        if !live.is_live() {
            warn!("stale update of task {} discarded before apply", id);
            return Ok(Outcome::StaleDiscarded);
        }
        reconcile_completion(Some(&prior), &mut task);
        let cascade = self.store.write(|store| {
            let replaced = store.upsert_task(task.clone());
            let old = replaced.as_ref().or(Some(&prior));
            task_cascade(store, old, Some(&task))
        });
        self.bus.emit();
        Ok(Outcome::Applied(Receipt {
            entity: task,
            cascade,
        }))
    }

    fn delete_task_inner(
        &self,
        id: &TaskId,
        live: &Liveness,
    ) -> Result<Outcome<Task>, MutationError> {
        let prior = self
            .store
            .task(id)
            .ok_or_else(|| MutationError::not_found(EntityKind::Task, id.as_str()))?;
        self.persistence.delete_task(id)?;
        if !live.is_live() {
            warn!("stale delete of task {} discarded before apply", id);
            return Ok(Outcome::StaleDiscarded);
        }
        let cascade = self.store.write(|store| {
            store.remove_task(id);
            task_cascade(store, Some(&prior), None)
        });
        self.bus.emit();
        Ok(Outcome::Applied(Receipt {
            entity: prior,
            cascade,
        }))
    }

    fn validate_task_refs(&self, draft: &TaskDraft) -> Result<(), MutationError> {
        self.store.read(|store| {
            if let Some(project_id) = &draft.project_id
                && !store.contains_project(project_id)
            {
                return Err(MutationError::not_found(
                    EntityKind::Project,
                    project_id.as_str(),
                ));
            }
            if let Some(member_id) = &draft.assignee_id
                && !store.contains_member(member_id)
            {
                return Err(MutationError::not_found(
                    EntityKind::Member,
                    member_id.as_str(),
                ));
            }
            Ok(())
        })
    }

    // ---- projects --------------------------------------------------------

    /// Create a project.
    ///
    /// # Errors
    ///
    /// Fails when a referenced manager or department is unknown, or when
    /// the backend call fails.
    pub fn create_project(
        &self,
        draft: &ProjectDraft,
        live: &Liveness,
    ) -> Result<Outcome<Project>, MutationError> {
        let result = self.create_project_inner(draft, live);
        self.report("create project", &result, |project| {
            format!("Project '{}' created", project.name)
        });
        result
    }

    /// Replace a project's caller-editable fields.
    ///
    /// # Errors
    ///
    /// Fails when the project or a referenced manager or department is
    /// unknown, or when the backend call fails.
    pub fn update_project(
        &self,
        id: &ProjectId,
        draft: &ProjectDraft,
        live: &Liveness,
    ) -> Result<Outcome<Project>, MutationError> {
        let result = self.update_project_inner(id, draft, live);
        self.report("update project", &result, |project| {
            format!("Project '{}' updated", project.name)
        });
        result
    }

    /// Delete a project. Its tasks are left in place with a dangling
    /// project reference.
    ///
    /// # Errors
    ///
    /// Fails when the project is unknown or the backend call fails.
    pub fn delete_project(
        &self,
        id: &ProjectId,
        live: &Liveness,
    ) -> Result<Outcome<Project>, MutationError> {
        let result = self.delete_project_inner(id, live);
        self.report("delete project", &result, |project| {
            format!("Project '{}' deleted", project.name)
        });
        result
    }

    fn create_project_inner(
        &self,
        draft: &ProjectDraft,
        live: &Liveness,
    ) -> Result<Outcome<Project>, MutationError> {
        self.validate_project_refs(draft)?;
        let project = self.persistence.create_project(draft)?;
        if !live.is_live() {
            warn!(
                "stale create of project '{}' discarded before apply",
                project.name
            );
            return Ok(Outcome::StaleDiscarded);
        }
        let cascade = self.store.write(|store| {
            store.upsert_project(project.clone());
            project_cascade(store, &project.id)
        });
        self.bus.emit();
        Ok(Outcome::Applied(Receipt {
            entity: project,
            cascade,
        }))
    }

    fn update_project_inner(
        &self,
        id: &ProjectId,
        draft: &ProjectDraft,
        live: &Liveness,
    ) -> Result<Outcome<Project>, MutationError> {
        if self.store.project(id).is_none() {
            return Err(MutationError::not_found(EntityKind::Project, id.as_str()));
        }
        self.validate_project_refs(draft)?;
        let project = self.persistence.update_project(id, draft)?;
        if !live.is_live() {
            warn!("stale update of project {} discarded before apply", id);
            return Ok(Outcome::StaleDiscarded);
        }
        let cascade = self.store.write(|store| {
            store.upsert_project(project.clone());
            project_cascade(store, id)
        });
        self.bus.emit();
        Ok(Outcome::Applied(Receipt {
            entity: project,
            cascade,
        }))
    }

    fn delete_project_inner(
        &self,
        id: &ProjectId,
        live: &Liveness,
    ) -> Result<Outcome<Project>, MutationError> {
        let prior = self
            .store
            .project(id)
            .ok_or_else(|| MutationError::not_found(EntityKind::Project, id.as_str()))?;
        self.persistence.delete_project(id)?;
        if !live.is_live() {
            warn!("stale delete of project {} discarded before apply", id);
            return Ok(Outcome::StaleDiscarded);
        }
        self.store.write(|store| {
            store.remove_project(id);
        });
        self.bus.emit();
        Ok(Outcome::Applied(Receipt {
            entity: prior,
            cascade: Cascade {
                touched: vec![EntityKind::Project],
                ..Cascade::default()
            },
        }))
    }

    fn validate_project_refs(&self, draft: &ProjectDraft) -> Result<(), MutationError> {
        self.store.read(|store| {
            if let Some(member_id) = &draft.manager_id
                && !store.contains_member(member_id)
            {
                return Err(MutationError::not_found(
                    EntityKind::Member,
                    member_id.as_str(),
                ));
            }
            if let Some(department_id) = &draft.department_id
                && !store.contains_department(department_id)
            {
                return Err(MutationError::not_found(
                    EntityKind::Department,
                    department_id.as_str(),
                ));
            }
            Ok(())
        })
    }

    // ---- members ---------------------------------------------------------

    /// Create a team member.
    ///
    /// # Errors
    ///
    /// Fails when the email is already in use, a referenced role or
    /// department is unknown, or the backend call fails.
    pub fn create_member(
        &self,
        draft: &MemberDraft,
        live: &Liveness,
    ) -> Result<Outcome<TeamMember>, MutationError> {
        let result = self.create_member_inner(draft, live);
        self.report("create member", &result, |member| {
            format!("Member '{}' added", member.name)
        });
        result
    }

    /// Replace a member's caller-editable fields.
    ///
    /// # Errors
    ///
    /// Fails when the member is unknown, the email clashes with another
    /// member, a referenced role or department is unknown, or the backend
    /// call fails.
    pub fn update_member(
        &self,
        id: &MemberId,
        draft: &MemberDraft,
        live: &Liveness,
    ) -> Result<Outcome<TeamMember>, MutationError> {
        let result = self.update_member_inner(id, draft, live);
        self.report("update member", &result, |member| {
            format!("Member '{}' updated", member.name)
        });
        result
    }

    /// Delete a member. Their tasks keep a dangling assignee reference and
    /// managed projects keep a dangling manager reference.
    ///
    /// # Errors
    ///
    /// Fails when the member is unknown or the backend call fails.
    pub fn delete_member(
        &self,
        id: &MemberId,
        live: &Liveness,
    ) -> Result<Outcome<TeamMember>, MutationError> {
        let result = self.delete_member_inner(id, live);
        self.report("delete member", &result, |member| {
            format!("Member '{}' removed", member.name)
        });
        result
    }

    fn create_member_inner(
        &self,
        draft: &MemberDraft,
        live: &Liveness,
    ) -> Result<Outcome<TeamMember>, MutationError> {
        self.validate_member_refs(draft)?;
        self.validate_member_email(&draft.email, None)?;
        let member = self.persistence.create_member(draft)?;
        if !live.is_live() {
            warn!(
                "stale create of member '{}' discarded before apply",
                member.name
            );
            return Ok(Outcome::StaleDiscarded);
        }
        let cascade = self.store.write(|store| {
            store.upsert_member(member.clone());
            member_cascade(store, &member.id)
        });
        self.bus.emit();
        Ok(Outcome::Applied(Receipt {
            entity: member,
            cascade,
        }))
    }

    fn update_member_inner(
        &self,
        id: &MemberId,
        draft: &MemberDraft,
        live: &Liveness,
    ) -> Result<Outcome<TeamMember>, MutationError> {
        if self.store.member(id).is_none() {
            return Err(MutationError::not_found(EntityKind::Member, id.as_str()));
        }
        self.validate_member_refs(draft)?;
        self.validate_member_email(&draft.email, Some(id))?;
        let member = self.persistence.update_member(id, draft)?;
        if !live.is_live() {
            warn!("stale update of member {} discarded before apply", id);
            return Ok(Outcome::StaleDiscarded);
        }
        let cascade = self.store.write(|store| {
            store.upsert_member(member.clone());
            member_cascade(store, id)
        });
        self.bus.emit();
        Ok(Outcome::Applied(Receipt {
            entity: member,
            cascade,
        }))
    }

    fn delete_member_inner(
        &self,
        id: &MemberId,
        live: &Liveness,
    ) -> Result<Outcome<TeamMember>, MutationError> {
        let prior = self
            .store
            .member(id)
            .ok_or_else(|| MutationError::not_found(EntityKind::Member, id.as_str()))?;
        self.persistence.delete_member(id)?;
        if !live.is_live() {
            warn!("stale delete of member {} discarded before apply", id);
            return Ok(Outcome::StaleDiscarded);
        }
        self.store.write(|store| {
            store.remove_member(id);
        });
        self.bus.emit();
        Ok(Outcome::Applied(Receipt {
            entity: prior,
            cascade: Cascade {
                touched: vec![EntityKind::Member],
                ..Cascade::default()
            },
        }))
    }

    fn validate_member_refs(&self, draft: &MemberDraft) -> Result<(), MutationError> {
        self.store.read(|store| {
            if let Some(role_id) = &draft.role_id
                && !store.contains_role(role_id)
            {
                return Err(MutationError::not_found(EntityKind::Role, role_id.as_str()));
            }
            if let Some(department_id) = &draft.department_id
                && !store.contains_department(department_id)
            {
                return Err(MutationError::not_found(
                    EntityKind::Department,
                    department_id.as_str(),
                ));
            }
            Ok(())
        })
    }

    fn validate_member_email(
        &self,
        email: &str,
        exclude: Option<&MemberId>,
    ) -> Result<(), MutationError> {
        let wanted = email.trim().to_lowercase();
        self.store.read(|store| {
            let clash = store
                .members()
                .any(|m| Some(&m.id) != exclude && m.email.trim().to_lowercase() == wanted);
            if clash {
                Err(MutationError::DuplicateEmail {
                    email: email.trim().to_string(),
                })
            } else {
                Ok(())
            }
        })
    }

    // ---- departments -----------------------------------------------------

    /// Create a department.
    ///
    /// # Errors
    ///
    /// Fails when the backend call fails.
    pub fn create_department(
        &self,
        draft: &DepartmentDraft,
        live: &Liveness,
    ) -> Result<Outcome<Department>, MutationError> {
        let result = self.create_department_inner(draft, live);
        self.report("create department", &result, |department| {
            format!("Department '{}' created", department.name)
        });
        result
    }

    /// Replace a department's fields.
    ///
    /// # Errors
    ///
    /// Fails when the department is unknown or the backend call fails.
    pub fn update_department(
        &self,
        id: &DepartmentId,
        draft: &DepartmentDraft,
        live: &Liveness,
    ) -> Result<Outcome<Department>, MutationError> {
        let result = self.update_department_inner(id, draft, live);
        self.report("update department", &result, |department| {
            format!("Department '{}' updated", department.name)
        });
        result
    }

    /// Delete a department. Members and projects that pointed at it keep a
    /// dangling reference.
    ///
    /// # Errors
    ///
    /// Fails when the department is unknown or the backend call fails.
    pub fn delete_department(
        &self,
        id: &DepartmentId,
        live: &Liveness,
    ) -> Result<Outcome<Department>, MutationError> {
        let result = self.delete_department_inner(id, live);
        self.report("delete department", &result, |department| {
            format!("Department '{}' deleted", department.name)
        });
        result
    }

    fn create_department_inner(
        &self,
        draft: &DepartmentDraft,
        live: &Liveness,
    ) -> Result<Outcome<Department>, MutationError> {
        let department = self.persistence.create_department(draft)?;
        if !live.is_live() {
            warn!(
                "stale create of department '{}' discarded before apply",
                department.name
            );
            return Ok(Outcome::StaleDiscarded);
        }
        self.store.write(|store| {
            store.upsert_department(department.clone());
        });
        self.bus.emit();
        Ok(Outcome::Applied(Receipt {
            entity: department,
            cascade: Cascade {
                touched: vec![EntityKind::Department],
                ..Cascade::default()
            },
        }))
    }

    fn update_department_inner(
        &self,
        id: &DepartmentId,
        draft: &DepartmentDraft,
        live: &Liveness,
    ) -> Result<Outcome<Department>, MutationError> {
        if self.store.department(id).is_none() {
            return Err(MutationError::not_found(
                EntityKind::Department,
                id.as_str(),
            ));
        }
        let department = self.persistence.update_department(id, draft)?;
        if !live.is_live() {
            warn!("stale update of department {} discarded before apply", id);
            return Ok(Outcome::StaleDiscarded);
        }
        self.store.write(|store| {
            store.upsert_department(department.clone());
        });
        self.bus.emit();
        Ok(Outcome::Applied(Receipt {
            entity: department,
            cascade: Cascade {
                touched: vec![EntityKind::Department],
                ..Cascade::default()
            },
        }))
    }

    fn delete_department_inner(
        &self,
        id: &DepartmentId,
        live: &Liveness,
    ) -> Result<Outcome<Department>, MutationError> {
        let prior = self
            .store
            .department(id)
            .ok_or_else(|| MutationError::not_found(EntityKind::Department, id.as_str()))?;
        self.persistence.delete_department(id)?;
        if !live.is_live() {
            warn!("stale delete of department {} discarded before apply", id);
            return Ok(Outcome::StaleDiscarded);
        }
        self.store.write(|store| {
            store.remove_department(id);
        });
        self.bus.emit();
        Ok(Outcome::Applied(Receipt {
            entity: prior,
            cascade: Cascade {
                touched: vec![EntityKind::Department],
                ..Cascade::default()
            },
        }))
    }

    // ---- roles -----------------------------------------------------------

    /// Create a role.
    ///
    /// # Errors
    ///
    /// Fails when the backend call fails.
    pub fn create_role(
        &self,
        draft: &RoleDraft,
        live: &Liveness,
    ) -> Result<Outcome<Role>, MutationError> {
        let result = self.create_role_inner(draft, live);
        self.report("create role", &result, |role| {
            format!("Role '{}' created", role.name)
        });
        result
    }

    /// Replace a role's fields.
    ///
    /// # Errors
    ///
    /// Fails when the role is unknown or the backend call fails.
    pub fn update_role(
        &self,
        id: &RoleId,
        draft: &RoleDraft,
        live: &Liveness,
    ) -> Result<Outcome<Role>, MutationError> {
        let result = self.update_role_inner(id, draft, live);
        self.report("update role", &result, |role| {
            format!("Role '{}' updated", role.name)
        });
        result
    }

    /// Delete a role. Members that pointed at it keep a dangling reference.
    ///
    /// # Errors
    ///
    /// Fails when the role is unknown or the backend call fails.
    pub fn delete_role(
        &self,
        id: &RoleId,
        live: &Liveness,
    ) -> Result<Outcome<Role>, MutationError> {
        let result = self.delete_role_inner(id, live);
        self.report("delete role", &result, |role| {
            format!("Role '{}' deleted", role.name)
        });
        result
    }

    fn create_role_inner(
        &self,
        draft: &RoleDraft,
        live: &Liveness,
    ) -> Result<Outcome<Role>, MutationError> {
        let role = self.persistence.create_role(draft)?;
        if !live.is_live() {
            warn!("stale create of role '{}' discarded before apply", role.name);
            return Ok(Outcome::StaleDiscarded);
        }
        self.store.write(|store| {
            store.upsert_role(role.clone());
        });
        self.bus.emit();
        Ok(Outcome::Applied(Receipt {
            entity: role,
            cascade: Cascade {
                touched: vec![EntityKind::Role],
                ..Cascade::default()
            },
        }))
    }

    fn update_role_inner(
        &self,
        id: &RoleId,
        draft: &RoleDraft,
        live: &Liveness,
    ) -> Result<Outcome<Role>, MutationError> {
        if self.store.role(id).is_none() {
            return Err(MutationError::not_found(EntityKind::Role, id.as_str()));
        }
        let role = self.persistence.update_role(id, draft)?;
        if !live.is_live() {
            warn!("stale update of role {} discarded before apply", id);
            return Ok(Outcome::StaleDiscarded);
        }
        self.store.write(|store| {
            store.upsert_role(role.clone());
        });
        self.bus.emit();
        Ok(Outcome::Applied(Receipt {
            entity: role,
            cascade: Cascade {
                touched: vec![EntityKind::Role],
                ..Cascade::default()
            },
        }))
    }

    fn delete_role_inner(
        &self,
        id: &RoleId,
        live: &Liveness,
    ) -> Result<Outcome<Role>, MutationError> {
        let prior = self
            .store
            .role(id)
            .ok_or_else(|| MutationError::not_found(EntityKind::Role, id.as_str()))?;
        self.persistence.delete_role(id)?;
        if !live.is_live() {
            warn!("stale delete of role {} discarded before apply", id);
            return Ok(Outcome::StaleDiscarded);
        }
        self.store.write(|store| {
            store.remove_role(id);
        });
        self.bus.emit();
        Ok(Outcome::Applied(Receipt {
            entity: prior,
            cascade: Cascade {
                touched: vec![EntityKind::Role],
                ..Cascade::default()
            },
        }))
    }

    // ---- notices ---------------------------------------------------------

    fn report<T>(
        &self,
        action: &str,
        result: &Result<Outcome<T>, MutationError>,
        describe: impl FnOnce(&T) -> String,
    ) {
        match result {
            Ok(Outcome::Applied(receipt)) => {
                if self.notify_success {
                    self.notices.success(&describe(&receipt.entity));
                }
            }
            Ok(Outcome::StaleDiscarded) => {}
            Err(err) => self.notices.failure(&format!("Failed to {action}: {err}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Cascade computation
// ---------------------------------------------------------------------------

/// Keep `completed_at` truthful across a status change: stamp it on the
/// transition into done, preserve it while done, clear it otherwise.
fn reconcile_completion(prior: Option<&Task>, task: &mut Task) {
    let was_done = prior.is_some_and(|t| t.status.is_done());
    match (was_done, task.status.is_done()) {
        (true, true) => task.completed_at = prior.and_then(|t| t.completed_at),
        (false, true) => {
            if task.completed_at.is_none() {
                task.completed_at = Some(Utc::now());
            }
        }
        (_, false) => task.completed_at = None,
    }
}

fn task_cascade(store: &EntityStore, old: Option<&Task>, new: Option<&Task>) -> Cascade {
    let mut cascade = Cascade {
        touched: vec![EntityKind::Task],
        ..Cascade::default()
    };

    let mut project_ids: Vec<ProjectId> = Vec::new();
    let mut member_ids: Vec<MemberId> = Vec::new();
    for task in [old, new].into_iter().flatten() {
        if let Some(project_id) = &task.project_id
            && store.contains_project(project_id)
            && !project_ids.contains(project_id)
        {
            project_ids.push(project_id.clone());
        }
        if let Some(member_id) = &task.assignee_id
            && store.contains_member(member_id)
            && !member_ids.contains(member_id)
        {
            member_ids.push(member_id.clone());
        }
    }

    for project_id in project_ids {
        let stats = store.stats_for_project(&project_id);
        cascade.project_stats.push((project_id, stats));
    }
    for member_id in member_ids {
        let count = store.task_count_for_member(&member_id);
        cascade.member_task_counts.push((member_id, count));
    }

    if !cascade.project_stats.is_empty() {
        cascade.touched.push(EntityKind::Project);
    }
    if !cascade.member_task_counts.is_empty() {
        cascade.touched.push(EntityKind::Member);
    }
    cascade
}

fn project_cascade(store: &EntityStore, id: &ProjectId) -> Cascade {
    Cascade {
        touched: vec![EntityKind::Project],
        project_stats: vec![(id.clone(), store.stats_for_project(id))],
        member_task_counts: Vec::new(),
    }
}

fn member_cascade(store: &EntityStore, id: &MemberId) -> Cascade {
    Cascade {
        touched: vec![EntityKind::Member],
        project_stats: Vec::new(),
        member_task_counts: vec![(id.clone(), store.task_count_for_member(id))],
    }
}
