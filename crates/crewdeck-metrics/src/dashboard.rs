//! Assembled read models for the client views.
//!
//! Each view owns one `compute` that derives everything it renders from a
//! [`Snapshot`] in a single pass. Views call it once on mount and again on
//! every refresh signal; nothing here caches, so a recompute can never
//! disagree with the store it was derived from.
//!
//! Missing and dangling references both render as the "Unknown" label.
//! A task keeps pointing at its deleted project or assignee, and these
//! assemblies must keep working when it does.

use chrono::{DateTime, Utc};
use crewdeck_core::{
    Project, ProjectId, ProjectStatus, Snapshot, Task, TaskStats, TeamMember, UNKNOWN_LABEL,
};
use serde::Serialize;
use tracing::debug;

use crate::activity::{DayBucket, weekly_activity};
use crate::completion::{CompletionStats, completion};
use crate::efficiency::{efficiency, overdue_rate};
use crate::period::Period;
use crate::trend::{MonthBucket, monthly_trend};

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

/// Everything the dashboard screen renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_projects: usize,
    pub active_projects: usize,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    /// Completions over the trailing week, with week-over-week change.
    pub weekly: CompletionStats,
    pub efficiency_pct: f64,
    pub overdue_pct: f64,
    pub weekly_activity: Vec<DayBucket>,
    pub trend: Vec<MonthBucket>,
}

impl DashboardSummary {
    /// Derive the dashboard from a snapshot at `now`, with the monthly
    /// trend reaching back `trend_months` calendar months.
    #[must_use]
    pub fn compute(snapshot: &Snapshot, now: DateTime<Utc>, trend_months: usize) -> Self {
        let overall = TaskStats::from_tasks(&snapshot.tasks);
        let summary = Self {
            total_projects: snapshot.projects.len(),
            active_projects: snapshot
                .projects
                .iter()
                .filter(|project| project.status == ProjectStatus::Active)
                .count(),
            total_tasks: overall.total_tasks,
            completed_tasks: overall.completed_tasks,
            weekly: completion(&snapshot.tasks, Period::Week, now),
            efficiency_pct: efficiency(&snapshot.tasks),
            overdue_pct: overdue_rate(&snapshot.tasks, now),
            weekly_activity: weekly_activity(&snapshot.tasks, now).collect(),
            trend: monthly_trend(&snapshot.tasks, now, trend_months),
        };
        debug!(
            "dashboard summary: {} projects ({} active), {}/{} tasks done",
            summary.total_projects,
            summary.active_projects,
            summary.completed_tasks,
            summary.total_tasks
        );
        summary
    }
}

// ---------------------------------------------------------------------------
// Project detail
// ---------------------------------------------------------------------------

/// The project page: the entity plus everything derived for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetail {
    pub project: Project,
    /// Recomputed from the task list below, never read from storage.
    pub stats: TaskStats,
    pub tasks: Vec<Task>,
    pub manager_name: String,
    pub department_name: String,
}

impl ProjectDetail {
    /// Assemble the detail view, or `None` when the project id itself does
    /// not resolve. A dangling manager or department renders as "Unknown"
    /// rather than failing the whole view.
    #[must_use]
    pub fn compute(snapshot: &Snapshot, id: &ProjectId) -> Option<Self> {
        let project = snapshot.project(id)?.clone();
        let tasks: Vec<Task> = snapshot.tasks_for_project(id).cloned().collect();
        let stats = TaskStats::from_tasks(&tasks);
        let manager_name = project.manager_id.as_ref().map_or_else(
            || UNKNOWN_LABEL.to_owned(),
            |manager| snapshot.member_name(manager).to_owned(),
        );
        let department_name = project.department_id.as_ref().map_or_else(
            || UNKNOWN_LABEL.to_owned(),
            |department| snapshot.department_name(department).to_owned(),
        );
        Some(Self {
            project,
            stats,
            tasks,
            manager_name,
            department_name,
        })
    }
}

// ---------------------------------------------------------------------------
// Team overview
// ---------------------------------------------------------------------------

/// One member's load on the team screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberLoad {
    pub member: TeamMember,
    pub role_name: String,
    pub department_name: String,
    /// Tasks currently assigned, any status.
    pub tasks: usize,
    /// Distinct projects managed or contributed to through a task.
    pub projects: usize,
}

/// The team dashboard: one row per member, in snapshot order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamOverview {
    pub members: Vec<MemberLoad>,
}

impl TeamOverview {
    #[must_use]
    pub fn compute(snapshot: &Snapshot) -> Self {
        let members = snapshot
            .members
            .iter()
            .map(|member| {
                let role_name = member.role_id.as_ref().map_or_else(
                    || UNKNOWN_LABEL.to_owned(),
                    |role| snapshot.role_name(role).to_owned(),
                );
                let department_name = member.department_id.as_ref().map_or_else(
                    || UNKNOWN_LABEL.to_owned(),
                    |department| snapshot.department_name(department).to_owned(),
                );
                MemberLoad {
                    member: member.clone(),
                    role_name,
                    department_name,
                    tasks: snapshot.tasks_for_member(&member.id).count(),
                    projects: snapshot.member_project_count(&member.id),
                }
            })
            .collect();
        Self { members }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
