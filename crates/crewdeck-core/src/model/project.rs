//! Projects and the task statistics derived from them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ids::{DepartmentId, MemberId, ProjectId};
use super::normalize::{self, Tags};
use super::task::{Priority, Task};

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle state of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectStatus {
    #[default]
    Planning,
    Active,
    OnHold,
    Completed,
}

impl ProjectStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Planning => "planning",
            Self::Active => "active",
            Self::OnHold => "on-hold",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProjectStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "planning" => Ok(Self::Planning),
            "active" => Ok(Self::Active),
            "on-hold" => Ok(Self::OnHold),
            "completed" => Ok(Self::Completed),
            other => Err(format!("unknown project status: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Project
// ---------------------------------------------------------------------------

/// A project groups tasks under a manager and a department.
///
/// Task statistics are deliberately absent from this struct. They are always
/// derived from the current task set, never stored, so a project can never
/// disagree with its own tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default)]
    pub priority: Priority,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "normalize::member_ref")]
    pub manager_id: Option<MemberId>,
    #[serde(default)]
    pub department_id: Option<DepartmentId>,
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub tags: Tags,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Caller-supplied fields for creating or updating a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default)]
    pub priority: Priority,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "normalize::member_ref")]
    pub manager_id: Option<MemberId>,
    #[serde(default)]
    pub department_id: Option<DepartmentId>,
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub tags: Tags,
}

impl ProjectDraft {
    /// Materialize a full project from this draft, as a backend would.
    #[must_use]
    pub fn into_project(self, id: ProjectId, now: DateTime<Utc>) -> Project {
        Project {
            id,
            name: self.name,
            description: self.description,
            status: self.status,
            priority: self.priority,
            start_date: self.start_date,
            end_date: self.end_date,
            manager_id: self.manager_id,
            department_id: self.department_id,
            budget: self.budget,
            tags: self.tags,
            created_at: now,
            updated_at: now,
        }
    }
}

// ---------------------------------------------------------------------------
// Derived statistics
// ---------------------------------------------------------------------------

/// Task counts and completion percentage for one project, computed from the
/// project's task set at a single point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    /// Completion percentage in `0..=100`, rounded half-up. Zero when the
    /// project has no tasks.
    pub progress: u8,
}

impl TaskStats {
    /// Count the given tasks and derive the completion percentage.
    #[must_use]
    pub fn from_tasks<'a, I>(tasks: I) -> Self
    where
        I: IntoIterator<Item = &'a Task>,
    {
        let mut total = 0usize;
        let mut completed = 0usize;
        for task in tasks {
            total += 1;
            if task.status.is_done() {
                completed += 1;
            }
        }
        Self {
            total_tasks: total,
            completed_tasks: completed,
            progress: Self::percentage(completed, total),
        }
    }

    /// Integer half-up rounding of `completed / total` as a percentage,
    /// with an empty set pinned to zero.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // clamped to 0..=100 first
    pub const fn percentage(completed: usize, total: usize) -> u8 {
        if total == 0 {
            return 0;
        }
        let raw = (completed * 200 + total) / (2 * total);
        if raw > 100 { 100 } else { raw as u8 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TaskId;
    use crate::model::task::{TaskDraft, TaskStatus};
    use chrono::TimeZone;

    fn task(n: usize, status: TaskStatus) -> Task {
        let now = Utc.with_ymd_and_hms(2026, 8, 25, 12, 0, 0).unwrap();
        TaskDraft {
            title: format!("task {n}"),
            status,
            ..TaskDraft::default()
        }
        .into_task(TaskId::new(format!("t-{n}")), now)
    }

    #[test]
    fn status_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_string(&ProjectStatus::OnHold).unwrap(),
            r#""on-hold""#
        );
    }

    #[test]
    fn status_roundtrips_through_str() {
        for status in [
            ProjectStatus::Planning,
            ProjectStatus::Active,
            ProjectStatus::OnHold,
            ProjectStatus::Completed,
        ] {
            assert_eq!(status.as_str().parse::<ProjectStatus>().unwrap(), status);
        }
        assert!("archived".parse::<ProjectStatus>().is_err());
    }

    #[test]
    fn stats_over_empty_set_are_all_zero() {
        let stats = TaskStats::from_tasks([]);
        assert_eq!(stats, TaskStats::default());
        assert_eq!(stats.progress, 0);
    }

    #[test]
    fn stats_count_done_tasks_and_round_half_up() {
        let tasks = vec![
            task(1, TaskStatus::Done),
            task(2, TaskStatus::Todo),
            task(3, TaskStatus::InProgress),
        ];
        let stats = TaskStats::from_tasks(&tasks);
        assert_eq!(stats.total_tasks, 3);
        assert_eq!(stats.completed_tasks, 1);
        // 1/3 = 33.33..%
        assert_eq!(stats.progress, 33);
    }

    #[test]
    fn percentage_rounds_half_up() {
        assert_eq!(TaskStats::percentage(1, 8), 13);
        assert_eq!(TaskStats::percentage(1, 2), 50);
        assert_eq!(TaskStats::percentage(2, 3), 67);
        assert_eq!(TaskStats::percentage(5, 5), 100);
        assert_eq!(TaskStats::percentage(0, 0), 0);
    }

    #[test]
    fn stats_serialize_camel_case() {
        let json = serde_json::to_string(&TaskStats {
            total_tasks: 4,
            completed_tasks: 2,
            progress: 50,
        })
        .unwrap();
        assert_eq!(
            json,
            r#"{"totalTasks":4,"completedTasks":2,"progress":50}"#
        );
    }
}
