//! Project progress rollups.

use crewdeck_core::{ProjectId, Snapshot, Task, TaskStats};

/// Recompute completion statistics for one task set.
///
/// Thin front over [`TaskStats::from_tasks`]; an empty set yields the
/// all-zero stats rather than an error or a NaN percentage.
#[must_use]
pub fn project_progress<'a, I>(tasks: I) -> TaskStats
where
    I: IntoIterator<Item = &'a Task>,
{
    TaskStats::from_tasks(tasks)
}

/// Fresh stats for every project in the snapshot, in snapshot order.
///
/// Tasks whose `project_id` dangles are counted by no project; they still
/// appear in overall totals computed from the full task list.
#[must_use]
pub fn by_project(snapshot: &Snapshot) -> Vec<(ProjectId, TaskStats)> {
    snapshot
        .projects
        .iter()
        .map(|project| {
            (
                project.id.clone(),
                project_progress(snapshot.tasks_for_project(&project.id)),
            )
        })
        .collect()
}
