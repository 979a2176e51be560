//! Delivery efficiency and overdue exposure.

use chrono::{DateTime, Utc};
use crewdeck_core::Task;

/// Share of completed tasks that finished on or before their due date, as
/// a percentage.
///
/// A completion without a due date counts as on time. No completions at
/// all yields `0.0`, never a NaN.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn efficiency<'a, I>(tasks: I) -> f64
where
    I: IntoIterator<Item = &'a Task>,
{
    let mut completed = 0usize;
    let mut on_time = 0usize;
    for task in tasks {
        let Some(done_at) = task.completed_at else {
            continue;
        };
        completed += 1;
        if task.due_date.is_none_or(|due| done_at.date_naive() <= due) {
            on_time += 1;
        }
    }
    if completed == 0 {
        0.0
    } else {
        on_time as f64 / completed as f64 * 100.0
    }
}

/// Share of open tasks whose due date has already passed, as a percentage.
///
/// Open means any status other than done. No open tasks yields `0.0`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn overdue_rate<'a, I>(tasks: I, now: DateTime<Utc>) -> f64
where
    I: IntoIterator<Item = &'a Task>,
{
    let today = now.date_naive();
    let mut open = 0usize;
    let mut overdue = 0usize;
    for task in tasks {
        if task.status.is_done() {
            continue;
        }
        open += 1;
        if task.is_overdue(today) {
            overdue += 1;
        }
    }
    if open == 0 {
        0.0
    } else {
        overdue as f64 / open as f64 * 100.0
    }
}
