//! Completion counts over trailing windows.

use chrono::{DateTime, Utc};
use crewdeck_core::Task;
use serde::Serialize;

use crate::period::{Period, Window};

/// Completions in the current window plus the change against the window
/// before it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionStats {
    pub completed: usize,
    /// Percent change against the preceding window of equal length. When
    /// that window had no completions, the current count itself scales to
    /// percent, so two empty windows read as `0.0`.
    pub change_pct: f64,
}

impl CompletionStats {
    /// Render the change with one decimal, sign included for decreases.
    #[must_use]
    pub fn change_label(&self) -> String {
        format!("{:.1}", self.change_pct)
    }
}

/// Count tasks completed within the trailing `period` ending at `now` and
/// compare against the window immediately before it.
///
/// A task counts by its `completed_at` stamp; tasks without one never
/// count, whatever their status says.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn completion<'a, I>(tasks: I, period: Period, now: DateTime<Utc>) -> CompletionStats
where
    I: IntoIterator<Item = &'a Task>,
{
    let current = Window::current(period, now);
    let previous = Window::previous(period, now);

    let mut in_current = 0usize;
    let mut in_previous = 0usize;
    for task in tasks {
        let Some(done_at) = task.completed_at else {
            continue;
        };
        if current.contains(done_at) {
            in_current += 1;
        } else if previous.contains(done_at) {
            in_previous += 1;
        }
    }

    let change_pct = if in_previous == 0 {
        in_current as f64 * 100.0
    } else {
        (in_current as f64 - in_previous as f64) / in_previous as f64 * 100.0
    };

    CompletionStats {
        completed: in_current,
        change_pct,
    }
}
