//! Calendar-month creation and completion trend.
//!
//! Unlike the fixed-span windows in [`crate::period`], the trend buckets
//! follow real calendar months, so the current partial month sits next to
//! full historical ones. Charts label them by month name, which only works
//! when the buckets are calendar-aligned.

use chrono::{DateTime, Datelike, Utc};
use crewdeck_core::Task;
use serde::Serialize;

/// Created and completed counts for one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonthBucket {
    pub year: i32,
    /// 1-based calendar month.
    pub month: u32,
    pub completed: usize,
    pub created: usize,
}

impl MonthBucket {
    /// Short month name for chart axes; empty for an out-of-range month.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self.month {
            1 => "Jan",
            2 => "Feb",
            3 => "Mar",
            4 => "Apr",
            5 => "May",
            6 => "Jun",
            7 => "Jul",
            8 => "Aug",
            9 => "Sep",
            10 => "Oct",
            11 => "Nov",
            12 => "Dec",
            _ => "",
        }
    }
}

/// Counts per month for the trailing `months` calendar months ending at
/// `now`'s month, oldest first.
///
/// Tasks created count toward their creation month, completions toward
/// their `completed_at` month. Months with no activity still appear, all
/// zero, so charts keep a continuous axis.
#[must_use]
pub fn monthly_trend(tasks: &[Task], now: DateTime<Utc>, months: usize) -> Vec<MonthBucket> {
    let today = now.date_naive();
    let mut first_of_month = today.with_day(1).unwrap_or(today);

    let mut anchors = Vec::with_capacity(months);
    for _ in 0..months {
        anchors.push((first_of_month.year(), first_of_month.month()));
        let Some(previous) = first_of_month.pred_opt().and_then(|d| d.with_day(1)) else {
            break;
        };
        first_of_month = previous;
    }
    anchors.reverse();

    anchors
        .into_iter()
        .map(|(year, month)| MonthBucket {
            year,
            month,
            completed: tasks
                .iter()
                .filter(|task| {
                    task.completed_at
                        .is_some_and(|done_at| in_month(done_at, year, month))
                })
                .count(),
            created: tasks
                .iter()
                .filter(|task| in_month(task.created_at, year, month))
                .count(),
        })
        .collect()
}

fn in_month(at: DateTime<Utc>, year: i32, month: u32) -> bool {
    let date = at.date_naive();
    date.year() == year && date.month() == month
}
