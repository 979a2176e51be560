//! Daily completion activity over the trailing week.

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc, Weekday};
use crewdeck_core::Task;
use serde::Serialize;

/// One day of completion activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayBucket {
    /// Calendar day the bucket covers.
    pub day: NaiveDate,
    /// Tasks whose completion stamp falls on that day.
    pub tasks: usize,
}

impl DayBucket {
    /// Short weekday label for chart axes.
    #[must_use]
    pub fn weekday_label(&self) -> &'static str {
        match self.day.weekday() {
            Weekday::Mon => "Mon",
            Weekday::Tue => "Tue",
            Weekday::Wed => "Wed",
            Weekday::Thu => "Thu",
            Weekday::Fri => "Fri",
            Weekday::Sat => "Sat",
            Weekday::Sun => "Sun",
        }
    }
}

/// Lazy walk over the trailing seven days ending at `now`'s date, oldest
/// day first.
///
/// Each step scans the task slice for completions stamped on one day, so
/// nothing is computed for days the caller never pulls. Clone the iterator
/// to restart it from the first day.
#[derive(Debug, Clone)]
pub struct WeeklyActivity<'a> {
    tasks: &'a [Task],
    next_day: NaiveDate,
    remaining: usize,
}

/// Seven [`DayBucket`]s covering the trailing week ending at `now`.
#[must_use]
pub fn weekly_activity(tasks: &[Task], now: DateTime<Utc>) -> WeeklyActivity<'_> {
    let today = now.date_naive();
    let first = today.checked_sub_days(Days::new(6)).unwrap_or(today);
    WeeklyActivity {
        tasks,
        next_day: first,
        remaining: 7,
    }
}

impl Iterator for WeeklyActivity<'_> {
    type Item = DayBucket;

    fn next(&mut self) -> Option<DayBucket> {
        if self.remaining == 0 {
            return None;
        }
        let day = self.next_day;
        let tasks = self
            .tasks
            .iter()
            .filter(|task| {
                task.completed_at
                    .is_some_and(|done_at| done_at.date_naive() == day)
            })
            .count();
        self.remaining -= 1;
        self.next_day = day.checked_add_days(Days::new(1)).unwrap_or(day);
        Some(DayBucket { day, tasks })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for WeeklyActivity<'_> {}
