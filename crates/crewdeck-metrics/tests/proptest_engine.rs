//! Property tests for the aggregation engine's degenerate-input guarantees.

use chrono::Duration;
use crewdeck_core::TaskStatus;
use crewdeck_metrics::{
    Period, completion, efficiency, monthly_trend, overdue_rate, project_progress, weekly_activity,
};
use proptest::prelude::*;

use generators::{anchor, arb_tasks};

proptest! {
    // 10,000 cases for local dev; CI can dial this down via PROPTEST_CASES.
    #![proptest_config(proptest::test_runner::Config::with_cases(10000))]

    #[test]
    fn progress_is_always_a_percentage(tasks in arb_tasks(40)) {
        let stats = project_progress(&tasks);
        prop_assert!(stats.progress <= 100);
        prop_assert!(stats.completed_tasks <= stats.total_tasks);
        prop_assert_eq!(stats.total_tasks, tasks.len());
    }

    #[test]
    fn marking_one_task_done_never_loses_completions(tasks in arb_tasks(40), pick in any::<prop::sample::Index>()) {
        let before = project_progress(&tasks);

        let mut flipped = tasks;
        if !flipped.is_empty() {
            let idx = pick.index(flipped.len());
            let task = &mut flipped[idx];
            task.status = TaskStatus::Done;
            task.completed_at.get_or_insert(anchor());
        }
        let after = project_progress(&flipped);

        prop_assert!(after.completed_tasks >= before.completed_tasks);
        prop_assert_eq!(after.total_tasks, before.total_tasks);
    }

    #[test]
    fn rates_are_finite_percentages(tasks in arb_tasks(40)) {
        let eff = efficiency(&tasks);
        prop_assert!(eff.is_finite());
        prop_assert!((0.0..=100.0).contains(&eff));

        let overdue = overdue_rate(&tasks, anchor());
        prop_assert!(overdue.is_finite());
        prop_assert!((0.0..=100.0).contains(&overdue));
    }

    #[test]
    fn completion_change_is_always_finite(tasks in arb_tasks(40), week in any::<bool>()) {
        let period = if week { Period::Week } else { Period::Month };
        let stats = completion(&tasks, period, anchor());
        prop_assert!(stats.change_pct.is_finite());
        prop_assert!(stats.completed <= tasks.len());
    }

    #[test]
    fn weekly_activity_always_yields_seven_buckets(tasks in arb_tasks(40), hours_back in 0i64..9600) {
        let now = anchor() - Duration::hours(hours_back);
        let buckets: Vec<_> = weekly_activity(&tasks, now).collect();
        prop_assert_eq!(buckets.len(), 7);
        prop_assert_eq!(buckets[6].day, now.date_naive());

        let counted: usize = buckets.iter().map(|bucket| bucket.tasks).sum();
        let stamped = tasks.iter().filter(|t| t.completed_at.is_some()).count();
        prop_assert!(counted <= stamped);
    }

    #[test]
    fn monthly_trend_covers_consecutive_months(tasks in arb_tasks(40), months in 1usize..=24) {
        let trend = monthly_trend(&tasks, anchor(), months);
        prop_assert_eq!(trend.len(), months);

        for pair in trend.windows(2) {
            let expected_next = if pair[0].month == 12 {
                (pair[0].year + 1, 1)
            } else {
                (pair[0].year, pair[0].month + 1)
            };
            prop_assert_eq!((pair[1].year, pair[1].month), expected_next);
        }

        let total_created: usize = trend.iter().map(|bucket| bucket.created).sum();
        prop_assert!(total_created <= tasks.len());
    }
}
