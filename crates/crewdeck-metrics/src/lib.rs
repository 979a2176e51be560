#![forbid(unsafe_code)]
//! crewdeck-metrics library.
//!
//! The aggregation engine for crewdeck: pure functions over
//! [`crewdeck_core::Snapshot`] data, plus the assembled read models the
//! dashboard, project, and team screens render. Nothing here mutates state
//! or performs I/O; views recompute on every refresh signal.
//!
//! Degenerate inputs never produce NaN, Infinity, or a panic. Empty task
//! sets and zero denominators map to zeroes, dangling references to the
//! "Unknown" label.
//!
//! # Conventions
//!
//! - **Errors**: none. Every function here is total over its inputs.
//! - **Logging**: `tracing` macros (`debug!` on view assembly).

pub mod activity;
pub mod completion;
pub mod dashboard;
pub mod efficiency;
pub mod period;
pub mod progress;
pub mod trend;

pub use activity::{DayBucket, WeeklyActivity, weekly_activity};
pub use completion::{CompletionStats, completion};
pub use dashboard::{DashboardSummary, MemberLoad, ProjectDetail, TeamOverview};
pub use efficiency::{efficiency, overdue_rate};
pub use period::{Period, Window};
pub use progress::{by_project, project_progress};
pub use trend::{MonthBucket, monthly_trend};
