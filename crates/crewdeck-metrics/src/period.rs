//! Reporting periods and the trailing windows they cover.
//!
//! Periods have fixed spans (a week is 7 days, a month is 30) so that the
//! window immediately before the current one always has the same length.
//! Percent-change comparisons would be meaningless otherwise.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Reporting period for completion statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Week,
    Month,
}

impl Period {
    /// Fixed window length in days.
    #[must_use]
    pub const fn days(self) -> i64 {
        match self {
            Self::Week => 7,
            Self::Month => 30,
        }
    }

    #[must_use]
    pub fn span(self) -> Duration {
        Duration::days(self.days())
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Week => "week",
            Self::Month => "month",
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Half-open time window `(start, end]`.
///
/// The end is inclusive so that a completion stamped exactly at `now`
/// lands in the current window, and the start is exclusive so that
/// adjacent windows never double-count an instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Window {
    /// Trailing window of `period` length ending at `now`.
    #[must_use]
    pub fn current(period: Period, now: DateTime<Utc>) -> Self {
        Self {
            start: now - period.span(),
            end: now,
        }
    }

    /// The window of equal length immediately before [`Window::current`].
    #[must_use]
    pub fn previous(period: Period, now: DateTime<Utc>) -> Self {
        let span = period.span();
        Self {
            start: now - span - span,
            end: now - span,
        }
    }

    #[must_use]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant > self.start && instant <= self.end
    }
}
