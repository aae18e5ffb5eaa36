use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use super::Sample;

/// Rendered in place of an estimate or a date when no completion trend exists
pub const INFINITY: &str = "∞";

/// Calendar format used for target dates, e.g. `March 05 2024`
pub const DATE_FORMAT: &str = "%B %d %Y";

const TIME_UNITS: [&str; 5] = ["seconds", "minutes", "hours", "days", "months"];
const UNIT_DIVISORS: [u64; 4] = [60, 60, 24, 30];

/// Average movement of the open and closed counts per sampling interval
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IssueRates {
    pub opened: u64,
    pub closed: u64,
}

/// Whether the trend in the window yields a completion estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outlook {
    /// Flat or diverging trend: no meaningful completion time
    Unresolved,
    Resolved {
        estimate_seconds: u64,
        target_date: DateTime<Utc>,
    },
}

/// Completion forecast derived from one window of samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Forecast {
    pub timestamp: DateTime<Utc>,
    pub issue_rates: IssueRates,
    pub outlook: Outlook,
}

impl Forecast {
    /// Forecast held before the window has enough samples to show a trend
    pub fn unresolved(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            issue_rates: IssueRates::default(),
            outlook: Outlook::Unresolved,
        }
    }

    /// Derive a forecast from the window using the moving-delta heuristic.
    ///
    /// Absolute deltas between consecutive samples are summed and divided by
    /// the number of samples in the window (not the number of deltas). The
    /// difference between the closing and opening averages is the burn rate;
    /// the latest open count divided by that rate gives the number of
    /// sampling intervals left, each one `cadence` long.
    ///
    /// Windows shorter than two samples carry no trend and yield an
    /// unresolved forecast.
    pub fn compute(samples: &[Sample], cadence: Duration, timestamp: DateTime<Utc>) -> Self {
        let Some(latest) = samples.last().filter(|_| samples.len() >= 2) else {
            return Self::unresolved(timestamp);
        };

        let window = samples.len() as u64;
        let (open_sum, closed_sum) = samples.windows(2).fold((0u64, 0u64), |(open, closed), pair| {
            (
                open + pair[1].open.abs_diff(pair[0].open),
                closed + pair[1].closed.abs_diff(pair[0].closed),
            )
        });

        let issue_rates = IssueRates {
            opened: open_sum / window,
            closed: closed_sum / window,
        };

        let rate = issue_rates.closed.abs_diff(issue_rates.opened);
        if rate == 0 {
            return Self {
                timestamp,
                issue_rates,
                outlook: Outlook::Unresolved,
            };
        }

        let cycles = latest.open.saturating_add(rate) / rate;
        let estimate_seconds = cycles.saturating_mul(cadence.as_secs());

        let target_date = i64::try_from(estimate_seconds)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .and_then(|delta| timestamp.checked_add_signed(delta));

        let outlook = match target_date {
            Some(target_date) => Outlook::Resolved {
                estimate_seconds,
                target_date,
            },
            // Beyond the representable calendar
            None => Outlook::Unresolved,
        };

        Self {
            timestamp,
            issue_rates,
            outlook,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self.outlook, Outlook::Resolved { .. })
    }

    /// Human readable estimate such as `3 days`, or `∞`
    pub fn estimate_label(&self) -> String {
        match self.outlook {
            Outlook::Resolved { estimate_seconds, .. } => format_duration(estimate_seconds),
            Outlook::Unresolved => INFINITY.to_string(),
        }
    }

    /// Target date such as `March 05 2024`, or `∞`
    pub fn date_label(&self) -> String {
        match self.outlook {
            Outlook::Resolved { target_date, .. } => target_date.format(DATE_FORMAT).to_string(),
            Outlook::Unresolved => INFINITY.to_string(),
        }
    }
}

/// Format a span of seconds in the largest unit it fills, up to months.
///
/// Months are 30 days. The value is rounded half to even and the unit is
/// singular when the rounded value is exactly one.
pub fn format_duration(seconds: u64) -> String {
    let mut value = seconds as f64;
    let mut level = 0;

    while level < UNIT_DIVISORS.len() && value >= UNIT_DIVISORS[level] as f64 {
        value /= UNIT_DIVISORS[level] as f64;
        level += 1;
    }

    let rounded = value.round_ties_even() as u64;
    let unit = TIME_UNITS[level];
    let unit = if rounded == 1 { unit.trim_end_matches('s') } else { unit };

    format!("{} {}", rounded, unit)
}
