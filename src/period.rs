use std::sync::LazyLock;

use chrono::{Duration, NaiveDate, Weekday};
use regex::Regex;

use crate::date_util::{days_inclusive, last_day_of_month};
use crate::error::{Error, Result};

static RE_HALF: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})-H([12])$").unwrap());
static RE_QUARTER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})-Q([1-4])$").unwrap());
static RE_PI: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})-PI([1-4])$").unwrap());
static RE_WEEK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})-W(\d{1,2})$").unwrap());
static RE_MONTH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})-(\d{2})$").unwrap());

/// A planning period used as the unit of analysis and historical baselining.
///
/// `Pi` is a SAFe program increment, calendar-aligned to its quarter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Period {
    Year(i32),
    Half(i32, u8),
    Quarter(i32, u8),
    Pi(i32, u8),
    Month(i32, u8),
    Week(i32, u8),
    Rolling(u32, NaiveDate),
}

impl Period {
    /// Parse a period string.
    ///
    /// Supported formats:
    /// - `2026` — year
    /// - `2026-H1` — half
    /// - `2026-Q1` — quarter
    /// - `2026-PI1` — program increment
    /// - `2026-01` — month
    /// - `2026-W05` — ISO week
    /// - `30d` — rolling last N days, anchored on today
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();

        // Rolling: "30d", "7d", etc.
        if s.ends_with('d') || s.ends_with('D') {
            if let Ok(n) = s[..s.len() - 1].parse::<u32>() {
                if n == 0 {
                    return Err(Error::PeriodParse("rolling period must be >= 1 day".into()));
                }
                let today = chrono::Local::now().date_naive();
                return Ok(Period::Rolling(n, today));
            }
        }

        // Year: "2026"
        if s.len() == 4 {
            if let Ok(year) = s.parse::<i32>() {
                return Ok(Period::Year(year));
            }
        }

        if let Some(caps) = RE_HALF.captures(s) {
            let year: i32 = caps[1].parse().unwrap();
            let half: u8 = caps[2].parse().unwrap();
            return Ok(Period::Half(year, half));
        }

        if let Some(caps) = RE_QUARTER.captures(s) {
            let year: i32 = caps[1].parse().unwrap();
            let q: u8 = caps[2].parse().unwrap();
            return Ok(Period::Quarter(year, q));
        }

        if let Some(caps) = RE_PI.captures(s) {
            let year: i32 = caps[1].parse().unwrap();
            let pi: u8 = caps[2].parse().unwrap();
            return Ok(Period::Pi(year, pi));
        }

        if let Some(caps) = RE_WEEK.captures(s) {
            let year: i32 = caps[1].parse().unwrap();
            let week: u8 = caps[2].parse().unwrap();
            if (1..=53).contains(&week) {
                return Ok(Period::Week(year, week));
            }
        }

        if let Some(caps) = RE_MONTH.captures(s) {
            let year: i32 = caps[1].parse().unwrap();
            let month: u8 = caps[2].parse().unwrap();
            if (1..=12).contains(&month) {
                return Ok(Period::Month(year, month));
            }
        }

        Err(Error::PeriodParse(format!("unrecognized period: {s}")))
    }

    /// Convert to a canonical key string for lookups and labels.
    pub fn to_key(&self) -> String {
        match self {
            Period::Year(y) => format!("{y}"),
            Period::Half(y, h) => format!("{y}-H{h}"),
            Period::Quarter(y, q) => format!("{y}-Q{q}"),
            Period::Pi(y, p) => format!("{y}-PI{p}"),
            Period::Month(y, m) => format!("{y}-{m:02}"),
            Period::Week(y, w) => format!("{y}-W{w:02}"),
            Period::Rolling(n, _) => format!("{n}d"),
        }
    }

    /// Get the date range (inclusive start, inclusive end) for this period.
    pub fn date_range(&self) -> (NaiveDate, NaiveDate) {
        match self {
            Period::Year(y) => (
                NaiveDate::from_ymd_opt(*y, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(*y, 12, 31).unwrap(),
            ),
            Period::Half(y, h) => {
                if *h == 1 {
                    (
                        NaiveDate::from_ymd_opt(*y, 1, 1).unwrap(),
                        NaiveDate::from_ymd_opt(*y, 6, 30).unwrap(),
                    )
                } else {
                    (
                        NaiveDate::from_ymd_opt(*y, 7, 1).unwrap(),
                        NaiveDate::from_ymd_opt(*y, 12, 31).unwrap(),
                    )
                }
            }
            Period::Quarter(y, q) | Period::Pi(y, q) => {
                let start_month = (*q as u32 - 1) * 3 + 1;
                let end_month = *q as u32 * 3;
                (
                    NaiveDate::from_ymd_opt(*y, start_month, 1).unwrap(),
                    last_day_of_month(*y, end_month),
                )
            }
            Period::Month(y, m) => (
                NaiveDate::from_ymd_opt(*y, *m as u32, 1).unwrap(),
                last_day_of_month(*y, *m as u32),
            ),
            Period::Week(y, w) => {
                let start = NaiveDate::from_isoywd_opt(*y, *w as u32, Weekday::Mon).unwrap();
                (start, start + Duration::days(6))
            }
            Period::Rolling(n, as_of) => (*as_of - Duration::days(*n as i64 - 1), *as_of),
        }
    }

    /// Length of this period in calendar days (inclusive of both endpoints).
    pub fn duration_days(&self) -> f64 {
        let (start, end) = self.date_range();
        days_inclusive(start, end) as f64
    }

    /// Get the previous period of the same type.
    pub fn previous(&self) -> Self {
        match self {
            Period::Year(y) => Period::Year(y - 1),
            Period::Half(y, h) => {
                if *h == 1 {
                    Period::Half(y - 1, 2)
                } else {
                    Period::Half(*y, 1)
                }
            }
            Period::Quarter(y, q) => {
                if *q == 1 {
                    Period::Quarter(y - 1, 4)
                } else {
                    Period::Quarter(*y, q - 1)
                }
            }
            Period::Pi(y, p) => {
                if *p == 1 {
                    Period::Pi(y - 1, 4)
                } else {
                    Period::Pi(*y, p - 1)
                }
            }
            Period::Month(y, m) => {
                if *m == 1 {
                    Period::Month(y - 1, 12)
                } else {
                    Period::Month(*y, m - 1)
                }
            }
            Period::Week(y, w) => {
                if *w == 1 {
                    // Last week of previous year — approximate
                    Period::Week(y - 1, 52)
                } else {
                    Period::Week(*y, w - 1)
                }
            }
            Period::Rolling(n, as_of) => Period::Rolling(*n, *as_of - Duration::days(*n as i64)),
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_key())
    }
}
