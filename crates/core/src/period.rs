use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inclusive calendar-date bounds applied to `occurred_at` (UTC). Either side
/// may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.start, self.end) {
            (Some(s), Some(e)) => write!(f, "{s} to {e}"),
            (Some(s), None) => write!(f, "from {s}"),
            (None, Some(e)) => write!(f, "until {e}"),
            (None, None) => write!(f, "all time"),
        }
    }
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        DateRange { start, end }
    }

    pub fn all() -> Self {
        DateRange::default()
    }

    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange { start: Some(start), end: Some(end) }
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }

    pub fn contains_instant(self, at: DateTime<Utc>) -> bool {
        self.contains(at.date_naive())
    }

    /// First instant covered by the range, if bounded below.
    pub fn start_instant(self) -> Option<DateTime<Utc>> {
        self.start.and_then(|d| d.and_hms_opt(0, 0, 0)).map(|t| t.and_utc())
    }

    /// First instant *after* the range, if bounded above.
    pub fn end_instant_exclusive(self) -> Option<DateTime<Utc>> {
        self.end
            .and_then(|d| d.checked_add_days(Days::new(1)))
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|t| t.and_utc())
    }
}

/// Granularity of a trend bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendPeriod {
    Daily,
    Weekly,
    #[default]
    Monthly,
}

impl fmt::Display for TrendPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendPeriod::Daily => write!(f, "daily"),
            TrendPeriod::Weekly => write!(f, "weekly"),
            TrendPeriod::Monthly => write!(f, "monthly"),
        }
    }
}

impl std::str::FromStr for TrendPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" | "day" => Ok(TrendPeriod::Daily),
            "weekly" | "week" => Ok(TrendPeriod::Weekly),
            "monthly" | "month" => Ok(TrendPeriod::Monthly),
            other => Err(format!("Unknown trend period: '{other}'")),
        }
    }
}

impl TrendPeriod {
    /// First day of the bucket containing `date`. ISO weeks start on Monday.
    pub fn bucket_start(self, date: NaiveDate) -> NaiveDate {
        match self {
            TrendPeriod::Daily => date,
            TrendPeriod::Weekly => {
                let back = u64::from(date.weekday().num_days_from_monday());
                date.checked_sub_days(Days::new(back)).unwrap_or(date)
            }
            TrendPeriod::Monthly => date.with_day(1).unwrap_or(date),
        }
    }

    pub fn label(self, date: NaiveDate) -> String {
        match self {
            TrendPeriod::Daily => date.format("%Y-%m-%d").to_string(),
            TrendPeriod::Weekly => {
                let week = date.iso_week();
                format!("{}-W{:02}", week.year(), week.week())
            }
            TrendPeriod::Monthly => date.format("%Y-%m").to_string(),
        }
    }
}
