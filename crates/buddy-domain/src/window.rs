//! Date ranges, window presets, and period bucketing keys.

use std::{fmt, str::FromStr};

use chrono::{Datelike, Duration, Months, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::DomainError;

const RANGE_SEPARATOR: &str = "..";

/// An inclusive calendar range `[start, end]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DomainError> {
        if end < start {
            return Err(DomainError::InvalidRange);
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Number of calendar days covered, both ends included.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// The range of equal length that ends the day before this one starts.
    pub fn previous(&self) -> DateRange {
        let end = self.start - Duration::days(1);
        DateRange {
            start: end - Duration::days(self.days() - 1),
            end,
        }
    }

    pub fn iter_days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |day| *day <= end)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.start, RANGE_SEPARATOR, self.end)
    }
}

/// Trailing windows ending on the reference date.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum WindowPreset {
    LastWeek,
    #[default]
    LastMonth,
    LastQuarter,
    LastYear,
    AllTime,
}

impl WindowPreset {
    /// Resolves the preset against `today`. `AllTime` has no bounds.
    pub fn resolve(self, today: NaiveDate) -> Option<DateRange> {
        let start = match self {
            WindowPreset::LastWeek => today - Duration::days(7),
            WindowPreset::LastMonth => shift_months_back(today, 1),
            WindowPreset::LastQuarter => shift_months_back(today, 3),
            WindowPreset::LastYear => shift_months_back(today, 12),
            WindowPreset::AllTime => return None,
        };
        Some(DateRange { start, end: today })
    }

    pub fn label(self) -> &'static str {
        match self {
            WindowPreset::LastWeek => "last-week",
            WindowPreset::LastMonth => "last-month",
            WindowPreset::LastQuarter => "last-quarter",
            WindowPreset::LastYear => "last-year",
            WindowPreset::AllTime => "all-time",
        }
    }
}

impl fmt::Display for WindowPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for WindowPreset {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "last-week" | "week" => Ok(WindowPreset::LastWeek),
            "last-month" | "month" => Ok(WindowPreset::LastMonth),
            "last-quarter" | "quarter" => Ok(WindowPreset::LastQuarter),
            "last-year" | "year" => Ok(WindowPreset::LastYear),
            "all-time" | "all" => Ok(WindowPreset::AllTime),
            other => Err(DomainError::UnknownWindow(other.to_string())),
        }
    }
}

/// A time filter: a trailing preset or an explicit inclusive range.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Window {
    Preset(WindowPreset),
    Range(DateRange),
}

impl Window {
    pub fn resolve(&self, today: NaiveDate) -> Option<DateRange> {
        match self {
            Window::Preset(preset) => preset.resolve(today),
            Window::Range(range) => Some(*range),
        }
    }
}

impl From<WindowPreset> for Window {
    fn from(preset: WindowPreset) -> Self {
        Window::Preset(preset)
    }
}

impl From<DateRange> for Window {
    fn from(range: DateRange) -> Self {
        Window::Range(range)
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Window::Preset(preset) => preset.fmt(f),
            Window::Range(range) => range.fmt(f),
        }
    }
}

impl FromStr for Window {
    type Err = DomainError;

    /// Accepts a preset name or `YYYY-MM-DD..YYYY-MM-DD`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if let Some((start, end)) = trimmed.split_once(RANGE_SEPARATOR) {
            let start = parse_date(start)?;
            let end = parse_date(end)?;
            return DateRange::new(start, end).map(Window::Range);
        }
        trimmed.parse::<WindowPreset>().map(Window::Preset)
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, DomainError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| DomainError::UnknownWindow(value.trim().to_string()))
}

/// Bucket size for period grouping.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    Week,
    #[default]
    Month,
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Granularity::Day => "day",
            Granularity::Week => "week",
            Granularity::Month => "month",
        };
        f.write_str(label)
    }
}

impl FromStr for Granularity {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "day" | "daily" => Ok(Granularity::Day),
            "week" | "weekly" => Ok(Granularity::Week),
            "month" | "monthly" => Ok(Granularity::Month),
            other => Err(DomainError::UnknownGranularity(other.to_string())),
        }
    }
}

/// Identifies one bucket. Weeks start on Monday.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PeriodKey {
    Day(NaiveDate),
    Week(NaiveDate),
    Month { year: i32, month: u32 },
}

impl PeriodKey {
    pub fn containing(granularity: Granularity, date: NaiveDate) -> Self {
        match granularity {
            Granularity::Day => PeriodKey::Day(date),
            Granularity::Week => PeriodKey::Week(week_start(date)),
            Granularity::Month => PeriodKey::Month {
                year: date.year(),
                month: date.month(),
            },
        }
    }

    pub fn previous(&self) -> Self {
        match *self {
            PeriodKey::Day(date) => PeriodKey::Day(date - Duration::days(1)),
            PeriodKey::Week(start) => PeriodKey::Week(start - Duration::days(7)),
            PeriodKey::Month { year, month: 1 } => PeriodKey::Month {
                year: year - 1,
                month: 12,
            },
            PeriodKey::Month { year, month } => PeriodKey::Month {
                year,
                month: month - 1,
            },
        }
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodKey::Day(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            PeriodKey::Week(start) => write!(f, "week of {}", start.format("%Y-%m-%d")),
            PeriodKey::Month { year, month } => write!(f, "{year:04}-{month:02}"),
        }
    }
}

fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Calendar month subtraction; the day clamps to the end of a shorter month.
pub fn shift_months_back(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_sub_months(Months::new(months))
        .unwrap_or(NaiveDate::MIN)
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn range_rejects_inverted_bounds_but_allows_single_day() {
        assert_eq!(
            DateRange::new(date(2024, 2, 2), date(2024, 2, 1)),
            Err(DomainError::InvalidRange)
        );
        let single = DateRange::new(date(2024, 2, 1), date(2024, 2, 1)).unwrap();
        assert_eq!(single.days(), 1);
        assert!(single.contains(date(2024, 2, 1)));
    }

    #[test]
    fn previous_range_has_equal_length() {
        let range = DateRange::new(date(2024, 3, 1), date(2024, 3, 31)).unwrap();
        let previous = range.previous();
        assert_eq!(previous.end, date(2024, 2, 29));
        assert_eq!(previous.days(), 31);
    }

    #[test]
    fn presets_resolve_with_month_clamping() {
        let today = date(2024, 3, 31);
        assert_eq!(
            WindowPreset::LastMonth.resolve(today).unwrap().start,
            date(2024, 2, 29)
        );
        assert_eq!(
            WindowPreset::LastWeek.resolve(today).unwrap().start,
            date(2024, 3, 24)
        );
        assert_eq!(
            WindowPreset::LastYear.resolve(today).unwrap().start,
            date(2023, 3, 31)
        );
        assert!(WindowPreset::AllTime.resolve(today).is_none());
    }

    #[test]
    fn window_parses_presets_and_ranges() {
        assert_eq!(
            "quarter".parse::<Window>().unwrap(),
            Window::Preset(WindowPreset::LastQuarter)
        );
        let parsed = "2024-01-01..2024-01-31".parse::<Window>().unwrap();
        assert_eq!(
            parsed,
            Window::Range(DateRange::new(date(2024, 1, 1), date(2024, 1, 31)).unwrap())
        );
        assert!("fortnight".parse::<Window>().is_err());
        assert!("2024-02-01..2024-01-01".parse::<Window>().is_err());
    }

    #[test]
    fn unknown_granularity_is_rejected() {
        assert_eq!(
            "hour".parse::<Granularity>(),
            Err(DomainError::UnknownGranularity("hour".into()))
        );
    }

    #[test]
    fn period_keys_bucket_and_step_back() {
        let wednesday = date(2024, 1, 3);
        assert_eq!(
            PeriodKey::containing(Granularity::Week, wednesday),
            PeriodKey::Week(date(2024, 1, 1))
        );
        let january = PeriodKey::containing(Granularity::Month, wednesday);
        assert_eq!(january.previous(), PeriodKey::Month { year: 2023, month: 12 });
        assert_eq!(january.to_string(), "2024-01");
    }
}
