//! One analytics pass backing every dashboard view.

use buddy_domain::{DateRange, Expense, ExpenseCategory, Granularity, Window, WindowPreset};
use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::{
    aggregation::{
        average_daily, average_per_transaction, budget_suggestion, day_type_split,
        filter_by_category, filter_by_range, group_by_category, group_by_period,
        period_over_period_delta, recent, span, top_category, top_n, total, BudgetSuggestion,
        CategoryBreakdown, DayTypeSplit, Delta, PeriodFill, PeriodTotal,
    },
    ingest::{Anomaly, Ingested},
    CoreError,
};

pub const DEFAULT_TRAILING_PERIODS: u32 = 6;
pub const DEFAULT_TOP_N: usize = 5;
/// Days before the window end covered by the daily activity view.
pub const ACTIVITY_DAYS: i64 = 30;
/// Average daily spending above this is flagged in the insights.
pub const DAILY_SPENDING_HINT: Decimal = Decimal::from_parts(50, 0, 0, false, 0);

/// Parameters for [`build_report`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyticsRequest {
    pub window: Option<Window>,
    pub category: Option<ExpenseCategory>,
    pub granularity: Granularity,
    pub trailing_periods: u32,
    pub top_n: usize,
    pub budget_margin: Decimal,
    pub today: NaiveDate,
}

impl AnalyticsRequest {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            window: Some(Window::Preset(WindowPreset::LastMonth)),
            category: None,
            granularity: Granularity::Month,
            trailing_periods: DEFAULT_TRAILING_PERIODS,
            top_n: DEFAULT_TOP_N,
            budget_margin: Decimal::new(1, 1),
            today,
        }
    }

    pub fn with_window(mut self, window: impl Into<Window>) -> Self {
        self.window = Some(window.into());
        self
    }

    pub fn with_category(mut self, category: Option<ExpenseCategory>) -> Self {
        self.category = category;
        self
    }

    pub fn with_granularity(mut self, granularity: Granularity, trailing_periods: u32) -> Self {
        self.granularity = granularity;
        self.trailing_periods = trailing_periods;
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn with_budget_margin(mut self, margin: Decimal) -> Self {
        self.budget_margin = margin;
        self
    }

    fn validate(&self) -> Result<(), CoreError> {
        if self.top_n == 0 {
            return Err(CoreError::InvalidParameter(
                "top-N size must be at least 1".into(),
            ));
        }
        if self.trailing_periods == 0 {
            return Err(CoreError::InvalidParameter(
                "trailing period count must be at least 1".into(),
            ));
        }
        if self.budget_margin < Decimal::ZERO {
            return Err(CoreError::InvalidParameter(format!(
                "budget margin must not be negative, got {}",
                self.budget_margin
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Insights {
    /// Average daily spending is above [`DAILY_SPENDING_HINT`].
    pub high_daily_spending: bool,
    /// Largest category and its share of the total, in percent.
    pub top_category_share: Option<(ExpenseCategory, Decimal)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalyticsReport {
    /// `None` for all-time requests.
    pub range: Option<DateRange>,
    pub expense_count: usize,
    pub total: Decimal,
    pub average_per_transaction: Decimal,
    pub average_daily: Decimal,
    pub categories: CategoryBreakdown,
    /// Zero-filled trailing buckets ending at the window end.
    pub trend: Vec<PeriodTotal>,
    /// Days with spending among the last [`ACTIVITY_DAYS`] before the window end.
    pub daily_activity: Vec<PeriodTotal>,
    pub top_category: Option<ExpenseCategory>,
    pub top_expenses: Vec<Expense>,
    pub recent: Vec<Expense>,
    pub previous_total: Option<Decimal>,
    pub delta: Option<Delta>,
    pub budget: BudgetSuggestion,
    pub day_split: DayTypeSplit,
    pub insights: Insights,
    pub anomalies: Vec<Anomaly>,
}

/// Builds every derived figure for one request.
///
/// The category filter applies to everything. The window applies to totals,
/// breakdown, top list and averages; the trend always covers the trailing periods
/// ending at the window end so that it stays continuous.
pub fn build_report(
    ingested: &Ingested,
    request: &AnalyticsRequest,
) -> Result<AnalyticsReport, CoreError> {
    request.validate()?;

    let scoped = filter_by_category(&ingested.expenses, request.category);
    let range = request
        .window
        .as_ref()
        .and_then(|window| window.resolve(request.today));
    let current = filter_by_range(&scoped, range);
    let current_total = total(&current);

    let anchor = range.map(|r| r.end).unwrap_or(request.today);
    let trend = group_by_period(
        &scoped,
        request.granularity,
        PeriodFill::Trailing {
            periods: request.trailing_periods,
            anchor,
        },
    )?;

    let activity_range = DateRange {
        start: anchor - Duration::days(ACTIVITY_DAYS),
        end: anchor,
    };
    let daily_activity = group_by_period(
        &filter_by_range(&scoped, Some(activity_range)),
        Granularity::Day,
        PeriodFill::Sparse,
    )?;

    let (previous_total, delta) = match range {
        Some(range) => {
            let previous = total(&filter_by_range(&scoped, Some(range.previous())));
            (
                Some(previous),
                Some(period_over_period_delta(current_total, previous)),
            )
        }
        None => (None, None),
    };

    // All-time requests average over the span the data actually covers.
    let averaging_range = range.or_else(|| span(&current));
    let (average_daily, day_split) = match averaging_range {
        Some(r) => (average_daily(&current, r), day_type_split(&current, r)),
        None => (Decimal::ZERO, DayTypeSplit::default()),
    };

    let categories = group_by_category(&current);
    let top = top_category(&current);
    let insights = Insights {
        high_daily_spending: average_daily > DAILY_SPENDING_HINT,
        top_category_share: top
            .and_then(|category| categories.get(category).map(|t| (category, t.percentage))),
    };

    Ok(AnalyticsReport {
        range,
        expense_count: current.len(),
        total: current_total,
        average_per_transaction: average_per_transaction(&current),
        average_daily,
        categories,
        trend,
        daily_activity,
        top_category: top,
        top_expenses: top_n(&current, request.top_n)?,
        recent: recent(&current, request.top_n),
        previous_total,
        delta,
        budget: budget_suggestion(current_total, request.budget_margin)?,
        day_split,
        insights,
        anomalies: ingested.anomalies.clone(),
    })
}
