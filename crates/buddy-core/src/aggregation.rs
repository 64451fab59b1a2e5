//! Pure aggregation passes over an in-memory expense snapshot.
//!
//! Nothing here performs I/O or keeps state between calls. Empty input always
//! produces empty or zero results; only degenerate parameters are errors.

use std::{cmp::Ordering, collections::BTreeMap};

use buddy_domain::{
    is_weekend, DateRange, Expense, ExpenseCategory, Granularity, PeriodKey, Window,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::CoreError;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Keeps expenses dated inside the window, boundaries inclusive.
///
/// Presets are resolved against `today`; `None` and all-time return the input unchanged.
pub fn filter_by_window(
    expenses: &[Expense],
    window: Option<&Window>,
    today: NaiveDate,
) -> Vec<Expense> {
    filter_by_range(expenses, window.and_then(|w| w.resolve(today)))
}

pub fn filter_by_range(expenses: &[Expense], range: Option<DateRange>) -> Vec<Expense> {
    match range {
        Some(range) => expenses
            .iter()
            .filter(|expense| range.contains(expense.date))
            .cloned()
            .collect(),
        None => expenses.to_vec(),
    }
}

pub fn filter_by_category(
    expenses: &[Expense],
    category: Option<ExpenseCategory>,
) -> Vec<Expense> {
    match category {
        Some(category) => expenses
            .iter()
            .filter(|expense| expense.category == category)
            .cloned()
            .collect(),
        None => expenses.to_vec(),
    }
}

pub fn total(expenses: &[Expense]) -> Decimal {
    expenses.iter().map(|expense| expense.amount).sum()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    pub amount: Decimal,
    pub percentage: Decimal,
    pub count: usize,
}

/// Per-category totals over the visible set. Categories absent from the input are absent here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryBreakdown {
    pub totals: BTreeMap<ExpenseCategory, CategoryTotal>,
    pub grand_total: Decimal,
}

impl CategoryBreakdown {
    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    pub fn get(&self, category: ExpenseCategory) -> Option<&CategoryTotal> {
        self.totals.get(&category)
    }

    /// Largest first; equal amounts keep category declaration order.
    pub fn sorted_by_amount(&self) -> Vec<(ExpenseCategory, CategoryTotal)> {
        let mut rows: Vec<_> = self
            .totals
            .iter()
            .map(|(category, total)| (*category, *total))
            .collect();
        rows.sort_by(|a, b| b.1.amount.cmp(&a.1.amount).then(a.0.cmp(&b.0)));
        rows
    }

    pub fn top(&self) -> Option<(ExpenseCategory, CategoryTotal)> {
        self.sorted_by_amount().into_iter().next()
    }
}

pub fn group_by_category(expenses: &[Expense]) -> CategoryBreakdown {
    let mut sums: BTreeMap<ExpenseCategory, (Decimal, usize)> = BTreeMap::new();
    for expense in expenses {
        let entry = sums.entry(expense.category).or_insert((Decimal::ZERO, 0));
        entry.0 += expense.amount;
        entry.1 += 1;
    }
    let grand_total: Decimal = sums.values().map(|(amount, _)| *amount).sum();
    let totals = sums
        .into_iter()
        .map(|(category, (amount, count))| {
            let total = CategoryTotal {
                amount,
                percentage: percent_of(amount, grand_total),
                count,
            };
            (category, total)
        })
        .collect();
    CategoryBreakdown {
        totals,
        grand_total,
    }
}

/// Largest category by amount; ties go to the category declared first.
pub fn top_category(expenses: &[Expense]) -> Option<ExpenseCategory> {
    group_by_category(expenses).top().map(|(category, _)| category)
}

fn percent_of(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        return Decimal::ZERO;
    }
    part / whole * HUNDRED
}

/// How empty buckets are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodFill {
    /// Only buckets that received at least one expense, ascending.
    Sparse,
    /// Exactly `periods` consecutive buckets ending with the one containing `anchor`,
    /// zero-filled. Expenses outside those buckets are ignored.
    Trailing { periods: u32, anchor: NaiveDate },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PeriodTotal {
    pub period: PeriodKey,
    pub amount: Decimal,
    pub count: usize,
}

pub fn group_by_period(
    expenses: &[Expense],
    granularity: Granularity,
    fill: PeriodFill,
) -> Result<Vec<PeriodTotal>, CoreError> {
    let mut buckets: BTreeMap<PeriodKey, (Decimal, usize)> = BTreeMap::new();

    if let PeriodFill::Trailing { periods, anchor } = fill {
        if periods == 0 {
            return Err(CoreError::InvalidParameter(
                "trailing period count must be at least 1".into(),
            ));
        }
        let mut key = PeriodKey::containing(granularity, anchor);
        for _ in 0..periods {
            buckets.insert(key, (Decimal::ZERO, 0));
            key = key.previous();
        }
    }

    for expense in expenses {
        let key = PeriodKey::containing(granularity, expense.date);
        match fill {
            PeriodFill::Sparse => {
                let entry = buckets.entry(key).or_insert((Decimal::ZERO, 0));
                entry.0 += expense.amount;
                entry.1 += 1;
            }
            PeriodFill::Trailing { .. } => {
                if let Some(entry) = buckets.get_mut(&key) {
                    entry.0 += expense.amount;
                    entry.1 += 1;
                }
            }
        }
    }

    Ok(buckets
        .into_iter()
        .map(|(period, (amount, count))| PeriodTotal {
            period,
            amount,
            count,
        })
        .collect())
}

/// Largest amount first, then earlier date, then identifier.
fn by_amount_desc(a: &Expense, b: &Expense) -> Ordering {
    b.amount
        .cmp(&a.amount)
        .then(a.date.cmp(&b.date))
        .then_with(|| a.id.cmp(&b.id))
}

pub fn top_n(expenses: &[Expense], n: usize) -> Result<Vec<Expense>, CoreError> {
    if n == 0 {
        return Err(CoreError::InvalidParameter(
            "top-N size must be at least 1".into(),
        ));
    }
    let mut sorted = expenses.to_vec();
    sorted.sort_by(by_amount_desc);
    sorted.truncate(n);
    Ok(sorted)
}

/// Most recently created first.
pub fn recent(expenses: &[Expense], n: usize) -> Vec<Expense> {
    let mut sorted = expenses.to_vec();
    sorted.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
    sorted.truncate(n);
    sorted
}

/// Percentage change between two adjacent totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Delta {
    Change(Decimal),
    /// The previous total was zero while the current one was not.
    NoBaseline,
    /// The change is too large to express, e.g. against a near-zero baseline.
    OutOfRange,
}

pub fn period_over_period_delta(current: Decimal, previous: Decimal) -> Delta {
    if previous.is_zero() {
        return if current.is_zero() {
            Delta::Change(Decimal::ZERO)
        } else {
            Delta::NoBaseline
        };
    }
    current
        .checked_sub(previous)
        .and_then(|diff| diff.checked_div(previous))
        .and_then(|ratio| ratio.checked_mul(HUNDRED))
        .map_or(Delta::OutOfRange, Delta::Change)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BudgetSuggestion {
    Suggested(Decimal),
    NotEnoughData,
}

/// `period_total * (1 + margin)`; non-positive totals carry no signal.
pub fn budget_suggestion(
    period_total: Decimal,
    margin: Decimal,
) -> Result<BudgetSuggestion, CoreError> {
    if margin < Decimal::ZERO {
        return Err(CoreError::InvalidParameter(format!(
            "budget margin must not be negative, got {margin}"
        )));
    }
    if period_total <= Decimal::ZERO {
        return Ok(BudgetSuggestion::NotEnoughData);
    }
    Decimal::ONE
        .checked_add(margin)
        .and_then(|factor| period_total.checked_mul(factor))
        .map(BudgetSuggestion::Suggested)
        .ok_or_else(|| {
            CoreError::InvalidParameter(format!("budget margin {margin} is too large"))
        })
}

pub fn average_per_transaction(expenses: &[Expense]) -> Decimal {
    if expenses.is_empty() {
        return Decimal::ZERO;
    }
    total(expenses) / Decimal::from(expenses.len())
}

/// Total of the expenses inside `range` divided by the days the range covers.
pub fn average_daily(expenses: &[Expense], range: DateRange) -> Decimal {
    let inside = filter_by_range(expenses, Some(range));
    total(&inside) / Decimal::from(range.days())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DayTypeStats {
    pub total: Decimal,
    pub transactions: usize,
    pub days: i64,
    pub average_per_day: Decimal,
    pub average_per_transaction: Decimal,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DayTypeSplit {
    pub weekday: DayTypeStats,
    pub weekend: DayTypeStats,
}

/// Weekday against weekend spending, averaged over the real number of each kind
/// of day inside `range`.
pub fn day_type_split(expenses: &[Expense], range: DateRange) -> DayTypeSplit {
    let mut split = DayTypeSplit::default();
    for day in range.iter_days() {
        if is_weekend(day) {
            split.weekend.days += 1;
        } else {
            split.weekday.days += 1;
        }
    }
    for expense in expenses.iter().filter(|e| range.contains(e.date)) {
        let stats = if is_weekend(expense.date) {
            &mut split.weekend
        } else {
            &mut split.weekday
        };
        stats.total += expense.amount;
        stats.transactions += 1;
    }
    for stats in [&mut split.weekday, &mut split.weekend] {
        if stats.days > 0 {
            stats.average_per_day = stats.total / Decimal::from(stats.days);
        }
        if stats.transactions > 0 {
            stats.average_per_transaction = stats.total / Decimal::from(stats.transactions);
        }
    }
    split
}

/// Earliest to latest expense date, or `None` for an empty list.
pub fn span(expenses: &[Expense]) -> Option<DateRange> {
    let start = expenses.iter().map(|e| e.date).min()?;
    let end = expenses.iter().map(|e| e.date).max()?;
    Some(DateRange { start, end })
}
