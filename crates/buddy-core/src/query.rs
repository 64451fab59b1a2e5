//! Search, filter and sort for expense listings.

use std::{cmp::Ordering, fmt, str::FromStr};

use buddy_domain::{DateRange, DomainError, Expense, ExpenseCategory};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    #[default]
    DateNewest,
    DateOldest,
    AmountHigh,
    AmountLow,
    Name,
    Category,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SortOrder::DateNewest => "date-new",
            SortOrder::DateOldest => "date-old",
            SortOrder::AmountHigh => "amount-high",
            SortOrder::AmountLow => "amount-low",
            SortOrder::Name => "name",
            SortOrder::Category => "category",
        };
        f.write_str(label)
    }
}

impl FromStr for SortOrder {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "date" | "date-new" | "newest" => Ok(SortOrder::DateNewest),
            "date-old" | "oldest" => Ok(SortOrder::DateOldest),
            "amount" | "amount-high" => Ok(SortOrder::AmountHigh),
            "amount-low" => Ok(SortOrder::AmountLow),
            "name" => Ok(SortOrder::Name),
            "category" => Ok(SortOrder::Category),
            other => Err(DomainError::UnknownSortOrder(other.to_string())),
        }
    }
}

/// Listing parameters, passed explicitly instead of living in view state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpenseQuery {
    pub search: Option<String>,
    pub category: Option<ExpenseCategory>,
    pub range: Option<DateRange>,
    pub sort: SortOrder,
}

impl ExpenseQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        let term = term.into();
        self.search = (!term.trim().is_empty()).then_some(term);
        self
    }

    pub fn with_category(mut self, category: ExpenseCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_range(mut self, range: DateRange) -> Self {
        self.range = Some(range);
        self
    }

    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    pub fn matches(&self, expense: &Expense) -> bool {
        let search_ok = self.search.as_ref().map_or(true, |term| {
            expense
                .name
                .to_lowercase()
                .contains(&term.trim().to_lowercase())
        });
        let category_ok = self.category.map_or(true, |c| expense.category == c);
        let range_ok = self.range.map_or(true, |r| r.contains(expense.date));
        search_ok && category_ok && range_ok
    }

    pub fn apply(&self, expenses: &[Expense]) -> Vec<Expense> {
        let mut rows: Vec<Expense> = expenses
            .iter()
            .filter(|expense| self.matches(expense))
            .cloned()
            .collect();
        rows.sort_by(|a, b| compare(self.sort, a, b).then_with(|| a.id.cmp(&b.id)));
        rows
    }
}

fn compare(sort: SortOrder, a: &Expense, b: &Expense) -> Ordering {
    match sort {
        SortOrder::DateNewest => b
            .date
            .cmp(&a.date)
            .then(b.created_at.cmp(&a.created_at)),
        SortOrder::DateOldest => a
            .date
            .cmp(&b.date)
            .then(a.created_at.cmp(&b.created_at)),
        SortOrder::AmountHigh => b.amount.cmp(&a.amount),
        SortOrder::AmountLow => a.amount.cmp(&b.amount),
        SortOrder::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        SortOrder::Category => a.category.label().cmp(b.category.label()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use buddy_domain::{ExpenseId, OwnerId};
    use chrono::{NaiveDate, TimeZone, Utc};
    use rust_decimal::Decimal;

    fn expense(id: &str, name: &str, category: ExpenseCategory, amount: i64, day: u32) -> Expense {
        Expense {
            id: ExpenseId::new(id),
            owner: OwnerId(uuid::Uuid::nil()),
            name: name.into(),
            amount: Decimal::from(amount),
            category,
            date: NaiveDate::from_ymd_opt(2024, 6, day).unwrap(),
            created_at: Utc.with_ymd_and_hms(2024, 6, day, 9, 0, 0).unwrap(),
            attachment: None,
        }
    }

    fn sample() -> Vec<Expense> {
        vec![
            expense("1", "Grocery run", ExpenseCategory::Food, 80, 3),
            expense("2", "Bus pass", ExpenseCategory::Travel, 45, 1),
            expense("3", "grocery top-up", ExpenseCategory::Food, 12, 7),
            expense("4", "Cinema", ExpenseCategory::Entertainment, 18, 5),
        ]
    }

    fn ids(rows: &[Expense]) -> Vec<&str> {
        rows.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn search_is_case_insensitive() {
        let rows = ExpenseQuery::new().with_search("GROCERY").apply(&sample());
        assert_eq!(ids(&rows), ["3", "1"]);
    }

    #[test]
    fn default_sort_is_newest_first() {
        let rows = ExpenseQuery::new().apply(&sample());
        assert_eq!(ids(&rows), ["3", "4", "1", "2"]);
    }

    #[test]
    fn filters_combine() {
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2024, 6, 2).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 6).unwrap(),
        )
        .unwrap();
        let rows = ExpenseQuery::new()
            .with_category(ExpenseCategory::Food)
            .with_range(range)
            .apply(&sample());
        assert_eq!(ids(&rows), ["1"]);
    }

    #[test]
    fn sorts_by_amount_and_name() {
        let by_amount = ExpenseQuery::new()
            .with_sort(SortOrder::AmountLow)
            .apply(&sample());
        assert_eq!(ids(&by_amount), ["3", "4", "2", "1"]);
        let by_name = ExpenseQuery::new().with_sort(SortOrder::Name).apply(&sample());
        assert_eq!(ids(&by_name), ["2", "4", "1", "3"]);
    }

    #[test]
    fn blank_search_is_ignored() {
        assert!(ExpenseQuery::new().with_search("  ").search.is_none());
    }

    #[test]
    fn parses_sort_aliases() {
        assert_eq!("amount".parse::<SortOrder>(), Ok(SortOrder::AmountHigh));
        assert!("random".parse::<SortOrder>().is_err());
    }
}
