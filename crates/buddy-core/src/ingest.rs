//! Turns raw store rows into validated expenses, counting every row it has to drop.

use std::{fmt, str::FromStr};

use buddy_domain::{
    Expense, ExpenseCategory, ExpenseId, OwnerId, RawExpense, MAX_EXPENSE_AMOUNT,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

/// Why a raw row was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum AnomalyKind {
    NonNumericAmount(String),
    NonPositiveAmount(Decimal),
    AmountOutOfRange(Decimal),
    UnparseableDate(String),
    UnknownCategory(String),
    EmptyName,
    InvalidOwner(String),
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnomalyKind::NonNumericAmount(raw) => write!(f, "amount `{raw}` is not numeric"),
            AnomalyKind::NonPositiveAmount(amount) => write!(f, "amount {amount} is not positive"),
            AnomalyKind::AmountOutOfRange(amount) => {
                write!(f, "amount {amount} exceeds {MAX_EXPENSE_AMOUNT}")
            }
            AnomalyKind::UnparseableDate(raw) => write!(f, "date `{raw}` is not a calendar date"),
            AnomalyKind::UnknownCategory(raw) => write!(f, "category `{raw}` is not recognised"),
            AnomalyKind::EmptyName => f.write_str("name is empty"),
            AnomalyKind::InvalidOwner(raw) => write!(f, "owner `{raw}` is not a valid user id"),
        }
    }
}

/// A skipped row together with the reason it was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Anomaly {
    pub record_id: String,
    pub kind: AnomalyKind,
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "record {}: {}", self.record_id, self.kind)
    }
}

/// Valid expenses plus the rows that could not be trusted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ingested {
    pub expenses: Vec<Expense>,
    pub anomalies: Vec<Anomaly>,
}

impl Ingested {
    pub fn is_clean(&self) -> bool {
        self.anomalies.is_empty()
    }

    pub fn anomaly_count(&self) -> usize {
        self.anomalies.len()
    }
}

pub fn ingest(records: &[RawExpense]) -> Ingested {
    let mut ingested = Ingested::default();
    for record in records {
        match validate(record) {
            Ok(expense) => ingested.expenses.push(expense),
            Err(kind) => ingested.anomalies.push(Anomaly {
                record_id: record.id.clone(),
                kind,
            }),
        }
    }
    if !ingested.is_clean() {
        warn!(
            skipped = ingested.anomalies.len(),
            kept = ingested.expenses.len(),
            "skipped malformed expense records"
        );
    }
    ingested
}

fn validate(record: &RawExpense) -> Result<Expense, AnomalyKind> {
    let name = record.expense_name.trim();
    if name.is_empty() {
        return Err(AnomalyKind::EmptyName);
    }
    let amount = parse_amount(&record.amount)?;
    if amount <= Decimal::ZERO {
        return Err(AnomalyKind::NonPositiveAmount(amount));
    }
    if amount > MAX_EXPENSE_AMOUNT {
        return Err(AnomalyKind::AmountOutOfRange(amount));
    }
    let category = ExpenseCategory::from_str(&record.category)
        .map_err(|_| AnomalyKind::UnknownCategory(record.category.clone()))?;
    let date = parse_date(&record.date)
        .ok_or_else(|| AnomalyKind::UnparseableDate(record.date.clone()))?;
    let owner = Uuid::parse_str(record.user_id.trim())
        .map(OwnerId)
        .map_err(|_| AnomalyKind::InvalidOwner(record.user_id.clone()))?;
    // A missing creation stamp only affects default ordering, so fall back to the expense date.
    let created_at = record
        .created_at
        .as_deref()
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|stamp| stamp.with_timezone(&Utc))
        .unwrap_or_else(|| DateTime::from_naive_utc_and_offset(date.and_time(NaiveTime::MIN), Utc));

    Ok(Expense {
        id: ExpenseId::new(record.id.clone()),
        owner,
        name: name.to_string(),
        amount,
        category,
        date,
        created_at,
        attachment: record.attachment.clone().filter(|value| !value.trim().is_empty()),
    })
}

/// Accepts JSON numbers and numeric strings. Floats are read through their decimal text.
pub fn parse_amount(value: &Value) -> Result<Decimal, AnomalyKind> {
    let text = match value {
        Value::Number(number) => number.to_string(),
        Value::String(raw) => raw.trim().to_string(),
        other => return Err(AnomalyKind::NonNumericAmount(other.to_string())),
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| AnomalyKind::NonNumericAmount(text))
}

/// `YYYY-MM-DD`, or an RFC 3339 timestamp truncated to its date.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(trimmed)
                .ok()
                .map(|stamp| stamp.date_naive())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(id: &str, amount: Value, category: &str, date: &str) -> RawExpense {
        RawExpense {
            id: id.into(),
            user_id: "6f1c3c36-64a4-4c57-9b53-0b3b1c1f3e01".into(),
            expense_name: "Coffee".into(),
            amount,
            category: category.into(),
            date: date.into(),
            created_at: Some("2024-05-01T08:30:00+00:00".into()),
            attachment: None,
        }
    }

    #[test]
    fn keeps_valid_rows_from_numbers_and_strings() {
        let records = vec![
            raw("a", json!(4.5), "Food", "2024-05-01"),
            raw("b", json!("12.30"), "travel", "2024-05-02T10:00:00Z"),
        ];
        let ingested = ingest(&records);
        assert!(ingested.is_clean());
        assert_eq!(ingested.expenses.len(), 2);
        assert_eq!(ingested.expenses[0].amount, Decimal::new(45, 1));
        assert_eq!(ingested.expenses[1].category, ExpenseCategory::Travel);
        assert_eq!(
            ingested.expenses[1].date,
            NaiveDate::from_ymd_opt(2024, 5, 2).unwrap()
        );
    }

    #[test]
    fn malformed_rows_are_counted_not_summed() {
        let records = vec![
            raw("ok", json!(10), "Food", "2024-05-01"),
            raw("amount", json!("ten"), "Food", "2024-05-01"),
            raw("negative", json!(-3), "Food", "2024-05-01"),
            raw("date", json!(5), "Food", "2024-13-45"),
            raw("category", json!(5), "Groceries", "2024-05-01"),
            raw("null", Value::Null, "Food", "2024-05-01"),
        ];
        let ingested = ingest(&records);
        assert_eq!(ingested.expenses.len(), 1);
        assert_eq!(ingested.anomaly_count(), 5);
        let kinds: Vec<_> = ingested.anomalies.iter().map(|a| a.record_id.as_str()).collect();
        assert_eq!(kinds, ["amount", "negative", "date", "category", "null"]);
        assert_eq!(
            ingested.anomalies[2].kind,
            AnomalyKind::UnparseableDate("2024-13-45".into())
        );
    }

    #[test]
    fn oversized_amounts_are_anomalies() {
        let records = vec![
            raw("huge-1", json!("50000000000000000000000000000"), "Other", "2024-05-01"),
            raw("huge-2", json!("50000000000000000000000000000"), "Other", "2024-05-02"),
            raw("ceiling", json!("1000000000000"), "Other", "2024-05-03"),
        ];
        let ingested = ingest(&records);
        assert_eq!(ingested.expenses.len(), 1);
        assert_eq!(ingested.expenses[0].id.as_str(), "ceiling");
        assert_eq!(ingested.anomaly_count(), 2);
        assert!(matches!(
            ingested.anomalies[0].kind,
            AnomalyKind::AmountOutOfRange(_)
        ));
    }

    #[test]
    fn blank_name_and_bad_owner_are_anomalies() {
        let mut blank = raw("blank", json!(1), "Food", "2024-05-01");
        blank.expense_name = "   ".into();
        let mut stranger = raw("owner", json!(1), "Food", "2024-05-01");
        stranger.user_id = "not-a-uuid".into();
        let ingested = ingest(&[blank, stranger]);
        assert_eq!(ingested.anomalies[0].kind, AnomalyKind::EmptyName);
        assert!(matches!(ingested.anomalies[1].kind, AnomalyKind::InvalidOwner(_)));
    }

    #[test]
    fn missing_created_at_falls_back_to_expense_date() {
        let mut record = raw("a", json!(1), "Other", "2024-02-10");
        record.created_at = None;
        let ingested = ingest(&[record]);
        assert_eq!(
            ingested.expenses[0].created_at.date_naive(),
            NaiveDate::from_ymd_opt(2024, 2, 10).unwrap()
        );
    }

    #[test]
    fn empty_input_is_not_an_error() {
        let ingested = ingest(&[]);
        assert!(ingested.expenses.is_empty());
        assert!(ingested.is_clean());
    }
}
