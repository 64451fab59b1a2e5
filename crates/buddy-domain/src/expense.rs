//! Expense records in their validated, raw (wire) and form shapes.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{DomainError, ExpenseCategory};

/// Largest amount a single expense may carry (one trillion).
///
/// Keeps every sum over a realistic number of rows inside `Decimal` range.
pub const MAX_EXPENSE_AMOUNT: Decimal = Decimal::from_parts(3_567_587_328, 232, 0, false, 0);

/// Opaque identifier assigned by the expense store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct ExpenseId(pub String);

impl ExpenseId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExpenseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The authenticated user that owns a record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct OwnerId(pub Uuid);

impl OwnerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OwnerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A validated expense: positive amount, known category, real calendar date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Expense {
    pub id: ExpenseId,
    pub owner: OwnerId,
    pub name: String,
    pub amount: Decimal,
    pub category: ExpenseCategory,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<String>,
}

impl Expense {
    pub fn has_attachment(&self) -> bool {
        self.attachment.is_some()
    }

    /// Converts back to the wire row, writing the amount as an exact decimal string.
    pub fn to_raw(&self) -> RawExpense {
        RawExpense {
            id: self.id.0.clone(),
            user_id: self.owner.to_string(),
            expense_name: self.name.clone(),
            amount: serde_json::Value::String(self.amount.to_string()),
            category: self.category.label().to_string(),
            date: self.date.format("%Y-%m-%d").to_string(),
            created_at: Some(self.created_at.to_rfc3339()),
            attachment: self.attachment.clone(),
        }
    }
}

/// A row exactly as the store returns it. Nothing here is trusted until ingested.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawExpense {
    pub id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub expense_name: String,
    #[serde(default)]
    pub amount: serde_json::Value,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<String>,
}

impl RawExpense {
    /// Applies a patch directly to the wire fields, mirroring [`ExpensePatch::apply_to`].
    pub fn apply_patch(&mut self, patch: &ExpensePatch) {
        if let Some(name) = &patch.name {
            self.expense_name = name.trim().to_string();
        }
        if let Some(amount) = patch.amount {
            self.amount = serde_json::Value::String(amount.to_string());
        }
        if let Some(category) = patch.category {
            self.category = category.label().to_string();
        }
        if let Some(date) = patch.date {
            self.date = date.format("%Y-%m-%d").to_string();
        }
        if let Some(attachment) = &patch.attachment {
            self.attachment = attachment.clone();
        }
    }
}

/// Insert form. Category falls back to `Other` when the caller has none.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewExpense {
    pub name: String,
    pub amount: Decimal,
    #[serde(default)]
    pub category: ExpenseCategory,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<String>,
}

impl NewExpense {
    pub fn new(
        name: impl Into<String>,
        amount: Decimal,
        category: ExpenseCategory,
        date: NaiveDate,
    ) -> Self {
        Self {
            name: name.into(),
            amount,
            category,
            date,
            attachment: None,
        }
    }

    pub fn with_attachment(mut self, attachment: impl Into<String>) -> Self {
        self.attachment = Some(attachment.into());
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        validate_name(&self.name)?;
        validate_amount(self.amount)
    }

    pub fn into_expense(
        self,
        id: ExpenseId,
        owner: OwnerId,
        created_at: DateTime<Utc>,
    ) -> Expense {
        Expense {
            id,
            owner,
            name: self.name.trim().to_string(),
            amount: self.amount,
            category: self.category,
            date: self.date,
            created_at,
            attachment: self.attachment,
        }
    }
}

/// Partial update. `attachment: Some(None)` clears the receipt reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExpensePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<ExpenseCategory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Option<String>>,
}

impl ExpensePatch {
    pub fn attachment(reference: impl Into<String>) -> Self {
        Self {
            attachment: Some(Some(reference.into())),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.amount.is_none()
            && self.category.is_none()
            && self.date.is_none()
            && self.attachment.is_none()
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.is_empty() {
            return Err(DomainError::Validation("update contains no fields".into()));
        }
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(amount) = self.amount {
            validate_amount(amount)?;
        }
        Ok(())
    }

    /// Applies the patch in place. Identity, owner and `created_at` are never touched.
    pub fn apply_to(&self, expense: &mut Expense) {
        if let Some(name) = &self.name {
            expense.name = name.trim().to_string();
        }
        if let Some(amount) = self.amount {
            expense.amount = amount;
        }
        if let Some(category) = self.category {
            expense.category = category;
        }
        if let Some(date) = self.date {
            expense.date = date;
        }
        if let Some(attachment) = &self.attachment {
            expense.attachment = attachment.clone();
        }
    }
}

fn validate_name(name: &str) -> Result<(), DomainError> {
    if name.trim().is_empty() {
        return Err(DomainError::Validation("expense name must not be empty".into()));
    }
    Ok(())
}

fn validate_amount(amount: Decimal) -> Result<(), DomainError> {
    if amount <= Decimal::ZERO {
        return Err(DomainError::Validation(format!(
            "expense amount must be positive, got {amount}"
        )));
    }
    if amount > MAX_EXPENSE_AMOUNT {
        return Err(DomainError::Validation(format!(
            "expense amount must not exceed {MAX_EXPENSE_AMOUNT}, got {amount}"
        )));
    }
    Ok(())
}
