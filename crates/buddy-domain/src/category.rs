//! The closed set of expense categories.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::DomainError;

/// Classifies an expense. `Other` is the catch-all and the default for new records.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
pub enum ExpenseCategory {
    Food,
    Travel,
    Utilities,
    Entertainment,
    Healthcare,
    Shopping,
    Education,
    #[default]
    Other,
}

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; 8] = [
        ExpenseCategory::Food,
        ExpenseCategory::Travel,
        ExpenseCategory::Utilities,
        ExpenseCategory::Entertainment,
        ExpenseCategory::Healthcare,
        ExpenseCategory::Shopping,
        ExpenseCategory::Education,
        ExpenseCategory::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ExpenseCategory::Food => "Food",
            ExpenseCategory::Travel => "Travel",
            ExpenseCategory::Utilities => "Utilities",
            ExpenseCategory::Entertainment => "Entertainment",
            ExpenseCategory::Healthcare => "Healthcare",
            ExpenseCategory::Shopping => "Shopping",
            ExpenseCategory::Education => "Education",
            ExpenseCategory::Other => "Other",
        }
    }
}

impl fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ExpenseCategory {
    type Err = DomainError;

    /// Case-insensitive match against the category labels.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        ExpenseCategory::ALL
            .into_iter()
            .find(|category| category.label().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| DomainError::UnknownCategory(trimmed.to_string()))
    }
}
