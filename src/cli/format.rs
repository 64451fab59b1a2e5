use buddy_core::{BudgetSuggestion, Delta};
use buddy_domain::{Expense, ExpenseId};
use rust_decimal::{Decimal, RoundingStrategy};

const SHORT_ID_LEN: usize = 8;

pub fn money(amount: Decimal, currency: &str) -> String {
    format!(
        "{:.2} {}",
        amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        currency
    )
}

pub fn percent(value: Decimal) -> String {
    format!(
        "{:.1}%",
        value.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
    )
}

pub fn short_id(id: &ExpenseId) -> String {
    id.as_str().chars().take(SHORT_ID_LEN).collect()
}

pub fn delta(delta: &Delta) -> String {
    match delta {
        Delta::Change(change) if change.is_sign_negative() => percent(*change),
        Delta::Change(change) => format!("+{}", percent(*change)),
        Delta::NoBaseline => "n/a (no spending in the previous period)".into(),
        Delta::OutOfRange => "n/a (previous period too small to compare)".into(),
    }
}

pub fn budget(suggestion: &BudgetSuggestion, currency: &str) -> String {
    match suggestion {
        BudgetSuggestion::Suggested(amount) => money(*amount, currency),
        BudgetSuggestion::NotEnoughData => "not enough data".into(),
    }
}

pub fn receipt_marker(expense: &Expense) -> &'static str {
    if expense.has_attachment() {
        "yes"
    } else {
        ""
    }
}
