//! CSV export of a filtered expense list.

use std::io::Write;

use buddy_domain::Expense;
use chrono::NaiveDate;

use crate::CoreError;

pub const EXPORT_HEADERS: [&str; 4] = ["Date", "Name", "Category", "Amount"];

/// Writes the header plus one row per expense and returns the number of rows written.
pub fn export_csv<W: Write>(expenses: &[Expense], writer: W) -> Result<usize, CoreError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(EXPORT_HEADERS)?;
    for expense in expenses {
        csv.write_record([
            expense.date.format("%Y-%m-%d").to_string(),
            expense.name.clone(),
            expense.category.label().to_string(),
            expense.amount.to_string(),
        ])?;
    }
    csv.flush()?;
    Ok(expenses.len())
}

/// Default download name, e.g. `expenses_2024-05-01.csv`.
pub fn export_file_name(today: NaiveDate) -> String {
    format!("expenses_{}.csv", today.format("%Y-%m-%d"))
}
