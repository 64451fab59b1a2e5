//! buddy-domain
//!
//! Pure domain models (Expense, ExpenseCategory, windows, profiles).
//! No I/O, no CLI, no storage. Only data types and core enums.

pub mod category;
pub mod error;
pub mod expense;
pub mod profile;
pub mod window;

pub use category::*;
pub use error::DomainError;
pub use expense::*;
pub use profile::*;
pub use window::*;
