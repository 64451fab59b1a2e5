//! buddy-core
//!
//! Expense aggregation engine and the services around it.
//! Depends on buddy-domain. No CLI, no terminal I/O; storage only through traits.

pub mod aggregation;
pub mod error;
pub mod export;
pub mod ingest;
pub mod query;
pub mod report;
pub mod service;
pub mod storage;
pub mod time;

pub use aggregation::*;
pub use error::CoreError;
pub use export::{export_csv, export_file_name};
pub use ingest::{ingest, Anomaly, AnomalyKind, Ingested};
pub use query::{ExpenseQuery, SortOrder};
pub use report::{
    build_report, AnalyticsReport, AnalyticsRequest, Insights, ACTIVITY_DAYS, DAILY_SPENDING_HINT,
};
pub use service::ExpenseService;
pub use storage::{AttachmentRef, AttachmentStore, ExpenseStore, FetchOrder, ProfileStore};
pub use time::{Clock, FixedClock, SystemClock};

#[cfg(test)]
mod tests;
