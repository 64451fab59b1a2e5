use std::io::Write;

use buddy_domain::{ExpenseId, ExpensePatch, NewExpense, OwnerId};
use chrono::NaiveDate;
use tracing::{debug, info};

use crate::{
    export::export_csv,
    ingest::{ingest, Ingested},
    query::ExpenseQuery,
    report::{build_report, AnalyticsReport, AnalyticsRequest},
    storage::{validate_attachment, AttachmentRef, AttachmentStore, ExpenseStore, FetchOrder},
    time::{Clock, SystemClock},
    CoreError,
};

/// The calling layer between a user session and the stores.
///
/// Each call fetches a fresh snapshot; nothing is cached between calls.
pub struct ExpenseService {
    owner: OwnerId,
    store: Box<dyn ExpenseStore>,
    attachments: Box<dyn AttachmentStore>,
    clock: Box<dyn Clock>,
}

impl ExpenseService {
    pub fn new(
        owner: OwnerId,
        store: Box<dyn ExpenseStore>,
        attachments: Box<dyn AttachmentStore>,
    ) -> Self {
        Self::with_clock(owner, store, attachments, Box::new(SystemClock))
    }

    pub fn with_clock(
        owner: OwnerId,
        store: Box<dyn ExpenseStore>,
        attachments: Box<dyn AttachmentStore>,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            owner,
            store,
            attachments,
            clock,
        }
    }

    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Fetches every row for the owner, newest first, and validates it.
    pub fn load(&self) -> Result<Ingested, CoreError> {
        let records = self.store.fetch_all(self.owner, FetchOrder::CreatedDesc)?;
        debug!(owner = %self.owner, rows = records.len(), "fetched expense rows");
        Ok(ingest(&records))
    }

    pub fn add(&self, expense: NewExpense) -> Result<ExpenseId, CoreError> {
        expense.validate()?;
        let id = self.store.insert(self.owner, expense)?;
        info!(owner = %self.owner, %id, "expense added");
        Ok(id)
    }

    pub fn edit(&self, id: &ExpenseId, patch: ExpensePatch) -> Result<(), CoreError> {
        patch.validate()?;
        self.store.update(self.owner, id, &patch)?;
        info!(owner = %self.owner, %id, "expense updated");
        Ok(())
    }

    pub fn remove(&self, id: &ExpenseId) -> Result<(), CoreError> {
        self.store.delete(self.owner, id)?;
        info!(owner = %self.owner, %id, "expense deleted");
        Ok(())
    }

    /// Uploads a receipt and points the expense at it.
    ///
    /// The expense must exist before anything is uploaded.
    pub fn attach_receipt(
        &self,
        id: &ExpenseId,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<AttachmentRef, CoreError> {
        validate_attachment(file_name, bytes.len() as u64)?;
        let snapshot = self.load()?;
        if !snapshot.expenses.iter().any(|expense| &expense.id == id) {
            return Err(CoreError::ExpenseNotFound(id.clone()));
        }
        let reference = self.attachments.upload(self.owner, file_name, bytes)?;
        self.store
            .update(self.owner, id, &ExpensePatch::attachment(reference.0.clone()))?;
        info!(owner = %self.owner, %id, attachment = %reference, "receipt attached");
        Ok(reference)
    }

    /// Filtered and sorted listing; anomalies are carried alongside.
    pub fn list(&self, query: &ExpenseQuery) -> Result<Ingested, CoreError> {
        let snapshot = self.load()?;
        Ok(Ingested {
            expenses: query.apply(&snapshot.expenses),
            anomalies: snapshot.anomalies,
        })
    }

    pub fn analytics(&self, request: &AnalyticsRequest) -> Result<AnalyticsReport, CoreError> {
        let snapshot = self.load()?;
        build_report(&snapshot, request)
    }

    /// Writes the listing for `query` as CSV and returns the row count.
    pub fn export<W: Write>(&self, query: &ExpenseQuery, writer: W) -> Result<usize, CoreError> {
        let listing = self.list(query)?;
        let rows = export_csv(&listing.expenses, writer)?;
        info!(owner = %self.owner, rows, "expenses exported");
        Ok(rows)
    }
}
