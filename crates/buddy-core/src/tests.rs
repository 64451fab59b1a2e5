use std::sync::{Arc, Mutex};

use buddy_domain::{
    ExpenseCategory, ExpenseId, ExpensePatch, NewExpense, OwnerId, RawExpense, WindowPreset,
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::json;

use crate::{
    storage::sort_raw, AnalyticsRequest, AttachmentRef, AttachmentStore, CoreError,
    ExpenseQuery, ExpenseService, ExpenseStore, FetchOrder, FixedClock, SortOrder,
};

#[derive(Clone, Default)]
struct MemoryStore {
    rows: Arc<Mutex<Vec<RawExpense>>>,
}

impl MemoryStore {
    fn push_raw(&self, row: RawExpense) {
        self.rows.lock().unwrap().push(row);
    }

    fn row(&self, id: &ExpenseId) -> Option<RawExpense> {
        self.rows
            .lock()
            .unwrap()
            .iter()
            .find(|row| row.id == id.as_str())
            .cloned()
    }
}

impl ExpenseStore for MemoryStore {
    fn fetch_all(&self, owner: OwnerId, order: FetchOrder) -> Result<Vec<RawExpense>, CoreError> {
        let owner = owner.to_string();
        let mut rows: Vec<RawExpense> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|row| row.user_id == owner)
            .cloned()
            .collect();
        sort_raw(&mut rows, order);
        Ok(rows)
    }

    fn insert(&self, owner: OwnerId, expense: NewExpense) -> Result<ExpenseId, CoreError> {
        let id = ExpenseId::generate();
        let row = expense.into_expense(id.clone(), owner, Utc::now()).to_raw();
        self.push_raw(row);
        Ok(id)
    }

    fn update(
        &self,
        owner: OwnerId,
        id: &ExpenseId,
        patch: &ExpensePatch,
    ) -> Result<(), CoreError> {
        let owner = owner.to_string();
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|row| row.id == id.as_str() && row.user_id == owner)
            .ok_or_else(|| CoreError::ExpenseNotFound(id.clone()))?;
        row.apply_patch(patch);
        Ok(())
    }

    fn delete(&self, owner: OwnerId, id: &ExpenseId) -> Result<(), CoreError> {
        let owner = owner.to_string();
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|row| !(row.id == id.as_str() && row.user_id == owner));
        if rows.len() == before {
            return Err(CoreError::ExpenseNotFound(id.clone()));
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
struct MemoryAttachments {
    uploads: Arc<Mutex<Vec<String>>>,
}

impl AttachmentStore for MemoryAttachments {
    fn upload(
        &self,
        owner: OwnerId,
        file_name: &str,
        _bytes: &[u8],
    ) -> Result<AttachmentRef, CoreError> {
        let reference = format!("mem://{owner}/{file_name}");
        self.uploads.lock().unwrap().push(reference.clone());
        Ok(AttachmentRef(reference))
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn service() -> (ExpenseService, MemoryStore, MemoryAttachments) {
    let store = MemoryStore::default();
    let attachments = MemoryAttachments::default();
    let service = ExpenseService::with_clock(
        OwnerId::new(),
        Box::new(store.clone()),
        Box::new(attachments.clone()),
        Box::new(FixedClock::on(date(2024, 3, 31))),
    );
    (service, store, attachments)
}

#[test]
fn service_adds_and_lists_expenses() {
    let (service, _, _) = service();
    service
        .add(NewExpense::new(
            "Lunch",
            Decimal::new(1250, 2),
            ExpenseCategory::Food,
            date(2024, 3, 20),
        ))
        .expect("add lunch");
    service
        .add(NewExpense::new(
            "Taxi",
            Decimal::from(30),
            ExpenseCategory::Travel,
            date(2024, 3, 22),
        ))
        .expect("add taxi");

    let listing = service
        .list(&ExpenseQuery::new().with_sort(SortOrder::AmountHigh))
        .expect("list");
    assert!(listing.is_clean());
    let names: Vec<_> = listing.expenses.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["Taxi", "Lunch"]);
    assert_eq!(listing.expenses[1].amount, Decimal::new(1250, 2));
}

#[test]
fn service_rejects_invalid_input_before_storing() {
    let (service, store, _) = service();
    let err = service
        .add(NewExpense::new(
            "  ",
            Decimal::from(5),
            ExpenseCategory::Other,
            date(2024, 3, 1),
        ))
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));

    let err = service
        .add(NewExpense::new(
            "Refund",
            Decimal::from(-5),
            ExpenseCategory::Other,
            date(2024, 3, 1),
        ))
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
    assert!(store.rows.lock().unwrap().is_empty());

    let err = service
        .edit(&ExpenseId::new("anything"), ExpensePatch::default())
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation(_)));
}

#[test]
fn service_edits_and_removes_expenses() {
    let (service, store, _) = service();
    let id = service
        .add(NewExpense::new(
            "Gym",
            Decimal::from(40),
            ExpenseCategory::Healthcare,
            date(2024, 3, 5),
        ))
        .expect("add gym");

    let patch = ExpensePatch {
        amount: Some(Decimal::from(45)),
        ..ExpensePatch::default()
    };
    service.edit(&id, patch).expect("edit gym");
    assert_eq!(store.row(&id).unwrap().amount, json!("45"));

    service.remove(&id).expect("remove gym");
    assert!(store.row(&id).is_none());
    assert!(matches!(
        service.remove(&id),
        Err(CoreError::ExpenseNotFound(_))
    ));
}

#[test]
fn service_cannot_touch_other_owners_rows() {
    let (service, store, _) = service();
    let stranger = OwnerId::new();
    let id = store
        .insert(
            stranger,
            NewExpense::new(
                "Hidden",
                Decimal::from(9),
                ExpenseCategory::Other,
                date(2024, 3, 1),
            ),
        )
        .unwrap();

    assert!(service.load().unwrap().expenses.is_empty());
    assert!(matches!(
        service.remove(&id),
        Err(CoreError::ExpenseNotFound(_))
    ));
    assert!(store.row(&id).is_some());
}

#[test]
fn service_attaches_receipts_to_existing_expenses() {
    let (service, store, attachments) = service();
    let id = service
        .add(NewExpense::new(
            "Laptop",
            Decimal::from(900),
            ExpenseCategory::Shopping,
            date(2024, 3, 10),
        ))
        .expect("add laptop");

    let reference = service
        .attach_receipt(&id, "invoice.pdf", b"%PDF-1.4")
        .expect("attach");
    assert_eq!(
        store.row(&id).unwrap().attachment.as_deref(),
        Some(reference.0.as_str())
    );
    assert!(service.load().unwrap().expenses[0].has_attachment());

    assert!(matches!(
        service.attach_receipt(&id, "notes.txt", b"hello"),
        Err(CoreError::UnsupportedContentType(_))
    ));
    assert!(matches!(
        service.attach_receipt(&ExpenseId::new("missing"), "scan.png", b"png"),
        Err(CoreError::ExpenseNotFound(_))
    ));
    assert_eq!(attachments.uploads.lock().unwrap().len(), 1);
}

#[test]
fn service_analytics_skips_malformed_rows() {
    let (service, store, _) = service();
    let owner = service.owner().to_string();
    for (id, amount, day) in [("a", json!(20), 3), ("b", json!("abc"), 4), ("c", json!("15.5"), 9)] {
        store.push_raw(RawExpense {
            id: id.into(),
            user_id: owner.clone(),
            expense_name: format!("row {id}"),
            amount,
            category: "Food".into(),
            date: format!("2024-03-{day:02}"),
            created_at: None,
            attachment: None,
        });
    }

    let request = AnalyticsRequest::new(service.today()).with_window(WindowPreset::LastMonth);
    let report = service.analytics(&request).expect("report");
    assert_eq!(report.expense_count, 2);
    assert_eq!(report.total, Decimal::new(355, 1));
    assert_eq!(report.anomalies.len(), 1);
}

#[test]
fn service_exports_filtered_listing() {
    let (service, _, _) = service();
    for (name, category) in [
        ("Bread", ExpenseCategory::Food),
        ("Bus", ExpenseCategory::Travel),
    ] {
        service
            .add(NewExpense::new(name, Decimal::from(3), category, date(2024, 3, 2)))
            .unwrap();
    }

    let mut buffer = Vec::new();
    let rows = service
        .export(
            &ExpenseQuery::new().with_category(ExpenseCategory::Travel),
            &mut buffer,
        )
        .expect("export");
    assert_eq!(rows, 1);
    let csv = String::from_utf8(buffer).unwrap();
    assert_eq!(csv, "Date,Name,Category,Amount\n2024-03-02,Bus,Travel,3\n");
}
