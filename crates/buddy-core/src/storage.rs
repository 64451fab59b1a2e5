//! Collaborator contracts for the expense, attachment and profile stores.

use std::{cmp::Reverse, fmt, path::Path};

use buddy_domain::{ExpenseId, ExpensePatch, NewExpense, OwnerId, RawExpense, UserProfile};
use serde::{Deserialize, Serialize};

use crate::CoreError;

pub const MAX_ATTACHMENT_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchOrder {
    #[default]
    CreatedDesc,
    DateAsc,
}

/// Owner-scoped persistence for expense rows.
///
/// Every operation only sees rows belonging to `owner`; touching another owner's
/// row reports [`CoreError::ExpenseNotFound`]. Concurrent writers resolve last-write-wins.
pub trait ExpenseStore: Send + Sync {
    fn fetch_all(&self, owner: OwnerId, order: FetchOrder) -> Result<Vec<RawExpense>, CoreError>;
    fn insert(&self, owner: OwnerId, expense: NewExpense) -> Result<ExpenseId, CoreError>;
    fn update(&self, owner: OwnerId, id: &ExpenseId, patch: &ExpensePatch)
        -> Result<(), CoreError>;
    fn delete(&self, owner: OwnerId, id: &ExpenseId) -> Result<(), CoreError>;
}

/// Opaque reference to an uploaded receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttachmentRef(pub String);

impl fmt::Display for AttachmentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub trait AttachmentStore: Send + Sync {
    fn upload(
        &self,
        owner: OwnerId,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<AttachmentRef, CoreError>;
}

pub trait ProfileStore: Send + Sync {
    fn load_profile(&self, owner: OwnerId) -> Result<Option<UserProfile>, CoreError>;
    fn save_profile(&self, profile: &UserProfile) -> Result<(), CoreError>;
}

/// Maps a file extension onto one of the accepted receipt content types.
pub fn content_type_for(file_name: &str) -> Option<&'static str> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())?
        .to_ascii_lowercase();
    match extension.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "heic" => Some("image/heic"),
        "pdf" => Some("application/pdf"),
        _ => None,
    }
}

/// Checks size and type before any bytes are handed to a store.
pub fn validate_attachment(file_name: &str, size: u64) -> Result<&'static str, CoreError> {
    if size > MAX_ATTACHMENT_BYTES {
        return Err(CoreError::AttachmentTooLarge {
            size,
            limit: MAX_ATTACHMENT_BYTES,
        });
    }
    content_type_for(file_name)
        .ok_or_else(|| CoreError::UnsupportedContentType(file_name.to_string()))
}

/// Orders rows the way a store query would. Dates and RFC 3339 stamps compare as text.
pub fn sort_raw(records: &mut [RawExpense], order: FetchOrder) {
    match order {
        FetchOrder::CreatedDesc => records.sort_by_key(|record| {
            (Reverse(record.created_at.clone()), record.id.clone())
        }),
        FetchOrder::DateAsc => records.sort_by(|a, b| {
            a.date
                .cmp(&b.date)
                .then_with(|| a.created_at.cmp(&b.created_at))
                .then_with(|| a.id.cmp(&b.id))
        }),
    }
}
