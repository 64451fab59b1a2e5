use std::path::{Path, PathBuf};

use buddy_core::{
    storage::validate_attachment, AttachmentRef, AttachmentStore, Clock, CoreError, SystemClock,
};
use buddy_domain::OwnerId;
use tracing::info;

use crate::save_atomic;

const RECEIPTS_DIR: &str = "receipts";

/// Stores receipts at `<root>/receipts/<owner>/<millis>.<ext>`.
pub struct FsAttachmentStore {
    receipts_dir: PathBuf,
    base_url: String,
    clock: Box<dyn Clock>,
}

impl FsAttachmentStore {
    pub fn new(root: &Path, base_url: impl Into<String>) -> Self {
        Self::with_clock(root, base_url, Box::new(SystemClock))
    }

    pub fn with_clock(root: &Path, base_url: impl Into<String>, clock: Box<dyn Clock>) -> Self {
        let base_url: String = base_url.into();
        Self {
            receipts_dir: root.join(RECEIPTS_DIR),
            base_url: base_url.trim_end_matches('/').to_string(),
            clock,
        }
    }

    pub fn receipts_dir(&self) -> &Path {
        &self.receipts_dir
    }
}

impl AttachmentStore for FsAttachmentStore {
    fn upload(
        &self,
        owner: OwnerId,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<AttachmentRef, CoreError> {
        validate_attachment(file_name, bytes.len() as u64)?;
        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .ok_or_else(|| CoreError::UnsupportedContentType(file_name.to_string()))?;

        let owner_dir = self.receipts_dir.join(owner.to_string());
        let mut millis = self.clock.now().timestamp_millis();
        let mut stored_name = format!("{millis}.{extension}");
        while owner_dir.join(&stored_name).exists() {
            millis += 1;
            stored_name = format!("{millis}.{extension}");
        }

        save_atomic(&owner_dir.join(&stored_name), bytes)?;
        let reference = AttachmentRef(format!("{}/{}/{}", self.base_url, owner, stored_name));
        info!(%owner, size = bytes.len(), %reference, "stored receipt");
        Ok(reference)
    }
}
