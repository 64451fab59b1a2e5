//! buddy-storage-json
//!
//! Filesystem-backed implementations of the buddy-core store traits.

mod attachments;

use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use buddy_core::{
    storage::sort_raw, Clock, CoreError, ExpenseStore, FetchOrder, ProfileStore, SystemClock,
};
use buddy_domain::{ExpenseId, ExpensePatch, NewExpense, OwnerId, RawExpense, UserProfile};
use tracing::{debug, info};

pub use attachments::FsAttachmentStore;

const EXPENSES_DIR: &str = "expenses";
const PROFILES_DIR: &str = "profiles";
const FILE_EXTENSION: &str = "json";
const TMP_SUFFIX: &str = "tmp";

/// One JSON array of raw rows per owner under `<root>/expenses/`.
///
/// Writes within one process are serialised; separate processes resolve last-write-wins.
pub struct JsonExpenseStore {
    root: PathBuf,
    clock: Box<dyn Clock>,
    write_lock: Mutex<()>,
}

impl JsonExpenseStore {
    pub fn new(root: PathBuf) -> Result<Self, CoreError> {
        Self::with_clock(root, Box::new(SystemClock))
    }

    pub fn with_clock(root: PathBuf, clock: Box<dyn Clock>) -> Result<Self, CoreError> {
        fs::create_dir_all(root.join(EXPENSES_DIR))?;
        fs::create_dir_all(root.join(PROFILES_DIR))?;
        Ok(Self {
            root,
            clock,
            write_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn expenses_path(&self, owner: OwnerId) -> PathBuf {
        self.root
            .join(EXPENSES_DIR)
            .join(format!("{}.{}", owner, FILE_EXTENSION))
    }

    pub fn profile_path(&self, owner: OwnerId) -> PathBuf {
        self.root
            .join(PROFILES_DIR)
            .join(format!("{}.{}", owner, FILE_EXTENSION))
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>, CoreError> {
        self.write_lock
            .lock()
            .map_err(|_| CoreError::Storage("expense store lock poisoned".into()))
    }

    fn read_rows(&self, owner: OwnerId) -> Result<Vec<RawExpense>, CoreError> {
        let path = self.expenses_path(owner);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let data = fs::read_to_string(&path)?;
        serde_json::from_str(&data).map_err(|err| {
            CoreError::Serde(format!("{}: {}", path.display(), err))
        })
    }

    fn write_rows(&self, owner: OwnerId, rows: &[RawExpense]) -> Result<(), CoreError> {
        let json =
            serde_json::to_string_pretty(rows).map_err(|err| CoreError::Serde(err.to_string()))?;
        save_atomic(&self.expenses_path(owner), json.as_bytes())
    }
}

impl ExpenseStore for JsonExpenseStore {
    fn fetch_all(&self, owner: OwnerId, order: FetchOrder) -> Result<Vec<RawExpense>, CoreError> {
        let owner_key = owner.to_string();
        let mut rows: Vec<RawExpense> = self
            .read_rows(owner)?
            .into_iter()
            .filter(|row| row.user_id == owner_key)
            .collect();
        sort_raw(&mut rows, order);
        debug!(%owner, rows = rows.len(), ?order, "loaded expense file");
        Ok(rows)
    }

    fn insert(&self, owner: OwnerId, expense: NewExpense) -> Result<ExpenseId, CoreError> {
        let _guard = self.lock()?;
        let mut rows = self.read_rows(owner)?;
        let id = ExpenseId::generate();
        let record = expense
            .into_expense(id.clone(), owner, self.clock.now())
            .to_raw();
        rows.push(record);
        self.write_rows(owner, &rows)?;
        info!(%owner, %id, "stored expense");
        Ok(id)
    }

    fn update(
        &self,
        owner: OwnerId,
        id: &ExpenseId,
        patch: &ExpensePatch,
    ) -> Result<(), CoreError> {
        let _guard = self.lock()?;
        let owner_key = owner.to_string();
        let mut rows = self.read_rows(owner)?;
        let row = rows
            .iter_mut()
            .find(|row| row.id == id.as_str() && row.user_id == owner_key)
            .ok_or_else(|| CoreError::ExpenseNotFound(id.clone()))?;
        row.apply_patch(patch);
        self.write_rows(owner, &rows)?;
        info!(%owner, %id, "rewrote expense");
        Ok(())
    }

    fn delete(&self, owner: OwnerId, id: &ExpenseId) -> Result<(), CoreError> {
        let _guard = self.lock()?;
        let owner_key = owner.to_string();
        let mut rows = self.read_rows(owner)?;
        let before = rows.len();
        rows.retain(|row| !(row.id == id.as_str() && row.user_id == owner_key));
        if rows.len() == before {
            return Err(CoreError::ExpenseNotFound(id.clone()));
        }
        self.write_rows(owner, &rows)?;
        info!(%owner, %id, "removed expense");
        Ok(())
    }
}

impl ProfileStore for JsonExpenseStore {
    fn load_profile(&self, owner: OwnerId) -> Result<Option<UserProfile>, CoreError> {
        let path = self.profile_path(owner);
        if !path.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(&path)?;
        let profile =
            serde_json::from_str(&data).map_err(|err| CoreError::Serde(err.to_string()))?;
        Ok(Some(profile))
    }

    fn save_profile(&self, profile: &UserProfile) -> Result<(), CoreError> {
        let json = serde_json::to_string_pretty(profile)
            .map_err(|err| CoreError::Serde(err.to_string()))?;
        save_atomic(&self.profile_path(profile.owner), json.as_bytes())?;
        info!(owner = %profile.owner, "saved profile");
        Ok(())
    }
}

pub(crate) fn save_atomic(path: &Path, data: &[u8]) -> Result<(), CoreError> {
    let tmp = tmp_path(path);
    write_atomic(&tmp, data)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &[u8]) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data)?;
    file.flush()?;
    Ok(())
}
