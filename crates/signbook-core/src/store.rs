use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use thiserror::Error;

use crate::records::UserRecord;

/// Errors produced by record store implementations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The persisted table could not be read or parsed.
    #[error("storage read failure: {reason}")]
    Read { reason: String },
    /// The persisted table could not be written.
    #[error("storage write failure: {reason}")]
    Write { reason: String },
}

/// Mutation applied to a single record by [`RecordStore::update_if_present`].
pub type RecordMutator<'a> = &'a (dyn Fn(&mut UserRecord) + Send + Sync);

/// Contract for the user table shared by every account operation.
///
/// Implementations keep insertion order and return whitespace-trimmed fields.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Create the empty table (header only) if it does not exist yet. Idempotent.
    async fn ensure_initialized(&self) -> Result<(), StoreError>;

    /// Every record, in insertion order.
    async fn read_all(&self) -> Result<Vec<UserRecord>, StoreError>;

    /// Add one record after the existing ones without rewriting them.
    async fn append(&self, record: &UserRecord) -> Result<(), StoreError>;

    /// Replace the whole table with `records`, in the given order.
    async fn replace_all(&self, records: &[UserRecord]) -> Result<(), StoreError>;

    /// Append `record` unless a record with the same email exists.
    /// Returns `true` when the record was appended.
    async fn append_if_absent(&self, record: &UserRecord) -> Result<bool, StoreError>;

    /// Apply `mutator` to the record keyed by `email` and persist the table.
    /// Returns the updated record, or `None` without writing when absent.
    async fn update_if_present(
        &self,
        email: &str,
        mutator: RecordMutator<'_>,
    ) -> Result<Option<UserRecord>, StoreError>;
}

/// In-memory record store for tests and smoke runs.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRecordStore {
    inner: Arc<Mutex<Vec<UserRecord>>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `records`.
    pub fn with_records(records: impl IntoIterator<Item = UserRecord>) -> Self {
        let records = records.into_iter().map(|r| r.trimmed()).collect();
        Self {
            inner: Arc::new(Mutex::new(records)),
        }
    }

    fn lock_for_read(&self) -> Result<MutexGuard<'_, Vec<UserRecord>>, StoreError> {
        self.inner.lock().map_err(|err| StoreError::Read {
            reason: format!("lock poisoned: {err}"),
        })
    }

    fn lock_for_write(&self) -> Result<MutexGuard<'_, Vec<UserRecord>>, StoreError> {
        self.inner.lock().map_err(|err| StoreError::Write {
            reason: format!("lock poisoned: {err}"),
        })
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn ensure_initialized(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<UserRecord>, StoreError> {
        Ok(self.lock_for_read()?.clone())
    }

    async fn append(&self, record: &UserRecord) -> Result<(), StoreError> {
        self.lock_for_write()?.push(record.trimmed());
        Ok(())
    }

    async fn replace_all(&self, records: &[UserRecord]) -> Result<(), StoreError> {
        let mut table = self.lock_for_write()?;
        *table = records.iter().map(UserRecord::trimmed).collect();
        Ok(())
    }

    async fn append_if_absent(&self, record: &UserRecord) -> Result<bool, StoreError> {
        let record = record.trimmed();
        let mut table = self.lock_for_write()?;
        if table.iter().any(|r| r.has_email(&record.email)) {
            return Ok(false);
        }
        table.push(record);
        Ok(true)
    }

    async fn update_if_present(
        &self,
        email: &str,
        mutator: RecordMutator<'_>,
    ) -> Result<Option<UserRecord>, StoreError> {
        let mut table = self.lock_for_write()?;
        let Some(record) = table.iter_mut().find(|r| r.has_email(email)) else {
            return Ok(None);
        };
        mutator(record);
        *record = record.trimmed();
        Ok(Some(record.clone()))
    }
}
