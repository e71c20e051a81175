//! redb storage backend: the persistent default.
//!
//! Every operation runs in its own transaction on the Tokio blocking pool.
//! redb serializes write transactions, so [`StorageBackend::create`] is
//! atomic here without an extra lock.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use redb::{Database, ReadableTable, TableDefinition, WriteTransaction};

use crate::{StorageBackend, StorageError};

/// The single table holding every collection; collections are key prefixes.
const DOCUMENTS: TableDefinition<&str, &[u8]> = TableDefinition::new("documents");

/// A storage backend backed by a single redb database file.
///
/// # Examples
///
/// ```no_run
/// # use icoder_storage::RedbBackend;
/// let backend = RedbBackend::open("./data/icoder.redb").unwrap();
/// ```
#[derive(Clone)]
pub struct RedbBackend {
    db: Arc<Database>,
    path: PathBuf,
}

impl std::fmt::Debug for RedbBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbBackend")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl RedbBackend {
    /// Open or create a redb database file at the given path.
    ///
    /// Missing parent directories are created.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Open`] if the directory or database file cannot
    /// be created, or [`StorageError::Transaction`] if the documents table
    /// cannot be initialized.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::Open {
                path: parent.display().to_string(),
                reason: e.to_string(),
            })?;
        }

        let db = Database::create(path).map_err(|e| StorageError::Open {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        // Opening the table in a write transaction creates it if missing, so
        // read transactions never see a missing table.
        let txn = db.begin_write().map_err(txn_error)?;
        txn.open_table(DOCUMENTS).map_err(|e| StorageError::MissingTable {
            name: format!("documents: {e}"),
        })?;
        txn.commit().map_err(txn_error)?;

        Ok(Self {
            db: Arc::new(db),
            path: path.to_path_buf(),
        })
    }

    /// Return the filesystem path of this database.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `op` inside a write transaction on the blocking pool and commit it
    /// when `op` succeeds. A failed `op` aborts the transaction.
    async fn write<F>(&self, key: &str, op: F) -> Result<(), StorageError>
    where
        F: FnOnce(&WriteTransaction, &str) -> Result<(), StorageError> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        let key = key.to_owned();
        tokio::task::spawn_blocking(move || {
            let txn = db.begin_write().map_err(txn_error)?;
            match op(&txn, &key) {
                Ok(()) => txn.commit().map_err(txn_error),
                Err(e) => {
                    txn.abort().map_err(txn_error)?;
                    Err(e)
                }
            }
        })
        .await
        .map_err(|e| StorageError::Write {
            key: String::new(),
            reason: format!("blocking task panicked: {e}"),
        })?
    }
}

fn txn_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::Transaction {
        reason: e.to_string(),
    }
}

fn missing_table(e: impl std::fmt::Display) -> StorageError {
    StorageError::MissingTable {
        name: format!("documents: {e}"),
    }
}

fn insert(txn: &WriteTransaction, key: &str, value: &[u8]) -> Result<(), StorageError> {
    let mut table = txn.open_table(DOCUMENTS).map_err(missing_table)?;
    table.insert(key, value).map_err(|e| StorageError::Write {
        key: key.to_owned(),
        reason: e.to_string(),
    })?;
    Ok(())
}

#[async_trait::async_trait]
impl StorageBackend for RedbBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let db = Arc::clone(&self.db);
        let key = key.to_owned();
        tokio::task::spawn_blocking(move || {
            let txn = db.begin_read().map_err(txn_error)?;
            let table = txn.open_table(DOCUMENTS).map_err(missing_table)?;
            let value = table
                .get(key.as_str())
                .map_err(|e| StorageError::Read {
                    key: key.clone(),
                    reason: e.to_string(),
                })?
                .map(|v| v.value().to_vec());
            Ok(value)
        })
        .await
        .map_err(|e| StorageError::Read {
            key: String::new(),
            reason: format!("blocking task panicked: {e}"),
        })?
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        let value = value.to_vec();
        self.write(key, move |txn, key| insert(txn, key, &value)).await
    }

    async fn create(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        let value = value.to_vec();
        self.write(key, move |txn, key| {
            let present = {
                let table = txn.open_table(DOCUMENTS).map_err(missing_table)?;
                let found = table.get(key).map_err(|e| StorageError::Read {
                    key: key.to_owned(),
                    reason: e.to_string(),
                })?;
                found.is_some()
            };
            if present {
                return Err(StorageError::AlreadyExists {
                    key: key.to_owned(),
                });
            }
            insert(txn, key, &value)
        })
        .await
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.write(key, |txn, key| {
            let mut table = txn.open_table(DOCUMENTS).map_err(missing_table)?;
            // remove() returns Ok(None) for a missing key.
            table.remove(key).map_err(|e| StorageError::Delete {
                key: key.to_owned(),
                reason: e.to_string(),
            })?;
            Ok(())
        })
        .await
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let db = Arc::clone(&self.db);
        let prefix = prefix.to_owned();
        tokio::task::spawn_blocking(move || {
            let txn = db.begin_read().map_err(txn_error)?;
            let table = txn.open_table(DOCUMENTS).map_err(missing_table)?;
            let list_error = |e: redb::StorageError| StorageError::List {
                prefix: prefix.clone(),
                reason: e.to_string(),
            };

            let mut keys = Vec::new();
            for item in table.range(prefix.as_str()..).map_err(list_error)? {
                let (k, _) = item.map_err(list_error)?;
                let key = k.value();
                if !key.starts_with(&prefix) {
                    break;
                }
                keys.push(key.to_owned());
            }
            Ok(keys)
        })
        .await
        .map_err(|e| StorageError::List {
            prefix: String::new(),
            reason: format!("blocking task panicked: {e}"),
        })?
    }
}
