//! `RocksDB` storage backend.
//!
//! Wraps the `rocksdb` crate behind the [`StorageBackend`] trait. All
//! operations are dispatched to a blocking thread via
//! [`tokio::task::spawn_blocking`] since `RocksDB` is a synchronous C++ library.
//!
//! `RocksDB` has no conditional put, so [`StorageBackend::create`] and
//! [`StorageBackend::put`] share a process-local write lock. Only one process
//! may open the database directory at a time, which keeps that lock sufficient.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rocksdb::{DBWithThreadMode, MultiThreaded, Options};

use crate::{StorageBackend, StorageError};

type Db = DBWithThreadMode<MultiThreaded>;

/// A storage backend backed by `RocksDB`.
///
/// # Examples
///
/// ```no_run
/// # use icoder_storage::RocksDbBackend;
/// let backend = RocksDbBackend::open("./data/rocksdb").unwrap();
/// ```
#[derive(Clone)]
pub struct RocksDbBackend {
    db: Arc<Db>,
    write_lock: Arc<Mutex<()>>,
    path: PathBuf,
}

impl std::fmt::Debug for RocksDbBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RocksDbBackend")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl RocksDbBackend {
    /// Open a `RocksDB` database at the given directory.
    ///
    /// Creates the database directory if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Open`] if `RocksDB` fails to open or create the
    /// database at the specified path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let mut opts = Options::default();
        opts.create_if_missing(true);

        let db = Db::open(&opts, path).map_err(|e| StorageError::Open {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
            path: path.to_path_buf(),
        })
    }

    /// Return the filesystem path of this database.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run a write under the process-local write lock on the blocking pool.
    async fn locked_write<F>(&self, key: &str, op: F) -> Result<(), StorageError>
    where
        F: FnOnce(&Db, &str) -> Result<(), StorageError> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        let lock = Arc::clone(&self.write_lock);
        let key = key.to_owned();
        tokio::task::spawn_blocking(move || {
            let _guard = lock.lock().map_err(|e| StorageError::Write {
                key: key.clone(),
                reason: format!("write lock poisoned: {e}"),
            })?;
            op(&db, &key)
        })
        .await
        .map_err(|e| StorageError::Write {
            key: String::new(),
            reason: format!("blocking task panicked: {e}"),
        })?
    }
}

fn write_error(key: &str, e: &rocksdb::Error) -> StorageError {
    StorageError::Write {
        key: key.to_owned(),
        reason: e.to_string(),
    }
}

#[async_trait::async_trait]
impl StorageBackend for RocksDbBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let db = Arc::clone(&self.db);
        let key = key.to_owned();
        tokio::task::spawn_blocking(move || {
            db.get(key.as_bytes()).map_err(|e| StorageError::Read {
                key,
                reason: e.to_string(),
            })
        })
        .await
        .map_err(|e| StorageError::Read {
            key: String::new(),
            reason: format!("blocking task panicked: {e}"),
        })?
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        let value = value.to_vec();
        self.locked_write(key, move |db, key| {
            db.put(key.as_bytes(), &value)
                .map_err(|e| write_error(key, &e))
        })
        .await
    }

    async fn create(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        let value = value.to_vec();
        self.locked_write(key, move |db, key| {
            let present = db
                .get_pinned(key.as_bytes())
                .map_err(|e| StorageError::Read {
                    key: key.to_owned(),
                    reason: e.to_string(),
                })?
                .is_some();
            if present {
                return Err(StorageError::AlreadyExists {
                    key: key.to_owned(),
                });
            }
            db.put(key.as_bytes(), &value)
                .map_err(|e| write_error(key, &e))
        })
        .await
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.locked_write(key, |db, key| {
            db.delete(key.as_bytes()).map_err(|e| StorageError::Delete {
                key: key.to_owned(),
                reason: e.to_string(),
            })
        })
        .await
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let db = Arc::clone(&self.db);
        let prefix = prefix.to_owned();
        tokio::task::spawn_blocking(move || {
            let iter = db.iterator(rocksdb::IteratorMode::From(
                prefix.as_bytes(),
                rocksdb::Direction::Forward,
            ));

            let mut keys = Vec::new();
            for item in iter {
                let (k, _) = item.map_err(|e| StorageError::List {
                    prefix: prefix.clone(),
                    reason: e.to_string(),
                })?;
                let key = String::from_utf8(k.to_vec()).map_err(|e| StorageError::InvalidKey {
                    reason: e.to_string(),
                })?;
                if !key.starts_with(&prefix) {
                    break;
                }
                keys.push(key);
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
