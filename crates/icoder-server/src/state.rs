//! Shared application state for the iCoder server.
//!
//! A single [`AppState`] is constructed at startup and shared across all
//! Axum handlers via `Arc`. Both collections share one storage backend and
//! are separated by key prefix.

use std::sync::Arc;

use icoder_core::account::AccountStore;
use icoder_core::contact::ContactStore;
use icoder_core::password::CredentialHasher;
use icoder_storage::StorageBackend;

/// Key prefix of the account collection.
pub const ACCOUNTS_PREFIX: &str = "accounts/";

/// Key prefix of the contact submission collection.
pub const CONTACTS_PREFIX: &str = "contacts/";

/// Shared application state passed to all HTTP handlers.
pub struct AppState {
    /// Signup and login lookups.
    pub accounts: AccountStore,
    /// Contact form submissions.
    pub contacts: ContactStore,
    /// Backend kind reported by `/health`.
    pub storage_kind: &'static str,
}

impl AppState {
    /// Build both collections over one storage backend.
    pub fn new(
        storage: Arc<dyn StorageBackend>,
        hasher: CredentialHasher,
        storage_kind: &'static str,
    ) -> Self {
        Self {
            accounts: AccountStore::new(Arc::clone(&storage), ACCOUNTS_PREFIX.to_owned(), hasher),
            contacts: ContactStore::new(storage, CONTACTS_PREFIX.to_owned()),
            storage_kind,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("storage_kind", &self.storage_kind)
            .finish_non_exhaustive()
    }
}
