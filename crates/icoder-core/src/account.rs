//! Account collection: signup and credential lookup.
//!
//! An account is one JSON document keyed by its normalized email
//! (`<prefix><trimmed, lowercased email>`). Because the email is the key,
//! uniqueness is enforced by [`StorageBackend::create`] and two racing
//! signups for the same address cannot both land. Login looks the account up
//! by the same normalized key, so matching is by value and never by pattern.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;

use icoder_storage::{StorageBackend, StorageError};

use crate::error::AccountError;
use crate::forms::{SignupForm, normalize_email};
use crate::password::CredentialHasher;

/// A registered account.
///
/// Only the Argon2id hash of the password is kept; the confirmation field
/// of the signup form is never stored.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

/// Password behind the hash verified when a login names no account.
const DUMMY_PASSWORD: &str = "icoder-no-such-account";

/// The account collection.
pub struct AccountStore {
    storage: Arc<dyn StorageBackend>,
    prefix: String,
    hasher: CredentialHasher,
    dummy_hash: OnceCell<String>,
}

impl std::fmt::Debug for AccountStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountStore")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl AccountStore {
    /// Create a collection rooted at `prefix` (e.g. `accounts/`).
    pub fn new(storage: Arc<dyn StorageBackend>, prefix: String, hasher: CredentialHasher) -> Self {
        Self {
            storage,
            prefix,
            hasher,
            dummy_hash: OnceCell::new(),
        }
    }

    fn key(&self, normalized_email: &str) -> String {
        format!("{}{}", self.prefix, normalized_email)
    }

    /// Register a new account from a signup form.
    ///
    /// Steps, stopping at the first failure: password confirmation check,
    /// schema validation, Argon2id hash on the blocking pool, atomic create.
    ///
    /// # Errors
    ///
    /// - [`AccountError::PasswordMismatch`] if the confirmation differs.
    /// - [`AccountError::Invalid`] if the form fails validation.
    /// - [`AccountError::Password`] if hashing fails.
    /// - [`AccountError::AlreadyExists`] if the normalized email is taken.
    /// - [`AccountError::Storage`] if the backend rejects the write.
    pub async fn register(&self, form: SignupForm) -> Result<Account, AccountError> {
        if !form.passwords_match() {
            return Err(AccountError::PasswordMismatch);
        }
        form.validate()?;

        let email = normalize_email(&form.email);
        let password_hash = self.hasher.hash_blocking(form.password).await?;

        let account = Account {
            name: form.name.trim().to_owned(),
            phone: form.phone.trim().to_owned(),
            email,
            password_hash,
            created_at: Utc::now(),
        };

        let data = serde_json::to_vec(&account).map_err(|e| AccountError::Serialization {
            reason: format!("serialization failed: {e}"),
        })?;

        match self.storage.create(&self.key(&account.email), &data).await {
            Ok(()) => Ok(account),
            Err(StorageError::AlreadyExists { .. }) => Err(AccountError::AlreadyExists {
                email: account.email,
            }),
            Err(e) => Err(AccountError::Storage(e)),
        }
    }

    /// Look up an account by email. The input is normalized first, so
    /// `" A@X.com "` finds the account registered as `a@x.com`.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::Storage`] on backend failure or
    /// [`AccountError::Serialization`] if the stored document is corrupt.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AccountError> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Ok(None);
        }
        let Some(data) = self.storage.get(&self.key(&email)).await? else {
            return Ok(None);
        };
        let account = serde_json::from_slice(&data).map_err(|e| AccountError::Serialization {
            reason: format!("deserialization failed: {e}"),
        })?;
        Ok(Some(account))
    }

    /// Check an email/password pair and return the matching account.
    ///
    /// An unknown email still runs one verification, against a hash of a
    /// fixed password made with this store's parameters.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::InvalidCredentials`] for an unknown email or a
    /// wrong password, and the errors of [`find_by_email`](Self::find_by_email)
    /// or [`AccountError::Password`] for infrastructure failures.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Account, AccountError> {
        let Some(account) = self.find_by_email(email).await? else {
            let dummy = self
                .dummy_hash
                .get_or_try_init(|| self.hasher.hash_blocking(DUMMY_PASSWORD.to_owned()))
                .await?;
            self.hasher
                .verify_blocking(password.to_owned(), dummy.clone())
                .await?;
            return Err(AccountError::InvalidCredentials);
        };

        let verified = self
            .hasher
            .verify_blocking(password.to_owned(), account.password_hash.clone())
            .await?;
        if !verified {
            return Err(AccountError::InvalidCredentials);
        }
        Ok(account)
    }

    /// Number of registered accounts. Operator API; no route exposes it.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::Storage`] on backend failure.
    pub async fn count(&self) -> Result<usize, AccountError> {
        Ok(self.storage.list(&self.prefix).await?.len())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use icoder_storage::MemoryBackend;

    use super::*;
    use crate::error::ValidationError;

    fn make_store() -> AccountStore {
        AccountStore::new(
            Arc::new(MemoryBackend::new()),
            "accounts/".to_owned(),
            CredentialHasher::new(64, 1, 1).unwrap(),
        )
    }

    fn signup(email: &str, password: &str, confirm: &str) -> SignupForm {
        SignupForm {
            name: "A".to_owned(),
            phone: "1".to_owned(),
            email: email.to_owned(),
            password: password.to_owned(),
            confirmpassword: confirm.to_owned(),
        }
    }

    #[tokio::test]
    async fn register_stores_hash_not_plaintext() {
        let store = make_store();
        let account = store.register(signup("a@x.com", "p1", "p1")).await.unwrap();
        assert_eq!(account.email, "a@x.com");
        assert_ne!(account.password_hash, "p1");
        assert!(account.password_hash.starts_with("$argon2id$"));

        let stored = store.find_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(stored, account);
    }

    #[tokio::test]
    async fn stored_document_has_no_confirmation_field() {
        let storage = Arc::new(MemoryBackend::new());
        let store = AccountStore::new(
            storage.clone(),
            "accounts/".to_owned(),
            CredentialHasher::new(64, 1, 1).unwrap(),
        );
        store.register(signup("a@x.com", "p1", "p1")).await.unwrap();

        let raw = storage.get("accounts/a@x.com").await.unwrap().unwrap();
        let doc: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        let fields: Vec<&str> = doc.as_object().unwrap().keys().map(String::as_str).collect();
        assert!(!fields.iter().any(|f| f.to_lowercase().contains("confirm")));
        assert!(!String::from_utf8(raw).unwrap().contains("\"p1\""));
    }

    #[tokio::test]
    async fn mismatch_is_rejected_before_anything_is_stored() {
        let store = make_store();
        let err = store
            .register(signup("a@x.com", "p1", "p2"))
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::PasswordMismatch));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn invalid_email_is_rejected() {
        let store = make_store();
        let err = store
            .register(signup("nope", "p1", "p1"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AccountError::Invalid(ValidationError::InvalidEmail { field: "email" })
        ));
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_case_insensitively() {
        let store = make_store();
        store.register(signup("a@x.com", "p1", "p1")).await.unwrap();
        let err = store
            .register(signup("  A@X.COM ", "p2", "p2"))
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::AlreadyExists { ref email } if email == "a@x.com"));
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn authenticate_accepts_correct_password() {
        let store = make_store();
        store.register(signup("a@x.com", "p1", "p1")).await.unwrap();
        let account = store.authenticate(" A@x.com", "p1").await.unwrap();
        assert_eq!(account.email, "a@x.com");
    }

    #[tokio::test]
    async fn authenticate_rejects_wrong_password() {
        let store = make_store();
        store.register(signup("a@x.com", "p1", "p1")).await.unwrap();
        let err = store.authenticate("a@x.com", "wrong").await.unwrap_err();
        assert!(matches!(err, AccountError::InvalidCredentials));
    }

    #[tokio::test]
    async fn authenticate_rejects_unknown_and_empty_email() {
        let store = make_store();
        for email in ["nobody@x.com", "", "   "] {
            let err = store.authenticate(email, "p1").await.unwrap_err();
            assert!(matches!(err, AccountError::InvalidCredentials));
        }
    }

    #[tokio::test]
    async fn unknown_email_still_verifies_a_hash() {
        let store = make_store();
        assert!(store.dummy_hash.get().is_none());

        let err = store.authenticate("nobody@x.com", "p1").await.unwrap_err();
        assert!(matches!(err, AccountError::InvalidCredentials));
        let dummy = store.dummy_hash.get().unwrap();
        assert!(dummy.starts_with("$argon2id$"));

        // The same fixed password must not unlock an unknown email.
        let err = store
            .authenticate("nobody@x.com", DUMMY_PASSWORD)
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::InvalidCredentials));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn lookup_is_by_value_not_pattern() {
        let store = make_store();
        store.register(signup("a.b@x.com", "p1", "p1")).await.unwrap();
        assert!(store.find_by_email("axb@x.com").await.unwrap().is_none());
        assert!(store.find_by_email("a.*@x.com").await.unwrap().is_none());
        assert!(store.find_by_email("b@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn concurrent_signups_for_one_email_admit_one() {
        let store = Arc::new(make_store());
        let mut handles = Vec::new();
        for i in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let password = format!("p{i}");
                store
                    .register(signup("race@x.com", &password, &password))
                    .await
                    .is_ok()
            }));
        }
        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap() {
                created += 1;
            }
        }
        assert_eq!(created, 1);
    }
}
