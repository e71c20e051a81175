//! Contact submission collection.
//!
//! Each submission is one JSON document at `<prefix><uuid>`. The HTTP
//! surface only ever appends through [`ContactStore::submit`];
//! [`ContactStore::get`] and [`ContactStore::list`] are the operator API for
//! reading submissions back.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use icoder_storage::StorageBackend;

use crate::error::ContactError;
use crate::forms::ContactForm;

/// A stored contact-form submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactSubmission {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub address: String,
    pub email: String,
    pub message: String,
    pub submitted_at: DateTime<Utc>,
}

/// The contact submission collection.
pub struct ContactStore {
    storage: Arc<dyn StorageBackend>,
    prefix: String,
}

impl std::fmt::Debug for ContactStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContactStore")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl ContactStore {
    /// Create a collection rooted at `prefix` (e.g. `contacts/`).
    pub fn new(storage: Arc<dyn StorageBackend>, prefix: String) -> Self {
        Self { storage, prefix }
    }

    fn key(&self, id: &str) -> String {
        format!("{}{}", self.prefix, id)
    }

    /// Validate a form and persist it as a new submission.
    ///
    /// Text fields are stored trimmed. The message keeps its inner line
    /// breaks.
    ///
    /// # Errors
    ///
    /// Returns [`ContactError::Invalid`] if the form fails validation,
    /// [`ContactError::Storage`] if the backend rejects the write.
    pub async fn submit(&self, form: ContactForm) -> Result<ContactSubmission, ContactError> {
        form.validate()?;

        let submission = ContactSubmission {
            id: uuid::Uuid::new_v4().to_string(),
            name: form.name.trim().to_owned(),
            phone: form.phone.trim().to_owned(),
            address: form.address.trim().to_owned(),
            email: form.email.trim().to_owned(),
            message: form.message.trim().to_owned(),
            submitted_at: Utc::now(),
        };

        let data = serde_json::to_vec(&submission).map_err(|e| ContactError::Serialization {
            reason: format!("serialization failed: {e}"),
        })?;
        self.storage.create(&self.key(&submission.id), &data).await?;

        tracing::debug!(id = %submission.id, "contact submission stored");
        Ok(submission)
    }

    /// Read one submission by id. Operator API; no route exposes it.
    ///
    /// # Errors
    ///
    /// Returns [`ContactError::Storage`] on backend failure or
    /// [`ContactError::Serialization`] if the stored document is corrupt.
    pub async fn get(&self, id: &str) -> Result<Option<ContactSubmission>, ContactError> {
        let Some(data) = self.storage.get(&self.key(id)).await? else {
            return Ok(None);
        };
        let submission =
            serde_json::from_slice(&data).map_err(|e| ContactError::Serialization {
                reason: format!("deserialization failed: {e}"),
            })?;
        Ok(Some(submission))
    }

    /// All stored submissions, oldest first. Operator API; no route
    /// exposes it.
    ///
    /// # Errors
    ///
    /// Same as [`get`](Self::get).
    pub async fn list(&self) -> Result<Vec<ContactSubmission>, ContactError> {
        let keys = self.storage.list(&self.prefix).await?;
        let mut submissions = Vec::with_capacity(keys.len());
        for id in keys.iter().filter_map(|k| k.strip_prefix(&self.prefix)) {
            if let Some(submission) = self.get(id).await? {
                submissions.push(submission);
            }
        }
        submissions.sort_by_key(|s| s.submitted_at);
        Ok(submissions)
    }
}
