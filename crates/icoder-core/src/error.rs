//! Error types for `icoder-core`.
//!
//! Each error variant carries enough context to diagnose the problem without
//! a debugger. Passwords and password hashes never appear in error messages;
//! emails and field names do.

use icoder_storage::StorageError;

/// A submitted form failed its schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A required field was absent or blank.
    #[error("{field} is required")]
    Missing { field: &'static str },

    /// The field does not look like an email address.
    #[error("{field} must be a valid email address")]
    InvalidEmail { field: &'static str },

    /// The field exceeds its length limit.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
}

impl ValidationError {
    /// Name of the offending form field.
    #[must_use]
    pub fn field(&self) -> &'static str {
        match self {
            Self::Missing { field }
            | Self::InvalidEmail { field }
            | Self::TooLong { field, .. } => field,
        }
    }
}

/// Errors from password hashing.
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// The Argon2 parameters were rejected.
    #[error("invalid argon2 parameters: {reason}")]
    Params { reason: String },

    /// Hashing a password failed.
    #[error("password hashing failed: {reason}")]
    Hash { reason: String },

    /// The blocking hashing task did not complete.
    #[error("password hashing task failed: {reason}")]
    Task { reason: String },
}

/// Errors from the contact submission collection.
#[derive(Debug, thiserror::Error)]
pub enum ContactError {
    /// The submitted form failed validation.
    #[error("invalid contact form: {0}")]
    Invalid(#[from] ValidationError),

    /// A document could not be encoded or decoded.
    #[error("contact serialization failed: {reason}")]
    Serialization { reason: String },

    /// The storage backend rejected the operation.
    #[error("contact storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Errors from the account collection.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    /// The submitted form failed validation.
    #[error("invalid signup form: {0}")]
    Invalid(#[from] ValidationError),

    /// `password` and `confirmpassword` differ.
    #[error("Passwords do not match")]
    PasswordMismatch,

    /// An account with this normalized email is already stored.
    #[error("account '{email}' already exists")]
    AlreadyExists { email: String },

    /// Unknown email or wrong password; the variant does not say which.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Hashing or verifying the password failed.
    #[error("account password error: {0}")]
    Password(#[from] PasswordError),

    /// A document could not be encoded or decoded.
    #[error("account serialization failed: {reason}")]
    Serialization { reason: String },

    /// The storage backend rejected the operation.
    #[error("account storage error: {0}")]
    Storage(#[from] StorageError),
}
