//! Form schemas for the three POST endpoints.
//!
//! Bodies arrive form-encoded. Every field defaults to an empty string so a
//! missing field surfaces as a [`ValidationError::Missing`] naming it, rather
//! than as an opaque deserialization failure.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::error::ValidationError;

/// Length limit for single-line fields.
pub const MAX_FIELD_LEN: usize = 1024;

/// Length limit for the contact message body.
pub const MAX_MESSAGE_LEN: usize = 5000;

static EMAIL_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok());

/// Whether `email` has the shape `local@domain.tld` with no whitespace.
#[must_use]
pub fn valid_email(email: &str) -> bool {
    EMAIL_RE.as_ref().is_some_and(|re| re.is_match(email))
}

/// Normalize an email for storage keys and lookups: trim, then lowercase.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Missing { field });
    }
    Ok(())
}

fn limit(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}

fn email(field: &'static str, value: &str) -> Result<(), ValidationError> {
    require(field, value)?;
    limit(field, value, MAX_FIELD_LEN)?;
    if !valid_email(value.trim()) {
        return Err(ValidationError::InvalidEmail { field });
    }
    Ok(())
}

/// `POST /contact` body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContactForm {
    pub name: String,
    pub phone: String,
    pub address: String,
    pub email: String,
    pub message: String,
}

impl ContactForm {
    /// Check required fields, the email shape, and length limits.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found, in field order.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("name", &self.name)?;
        limit("name", &self.name, MAX_FIELD_LEN)?;
        limit("phone", &self.phone, MAX_FIELD_LEN)?;
        limit("address", &self.address, MAX_FIELD_LEN)?;
        email("email", &self.email)?;
        require("message", &self.message)?;
        limit("message", &self.message, MAX_MESSAGE_LEN)
    }
}

/// `POST /signup` body.
///
/// The confirmation field is accepted as `confirmpassword` (what the signup
/// page posts) or `confirmPassword`.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct SignupForm {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub password: String,
    #[serde(alias = "confirmPassword")]
    pub confirmpassword: String,
}

impl std::fmt::Debug for SignupForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignupForm")
            .field("name", &self.name)
            .field("phone", &self.phone)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl SignupForm {
    /// Whether the password and its confirmation are identical.
    #[must_use]
    pub fn passwords_match(&self) -> bool {
        self.password == self.confirmpassword
    }

    /// Check required fields, the email shape, and length limits. The
    /// password is not trimmed; whitespace is part of it.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found, in field order.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("name", &self.name)?;
        limit("name", &self.name, MAX_FIELD_LEN)?;
        limit("phone", &self.phone, MAX_FIELD_LEN)?;
        email("email", &self.email)?;
        if self.password.is_empty() {
            return Err(ValidationError::Missing { field: "password" });
        }
        limit("password", &self.password, MAX_FIELD_LEN)
    }
}

/// `POST /login` body. Missing fields are empty strings and simply fail
/// authentication.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}
