//! Session bag keys and cookie signing.
//!
//! Sessions live in `tower-sessions`' in-memory store and are correlated by
//! a signed `icoder.sid` cookie. The login handler is the only writer of the
//! bag; the home page and the login response read it back.

use tower_sessions::Session;
use tower_sessions::cookie::Key;

use crate::config::SessionSecret;

/// Name of the session cookie.
pub const COOKIE_NAME: &str = "icoder.sid";

/// Session key: whether this browser has logged in.
pub const LOGGED_IN_KEY: &str = "isLoggedIn";

/// Session key: the message shown after login.
pub const LOGIN_ALERT_KEY: &str = "loginAlert";

/// Message written to the bag on successful login.
pub const LOGIN_ALERT: &str = "You have successfully logged in!";

/// Message shown when a logged-in bag carries no alert.
pub const FALLBACK_LOGIN_ALERT: &str = "You have logged in successfully";

/// Errors deriving the cookie signing key.
#[derive(Debug, thiserror::Error)]
pub enum SessionKeyError {
    /// `ICODER_SESSION_SECRET` is not valid hex.
    #[error("session secret is not valid hex: {reason}")]
    InvalidHex { reason: String },

    /// The decoded secret is too short to sign cookies.
    #[error("session secret must be at least 64 bytes, got {len}")]
    TooShort { len: usize },
}

/// Build the cookie signing key for the configured secret source.
///
/// # Errors
///
/// Returns [`SessionKeyError`] if a persisted secret is malformed.
pub fn signing_key(secret: &SessionSecret) -> Result<Key, SessionKeyError> {
    match secret {
        SessionSecret::Ephemeral => Ok(Key::generate()),
        SessionSecret::Persisted(encoded) => {
            let bytes = hex::decode(encoded).map_err(|e| SessionKeyError::InvalidHex {
                reason: e.to_string(),
            })?;
            Key::try_from(bytes.as_slice()).map_err(|_| SessionKeyError::TooShort { len: bytes.len() })
        }
    }
}

/// The login-related contents of a session bag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginState {
    pub is_logged_in: bool,
    pub login_alert: Option<String>,
}

impl LoginState {
    /// Read the login keys from a session. Absent keys read as logged out.
    ///
    /// # Errors
    ///
    /// Returns the session store error if the bag cannot be loaded.
    pub async fn load(session: &Session) -> Result<Self, tower_sessions::session::Error> {
        let is_logged_in = session.get::<bool>(LOGGED_IN_KEY).await?.unwrap_or(false);
        let login_alert = session.get::<String>(LOGIN_ALERT_KEY).await?;
        Ok(Self {
            is_logged_in,
            login_alert,
        })
    }

    /// Write a successful login into the session and persist it.
    ///
    /// The session id is rotated first so an id planted before login is not
    /// carried into the authenticated session.
    ///
    /// # Errors
    ///
    /// Returns the session store error if the bag cannot be written.
    pub async fn record_login(session: &Session) -> Result<(), tower_sessions::session::Error> {
        session.cycle_id().await?;
        session.insert(LOGGED_IN_KEY, true).await?;
        session.insert(LOGIN_ALERT_KEY, LOGIN_ALERT).await?;
        session.save().await
    }

    /// The alert to display, if the bag says the user is logged in.
    #[must_use]
    pub fn alert(&self) -> Option<&str> {
        if !self.is_logged_in {
            return None;
        }
        Some(
            self.login_alert
                .as_deref()
                .filter(|a| !a.is_empty())
                .unwrap_or(FALLBACK_LOGIN_ALERT),
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn ephemeral_keys_differ() {
        let a = signing_key(&SessionSecret::Ephemeral).unwrap();
        let b = signing_key(&SessionSecret::Ephemeral).unwrap();
        assert_ne!(a.master(), b.master());
    }

    #[test]
    fn persisted_key_is_stable() {
        let secret = SessionSecret::Persisted("ab".repeat(64));
        let a = signing_key(&secret).unwrap();
        let b = signing_key(&secret).unwrap();
        assert_eq!(a.master(), b.master());
    }

    #[test]
    fn persisted_key_rejects_bad_hex() {
        let err = signing_key(&SessionSecret::Persisted("zz".to_owned())).unwrap_err();
        assert!(matches!(err, SessionKeyError::InvalidHex { .. }));
    }

    #[test]
    fn persisted_key_rejects_short_secret() {
        let err = signing_key(&SessionSecret::Persisted("ab".repeat(32))).unwrap_err();
        assert!(matches!(err, SessionKeyError::TooShort { len: 32 }));
    }

    #[test]
    fn alert_only_when_logged_in() {
        assert_eq!(LoginState::default().alert(), None);

        let logged_in = LoginState {
            is_logged_in: true,
            login_alert: Some(LOGIN_ALERT.to_owned()),
        };
        assert_eq!(logged_in.alert(), Some(LOGIN_ALERT));

        let no_message = LoginState {
            is_logged_in: true,
            login_alert: None,
        };
        assert_eq!(no_message.alert(), Some(FALLBACK_LOGIN_ALERT));
    }
}
