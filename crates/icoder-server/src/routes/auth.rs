//! Account routes: `POST /signup`, `POST /login`, `POST /logout`.
//!
//! Signup and login hash or verify a password and are mounted by
//! [`credential_router`] so they can share a concurrency limit. Logout only
//! touches the session.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::FormRejection;
use axum::response::{Html, Redirect};
use axum::routing::post;
use axum::{Form, Router};
use tower_sessions::Session;

use icoder_core::error::AccountError;
use icoder_core::forms::{LoginForm, SignupForm, normalize_email};

use crate::error::AppError;
use crate::extract::FormBody;
use crate::session::{LOGIN_ALERT, LoginState};
use crate::state::AppState;
use crate::views::{self, Page};

/// Plain-text body of a stored signup.
pub const SIGNUP_SUBMITTED: &str =
    "Your form has been successfully submitted. Thank you for signing up.";

/// Build the `/signup` and `/login` router.
pub fn credential_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
}

/// Build the `/logout` router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/logout", post(logout))
}

/// Register a new account.
async fn signup(
    State(state): State<Arc<AppState>>,
    FormBody(form): FormBody<SignupForm>,
) -> Result<&'static str, AppError> {
    let account = state.accounts.register(form).await.map_err(signup_error)?;
    tracing::info!(email = %account.email, "account created");
    Ok(SIGNUP_SUBMITTED)
}

/// A signup that passed validation but was not stored answers with the
/// plain-text failure; hashing failures stay internal errors.
fn signup_error(err: AccountError) -> AppError {
    match err {
        AccountError::Storage(_) | AccountError::Serialization { .. } => {
            tracing::warn!(error = %err, "signup not persisted");
            AppError::NotSubmitted
        }
        other => other.into(),
    }
}

/// Check credentials, mark the session logged in, and render the home page.
///
/// A body that cannot be read as a form counts as empty credentials.
async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Result<Html<String>, AppError> {
    let form = form.map_or_else(
        |rejection| {
            tracing::debug!(error = %rejection, "unreadable login body");
            LoginForm::default()
        },
        |Form(form)| form,
    );
    let account = match state.accounts.authenticate(&form.email, &form.password).await {
        Ok(account) => account,
        Err(AccountError::InvalidCredentials) => {
            tracing::warn!(email = %normalize_email(&form.email), "login rejected");
            return Err(AccountError::InvalidCredentials.into());
        }
        Err(e) => return Err(e.into()),
    };

    LoginState::record_login(&session).await?;
    tracing::info!(email = %account.email, "login succeeded");

    let login = LoginState {
        is_logged_in: true,
        login_alert: Some(LOGIN_ALERT.to_owned()),
    };
    Ok(Html(views::render(Page::Home, &login)))
}

/// Drop the session and send the browser home.
async fn logout(session: Session) -> Result<Redirect, AppError> {
    session.flush().await?;
    Ok(Redirect::to("/"))
}
