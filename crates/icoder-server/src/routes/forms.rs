//! Contact form route: `POST /contact`.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::Router;

use icoder_core::forms::ContactForm;

use crate::error::AppError;
use crate::extract::FormBody;
use crate::state::AppState;

/// Plain-text body of a stored contact submission.
pub const CONTACT_SUBMITTED: &str =
    "Your form has been successfully submitted. Thank you for contacting us.";

/// Build the contact form router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/contact", post(submit_contact))
}

/// Validate and store a contact submission.
async fn submit_contact(
    State(state): State<Arc<AppState>>,
    FormBody(form): FormBody<ContactForm>,
) -> Result<&'static str, AppError> {
    let submission = state.contacts.submit(form).await?;
    tracing::info!(id = %submission.id, "contact form submitted");
    Ok(CONTACT_SUBMITTED)
}
