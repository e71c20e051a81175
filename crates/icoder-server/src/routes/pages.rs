//! Page routes: `/`, `/base.pug`, `/topics.pug`, `/contact.pug`.

use std::sync::Arc;

use axum::Router;
use axum::response::Html;
use axum::routing::get;
use tower_sessions::Session;

use crate::session::LoginState;
use crate::state::AppState;
use crate::views::{self, Page};

/// Build the page router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(home))
        .route("/base.pug", get(base))
        .route("/topics.pug", get(topics))
        .route("/contact.pug", get(contact))
}

/// Home page. Shows the login alert when the session says logged in; a
/// session that cannot be read renders as anonymous.
async fn home(session: Session) -> Html<String> {
    let login = match LoginState::load(&session).await {
        Ok(login) => login,
        Err(e) => {
            tracing::warn!(error = %e, "failed to read session, rendering anonymous home");
            LoginState::default()
        }
    };
    Html(views::render(Page::Home, &login))
}

async fn base() -> Html<String> {
    Html(views::render(Page::Base, &LoginState::default()))
}

async fn topics() -> Html<String> {
    Html(views::render(Page::Topics, &LoginState::default()))
}

async fn contact() -> Html<String> {
    Html(views::render(Page::Contact, &LoginState::default()))
}
