//! HTTP route handlers and router assembly.
//!
//! Each submodule exposes a `router()` returning `Router<Arc<AppState>>`.
//! [`build_router`] merges them and applies the session, tracing, and
//! response-header layers.

pub mod auth;
pub mod forms;
pub mod health;
pub mod pages;

use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderValue, header};
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tower_sessions::cookie::SameSite;
use tower_sessions::{MemoryStore, SessionManagerLayer};

use crate::config::SessionSettings;
use crate::session::{COOKIE_NAME, SessionKeyError, signing_key};
use crate::state::AppState;

/// Maximum in-flight requests across `/signup` and `/login`.
pub const CREDENTIAL_CONCURRENCY: usize = 64;

/// Build the Axum router with all routes and middleware.
///
/// # Errors
///
/// Returns [`SessionKeyError`] if the configured session secret cannot be
/// turned into a signing key.
pub fn build_router(
    state: Arc<AppState>,
    static_dir: &Path,
    session: &SessionSettings,
) -> Result<Router, SessionKeyError> {
    let key = signing_key(&session.secret)?;
    let sessions = SessionManagerLayer::new(MemoryStore::default())
        .with_name(COOKIE_NAME)
        .with_http_only(true)
        .with_same_site(SameSite::Lax)
        .with_secure(session.secure)
        .with_signed(key);

    let credential_routes = limit_credentials(auth::credential_router(), CREDENTIAL_CONCURRENCY);

    let app = Router::new()
        .merge(pages::router())
        .merge(forms::router())
        .merge(credential_routes)
        .merge(auth::router())
        .merge(health::router())
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(sessions)
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .with_state(state);

    Ok(app)
}

/// Cap in-flight requests across every route of `router` with one shared
/// semaphore, so `/signup` and `/login` draw from the same `max` permits.
fn limit_credentials<S>(router: Router<S>, max: usize) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(GlobalConcurrencyLimitLayer::new(max))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::post;
    use tokio::sync::Notify;
    use tower::ServiceExt;

    use super::*;

    fn post_to(path: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(path)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn credential_routes_share_one_limit() {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());

        let signup = {
            let entered = Arc::clone(&entered);
            let release = Arc::clone(&release);
            move || {
                let entered = Arc::clone(&entered);
                let release = Arc::clone(&release);
                async move {
                    entered.notify_one();
                    release.notified().await;
                    "signup"
                }
            }
        };
        let router: Router = limit_credentials(
            Router::new()
                .route("/signup", post(signup))
                .route("/login", post(|| async { "login" })),
            1,
        );

        let held = tokio::spawn(router.clone().oneshot(post_to("/signup")));
        entered.notified().await;

        let waiting = tokio::time::timeout(
            Duration::from_millis(100),
            router.clone().oneshot(post_to("/login")),
        )
        .await;
        assert!(waiting.is_err(), "login ran while signup held the only permit");

        release.notify_one();
        assert_eq!(held.await.unwrap().unwrap().status(), StatusCode::OK);

        let login = router.oneshot(post_to("/login")).await.unwrap();
        assert_eq!(login.status(), StatusCode::OK);
    }
}
