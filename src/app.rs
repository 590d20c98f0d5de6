use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, RequestParts};
use axum::handler::Handler;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};

use crate::auth::{resolve_session, Session, TokenCodec};
use crate::err::Error;
use crate::store::PortalStore;
use crate::{assignments, auth, comments, err, events, notices, users};

pub struct AppState {
    pub store: Arc<dyn PortalStore>,
    pub tokens: TokenCodec,
    /// Adds `Secure` to the session cookie.
    pub secure_cookies: bool,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(store: Arc<dyn PortalStore>, tokens: TokenCodec, secure_cookies: bool) -> Self {
        Self {
            store,
            tokens,
            secure_cookies,
        }
    }
}

/// The caller's decoded session, or `None` for anonymous requests.
pub struct CurrentSession(pub Option<Session>);

#[async_trait]
impl<B: Send> FromRequest<B> for CurrentSession {
    type Rejection = Error;

    async fn from_request(req: &mut RequestParts<B>) -> Result<Self, Self::Rejection> {
        let state = req
            .extensions()
            .get::<SharedState>()
            .cloned()
            .ok_or_else(|| Error::InternalError {
                kind: "StateError",
                message: "application state is not installed".to_string(),
            })?;
        Ok(CurrentSession(resolve_session(req.headers(), &state.tokens)))
    }
}

/// JSON request body whose rejections use the portal's `{error}` shape.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<B, T> FromRequest<B> for JsonBody<T>
where
    B: Send,
    T: Send,
    Json<T>: FromRequest<B, Rejection = JsonRejection>,
{
    type Rejection = Error;

    async fn from_request(req: &mut RequestParts<B>) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(Error::invalid(rejection.to_string())),
        }
    }
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/api/auth/register", post(auth::register_user))
        .route("/api/auth/login", post(auth::login_user))
        .route("/api/auth/me", get(auth::current_user))
        .route("/api/auth/logout", post(auth::logout_user))
        .route(
            "/api/notices",
            get(notices::list_notices).post(notices::create_notice),
        )
        .route(
            "/api/notices/:id",
            get(notices::read_notice).delete(notices::delete_notice),
        )
        .route(
            "/api/notices/:id/comments",
            get(comments::list_comments).post(comments::create_comment),
        )
        .route(
            "/api/assignments",
            get(assignments::list_assignments).post(assignments::create_assignment),
        )
        .route("/api/assignments/:id", get(assignments::read_assignment))
        .route(
            "/api/assignments/:id/submit",
            post(assignments::submit_assignment),
        )
        .route(
            "/api/events",
            get(events::list_events).post(events::create_event),
        )
        .route("/api/users", get(users::list_users).post(users::create_user))
        .route(
            "/api/users/:id",
            axum::routing::delete(users::delete_user).patch(users::patch_user_role),
        )
        .fallback(err::handler404.into_service())
        .layer(Extension(state))
}
