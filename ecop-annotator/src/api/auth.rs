//! Login, logout and the login-required middleware

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{Html, IntoResponse, Redirect, Response},
    Extension, Form,
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::api::ui::pages;
use crate::error::{ApiError, ApiResult};
use crate::session::{clear_session_cookie, set_session_cookie, CurrentUser, Session};
use crate::AppState;

/// Login form body
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub csrf_token: Option<String>,
}

/// GET /
pub async fn home_page(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Html<String> {
    let logged_in = state.sessions.username(&session).await.is_some();
    Html(pages::home_page(logged_in))
}

/// GET /login
///
/// First point where an anonymous session is stored, so the token in the
/// form can be checked on POST.
pub async fn login_page(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Response {
    let mut response = Html(pages::login_page(&session.csrf_token, None, "")).into_response();
    if session.is_new {
        state.sessions.register(&session).await;
        set_session_cookie(&mut response, &session);
    }
    response
}

/// POST /login
///
/// Bad credentials re-render the form with an inline error. Success moves
/// the user to a new session id.
pub async fn login_submit(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Form(form): Form<LoginForm>,
) -> ApiResult<Response> {
    if !state
        .sessions
        .verify_csrf(&session, form.csrf_token.as_deref())
    {
        return Err(ApiError::InvalidCsrfToken);
    }

    let username = form.username.trim();
    match state.catalog.authenticate(username, &form.password) {
        Some(user) => {
            let fresh = state.sessions.log_in(&session, &user.username).await;
            info!("User {} logged in", user.username);
            let mut response = Redirect::to("/instructions").into_response();
            set_session_cookie(&mut response, &fresh);
            Ok(response)
        }
        None => {
            warn!("Failed login attempt for user {:?}", username);
            Ok(Html(pages::login_page(
                &session.csrf_token,
                Some("Invalid credentials"),
                username,
            ))
            .into_response())
        }
    }
}

/// GET /logout
pub async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Response {
    if let Some(username) = state.sessions.username(&session).await {
        info!("User {} logged out", username);
    }
    state.sessions.log_out(&session).await;

    let mut response = Redirect::to("/").into_response();
    if !session.is_new {
        clear_session_cookie(&mut response);
    }
    response
}

/// Login-required middleware
///
/// Inserts [`CurrentUser`] for the handlers behind it; anonymous requests are
/// redirected to `/login`.
pub async fn require_login(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let username = match request.extensions().get::<Session>() {
        Some(session) => state.sessions.username(session).await,
        None => None,
    };

    match username {
        Some(username) => {
            request.extensions_mut().insert(CurrentUser(username));
            next.run(request).await
        }
        None => Redirect::to("/login").into_response(),
    }
}
