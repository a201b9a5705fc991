use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::response::AppendHeaders;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Extension;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::account::models::RequestIdentity;
use crate::account::models::UserId;
use crate::domain::session::models::SessionKey;
use crate::inbound::http::middleware::SessionContext;
use crate::inbound::http::router::AppState;

/// Issue an anti-forgery token for the current identity.
pub async fn csrf_token(
    State(state): State<AppState>,
    Extension(identity): Extension<RequestIdentity>,
    Extension(session): Extension<SessionContext>,
) -> Result<Response, ApiError> {
    let (token, cookie) = issue_csrf_token(&state, identity.user_id, &session)?;

    Ok((
        AppendHeaders(cookie.map(|cookie| (SET_COOKIE, cookie))),
        ApiSuccess::new(StatusCode::OK, CsrfTokenData { token }),
    )
        .into_response())
}

/// Token for `user_id`, bound to the browser's session key.
///
/// A visitor without a session cookie gets a freshly minted key, delivered
/// by the returned cookie. No session entry is stored for it.
pub(super) fn issue_csrf_token(
    state: &AppState,
    user_id: UserId,
    session: &SessionContext,
) -> Result<(String, Option<HeaderValue>), ApiError> {
    let (key, cookie) = match &session.key {
        Some(key) => (key.clone(), None),
        None => {
            let key = SessionKey::generate();
            let cookie = state.cookies.session_cookie(&key)?;
            (key, Some(cookie))
        }
    };

    let token = state.csrf.generate(user_id.0, key.as_str())?;
    Ok((token, cookie))
}

/// Whether `token` was issued to this browser for `user_id`.
pub(super) fn csrf_token_valid(
    state: &AppState,
    user_id: UserId,
    session: &SessionContext,
    token: &str,
) -> bool {
    session
        .key
        .as_ref()
        .is_some_and(|key| state.csrf.validate(user_id.0, key.as_str(), token))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CsrfTokenData {
    pub token: String,
}
