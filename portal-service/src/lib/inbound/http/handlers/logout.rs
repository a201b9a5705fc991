use axum::extract::Query;
use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::StatusCode;
use axum::response::AppendHeaders;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::Extension;
use serde::Deserialize;
use subtle::ConstantTimeEq;

use super::ApiError;
use super::ApiSuccess;
use super::MessageData;
use crate::account::models::RequestIdentity;
use crate::inbound::http::middleware::SessionContext;
use crate::inbound::http::router::AppState;

/// End the current session.
///
/// The `k` parameter must equal the logout key issued at login, so a
/// third-party page cannot log the user out. The identity cookie is kept.
pub async fn logout(
    State(state): State<AppState>,
    Extension(identity): Extension<RequestIdentity>,
    Extension(session): Extension<SessionContext>,
    Query(query): Query<LogoutQuery>,
) -> Result<Response, ApiError> {
    if !logout_key_matches(session.data.logout_key.as_deref(), query.k.as_deref()) {
        return Err(ApiError::session_expired());
    }

    if let Some(key) = &session.key {
        state.sessions.delete(key).await?;
    }

    tracing::info!(user_id = %identity.user_id, "User logged out");

    let cookie = state.cookies.clear_session_cookie()?;
    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        ApiSuccess::new(StatusCode::OK, MessageData::new("Successfully logged out.")),
    )
        .into_response())
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogoutQuery {
    k: Option<String>,
}

/// Constant-time check of the submitted logout key. A session without a key
/// never matches.
fn logout_key_matches(expected: Option<&str>, provided: Option<&str>) -> bool {
    let expected = expected.unwrap_or_default();
    let provided = provided.unwrap_or_default();

    !expected.is_empty() && bool::from(provided.as_bytes().ct_eq(expected.as_bytes()))
}
