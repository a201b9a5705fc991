use axum::extract::State;
use axum::http::StatusCode;
use axum::Extension;
use axum::Form;
use serde::Deserialize;

use super::csrf_token::csrf_token_valid;
use super::ApiError;
use super::ApiSuccess;
use super::MessageData;
use crate::account::models::RequestIdentity;
use crate::inbound::http::middleware::SessionContext;
use crate::inbound::http::router::AppState;

/// Change the signed-in user's password.
///
/// The acting session is re-pinned to the new hash; every other session of
/// the user is invalidated on its next request.
pub async fn change_password(
    State(state): State<AppState>,
    Extension(identity): Extension<RequestIdentity>,
    Extension(mut session): Extension<SessionContext>,
    Form(body): Form<ChangePasswordRequest>,
) -> Result<ApiSuccess<MessageData>, ApiError> {
    if !csrf_token_valid(&state, identity.user_id, &session, &body.csrf) {
        return Err(ApiError::session_expired());
    }

    let fingerprint = state
        .accounts
        .change_password(identity.user_id, body.current_password, body.new_password)
        .await?;

    if let Some(key) = &session.key {
        session.data.password_fingerprint = Some(fingerprint);
        state.sessions.save(key, &session.data).await?;
    }

    Ok(ApiSuccess::new(
        StatusCode::OK,
        MessageData::new("Your password has been changed."),
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChangePasswordRequest {
    current_password: String,
    new_password: String,
    #[serde(default)]
    csrf: String,
}
