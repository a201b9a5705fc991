use axum::extract::State;
use axum::http::StatusCode;
use axum::Form;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::MessageData;
use crate::inbound::http::router::AppState;

/// Start password recovery for a username or email address.
pub async fn request_password_reset(
    State(state): State<AppState>,
    Form(body): Form<PasswordResetRequest>,
) -> Result<ApiSuccess<MessageData>, ApiError> {
    state
        .accounts
        .request_password_reset(body.username.trim())
        .await?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        MessageData::new(
            "Done! You should shortly receive an email at the address you signed up with.",
        ),
    ))
}

/// Finish password recovery with the key from the mail.
pub async fn reset_password(
    State(state): State<AppState>,
    Form(body): Form<ResetPasswordRequest>,
) -> Result<ApiSuccess<MessageData>, ApiError> {
    state.accounts.reset_password(&body.k, body.password).await?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        MessageData::new("All right, we have changed your password and you should now be able to login!"),
    ))
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PasswordResetRequest {
    username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResetPasswordRequest {
    k: String,
    password: String,
}
