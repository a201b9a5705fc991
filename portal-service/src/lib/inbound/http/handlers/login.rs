use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::StatusCode;
use axum::response::AppendHeaders;
use axum::response::IntoResponse;
use axum::response::Redirect;
use axum::response::Response;
use axum::Extension;
use axum::Form;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::account::models::LoginCommand;
use crate::account::models::LoginOutcome;
use crate::domain::session::models::SessionKey;
use crate::inbound::http::client_ip::ClientIp;
use crate::inbound::http::middleware::SessionContext;
use crate::inbound::http::router::AppState;

/// Log in with username or email and password.
///
/// On success the session key is rotated: the new entry is stored under a
/// fresh key and the old one is discarded.
pub async fn login(
    State(state): State<AppState>,
    Extension(client_ip): Extension<ClientIp>,
    Extension(session): Extension<SessionContext>,
    Form(body): Form<LoginRequest>,
) -> Result<Response, ApiError> {
    let outcome = state
        .accounts
        .login(LoginCommand {
            identifier: body.username,
            password: body.password,
            client_ip: client_ip.0,
        })
        .await?;

    match outcome {
        LoginOutcome::SignedIn(signed_in) => {
            let key = SessionKey::generate();
            state.sessions.save(&key, &signed_in.session).await?;

            if let Some(old_key) = &session.key {
                if let Err(e) = state.sessions.delete(old_key).await {
                    tracing::warn!(error = %e, "Failed to discard previous session");
                }
            }

            let cookies = AppendHeaders([
                (SET_COOKIE, state.cookies.session_cookie(&key)?),
                (SET_COOKIE, state.cookies.identity_cookie(&signed_in.identity_token)?),
            ]);

            let data = LoginResponseData {
                user_id: signed_in.user_id.0,
                username: signed_in.username,
                logout_key: signed_in.session.logout_key.unwrap_or_default(),
            };

            Ok((cookies, ApiSuccess::new(StatusCode::OK, data)).into_response())
        }
        LoginOutcome::PendingVerification {
            user_id,
            identity_token,
        } => {
            tracing::debug!(user_id = %user_id, "Login attempt on unverified account");

            let cookie = state.cookies.identity_cookie(&identity_token)?;
            let target = format!("/register/verify?u={}", user_id);

            Ok((AppendHeaders([(SET_COOKIE, cookie)]), Redirect::to(&target)).into_response())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginRequest {
    username: String,
    password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginResponseData {
    pub user_id: i64,
    pub username: String,
    /// Required by `/logout` to end this session.
    pub logout_key: String,
}
