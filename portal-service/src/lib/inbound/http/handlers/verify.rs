use axum::extract::Query;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Redirect;
use axum::response::Response;
use serde::Deserialize;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use crate::account::models::Credential;
use crate::account::models::UserId;
use crate::inbound::http::router::AppState;

/// Status page shown while an account waits for verification.
///
/// Only the device holding the account's identity cookie may see it.
pub async fn verify_account(
    State(state): State<AppState>,
    Query(query): Query<AccountQuery>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let credential = resume(&state, &query, &headers).await?;

    if !credential.privileges.is_pending_verification() {
        let target = format!("/register/welcome?u={}", credential.user_id);
        return Ok(Redirect::to(&target).into_response());
    }

    Ok(ApiSuccess::new(
        StatusCode::OK,
        AccountStatusData::new(&credential, AccountStatus::PendingVerification),
    )
    .into_response())
}

/// Landing page once verification went through.
pub async fn welcome(
    State(state): State<AppState>,
    Query(query): Query<AccountQuery>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let credential = resume(&state, &query, &headers).await?;

    if credential.privileges.is_pending_verification() {
        let target = format!("/register/verify?u={}", credential.user_id);
        return Ok(Redirect::to(&target).into_response());
    }

    // Verification can end with a restricted account (e.g. flagged as a
    // duplicate); the page says so instead of welcoming.
    let status = if credential.privileges.can_login() {
        AccountStatus::Active
    } else {
        AccountStatus::Restricted
    };

    Ok(ApiSuccess::new(StatusCode::OK, AccountStatusData::new(&credential, status)).into_response())
}

async fn resume(
    state: &AppState,
    query: &AccountQuery,
    headers: &HeaderMap,
) -> Result<Credential, ApiError> {
    let forbidden = || ApiError::Forbidden("Nope.".to_string());

    let user_id = UserId::from_string(query.u.as_deref().unwrap_or_default())
        .map_err(|e| ApiError::UnprocessableEntity(e.to_string()))?;
    let token = state.cookies.identity_token(headers).ok_or_else(forbidden)?;

    state
        .accounts
        .resume_registration(user_id, &token)
        .await?
        .ok_or_else(forbidden)
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccountQuery {
    u: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    PendingVerification,
    Active,
    Restricted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountStatusData {
    pub user_id: i64,
    pub username: String,
    pub status: AccountStatus,
}

impl AccountStatusData {
    fn new(credential: &Credential, status: AccountStatus) -> Self {
        Self {
            user_id: credential.user_id.0,
            username: credential.username.clone(),
            status,
        }
    }
}
