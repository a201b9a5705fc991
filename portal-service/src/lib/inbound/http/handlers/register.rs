use axum::extract::Query;
use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::response::AppendHeaders;
use axum::response::IntoResponse;
use axum::response::Redirect;
use axum::response::Response;
use axum::Extension;
use axum::Form;
use serde::Deserialize;
use serde::Serialize;

use super::csrf_token::csrf_token_valid;
use super::csrf_token::issue_csrf_token;
use super::ApiError;
use super::ApiSuccess;
use crate::account::models::RegisterCommand;
use crate::account::models::UserId;
use crate::domain::identity::models::MatchSignal;
use crate::domain::identity::models::MultiAccountMatch;
use crate::inbound::http::client_ip::ClientIp;
use crate::inbound::http::middleware::SessionContext;
use crate::inbound::http::router::AppState;

/// Registration page data.
///
/// Unless `stopsign=1` is passed, warns visitors who already seem to own an
/// account, matched by IP history or by the identity cookie.
pub async fn registration_page(
    State(state): State<AppState>,
    Extension(client_ip): Extension<ClientIp>,
    Extension(session): Extension<SessionContext>,
    Query(query): Query<RegistrationPageQuery>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let existing_account = if query.stopsign.as_deref() == Some("1") {
        None
    } else {
        let token = state.cookies.identity_token(&headers);
        state
            .identity
            .check_multi_account(client_ip.as_str(), token.as_ref())
            .await?
            .map(ExistingAccountData::from)
    };

    let (csrf_token, cookie) = issue_csrf_token(&state, UserId::ANONYMOUS, &session)?;

    Ok((
        AppendHeaders(cookie.map(|cookie| (SET_COOKIE, cookie))),
        ApiSuccess::new(
            StatusCode::OK,
            RegistrationPageData {
                registrations_enabled: state.accounts.registration_enabled(),
                csrf_token,
                existing_account,
            },
        ),
    )
        .into_response())
}

/// Create an account and continue to the verification page.
pub async fn register(
    State(state): State<AppState>,
    Extension(client_ip): Extension<ClientIp>,
    Extension(session): Extension<SessionContext>,
    Form(body): Form<RegisterRequest>,
) -> Result<Response, ApiError> {
    if !csrf_token_valid(&state, UserId::ANONYMOUS, &session, &body.csrf) {
        return Err(ApiError::session_expired());
    }

    let command = RegisterCommand::parse(body.username, body.email, body.password, client_ip.0)?;
    let registration = state.accounts.register(command).await?;

    let cookie = state.cookies.identity_cookie(&registration.identity_token)?;
    let target = format!("/register/verify?u={}", registration.user_id);

    Ok((AppendHeaders([(SET_COOKIE, cookie)]), Redirect::to(&target)).into_response())
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegistrationPageQuery {
    stopsign: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegisterRequest {
    username: String,
    email: String,
    password: String,
    #[serde(default)]
    csrf: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationPageData {
    pub registrations_enabled: bool,
    pub csrf_token: String,
    pub existing_account: Option<ExistingAccountData>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExistingAccountData {
    pub username: String,
    pub matched_by: MatchSignal,
}

impl From<MultiAccountMatch> for ExistingAccountData {
    fn from(found: MultiAccountMatch) -> Self {
        Self {
            username: found.username,
            matched_by: found.signal,
        }
    }
}
