use axum::extract::Request;
use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::Method;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Redirect;
use axum::response::Response;
use chrono::Utc;

use super::handlers::ApiError;
use crate::account::models::RequestIdentity;
use crate::domain::session::hydrator::HydrationOutcome;
use crate::domain::session::models::SessionData;
use crate::domain::session::models::SessionKey;
use crate::inbound::http::router::AppState;

/// Session entry attached to the request after hydration.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    /// Key from the cookie, if one was presented and well formed.
    pub key: Option<SessionKey>,
    pub data: SessionData,
}

/// Middleware that turns the session cookie into a verified `RequestIdentity`.
///
/// Sessions that no longer match their credential are cleared. Safe requests
/// are then redirected to themselves so the client drops the stale cookie;
/// other requests continue anonymously with a clearing cookie attached.
pub async fn hydrate_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let key = state.cookies.session_key(req.headers());
    let hydration = state.hydrator.hydrate(key.as_ref()).await;

    let invalidated = matches!(hydration.outcome, HydrationOutcome::Invalidated(_));
    if invalidated {
        if let Some(response) = redirect_safe_request(&state, &req) {
            return response;
        }
    }

    req.extensions_mut().insert(hydration.identity);
    req.extensions_mut().insert(SessionContext {
        key,
        data: hydration.session,
    });

    let mut response = next.run(req).await;

    if invalidated && !sets_cookie(&response, &state.cookies.session_name) {
        match state.cookies.clear_session_cookie() {
            Ok(cookie) => {
                response.headers_mut().append(SET_COOKIE, cookie);
            }
            Err(e) => tracing::error!(error = %e, "Failed to build clearing cookie"),
        }
    }

    response
}

fn redirect_safe_request(state: &AppState, req: &Request) -> Option<Response> {
    if req.method() != Method::GET && req.method() != Method::HEAD {
        return None;
    }

    let target = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    let mut response = Redirect::to(target).into_response();
    match state.cookies.clear_session_cookie() {
        Ok(cookie) => {
            response.headers_mut().append(SET_COOKIE, cookie);
            Some(response)
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to build clearing cookie");
            None
        }
    }
}

fn sets_cookie(response: &Response, name: &str) -> bool {
    let prefix = format!("{name}=");
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|value| value.starts_with(&prefix))
}

/// Middleware recording user activity at most once per configured interval.
pub async fn track_activity(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let user_id = req
        .extensions()
        .get::<RequestIdentity>()
        .map(|identity| identity.user_id)
        .unwrap_or_default();

    if !user_id.is_anonymous() {
        let now = Utc::now().timestamp();

        if let Some(ctx) = req.extensions_mut().get_mut::<SessionContext>() {
            if let Some(key) = ctx.key.clone() {
                if ctx.data.activity_due(now, state.activity_update_interval_secs) {
                    if let Err(e) = state.credentials.touch_activity(user_id, now).await {
                        tracing::warn!(user_id = %user_id, error = %e, "Failed to record activity");
                    }

                    ctx.data.last_activity_update = Some(now);
                    if let Err(e) = state.sessions.save(&key, &ctx.data).await {
                        tracing::warn!(user_id = %user_id, error = %e, "Failed to save session");
                    }
                }
            }
        }
    }

    next.run(req).await
}

/// Route guard for pages that need a signed-in user.
pub async fn require_auth(req: Request, next: Next) -> Result<Response, ApiError> {
    let logged_in = req
        .extensions()
        .get::<RequestIdentity>()
        .is_some_and(RequestIdentity::is_logged_in);

    if !logged_in {
        return Err(ApiError::Unauthorized(
            "You need to login first.".to_string(),
        ));
    }

    Ok(next.run(req).await)
}

/// Route guard for pages only anonymous visitors may use.
pub async fn require_guest(req: Request, next: Next) -> Result<Response, ApiError> {
    let logged_in = req
        .extensions()
        .get::<RequestIdentity>()
        .is_some_and(RequestIdentity::is_logged_in);

    if logged_in {
        return Err(ApiError::Forbidden("You're already logged in!".to_string()));
    }

    Ok(next.run(req).await)
}
