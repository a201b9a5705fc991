use std::sync::Arc;
use std::time::Duration;

use auth::CsrfTokenService;
use axum::body::Body;
use axum::http::Request;
use axum::http::Response;
use axum::middleware;
use axum::routing::get;
use axum::routing::post;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::Span;

use super::client_ip::ClientIpResolver;
use super::cookies::CookieSettings;
use super::handlers::change_password::change_password;
use super::handlers::csrf_token::csrf_token;
use super::handlers::login::login;
use super::handlers::logout::logout;
use super::handlers::me::me;
use super::handlers::password_reset::request_password_reset;
use super::handlers::password_reset::reset_password;
use super::handlers::register::register;
use super::handlers::register::registration_page;
use super::handlers::verify::verify_account;
use super::handlers::verify::welcome;
use super::middleware::hydrate_session;
use super::middleware::require_auth;
use super::middleware::require_guest;
use super::middleware::track_activity;
use super::rate_limit::enforce_rate_limit;
use super::rate_limit::RateLimiter;
use crate::account::ports::CredentialStore;
use crate::account::ports::EventPublisher;
use crate::account::ports::TokenRepository;
use crate::account::service::AccountService;
use crate::domain::identity::service::IdentityTokenService;
use crate::domain::session::hydrator::SessionHydrator;
use crate::domain::session::ports::SessionStore;

pub type DynAccountService =
    AccountService<dyn CredentialStore, dyn TokenRepository, dyn EventPublisher>;
pub type DynIdentityService = IdentityTokenService<dyn TokenRepository>;
pub type DynSessionHydrator = SessionHydrator<dyn CredentialStore, dyn SessionStore>;

#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<DynAccountService>,
    pub identity: Arc<DynIdentityService>,
    pub hydrator: Arc<DynSessionHydrator>,
    pub credentials: Arc<dyn CredentialStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub csrf: Arc<dyn CsrfTokenService>,
    pub rate_limiter: Arc<RateLimiter>,
    pub client_ip: ClientIpResolver,
    pub cookies: CookieSettings,
    pub activity_update_interval_secs: i64,
}

/// Build the HTTP router.
///
/// Every request passes, outermost first, through tracing, the per-IP rate
/// limiter, session hydration and activity tracking before reaching a
/// handler.
pub fn create_router(state: AppState) -> Router {
    let guest_routes = Router::new()
        .route("/login", post(login))
        .route("/register", get(registration_page).post(register))
        .route("/password-reset", post(request_password_reset))
        .route("/password-reset/continue", post(reset_password))
        .route_layer(middleware::from_fn(require_guest));

    let protected_routes = Router::new()
        .route("/logout", post(logout))
        .route("/settings/password", post(change_password))
        .route("/me", get(me))
        .route_layer(middleware::from_fn(require_auth));

    let public_routes = Router::new()
        .route("/register/verify", get(verify_account))
        .route("/register/welcome", get(welcome))
        .route("/csrf", get(csrf_token));

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version(),
            )
        })
        .on_request(|request: &Request<Body>, _span: &Span| {
            tracing::info!(
                method = %request.method(),
                uri = %request.uri(),
                "Request started"
            );
        })
        .on_response(
            |response: &Response<Body>, latency: Duration, _span: &Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis(),
                    "Request completed"
                );
            },
        );

    Router::new()
        .merge(guest_routes)
        .merge(protected_routes)
        .merge(public_routes)
        .layer(
            ServiceBuilder::new()
                .layer(trace_layer)
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    enforce_rate_limit,
                ))
                .layer(middleware::from_fn_with_state(state.clone(), hydrate_session))
                .layer(middleware::from_fn_with_state(state.clone(), track_activity)),
        )
        .with_state(state)
}
