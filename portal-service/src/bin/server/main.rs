use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use auth::Authenticator;
use auth::InMemoryCsrfTokens;
use auth::PasswordHasher;
use portal_service::account::ports::CredentialStore;
use portal_service::account::ports::EventPublisher;
use portal_service::account::ports::TokenRepository;
use portal_service::account::service::AccountService;
use portal_service::config::Config;
use portal_service::domain::identity::service::IdentityTokenService;
use portal_service::domain::session::hydrator::SessionHydrator;
use portal_service::domain::session::ports::SessionStore;
use portal_service::inbound::http::client_ip::ClientIpResolver;
use portal_service::inbound::http::cookies::CookieSettings;
use portal_service::inbound::http::rate_limit::RateLimiter;
use portal_service::inbound::http::create_router;
use portal_service::inbound::http::AppState;
use portal_service::outbound::events::KafkaEventProducer;
use portal_service::outbound::repositories::PostgresCredentialStore;
use portal_service::outbound::repositories::PostgresSessionStore;
use portal_service::outbound::repositories::PostgresTokenRepository;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portal_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "portal-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        kafka_brokers = %config.kafka.brokers,
        kafka_topic = %config.kafka.topic,
        rate_per_second = config.rate_limit.rate_per_second,
        rate_capacity = config.rate_limit.capacity,
        registrations_enabled = config.registration.enabled,
        "Configuration loaded"
    );

    let pg_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database.url)
        .await?;
    tracing::info!(
        max_connections = 5,
        database = "postgresql",
        "Database connection pool created"
    );

    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    tracing::info!(database = "postgresql", "Database migrations completed");

    let password_hasher = PasswordHasher::with_cost(
        config.security.password_memory_kib,
        config.security.password_iterations,
        config.security.password_parallelism,
    )?;
    let authenticator = Arc::new(Authenticator::new(password_hasher));

    let credentials: Arc<dyn CredentialStore> =
        Arc::new(PostgresCredentialStore::new(pg_pool.clone()));
    let tokens: Arc<dyn TokenRepository> = Arc::new(PostgresTokenRepository::new(pg_pool.clone()));
    let session_store = Arc::new(PostgresSessionStore::new(
        pg_pool.clone(),
        config.session.ttl(),
    ));
    let sessions: Arc<dyn SessionStore> = session_store.clone();
    let event_producer: Arc<dyn EventPublisher> = Arc::new(KafkaEventProducer::new(&config)?);

    let identity = Arc::new(IdentityTokenService::new(Arc::clone(&tokens)));
    let accounts = Arc::new(AccountService::new(
        Arc::clone(&credentials),
        Arc::clone(&tokens),
        event_producer,
        Arc::clone(&identity),
        authenticator,
        config.registration.clone(),
    ));
    let hydrator = Arc::new(SessionHydrator::new(
        Arc::clone(&credentials),
        Arc::clone(&sessions),
    ));

    let rate_limiter = Arc::new(RateLimiter::new(&config.rate_limit));
    let sweep_task = rate_limiter.start();

    let purge_task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SESSION_PURGE_INTERVAL);
        loop {
            ticker.tick().await;
            match session_store.purge_expired().await {
                Ok(0) => {}
                Ok(removed) => tracing::debug!(removed, "Purged expired sessions"),
                Err(e) => tracing::warn!(error = %e, "Failed to purge expired sessions"),
            }
        }
    });

    let state = AppState {
        accounts,
        identity,
        hydrator,
        credentials,
        sessions,
        csrf: Arc::new(InMemoryCsrfTokens::new(config.security.csrf_ttl())),
        rate_limiter: Arc::clone(&rate_limiter),
        client_ip: ClientIpResolver::new(&config.security.trusted_proxy_headers),
        cookies: CookieSettings::from_config(&config),
        activity_update_interval_secs: config.session.activity_update_interval_secs,
    };

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let http_application = create_router(state);
    axum::serve(
        http_listener,
        http_application.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    rate_limiter.stop();
    purge_task.abort();
    if let Err(e) = sweep_task.await {
        tracing::warn!(error = %e, "Rate limiter sweep task ended abnormally");
    }

    tracing::info!("Server exited successfully");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
