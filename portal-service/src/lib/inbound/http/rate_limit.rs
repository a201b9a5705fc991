use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::time::Duration;
use std::time::Instant;

use axum::extract::Request;
use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::RateLimitConfig;
use crate::inbound::http::client_ip::ClientIp;
use crate::inbound::http::router::AppState;

#[derive(Debug, Clone, Copy)]
struct ClientBucket {
    tokens: f64,
    last_refill: Instant,
}

/// Per-client-IP token bucket limiter.
///
/// State is process local. A background task removes buckets that have been
/// idle for longer than the sweep interval.
pub struct RateLimiter {
    buckets: Mutex<HashMap<String, ClientBucket>>,
    rate_per_second: f64,
    capacity: f64,
    sweep_interval: Duration,
    shutdown: Mutex<Option<oneshot::Sender<()>>>,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            rate_per_second: config.rate_per_second.max(0.0),
            capacity: config.capacity.max(0.0),
            sweep_interval: config.sweep_interval(),
            shutdown: Mutex::new(None),
        }
    }

    /// Take one token from `ip`'s bucket if available.
    ///
    /// An empty key is a valid (shared) bucket.
    pub fn allow(&self, ip: &str) -> bool {
        self.allow_at(ip, Instant::now())
    }

    pub(crate) fn allow_at(&self, ip: &str, now: Instant) -> bool {
        let mut buckets = self.lock_buckets();

        let bucket = buckets.entry(ip.to_string()).or_insert(ClientBucket {
            tokens: self.capacity,
            last_refill: now,
        });

        let elapsed = now.saturating_duration_since(bucket.last_refill);
        bucket.tokens =
            (bucket.tokens + elapsed.as_secs_f64() * self.rate_per_second).min(self.capacity);
        bucket.last_refill = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Remove buckets idle for longer than the sweep interval.
    ///
    /// # Returns
    /// Number of buckets removed
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    pub(crate) fn sweep_at(&self, now: Instant) -> usize {
        let mut buckets = self.lock_buckets();
        let before = buckets.len();

        buckets.retain(|_, bucket| {
            now.saturating_duration_since(bucket.last_refill) <= self.sweep_interval
        });

        before - buckets.len()
    }

    pub fn bucket_count(&self) -> usize {
        self.lock_buckets().len()
    }

    /// Spawn the periodic sweep task.
    ///
    /// The task holds only a weak reference and exits on `stop` or once the
    /// limiter is dropped.
    pub fn start(self: &Arc<Self>) -> JoinHandle<()> {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
        *self
            .shutdown
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(shutdown_tx);

        let limiter = Arc::downgrade(self);
        let period = self.sweep_interval.max(Duration::from_secs(1));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let Some(limiter) = limiter.upgrade() else {
                            break;
                        };
                        let removed = limiter.sweep();
                        if removed > 0 {
                            tracing::debug!(
                                removed,
                                remaining = limiter.bucket_count(),
                                "Swept idle rate limit buckets"
                            );
                        }
                    }
                    _ = &mut shutdown_rx => break,
                }
            }

            tracing::debug!("Rate limiter sweep stopped");
        })
    }

    /// Signal the sweep task to exit.
    ///
    /// # Returns
    /// True for the call that actually stopped it, false afterwards
    pub fn stop(&self) -> bool {
        let sender = self
            .shutdown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        match sender {
            Some(sender) => {
                let _ = sender.send(());
                true
            }
            None => false,
        }
    }

    fn lock_buckets(&self) -> MutexGuard<'_, HashMap<String, ClientBucket>> {
        self.buckets.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Middleware rejecting clients that ran out of tokens with an empty 429.
///
/// Also publishes the resolved `ClientIp` for downstream handlers.
pub async fn enforce_rate_limit(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let client_ip = state.client_ip.resolve(&req);

    if !state.rate_limiter.allow(&client_ip) {
        tracing::debug!(client_ip = %client_ip, "Rate limit exceeded");
        return StatusCode::TOO_MANY_REQUESTS.into_response();
    }

    req.extensions_mut().insert(ClientIp(client_ip));
    next.run(req).await
}
