pub mod client_ip;
pub mod cookies;
pub mod handlers;
pub mod middleware;
pub mod rate_limit;
pub mod router;

pub use router::create_router;
pub use router::AppState;
