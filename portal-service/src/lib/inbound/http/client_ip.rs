use std::net::IpAddr;
use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::HeaderName;
use axum::http::Request;

/// Client address resolved once per request by the rate limit middleware.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientIp(pub String);

impl ClientIp {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Resolves the client address from trusted proxy headers, falling back to
/// the TCP peer.
#[derive(Debug, Clone, Default)]
pub struct ClientIpResolver {
    trusted_headers: Vec<HeaderName>,
}

impl ClientIpResolver {
    /// # Arguments
    /// * `trusted_headers` - Header names consulted in order; for list-valued
    ///   headers such as `X-Forwarded-For` the first entry is used
    pub fn new(trusted_headers: &[String]) -> Self {
        let trusted_headers = trusted_headers
            .iter()
            .filter_map(|name| match HeaderName::from_bytes(name.as_bytes()) {
                Ok(header) => Some(header),
                Err(e) => {
                    tracing::warn!(header = %name, error = %e, "Ignoring invalid trusted proxy header");
                    None
                }
            })
            .collect();

        Self { trusted_headers }
    }

    /// Best-effort client address; empty when nothing usable is available.
    pub fn resolve<B>(&self, req: &Request<B>) -> String {
        for header in &self.trusted_headers {
            let candidate = req
                .headers()
                .get(header)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.split(',').next())
                .map(str::trim)
                .and_then(|value| value.parse::<IpAddr>().ok());

            if let Some(ip) = candidate {
                return ip.to_string();
            }
        }

        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;

    use super::*;

    fn resolver() -> ClientIpResolver {
        ClientIpResolver::new(&["X-Real-IP".to_string(), "X-Forwarded-For".to_string()])
    }

    #[test]
    fn test_prefers_headers_in_order() {
        let req = Request::builder()
            .header("X-Forwarded-For", "10.0.0.1, 10.0.0.2")
            .header("X-Real-IP", "203.0.113.7")
            .body(Body::empty())
            .unwrap();

        assert_eq!(resolver().resolve(&req), "203.0.113.7");
    }

    #[test]
    fn test_uses_first_forwarded_entry() {
        let req = Request::builder()
            .header("X-Forwarded-For", " 198.51.100.4 , 10.0.0.2")
            .body(Body::empty())
            .unwrap();

        assert_eq!(resolver().resolve(&req), "198.51.100.4");
    }

    #[test]
    fn test_falls_back_to_peer_address() {
        let mut req = Request::builder()
            .header("X-Real-IP", "not an ip")
            .body(Body::empty())
            .unwrap();
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 1], 4242))));

        assert_eq!(resolver().resolve(&req), "192.0.2.1");
    }

    #[test]
    fn test_untrusted_headers_are_ignored() {
        let req = Request::builder()
            .header("X-Real-IP", "203.0.113.7")
            .body(Body::empty())
            .unwrap();

        assert_eq!(ClientIpResolver::new(&[]).resolve(&req), "");
    }
}
