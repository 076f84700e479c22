//! Client address extraction.

use std::collections::HashSet;
use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::async_trait;
use axum::extract::{ConnectInfo, FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum::http::HeaderMap;

/// Used when no address can be determined, so such clients share one bucket.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Proxies whose forwarding headers are believed.
///
/// Headers from any other peer are ignored, since a client can put whatever
/// it likes in them.
#[derive(Debug, Clone, Default)]
pub struct TrustedProxies(Arc<HashSet<IpAddr>>);

impl TrustedProxies {
    pub fn new(proxies: impl IntoIterator<Item = IpAddr>) -> Self {
        Self(Arc::new(proxies.into_iter().collect()))
    }

    pub fn contains(&self, ip: &IpAddr) -> bool {
        self.0.contains(ip)
    }
}

/// The address a request came from, as used in rate limit keys.
///
/// Priority:
/// 1. The socket peer, unless it is a trusted proxy
/// 2. X-Forwarded-For, right-most entry that is not a trusted proxy
/// 3. X-Real-IP (for Nginx), when set by a trusted proxy
/// 4. The trusted proxy itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

impl ClientIp {
    /// Resolve the client address from headers and the peer address.
    pub fn resolve(
        headers: &HeaderMap,
        peer: Option<SocketAddr>,
        trusted: &TrustedProxies,
    ) -> Self {
        let ip = peer.map(|addr| {
            let peer_ip = addr.ip();
            if !trusted.contains(&peer_ip) {
                return peer_ip;
            }
            forwarded_client(headers, trusted)
                .or_else(|| real_ip(headers))
                .unwrap_or(peer_ip)
        });

        match ip {
            Some(ip) => ClientIp(ip.to_string()),
            None => ClientIp(UNKNOWN_CLIENT.to_string()),
        }
    }
}

/// Walk X-Forwarded-For from the right, skipping our own proxies. Proxies
/// append, so everything left of the first untrusted hop is client-supplied.
fn forwarded_client(headers: &HeaderMap, trusted: &TrustedProxies) -> Option<IpAddr> {
    let mut hops: Vec<&str> = Vec::new();
    for value in headers.get_all("x-forwarded-for") {
        hops.extend(value.to_str().ok()?.split(','));
    }

    for hop in hops.iter().rev() {
        let ip = hop.trim().parse::<IpAddr>().ok()?;
        if !trusted.contains(&ip) {
            return Some(ip);
        }
    }
    None
}

fn real_ip(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<IpAddr>().ok())
}

#[async_trait]
impl<S> FromRequestParts<S> for ClientIp
where
    TrustedProxies: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        let trusted = TrustedProxies::from_ref(state);
        Ok(ClientIp::resolve(&parts.headers, peer, &trusted))
    }
}

impl std::fmt::Display for ClientIp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
