use axum::{
    extract::{ConnectInfo, FromRequest, FromRequestParts},
    http::{header::USER_AGENT, request::Parts},
};
use std::{
    convert::Infallible,
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use crate::{errors::ApiError, AppState};

/// `Json` whose rejections render as the standard error body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `Query` whose rejections render as the standard error body.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Where a request came from, for the audit trail
pub struct ClientInfo {
    pub ip_address: String,
    pub user_agent: String,
}

impl FromRequestParts<Arc<AppState>> for ClientInfo {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let forwarded_for = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok());

        let ip_address = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| {
                resolve_client_ip(addr.ip(), forwarded_for, &state.config.trusted_proxies).to_string()
            })
            .unwrap_or_else(|| "unknown".to_string());

        let user_agent = parts
            .headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();

        Ok(ClientInfo { ip_address, user_agent })
    }
}

/// The socket peer, unless it is a trusted proxy. Then `X-Forwarded-For` is
/// walked from the right and the first hop that is not itself trusted wins.
pub fn resolve_client_ip(peer: IpAddr, forwarded_for: Option<&str>, trusted: &[IpAddr]) -> IpAddr {
    if !trusted.contains(&peer) {
        return peer;
    }
    let Some(chain) = forwarded_for else {
        return peer;
    };

    let mut client = peer;
    for hop in chain.rsplit(',') {
        match hop.trim().parse::<IpAddr>() {
            Ok(ip) => {
                client = ip;
                if !trusted.contains(&ip) {
                    break;
                }
            }
            Err(_) => break,
        }
    }
    client
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_untrusted_peer_ignores_header() {
        let client = resolve_client_ip(ip("198.51.100.4"), Some("1.2.3.4"), &[]);
        assert_eq!(client, ip("198.51.100.4"));

        let client = resolve_client_ip(ip("198.51.100.4"), Some("1.2.3.4"), &[ip("10.0.0.1")]);
        assert_eq!(client, ip("198.51.100.4"));
    }

    #[test]
    fn test_trusted_proxy_chain() {
        let trusted = [ip("10.0.0.1"), ip("10.0.0.2")];

        // A spoofed left-most entry is not reached while an untrusted hop sits to its right.
        let client = resolve_client_ip(ip("10.0.0.1"), Some("1.2.3.4, 203.0.113.9, 10.0.0.2"), &trusted);
        assert_eq!(client, ip("203.0.113.9"));

        let client = resolve_client_ip(ip("10.0.0.1"), None, &trusted);
        assert_eq!(client, ip("10.0.0.1"));
    }

    #[test]
    fn test_garbage_hop_stops_the_walk() {
        let trusted = [ip("10.0.0.1")];
        let client = resolve_client_ip(ip("10.0.0.1"), Some("203.0.113.9, not-an-ip"), &trusted);
        assert_eq!(client, ip("10.0.0.1"));
    }
}
