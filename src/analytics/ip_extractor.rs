//! Client IP extraction from HTTP headers.
//!
//! Forwarding headers are attacker-controllable: a client can set
//! X-Forwarded-For to anything it likes. They are only consulted when
//! the deployment declares that requests arrive through a trusted proxy
//! layer (`TRUST_FORWARDED_HEADERS`); otherwise the socket remote
//! address is used unconditionally.

use axum::http::HeaderMap;
use std::net::IpAddr;

/// Extract the client IP address for a request.
///
/// With `trust_forwarded` set, the first parseable entry of
/// X-Forwarded-For (the original client as recorded by the proxy chain)
/// wins; without it, or when the header is absent or malformed, the
/// socket address is returned.
pub fn extract_client_ip(headers: &HeaderMap, socket_addr: IpAddr, trust_forwarded: bool) -> IpAddr {
    if !trust_forwarded {
        return socket_addr;
    }

    extract_from_x_forwarded_for(headers).unwrap_or(socket_addr)
}

fn extract_from_x_forwarded_for(headers: &HeaderMap) -> Option<IpAddr> {
    let xff = headers.get("x-forwarded-for")?.to_str().ok()?;

    xff.split(',')
        .filter_map(|s| s.trim().parse::<IpAddr>().ok())
        .next()
}
