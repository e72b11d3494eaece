use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use kban_identity_core::NetworkContext;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use crate::error::ApiError;
use crate::state::AppState;

/// Extract client IP address with proxy validation
///
/// # Security
///
/// X-Forwarded-For header is only trusted if:
/// 1. A direct connection IP is provided
/// 2. The direct connection IP is in the trusted_proxies list
/// 3. The X-Forwarded-For header contains a valid IP address
///
/// Otherwise, uses the direct connection IP or "unknown" as fallback.
pub fn extract_client_ip(
    headers: &HeaderMap,
    direct_ip: Option<IpAddr>,
    trusted_proxies: &[IpAddr],
) -> String {
    if let Some(direct) = direct_ip {
        if trusted_proxies.contains(&direct) {
            // Rightmost entry is the hop our proxy saw
            if let Some(ip) = header_ip(headers, "X-Forwarded-For", |v| v.split(',').next_back()) {
                return ip;
            }
            if let Some(ip) = header_ip(headers, "X-Real-IP", Some) {
                return ip;
            }
        }

        return direct.to_string();
    }

    tracing::debug!("No direct connection IP available for request");
    "unknown".to_string()
}

fn header_ip<'a, F>(headers: &'a HeaderMap, name: &str, pick: F) -> Option<String>
where
    F: FnOnce(&'a str) -> Option<&'a str>,
{
    let value = headers.get(name)?.to_str().ok()?;
    let candidate = pick(value)?.trim();
    candidate.parse::<IpAddr>().ok()?;
    Some(candidate.to_string())
}

fn direct_ip_from_parts(parts: &Parts) -> Option<IpAddr> {
    parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip())
}

/// Network attributes of the calling device
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Client IP address (connection or trusted X-Forwarded-For)
    pub ip_address: String,

    /// User-Agent string from the request headers
    pub user_agent: String,
}

impl RequestContext {
    /// Create a new request context from request parts
    pub fn from_parts(parts: &Parts, trusted_proxies: &[IpAddr]) -> Self {
        let direct_ip = direct_ip_from_parts(parts);
        let ip_address = extract_client_ip(&parts.headers, direct_ip, trusted_proxies);

        let user_agent = parts
            .headers
            .get("User-Agent")
            .and_then(|h| h.to_str().ok())
            .unwrap_or("unknown")
            .to_string();

        Self {
            ip_address,
            user_agent,
        }
    }
}

impl From<RequestContext> for NetworkContext {
    fn from(ctx: RequestContext) -> Self {
        NetworkContext {
            ip: Some(ctx.ip_address),
            user_agent: Some(ctx.user_agent),
        }
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for RequestContext {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        Ok(RequestContext::from_parts(
            parts,
            &state.config.trusted_proxies,
        ))
    }
}
