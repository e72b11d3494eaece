use anyhow::{Context, Result};
use kban_crypto::SecretKey;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use url::Url;

use crate::api_keys::ApiKeyRegistry;

const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8080";
const DEFAULT_PROFILE_ORGANIZATION: &str = "Reapware";
const DEFAULT_PROFILE_IDENTIFIER: &str = "com.reapware.kban";
const DEFAULT_QR_BASE_URL: &str = "https://api.qrserver.com/v1/create-qr-code/";

/// Mobile configuration profile branding
#[derive(Debug, Clone)]
pub struct ProfileSettings {
    pub organization: String,
    /// Reverse-DNS identifier; payload identifiers are derived from it
    pub identifier: String,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind the server to
    pub bind_address: SocketAddr,

    /// Key sealing every KBAN handed out by this process
    pub encryption_key: Arc<SecretKey>,

    /// Whether `encryption_key` was generated at startup
    pub ephemeral_key: bool,

    /// API keys allowed to call protected endpoints
    pub api_keys: ApiKeyRegistry,

    /// Proxies whose X-Forwarded-For header is trusted
    pub trusted_proxies: Vec<IpAddr>,

    pub profile: ProfileSettings,

    /// QR code renderer the issuance response links to
    pub qr_base_url: Url,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_address = lookup("BIND_ADDRESS")
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string())
            .parse()
            .context("BIND_ADDRESS must be a socket address")?;

        let (encryption_key, ephemeral_key) = match lookup("KBAN_ENCRYPTION_KEY") {
            Some(hex_key) => (
                SecretKey::from_hex(&hex_key)
                    .context("KBAN_ENCRYPTION_KEY must be 32 bytes (64 hex chars)")?,
                false,
            ),
            None => {
                tracing::warn!(
                    "KBAN_ENCRYPTION_KEY not set; using a random key. \
                     KBANs issued by this process become undecryptable after restart"
                );
                (SecretKey::generate()?, true)
            }
        };

        let api_keys = match lookup("KBAN_API_KEYS") {
            Some(entries) => ApiKeyRegistry::parse(&entries)?,
            None => {
                tracing::warn!("KBAN_API_KEYS not set; only the development key is accepted");
                ApiKeyRegistry::development()
            }
        };

        let trusted_proxies = match lookup("TRUSTED_PROXIES") {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| {
                    s.parse()
                        .with_context(|| format!("Invalid TRUSTED_PROXIES entry: {}", s))
                })
                .collect::<Result<Vec<IpAddr>>>()?,
            None => Vec::new(),
        };

        let profile = ProfileSettings {
            organization: lookup("PROFILE_ORGANIZATION")
                .unwrap_or_else(|| DEFAULT_PROFILE_ORGANIZATION.to_string()),
            identifier: lookup("PROFILE_IDENTIFIER")
                .unwrap_or_else(|| DEFAULT_PROFILE_IDENTIFIER.to_string()),
        };

        let qr_base_url = Url::parse(
            &lookup("QR_BASE_URL").unwrap_or_else(|| DEFAULT_QR_BASE_URL.to_string()),
        )
        .context("QR_BASE_URL must be an absolute URL")?;

        Ok(Config {
            bind_address,
            encryption_key: Arc::new(encryption_key),
            ephemeral_key,
            api_keys,
            trusted_proxies,
            profile,
            qr_base_url,
        })
    }
}
