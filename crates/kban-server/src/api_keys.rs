//! API key allow-list gating issuance and administrative endpoints.

use anyhow::{bail, Result};
use std::collections::HashMap;
use std::fmt;

/// Key accepted when no allow-list is configured
pub const DEVELOPMENT_API_KEY: &str = "testkey1234567890testkey1234567890";

/// Owner and plan attached to an API key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKeyMeta {
    pub owner: String,
    pub plan: String,
}

/// In-memory API key allow-list
#[derive(Clone, Default)]
pub struct ApiKeyRegistry {
    keys: HashMap<String, ApiKeyMeta>,
}

impl ApiKeyRegistry {
    /// Registry holding only [`DEVELOPMENT_API_KEY`]
    pub fn development() -> Self {
        let mut registry = Self::default();
        registry.insert(DEVELOPMENT_API_KEY, "admin", "unlimited");
        registry
    }

    /// Parse comma-separated `key:owner:plan` entries
    pub fn parse(entries: &str) -> Result<Self> {
        let mut registry = Self::default();

        for entry in entries.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let mut fields = entry.splitn(3, ':').map(str::trim);
            match (fields.next(), fields.next(), fields.next()) {
                (Some(key), Some(owner), Some(plan))
                    if !key.is_empty() && !owner.is_empty() && !plan.is_empty() =>
                {
                    registry.insert(key, owner, plan);
                }
                _ => bail!("API key entries must look like key:owner:plan"),
            }
        }

        if registry.keys.is_empty() {
            bail!("KBAN_API_KEYS contains no keys");
        }
        Ok(registry)
    }

    pub fn insert(&mut self, key: &str, owner: &str, plan: &str) {
        self.keys.insert(
            key.to_string(),
            ApiKeyMeta {
                owner: owner.to_string(),
                plan: plan.to_string(),
            },
        );
    }

    /// Whether `key` may call protected endpoints
    pub fn is_valid(&self, key: &str) -> bool {
        self.keys.contains_key(key)
    }

    pub fn meta(&self, key: &str) -> Option<&ApiKeyMeta> {
        self.keys.get(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl fmt::Debug for ApiKeyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKeyRegistry")
            .field("keys", &self.keys.len())
            .finish()
    }
}
