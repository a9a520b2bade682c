//! Secret resolution
//!
//! Credentials are resolved by name once at process start. The default store
//! reads `ADREV_SECRET_<NAME>` environment variables, which is how the
//! deployment injects key-vault references.

use adrev_common::{AdrevError, Result};
use async_trait::async_trait;
use std::collections::HashMap;

pub const ENV_SECRET_PREFIX: &str = "ADREV_SECRET_";

#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn get(&self, name: &str) -> Result<String>;
}

/// Secrets from the environment
#[derive(Debug, Clone, Default)]
pub struct EnvSecretStore;

impl EnvSecretStore {
    /// `db-connection` -> `ADREV_SECRET_DB_CONNECTION`
    pub fn variable_name(name: &str) -> String {
        format!(
            "{}{}",
            ENV_SECRET_PREFIX,
            name.trim().to_ascii_uppercase().replace(['-', '.'], "_")
        )
    }
}

#[async_trait]
impl SecretStore for EnvSecretStore {
    async fn get(&self, name: &str) -> Result<String> {
        let variable = Self::variable_name(name);
        std::env::var(&variable)
            .ok()
            .filter(|value| !value.is_empty())
            .ok_or_else(|| AdrevError::SecretNotFound(format!("{} ({})", name, variable)))
    }
}

/// Fixed secrets, for tests and local runs
#[derive(Debug, Clone, Default)]
pub struct StaticSecretStore {
    secrets: HashMap<String, String>,
}

impl StaticSecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.secrets.insert(name.into(), value.into());
        self
    }
}

#[async_trait]
impl SecretStore for StaticSecretStore {
    async fn get(&self, name: &str) -> Result<String> {
        self.secrets
            .get(name)
            .cloned()
            .ok_or_else(|| AdrevError::SecretNotFound(name.to_string()))
    }
}
