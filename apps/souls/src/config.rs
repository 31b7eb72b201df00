//! # Configuration
//!
//! Layered settings for the Souls binary.
//!
//! Precedence (lowest to highest):
//! 1. Built-in defaults
//! 2. TOML file (`--config`, or `souls.toml` if present)
//! 3. Environment (`SOULS_HOST`, `SOULS_PORT`, `SOULS_BACKEND`, `SOULS_DB`,
//!    `SOULS_CORS_ORIGINS`, `SOULS_SESSION_TTL`)
//! 4. CLI flags (applied by the caller)

use serde::{Deserialize, Serialize};
use souls_core::{CredentialManager, SoulError};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// File looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "souls.toml";

// =============================================================================
// STORAGE BACKEND
// =============================================================================

/// Which [`souls_core::SoulStore`] implementation to open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Redb,
    Memory,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Redb => f.write_str("redb"),
            Self::Memory => f.write_str("memory"),
        }
    }
}

impl FromStr for Backend {
    type Err = SoulError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redb" => Ok(Self::Redb),
            "memory" => Ok(Self::Memory),
            other => Err(SoulError::InvalidInput(format!(
                "unknown backend '{}' (expected redb or memory)",
                other
            ))),
        }
    }
}

// =============================================================================
// SECTIONS
// =============================================================================

/// `[server]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Comma-separated allowed origins, or `*`. Localhost only when unset.
    pub cors_origins: Option<String>,
    /// Seconds a session token stays valid after login.
    pub session_ttl_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6060,
            cors_origins: None,
            session_ttl_secs: crate::api::DEFAULT_SESSION_TTL.as_secs(),
        }
    }
}

impl ServerConfig {
    #[must_use]
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}

/// `[storage]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: Backend,
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Redb,
            path: PathBuf::from("souls.db"),
        }
    }
}

/// `[credentials]` section: Argon2id cost parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            memory_kib: 19_456,
            iterations: 2,
            parallelism: 1,
        }
    }
}

impl CredentialsConfig {
    /// Build the credential manager, rejecting invalid cost combinations.
    pub fn manager(&self) -> Result<CredentialManager, SoulError> {
        CredentialManager::with_costs(self.memory_kib, self.iterations, self.parallelism)
    }
}

// =============================================================================
// ROOT CONFIG
// =============================================================================

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoulsConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub credentials: CredentialsConfig,
}

impl SoulsConfig {
    /// Parse a TOML document.
    pub fn from_toml(text: &str) -> Result<Self, SoulError> {
        toml::from_str(text).map_err(|e| SoulError::InvalidInput(format!("config: {}", e)))
    }

    /// Load configuration from the process environment and an optional file.
    ///
    /// An explicit path must exist. Without one, `souls.toml` is read if it
    /// is present in the working directory.
    pub fn load(path: Option<&Path>) -> Result<Self, SoulError> {
        let mut config = match path {
            Some(path) => Self::read_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::read_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self, SoulError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            SoulError::InvalidInput(format!("cannot read config '{}': {}", path.display(), e))
        })?;
        tracing::debug!(path = %path.display(), "loaded config file");
        Self::from_toml(&text)
    }

    /// Apply `SOULS_*` overrides from the given lookup.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), SoulError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(host) = var("SOULS_HOST") {
            self.server.host = host;
        }
        if let Some(port) = var("SOULS_PORT") {
            self.server.port = port
                .parse()
                .map_err(|e| SoulError::InvalidInput(format!("SOULS_PORT '{}': {}", port, e)))?;
        }
        if let Some(origins) = var("SOULS_CORS_ORIGINS") {
            self.server.cors_origins = Some(origins);
        }
        if let Some(ttl) = var("SOULS_SESSION_TTL") {
            self.server.session_ttl_secs = ttl.parse().map_err(|e| {
                SoulError::InvalidInput(format!("SOULS_SESSION_TTL '{}': {}", ttl, e))
            })?;
        }
        if let Some(backend) = var("SOULS_BACKEND") {
            self.storage.backend = backend.parse()?;
        }
        if let Some(path) = var("SOULS_DB") {
            self.storage.path = PathBuf::from(path);
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = SoulsConfig::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 6060);
        assert_eq!(config.storage.backend, Backend::Redb);
        assert_eq!(config.storage.path, PathBuf::from("souls.db"));
        assert_eq!(config.credentials.memory_kib, 19_456);
        assert!(config.credentials.manager().is_ok());
        assert_eq!(config.server.session_ttl(), Duration::from_secs(60_000));
    }

    #[test]
    fn session_ttl_from_file_and_env() {
        let mut config = SoulsConfig::from_toml("[server]
session_ttl_secs = 30
").unwrap();
        assert_eq!(config.server.session_ttl(), Duration::from_secs(30));

        config.apply_env(env(&[("SOULS_SESSION_TTL", "5")])).unwrap();
        assert_eq!(config.server.session_ttl(), Duration::from_secs(5));

        assert!(config.apply_env(env(&[("SOULS_SESSION_TTL", "-1")])).is_err());
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config = SoulsConfig::from_toml(
            r#"
            [server]
            port = 7070

            [storage]
            backend = "memory"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 7070);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.storage.backend, Backend::Memory);
        assert_eq!(config.credentials, CredentialsConfig::default());
    }

    #[test]
    fn malformed_toml_is_rejected() {
        assert!(SoulsConfig::from_toml("[server]\nport = \"not a number\"").is_err());
        assert!(SoulsConfig::from_toml("[storage]\nbackend = \"mongo\"").is_err());
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = SoulsConfig::default();
        config
            .apply_env(env(&[
                ("SOULS_HOST", "0.0.0.0"),
                ("SOULS_PORT", "9000"),
                ("SOULS_BACKEND", "Memory"),
                ("SOULS_DB", "/tmp/other.db"),
                ("SOULS_CORS_ORIGINS", "*"),
            ]))
            .unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.storage.backend, Backend::Memory);
        assert_eq!(config.storage.path, PathBuf::from("/tmp/other.db"));
        assert_eq!(config.server.cors_origins.as_deref(), Some("*"));
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let mut config = SoulsConfig::default();
        config.apply_env(env(&[("SOULS_HOST", "")])).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn bad_env_values_are_rejected() {
        let mut config = SoulsConfig::default();
        assert!(config.apply_env(env(&[("SOULS_PORT", "high")])).is_err());
        assert!(config.apply_env(env(&[("SOULS_BACKEND", "file")])).is_err());
    }

    #[test]
    fn invalid_argon2_costs_fail_at_startup() {
        let credentials = CredentialsConfig {
            memory_kib: 1,
            iterations: 0,
            parallelism: 1,
        };
        assert!(credentials.manager().is_err());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = SoulsConfig::load(Some(&dir.path().join("absent.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn explicit_file_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("souls.toml");
        std::fs::write(&path, "[credentials]\nmemory_kib = 64\niterations = 1\n").unwrap();

        let config = SoulsConfig::load(Some(&path)).unwrap();
        assert_eq!(config.credentials.memory_kib, 64);
        assert_eq!(config.credentials.iterations, 1);
    }
}
