// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Gateway Configuration Types
//
// Defines the configuration schema for a polytenant gateway process:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - Base connection per database engine
// - Connection cache bounds and per-tenant pool sizing
// - Static tenant → database table
// - HTTP server and observability settings

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use crate::domain::connection::{CacheConfig, PoolLimits};
use crate::domain::engine::EngineKind;
use crate::domain::identifier::Identifier;
use crate::domain::tenant::{TenantBinding, TenantDirectory};

pub const API_VERSION: &str = "polytenant/v1";
pub const KIND: &str = "GatewayConfig";
pub const CONFIG_PATH_ENV: &str = "POLYTENANT_CONFIG_PATH";

/// Top-level Kubernetes-style gateway configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfigManifest {
    /// API version (must be "polytenant/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "GatewayConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    pub spec: GatewayConfigSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    /// Human-readable gateway name
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
}

/// Gateway configuration specification (content under spec:)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfigSpec {
    #[serde(default)]
    pub server: ServerConfig,

    /// One base connection per engine
    #[serde(default)]
    pub engines: Vec<EngineConfig>,

    #[serde(default)]
    pub cache: CacheConfig,

    /// Sizing applied to every tenant pool
    #[serde(default)]
    pub pool: PoolLimits,

    /// Tenant id → engine and database
    #[serde(default)]
    pub tenants: BTreeMap<String, TenantBinding>,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_api_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_api_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub kind: EngineKind,

    /// Connection URL of the base (template) connection.
    /// Supports "env:VAR_NAME" to read it from the environment.
    pub url: String,

    /// Pool size of the base connection itself
    #[serde(default = "default_base_max_connections")]
    pub max_connections: u32,
}

impl EngineConfig {
    /// Resolve `env:` indirection.
    pub fn resolve_url(&self) -> anyhow::Result<String> {
        match self.url.strip_prefix("env:") {
            Some(var) => std::env::var(var).map_err(|_| {
                anyhow::anyhow!(
                    "Environment variable '{}' referenced by {} engine url is not set",
                    var,
                    self.kind
                )
            }),
            None => Ok(self.url.clone()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Expose Prometheus metrics on `metrics_port`
    #[serde(default)]
    pub metrics_enabled: bool,

    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            metrics_enabled: false,
            metrics_port: default_metrics_port(),
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
    8080
}

fn default_base_max_connections() -> u32 {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_metrics_port() -> u16 {
    9090
}

impl Default for GatewayConfigManifest {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: "polytenant".to_string(),
                labels: None,
            },
            spec: GatewayConfigSpec::default(),
        }
    }
}

impl GatewayConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. POLYTENANT_CONFIG_PATH environment variable
    /// 2. ./polytenant-config.yaml (working directory)
    /// 3. ~/.polytenant/config.yaml (user home)
    /// 4. /etc/polytenant/config.yaml (system, Unix)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./polytenant-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".polytenant").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        #[cfg(unix)]
        {
            let system_config = PathBuf::from("/etc/polytenant/config.yaml");
            if system_config.exists() {
                return Some(system_config);
            }
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit CLI path fails if missing/invalid
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::warn!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    /// This allows container deployments to override config via env vars
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Same as [`Self::apply_env_overrides`] with an injectable lookup.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("POLYTENANT_DATABASE_URL") {
            tracing::info!("Environment override: POLYTENANT_DATABASE_URL");
            match self
                .spec
                .engines
                .iter_mut()
                .find(|engine| engine.kind == EngineKind::Postgres)
            {
                Some(engine) => engine.url = url,
                None => self.spec.engines.push(EngineConfig {
                    kind: EngineKind::Postgres,
                    url,
                    max_connections: default_base_max_connections(),
                }),
            }
        }

        if let Some(val) = lookup("POLYTENANT_MAX_ENTRIES") {
            match val.trim().parse::<usize>() {
                Ok(max_entries) => {
                    tracing::info!("Environment override: POLYTENANT_MAX_ENTRIES={}", max_entries);
                    self.spec.cache.max_entries = max_entries;
                }
                Err(_) => {
                    tracing::warn!(
                        "Invalid value for POLYTENANT_MAX_ENTRIES: '{}'. Expected a positive integer. Ignoring.",
                        val
                    );
                }
            }
        }

        if let Some(addr) = lookup("POLYTENANT_BIND_ADDRESS") {
            tracing::info!("Environment override: POLYTENANT_BIND_ADDRESS={}", addr);
            self.spec.server.bind_address = addr;
        }

        if let Some(val) = lookup("POLYTENANT_PORT") {
            match val.trim().parse::<u16>() {
                Ok(port) => {
                    tracing::info!("Environment override: POLYTENANT_PORT={}", port);
                    self.spec.server.port = port;
                }
                Err(_) => {
                    tracing::warn!("Invalid value for POLYTENANT_PORT: '{}'. Ignoring.", val);
                }
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        let mut seen = HashSet::new();
        for engine in &self.spec.engines {
            if engine.url.trim().is_empty() {
                anyhow::bail!("Engine url cannot be empty for: {}", engine.kind);
            }
            if !seen.insert(engine.kind) {
                anyhow::bail!("Engine '{}' is configured more than once", engine.kind);
            }
            if engine.max_connections == 0 {
                anyhow::bail!("Engine '{}' max_connections must be at least 1", engine.kind);
            }
        }

        let cache = &self.spec.cache;
        if cache.max_entries == 0 {
            anyhow::bail!("cache.max_entries must be at least 1");
        }
        for (field, value) in [
            ("cache.idle_ttl", cache.idle_ttl),
            ("cache.reap_interval", cache.reap_interval),
            ("cache.close_timeout", cache.close_timeout),
            ("pool.acquire_timeout", self.spec.pool.acquire_timeout),
        ] {
            if value.is_zero() {
                anyhow::bail!("{} must be greater than zero", field);
            }
        }

        let pool = &self.spec.pool;
        if pool.max_connections == 0 {
            anyhow::bail!("pool.max_connections must be at least 1");
        }
        if pool.min_connections > pool.max_connections {
            anyhow::bail!(
                "pool.min_connections ({}) exceeds pool.max_connections ({})",
                pool.min_connections,
                pool.max_connections
            );
        }

        for (tenant, binding) in &self.spec.tenants {
            if tenant.is_empty() {
                anyhow::bail!("Tenant id cannot be empty");
            }
            if !seen.contains(&binding.engine) {
                anyhow::bail!(
                    "Tenant '{}' references engine '{}' which has no base connection configured",
                    tenant,
                    binding.engine
                );
            }
            Identifier::parse("database", &binding.database)
                .map_err(|e| anyhow::anyhow!("Tenant '{}': {}", tenant, e))?;
        }

        Ok(())
    }

    pub fn tenant_directory(&self) -> TenantDirectory {
        TenantDirectory::new(self.spec.tenants.clone())
    }
}
