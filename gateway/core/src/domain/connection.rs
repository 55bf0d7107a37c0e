// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Connection Contracts
//!
//! Seams between the connection cache and the database drivers.
//!
//! - [`PooledHandle`] is one live, already-initialized pool bound to a single
//!   physical database. The cache clones it out to callers and closes it on
//!   eviction or shutdown.
//! - [`ConnectionProvider`] owns the per-engine base (template) connections
//!   and provisions new handles for named databases from them.
//!
//! The PostgreSQL implementation lives in
//! `crate::infrastructure::postgres`; tests supply their own.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::engine::EngineKind;

/// Driver-level failures surfaced through the provider and handle traits.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionError {
    #[error("connect failed: {0}")]
    Connect(String),

    #[error("initialization timed out after {0:?}")]
    Timeout(Duration),

    #[error("close failed: {0}")]
    Close(String),
}

/// A live connection pool bound to one physical database.
#[async_trait]
pub trait PooledHandle: Clone + Send + Sync + 'static {
    /// `false` once the underlying pool has been closed.
    fn is_alive(&self) -> bool;

    /// Release every physical connection held by this handle.
    async fn close(&self) -> Result<(), ConnectionError>;
}

/// Source of base connections and freshly provisioned tenant pools.
#[async_trait]
pub trait ConnectionProvider: Send + Sync + 'static {
    type Handle: PooledHandle;

    /// Engines that have a base connection configured.
    fn engines(&self) -> Vec<EngineKind>;

    /// The engine's base connection, if the engine is configured.
    fn base(&self, engine: EngineKind) -> Option<Self::Handle>;

    /// Clone the engine's base configuration onto `database`, apply `limits`
    /// and initialize the pool. Must not return before the pool is usable.
    async fn connect(
        &self,
        engine: EngineKind,
        database: &str,
        limits: &PoolLimits,
    ) -> Result<Self::Handle, ConnectionError>;
}

/// Pool sizing applied to every tenant pool the cache provisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolLimits {
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Idle timeout for individual connections inside the driver's pool.
    #[serde(default = "default_idle_timeout", with = "humantime_serde")]
    pub idle_timeout: Duration,

    /// Bounds both checkout from the pool and the cache's initialization wait.
    #[serde(default = "default_acquire_timeout", with = "humantime_serde")]
    pub acquire_timeout: Duration,
}

impl Default for PoolLimits {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            idle_timeout: default_idle_timeout(),
            acquire_timeout: default_acquire_timeout(),
        }
    }
}

/// Bounds and timers of the connection cache itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of tenant (non-base) entries held at once.
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Entries unused for longer than this are evicted by the reaper.
    #[serde(default = "default_idle_ttl", with = "humantime_serde")]
    pub idle_ttl: Duration,

    #[serde(default = "default_reap_interval", with = "humantime_serde")]
    pub reap_interval: Duration,

    #[serde(default = "default_true")]
    pub reaper_enabled: bool,

    /// Upper bound on closing one evicted pool before it counts as failed.
    #[serde(default = "default_close_timeout", with = "humantime_serde")]
    pub close_timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            idle_ttl: default_idle_ttl(),
            reap_interval: default_reap_interval(),
            reaper_enabled: true,
            close_timeout: default_close_timeout(),
        }
    }
}

fn default_max_entries() -> usize {
    20
}

fn default_idle_ttl() -> Duration {
    Duration::from_secs(10 * 60)
}

fn default_reap_interval() -> Duration {
    Duration::from_secs(60 * 60)
}

fn default_close_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_true() -> bool {
    true
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_idle_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_acquire_timeout() -> Duration {
    Duration::from_secs(30)
}
