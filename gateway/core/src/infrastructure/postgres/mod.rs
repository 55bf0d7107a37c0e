// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # PostgreSQL Connection Provider
//!
//! Holds the base `PgConnectOptions` and base `PgPool` for the configured
//! server. Tenant pools are provisioned by cloning the base options onto a
//! different database name and applying the cache's [`PoolLimits`].
//!
//! `PgPool` itself is the [`PooledHandle`]: it is cheaply cloneable and
//! closing any clone closes the shared pool.

pub mod catalog;
pub mod sql;

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

use crate::domain::connection::{ConnectionError, ConnectionProvider, PoolLimits, PooledHandle};
use crate::domain::engine::EngineKind;
use crate::domain::gateway_config::EngineConfig;

#[async_trait]
impl PooledHandle for PgPool {
    fn is_alive(&self) -> bool {
        !self.is_closed()
    }

    async fn close(&self) -> Result<(), ConnectionError> {
        PgPool::close(self).await;
        Ok(())
    }
}

pub struct PostgresProvider {
    base_options: PgConnectOptions,
    base_pool: PgPool,
    /// Skip the initial round-trip when provisioning tenant pools.
    lazy: bool,
}

impl PostgresProvider {
    /// Connect the base pool for the `postgres` entry of `engines`.
    ///
    /// Entries for engines without a driver are logged and skipped.
    pub async fn from_config(engines: &[EngineConfig], acquire_timeout: Duration) -> anyhow::Result<Self> {
        let mut postgres = None;
        for engine in engines {
            if engine.kind == EngineKind::Postgres {
                postgres = Some(engine);
            } else {
                warn!(engine = %engine.kind, "No driver available for engine, skipping");
            }
        }

        let engine = postgres
            .ok_or_else(|| anyhow::anyhow!("no postgres engine configured under spec.engines"))?;
        let url = engine.resolve_url()?;
        let base_options = PgConnectOptions::from_str(&url)?;

        let base_pool = PgPoolOptions::new()
            .max_connections(engine.max_connections)
            .acquire_timeout(acquire_timeout)
            .connect_with(base_options.clone())
            .await?;

        info!(
            host = base_options.get_host(),
            port = base_options.get_port(),
            max_connections = engine.max_connections,
            "Connected base PostgreSQL pool"
        );

        Ok(Self {
            base_options,
            base_pool,
            lazy: false,
        })
    }

    /// Provider whose pools defer connecting until first use.
    pub fn lazy(url: &str) -> Result<Self, sqlx::Error> {
        let base_options = PgConnectOptions::from_str(url)?;
        let base_pool = PgPoolOptions::new()
            .max_connections(1)
            .connect_lazy_with(base_options.clone());

        Ok(Self {
            base_options,
            base_pool,
            lazy: true,
        })
    }

    pub fn base_pool(&self) -> &PgPool {
        &self.base_pool
    }
}

#[async_trait]
impl ConnectionProvider for PostgresProvider {
    type Handle = PgPool;

    fn engines(&self) -> Vec<EngineKind> {
        vec![EngineKind::Postgres]
    }

    fn base(&self, engine: EngineKind) -> Option<PgPool> {
        (engine == EngineKind::Postgres).then(|| self.base_pool.clone())
    }

    async fn connect(
        &self,
        engine: EngineKind,
        database: &str,
        limits: &PoolLimits,
    ) -> Result<PgPool, ConnectionError> {
        if engine != EngineKind::Postgres {
            return Err(ConnectionError::Connect(format!("no driver for engine {}", engine)));
        }

        let options = self.base_options.clone().database(database);
        let pool_options = PgPoolOptions::new()
            .max_connections(limits.max_connections)
            .min_connections(limits.min_connections)
            .idle_timeout(limits.idle_timeout)
            .acquire_timeout(limits.acquire_timeout);

        if self.lazy {
            return Ok(pool_options.connect_lazy_with(options));
        }

        pool_options
            .connect_with(options)
            .await
            .map_err(|e| ConnectionError::Connect(e.to_string()))
    }
}
