// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Idle Reaper - Background task evicting unused tenant connection pools
//!
//! Wakes once per `reap_interval` (first sweep one full period after start)
//! and runs [`ConnectionCache::evict_idle`]. Holds only a `Weak` reference,
//! so a dropped cache ends the loop at the next tick.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Periodic idle eviction for the connection cache

use std::sync::Weak;
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::application::connection_cache::ConnectionCache;
use crate::domain::connection::ConnectionProvider;

pub struct IdleReaper<P: ConnectionProvider> {
    cache: Weak<ConnectionCache<P>>,
    interval: Duration,
    shutdown_token: CancellationToken,
}

impl<P: ConnectionProvider> IdleReaper<P> {
    pub fn new(cache: Weak<ConnectionCache<P>>, interval: Duration, shutdown_token: CancellationToken) -> Self {
        Self {
            cache,
            interval,
            shutdown_token,
        }
    }

    /// Get a handle to trigger shutdown
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn run(&self) {
        info!(
            interval_secs = self.interval.as_secs(),
            "Starting idle reaper background task"
        );

        let mut tick = interval_at(Instant::now() + self.interval, self.interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    if !self.sweep().await {
                        debug!("Connection cache dropped, stopping idle reaper");
                        break;
                    }
                }
                _ = self.shutdown_token.cancelled() => {
                    info!("Shutdown signal received, stopping idle reaper");
                    break;
                }
            }
        }

        info!("Idle reaper background task stopped");
    }

    /// One sweep. Returns `false` once the cache is gone.
    async fn sweep(&self) -> bool {
        let Some(cache) = self.cache.upgrade() else {
            return false;
        };

        debug!("Running idle reaper cycle");
        let report = cache.evict_idle().await;

        if report.failures.is_empty() {
            info!(
                scanned = report.scanned,
                evicted = report.evicted,
                "Idle reaper cycle completed"
            );
        } else {
            warn!(
                scanned = report.scanned,
                evicted = report.evicted,
                failures = report.failures.len(),
                "Idle reaper cycle completed with close failures"
            );
        }
        true
    }
}
