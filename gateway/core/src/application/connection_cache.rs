// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Connection Pool Cache
//!
//! Process-wide registry of live connection pools keyed by
//! `(engine, database)`. Every CRUD and schema operation obtains its pool
//! through [`ConnectionCache::acquire`]; nothing else manages pool lifetime.
//!
//! ## Lifecycle of an entry
//!
//! ```text
//! miss ──► capacity check (LRU victims removed, closed)
//!      ──► Pending slot claimed under the lock
//!      ──► provider.connect() outside the lock, bounded by acquire_timeout
//!      ──► Ready entry published ──► hits bump last_used
//!                                ──► idle reaper / capacity / shutdown close it
//! ```
//!
//! ## Concurrency
//!
//! The key → slot map sits behind one `parking_lot::Mutex` whose critical
//! sections never await. A miss inserts a `Pending` slot carrying a
//! `watch::Sender`; concurrent callers for the same key subscribe under the
//! lock and sleep until that sender is dropped (published, failed or
//! cancelled), then look again. Callers for other keys are never blocked by
//! an initialization in progress.
//!
//! Base entries (one per configured engine) are registered at construction,
//! never re-initialized and only removed by [`ConnectionCache::shutdown`].

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::application::idle_reaper::IdleReaper;
use crate::domain::connection::{
    CacheConfig, ConnectionError, ConnectionProvider, PoolLimits, PooledHandle,
};
use crate::domain::engine::{ConnectionKey, DatabaseTarget, EngineKind};
use crate::infrastructure::telemetry;

/// Errors surfaced to request-path callers of [`ConnectionCache::acquire`].
#[derive(Debug, thiserror::Error)]
pub enum ConnectionCacheError {
    #[error("unsupported database engine '{0}'")]
    UnsupportedEngine(String),

    #[error("failed to initialize {engine} connection to database '{database}': {source}")]
    ConnectionInitFailure {
        engine: EngineKind,
        database: String,
        #[source]
        source: ConnectionError,
    },

    #[error("connection cache is shut down")]
    ShutDown,
}

/// A cached, initialized handle plus its usage metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<H> {
    pub handle: H,
    pub created_at: Instant,
    pub created_wall: DateTime<Utc>,
    pub last_used: Instant,
    pub is_base: bool,
    pub acquisitions: u64,
}

impl<H> CacheEntry<H> {
    fn new(handle: H, is_base: bool, now: Instant) -> Self {
        Self {
            handle,
            created_at: now,
            created_wall: Utc::now(),
            last_used: now,
            is_base,
            acquisitions: 0,
        }
    }

    fn touch(&mut self, now: Instant) {
        if now > self.last_used {
            self.last_used = now;
        }
        self.acquisitions += 1;
    }
}

enum Slot<H> {
    Ready(CacheEntry<H>),
    /// Initialization in flight. Dropping `notify` wakes every waiter.
    Pending {
        claim: u64,
        notify: watch::Sender<()>,
    },
}

/// Result of one map inspection under the lock.
enum Step<H> {
    Hit(H),
    Wait(watch::Receiver<()>),
    Claimed {
        claim: u64,
        stale: Option<(ConnectionKey, CacheEntry<H>)>,
        victims: Vec<(ConnectionKey, CacheEntry<H>)>,
    },
    Failed(ConnectionCacheError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictionReason {
    Idle,
    Capacity,
    Stale,
    Shutdown,
}

impl EvictionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvictionReason::Idle => "idle",
            EvictionReason::Capacity => "capacity",
            EvictionReason::Stale => "stale",
            EvictionReason::Shutdown => "shutdown",
        }
    }
}

impl fmt::Display for EvictionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A handle that could not be closed cleanly. Its entry is gone regardless.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvictionFailure {
    pub engine: EngineKind,
    pub database: Option<String>,
    pub error: String,
}

/// Outcome of one idle sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    /// Non-base entries examined.
    pub scanned: usize,
    /// Entries removed from the cache.
    pub evicted: usize,
    pub failures: Vec<EvictionFailure>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ShutdownReport {
    pub closed: usize,
    pub failures: Vec<EvictionFailure>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryStats {
    pub engine: EngineKind,
    pub database: Option<String>,
    pub is_base: bool,
    pub created_at: DateTime<Utc>,
    pub last_used_at: DateTime<Utc>,
    pub age_seconds: u64,
    pub idle_seconds: u64,
    pub acquisitions: u64,
}

/// Diagnostics snapshot for operational tooling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheStats {
    pub entry_count: usize,
    pub tenant_entries: usize,
    pub pending: usize,
    pub max_entries: usize,
    pub idle_ttl_seconds: u64,
    pub hits: u64,
    pub misses: u64,
    pub created: u64,
    pub evicted_idle: u64,
    pub evicted_capacity: u64,
    pub eviction_failures: u64,
    pub entries: Vec<EntryStats>,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    created: AtomicU64,
    evicted_idle: AtomicU64,
    evicted_capacity: AtomicU64,
    eviction_failures: AtomicU64,
    next_claim: AtomicU64,
}

/// Removes a `Pending` slot if the claiming caller never publishes
/// (connect error, timeout, or the future being dropped).
struct ClaimGuard<'a, P: ConnectionProvider> {
    cache: &'a ConnectionCache<P>,
    key: ConnectionKey,
    claim: u64,
    armed: bool,
}

impl<P: ConnectionProvider> Drop for ClaimGuard<'_, P> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut slots = self.cache.slots.lock();
        if let Some(Slot::Pending { claim, .. }) = slots.get(&self.key) {
            if *claim == self.claim {
                slots.remove(&self.key);
            }
        }
    }
}

pub struct ConnectionCache<P: ConnectionProvider> {
    provider: Arc<P>,
    engines: HashSet<EngineKind>,
    config: CacheConfig,
    limits: PoolLimits,
    slots: Mutex<HashMap<ConnectionKey, Slot<P::Handle>>>,
    counters: Arc<Counters>,
    closed: AtomicBool,
    reaper_token: CancellationToken,
    reaper: Mutex<Option<JoinHandle<()>>>,
}

impl<P: ConnectionProvider> ConnectionCache<P> {
    /// Build the cache and register every engine's base connection.
    /// No background reaper runs; see [`Self::start`].
    pub fn new(provider: Arc<P>, config: CacheConfig, limits: PoolLimits) -> Self {
        let engines: HashSet<EngineKind> = provider.engines().into_iter().collect();
        let now = Instant::now();

        let mut slots = HashMap::new();
        for engine in &engines {
            if let Some(handle) = provider.base(*engine) {
                slots.insert(
                    ConnectionKey::base(*engine),
                    Slot::Ready(CacheEntry::new(handle, true, now)),
                );
            }
        }

        info!(
            engines = engines.len(),
            max_entries = config.max_entries,
            idle_ttl_secs = config.idle_ttl.as_secs(),
            "Connection cache initialized"
        );

        Self {
            provider,
            engines,
            config,
            limits,
            slots: Mutex::new(slots),
            counters: Arc::new(Counters::default()),
            closed: AtomicBool::new(false),
            reaper_token: CancellationToken::new(),
            reaper: Mutex::new(None),
        }
    }

    /// Build the cache and spawn its idle reaper. Must run inside a Tokio runtime.
    /// A zero `reap_interval` leaves the reaper off.
    pub fn start(provider: Arc<P>, config: CacheConfig, limits: PoolLimits) -> Arc<Self> {
        let cache = Arc::new(Self::new(provider, config, limits));

        if cache.config.reaper_enabled && cache.config.reap_interval.is_zero() {
            warn!("Idle reaper disabled: reap_interval must be greater than zero");
        } else if cache.config.reaper_enabled {
            let reaper = IdleReaper::new(
                Arc::downgrade(&cache),
                cache.config.reap_interval,
                cache.reaper_token.clone(),
            );
            *cache.reaper.lock() = Some(reaper.start());
        } else {
            info!("Idle reaper is disabled");
        }

        cache
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn limits(&self) -> &PoolLimits {
        &self.limits
    }

    pub fn is_shut_down(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Parse `engine` case-insensitively, then [`Self::acquire`].
    pub async fn acquire_by_name(
        &self,
        engine: &str,
        database: Option<&str>,
    ) -> Result<P::Handle, ConnectionCacheError> {
        let kind: EngineKind = engine
            .parse()
            .map_err(|_| ConnectionCacheError::UnsupportedEngine(engine.to_string()))?;
        self.acquire(kind, database).await
    }

    /// Return the pool for `(engine, database)`, provisioning it on a miss.
    /// `None` selects the engine's base connection.
    pub async fn acquire(
        &self,
        engine: EngineKind,
        database: Option<&str>,
    ) -> Result<P::Handle, ConnectionCacheError> {
        if self.is_shut_down() {
            return Err(ConnectionCacheError::ShutDown);
        }
        if !self.engines.contains(&engine) {
            return Err(ConnectionCacheError::UnsupportedEngine(engine.to_string()));
        }

        let key = ConnectionKey::new(engine, DatabaseTarget::from_optional(database));

        loop {
            let step = {
                let mut slots = self.slots.lock();
                self.inspect_locked(&mut slots, &key)
            };

            match step {
                Step::Hit(handle) => return Ok(handle),
                Step::Failed(err) => return Err(err),
                Step::Wait(mut rx) => {
                    debug!(key = %key, "Waiting on in-flight connection initialization");
                    // Err means the sender was dropped, which is the signal itself.
                    let _ = rx.changed().await;
                }
                Step::Claimed {
                    claim,
                    stale,
                    victims,
                } => {
                    let guard = ClaimGuard {
                        cache: self,
                        key: key.clone(),
                        claim,
                        armed: true,
                    };
                    let mut batches = Vec::with_capacity(2);
                    if let Some(stale) = stale {
                        batches.push((EvictionReason::Stale, vec![stale]));
                    }
                    if !victims.is_empty() {
                        batches.push((EvictionReason::Capacity, victims));
                    }
                    if !batches.is_empty() {
                        self.close_detached(batches).await;
                    }
                    return self.provision(guard).await;
                }
            }
        }
    }

    fn inspect_locked(
        &self,
        slots: &mut HashMap<ConnectionKey, Slot<P::Handle>>,
        key: &ConnectionKey,
    ) -> Step<P::Handle> {
        if self.is_shut_down() {
            return Step::Failed(ConnectionCacheError::ShutDown);
        }

        let now = Instant::now();
        let mut stale = None;

        match slots.get_mut(key) {
            Some(Slot::Ready(entry)) if entry.is_base => {
                if !entry.handle.is_alive() {
                    return Step::Failed(ConnectionCacheError::ConnectionInitFailure {
                        engine: key.engine,
                        database: key.target.to_string(),
                        source: ConnectionError::Connect("base connection is closed".to_string()),
                    });
                }
                entry.touch(now);
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                telemetry::record_hit();
                return Step::Hit(entry.handle.clone());
            }
            Some(Slot::Ready(entry)) if entry.handle.is_alive() => {
                entry.touch(now);
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                telemetry::record_hit();
                debug!(key = %key, acquisitions = entry.acquisitions, "Connection cache hit");
                return Step::Hit(entry.handle.clone());
            }
            Some(Slot::Ready(_)) => {
                if let Some(Slot::Ready(dead)) = slots.remove(key) {
                    warn!(key = %key, "Cached connection is no longer alive; re-provisioning");
                    stale = Some((key.clone(), dead));
                }
            }
            Some(Slot::Pending { notify, .. }) => return Step::Wait(notify.subscribe()),
            None => {}
        }

        if key.is_base() {
            // Base connections are registered once, from the provider.
            return match self.provider.base(key.engine) {
                Some(handle) => {
                    let mut entry = CacheEntry::new(handle.clone(), true, now);
                    entry.touch(now);
                    slots.insert(key.clone(), Slot::Ready(entry));
                    Step::Hit(handle)
                }
                None => Step::Failed(ConnectionCacheError::UnsupportedEngine(key.engine.to_string())),
            };
        }

        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        telemetry::record_miss();

        let victims = self.capacity_victims_locked(slots);
        let claim = self.counters.next_claim.fetch_add(1, Ordering::Relaxed);
        let (notify, _) = watch::channel(());
        slots.insert(key.clone(), Slot::Pending { claim, notify });

        Step::Claimed {
            claim,
            stale,
            victims,
        }
    }

    /// Remove least-recently-used tenant entries so that one more insertion
    /// keeps the tenant entry count at or below `max_entries`.
    ///
    /// Pending slots count toward the bound but cannot be evicted. Ties on
    /// `last_used` fall back to key order.
    fn capacity_victims_locked(
        &self,
        slots: &mut HashMap<ConnectionKey, Slot<P::Handle>>,
    ) -> Vec<(ConnectionKey, CacheEntry<P::Handle>)> {
        let occupied = slots
            .iter()
            .filter(|(key, _)| !key.is_base())
            .count();

        if occupied < self.config.max_entries {
            return Vec::new();
        }
        let needed = occupied + 1 - self.config.max_entries;

        let mut candidates: Vec<(Instant, ConnectionKey)> = slots
            .iter()
            .filter_map(|(key, slot)| match slot {
                Slot::Ready(entry) if !entry.is_base => Some((entry.last_used, key.clone())),
                _ => None,
            })
            .collect();
        candidates.sort();

        if candidates.len() < needed {
            warn!(
                occupied,
                max_entries = self.config.max_entries,
                "Connection cache over capacity with too many in-flight initializations"
            );
        }

        candidates
            .into_iter()
            .take(needed)
            .filter_map(|(_, key)| match slots.remove(&key) {
                Some(Slot::Ready(entry)) => Some((key, entry)),
                _ => None,
            })
            .collect()
    }

    async fn provision(&self, mut guard: ClaimGuard<'_, P>) -> Result<P::Handle, ConnectionCacheError> {
        let key = guard.key.clone();
        let database = key.target.database_name().unwrap_or_default().to_string();
        let timeout = self.limits.acquire_timeout;
        let started = Instant::now();

        let connected = tokio::time::timeout(
            timeout,
            self.provider.connect(key.engine, &database, &self.limits),
        )
        .await
        .unwrap_or(Err(ConnectionError::Timeout(timeout)));

        let handle = match connected {
            Ok(handle) => handle,
            Err(source) => {
                warn!(
                    engine = %key.engine,
                    database = %database,
                    error = %source,
                    "Failed to initialize tenant connection pool"
                );
                return Err(ConnectionCacheError::ConnectionInitFailure {
                    engine: key.engine,
                    database,
                    source,
                });
            }
        };

        let published = {
            let mut slots = self.slots.lock();
            if self.is_shut_down() {
                false
            } else {
                slots.insert(
                    key.clone(),
                    Slot::Ready(CacheEntry::new(handle.clone(), false, Instant::now())),
                );
                guard.armed = false;
                telemetry::set_entries(slots.len());
                true
            }
        };

        if !published {
            if let Err(e) = handle.close().await {
                warn!(key = %key, error = %e, "Failed to close connection provisioned during shutdown");
            }
            return Err(ConnectionCacheError::ShutDown);
        }

        self.counters.created.fetch_add(1, Ordering::Relaxed);
        info!(
            engine = %key.engine,
            database = %database,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Provisioned tenant connection pool"
        );

        Ok(handle)
    }

    /// Evict every tenant entry unused for longer than `idle_ttl`.
    ///
    /// Removal decisions happen under the lock; closing happens after it is
    /// released. A failing close is recorded and the sweep moves on.
    pub async fn evict_idle(&self) -> SweepReport {
        let ttl = self.config.idle_ttl;
        let now = Instant::now();

        let (scanned, expired) = {
            let mut slots = self.slots.lock();
            let mut scanned = 0;
            let keys: Vec<ConnectionKey> = slots
                .iter()
                .filter_map(|(key, slot)| match slot {
                    Slot::Ready(entry) if !entry.is_base => {
                        scanned += 1;
                        (now.duration_since(entry.last_used) > ttl).then(|| key.clone())
                    }
                    _ => None,
                })
                .collect();

            let expired: Vec<(ConnectionKey, CacheEntry<P::Handle>)> = keys
                .into_iter()
                .filter_map(|key| match slots.remove(&key) {
                    Some(Slot::Ready(entry)) => Some((key, entry)),
                    _ => None,
                })
                .collect();
            (scanned, expired)
        };

        let evicted = expired.len();
        let failures = if expired.is_empty() {
            Vec::new()
        } else {
            self.close_detached(vec![(EvictionReason::Idle, expired)]).await
        };

        debug!(scanned, evicted, failures = failures.len(), "Idle sweep finished");

        SweepReport {
            scanned,
            evicted,
            failures,
        }
    }

    /// On-demand idle sweep for operational tooling.
    pub async fn manual_cleanup(&self) -> SweepReport {
        info!("Manual connection cleanup requested");
        self.evict_idle().await
    }

    /// Stop the reaper and close every handle, base entries included.
    /// Safe to call more than once; later calls find nothing to close.
    pub async fn shutdown(&self) -> ShutdownReport {
        let first = !self.closed.swap(true, Ordering::AcqRel);
        self.reaper_token.cancel();

        let reaper = self.reaper.lock().take();
        if let Some(reaper) = reaper {
            if let Err(e) = reaper.await {
                warn!(error = %e, "Idle reaper task ended abnormally");
            }
        }

        let drained: Vec<(ConnectionKey, CacheEntry<P::Handle>)> = {
            let mut slots = self.slots.lock();
            slots
                .drain()
                .filter_map(|(key, slot)| match slot {
                    Slot::Ready(entry) => Some((key, entry)),
                    Slot::Pending { .. } => None,
                })
                .collect()
        };

        let closed = drained.len();
        let failures = if drained.is_empty() {
            Vec::new()
        } else {
            self.close_detached(vec![(EvictionReason::Shutdown, drained)]).await
        };

        if first {
            info!(closed, failures = failures.len(), "Connection cache shut down");
        }

        ShutdownReport { closed, failures }
    }

    /// Close entries already removed from the map.
    ///
    /// Closes run on their own task and finish even if the calling future is
    /// dropped. The caller still waits for the outcome.
    async fn close_detached(
        &self,
        batches: Vec<(EvictionReason, Vec<(ConnectionKey, CacheEntry<P::Handle>)>)>,
    ) -> Vec<EvictionFailure> {
        let closing = tokio::spawn(close_entries(
            self.counters.clone(),
            self.config.close_timeout,
            batches,
        ));

        let failures = match closing.await {
            Ok(failures) => failures,
            Err(e) => {
                warn!(error = %e, "Connection close task ended abnormally");
                Vec::new()
            }
        };

        telemetry::set_entries(self.slots.lock().len());
        failures
    }

    /// Whether a ready entry exists for the key. Does not count as a use.
    pub fn contains(&self, engine: EngineKind, database: Option<&str>) -> bool {
        let key = ConnectionKey::new(engine, DatabaseTarget::from_optional(database));
        matches!(self.slots.lock().get(&key), Some(Slot::Ready(_)))
    }

    /// Snapshot of one ready entry's metadata. Does not count as a use.
    pub fn entry(&self, engine: EngineKind, database: Option<&str>) -> Option<CacheEntry<P::Handle>> {
        let key = ConnectionKey::new(engine, DatabaseTarget::from_optional(database));
        match self.slots.lock().get(&key) {
            Some(Slot::Ready(entry)) => Some(entry.clone()),
            _ => None,
        }
    }

    /// Ready entries, base entries included.
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .values()
            .filter(|slot| matches!(slot, Slot::Ready(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let wall_now = Utc::now();

        let mut entries = Vec::new();
        let mut pending = 0;
        {
            let slots = self.slots.lock();
            for (key, slot) in slots.iter() {
                match slot {
                    Slot::Ready(entry) => {
                        let idle = now.duration_since(entry.last_used);
                        let idle_chrono = chrono::Duration::from_std(idle)
                            .unwrap_or_else(|_| chrono::Duration::zero());
                        entries.push((
                            key.clone(),
                            EntryStats {
                                engine: key.engine,
                                database: key.target.database_name().map(str::to_string),
                                is_base: entry.is_base,
                                created_at: entry.created_wall,
                                last_used_at: wall_now - idle_chrono,
                                age_seconds: now.duration_since(entry.created_at).as_secs(),
                                idle_seconds: idle.as_secs(),
                                acquisitions: entry.acquisitions,
                            },
                        ));
                    }
                    Slot::Pending { .. } => pending += 1,
                }
            }
        }
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        let entries: Vec<EntryStats> = entries.into_iter().map(|(_, stats)| stats).collect();

        CacheStats {
            entry_count: entries.len(),
            tenant_entries: entries.iter().filter(|e| !e.is_base).count(),
            pending,
            max_entries: self.config.max_entries,
            idle_ttl_seconds: self.config.idle_ttl.as_secs(),
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            created: self.counters.created.load(Ordering::Relaxed),
            evicted_idle: self.counters.evicted_idle.load(Ordering::Relaxed),
            evicted_capacity: self.counters.evicted_capacity.load(Ordering::Relaxed),
            eviction_failures: self.counters.eviction_failures.load(Ordering::Relaxed),
            entries,
        }
    }
}

async fn close_entries<H: PooledHandle>(
    counters: Arc<Counters>,
    close_timeout: Duration,
    batches: Vec<(EvictionReason, Vec<(ConnectionKey, CacheEntry<H>)>)>,
) -> Vec<EvictionFailure> {
    let mut failures = Vec::new();

    for (reason, entries) in batches {
        for (key, entry) in entries {
            let idle_secs = entry.last_used.elapsed().as_secs();
            let outcome = tokio::time::timeout(close_timeout, entry.handle.close())
                .await
                .unwrap_or_else(|_| {
                    Err(ConnectionError::Close(format!(
                        "timed out after {:?}",
                        close_timeout
                    )))
                });

            match reason {
                EvictionReason::Idle => {
                    counters.evicted_idle.fetch_add(1, Ordering::Relaxed);
                }
                EvictionReason::Capacity => {
                    counters.evicted_capacity.fetch_add(1, Ordering::Relaxed);
                }
                EvictionReason::Stale | EvictionReason::Shutdown => {}
            }
            telemetry::record_eviction(reason.as_str());

            match outcome {
                Ok(()) => info!(
                    engine = %key.engine,
                    database = %key.target,
                    reason = %reason,
                    idle_secs,
                    "Closed cached connection"
                ),
                Err(e) => {
                    warn!(
                        engine = %key.engine,
                        database = %key.target,
                        reason = %reason,
                        error = %e,
                        "Failed to close cached connection"
                    );
                    counters.eviction_failures.fetch_add(1, Ordering::Relaxed);
                    telemetry::record_eviction_failure();
                    failures.push(EvictionFailure {
                        engine: key.engine,
                        database: key.target.database_name().map(str::to_string),
                        error: e.to_string(),
                    });
                }
            }
        }
    }

    failures
}
