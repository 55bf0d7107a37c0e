// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Behavioural tests for the connection cache against an in-memory provider.
//!
//! Time is paused (`start_paused = true`) so idle TTLs, reaper periods and
//! initialization timeouts are driven with `tokio::time::advance` instead of
//! real sleeps.

use async_trait::async_trait;
use parking_lot::Mutex;
use polytenant_core::application::connection_cache::{ConnectionCache, ConnectionCacheError};
use polytenant_core::domain::connection::{
    CacheConfig, ConnectionError, ConnectionProvider, PoolLimits, PooledHandle,
};
use polytenant_core::domain::engine::EngineKind;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone, Debug)]
struct MockHandle {
    id: u64,
    label: String,
    closed: Arc<AtomicBool>,
    fail_close: bool,
    close_delay: Option<Duration>,
    close_log: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl PooledHandle for MockHandle {
    fn is_alive(&self) -> bool {
        !self.closed.load(Ordering::SeqCst)
    }

    async fn close(&self) -> Result<(), ConnectionError> {
        if let Some(delay) = self.close_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_close {
            return Err(ConnectionError::Close(format!("{} refused to close", self.label)));
        }
        self.closed.store(true, Ordering::SeqCst);
        self.close_log.lock().push(self.label.clone());
        Ok(())
    }
}

#[derive(Default)]
struct MockProvider {
    bases: HashMap<EngineKind, MockHandle>,
    connects: AtomicU64,
    next_id: AtomicU64,
    delays: Mutex<HashMap<String, Duration>>,
    failing: Mutex<HashSet<String>>,
    fail_once: Mutex<HashSet<String>>,
    failing_close: Mutex<HashSet<String>>,
    slow_close: Mutex<HashMap<String, Duration>>,
    close_log: Arc<Mutex<Vec<String>>>,
}

impl MockProvider {
    fn postgres() -> Self {
        let mut provider = Self::default();
        let base = provider.handle("postgres/<base>", false, None);
        provider.bases.insert(EngineKind::Postgres, base);
        provider
    }

    fn handle(&self, label: &str, fail_close: bool, close_delay: Option<Duration>) -> MockHandle {
        MockHandle {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            label: label.to_string(),
            closed: Arc::new(AtomicBool::new(false)),
            fail_close,
            close_delay,
            close_log: self.close_log.clone(),
        }
    }

    fn delay(self, database: &str, delay: Duration) -> Self {
        self.delays.lock().insert(database.to_string(), delay);
        self
    }

    fn connects(&self) -> u64 {
        self.connects.load(Ordering::SeqCst)
    }

    fn closed(&self) -> Vec<String> {
        self.close_log.lock().clone()
    }
}

#[async_trait]
impl ConnectionProvider for MockProvider {
    type Handle = MockHandle;

    fn engines(&self) -> Vec<EngineKind> {
        self.bases.keys().copied().collect()
    }

    fn base(&self, engine: EngineKind) -> Option<MockHandle> {
        self.bases.get(&engine).cloned()
    }

    async fn connect(
        &self,
        engine: EngineKind,
        database: &str,
        _limits: &PoolLimits,
    ) -> Result<MockHandle, ConnectionError> {
        self.connects.fetch_add(1, Ordering::SeqCst);

        let delay = self.delays.lock().get(database).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_once.lock().remove(database) || self.failing.lock().contains(database) {
            return Err(ConnectionError::Connect(format!("{database}: connection refused")));
        }

        let fail_close = self.failing_close.lock().contains(database);
        let close_delay = self.slow_close.lock().get(database).copied();
        Ok(self.handle(&format!("{engine}/{database}"), fail_close, close_delay))
    }
}

fn config(max_entries: usize) -> CacheConfig {
    CacheConfig {
        max_entries,
        idle_ttl: Duration::from_secs(10 * 60),
        reap_interval: Duration::from_secs(60 * 60),
        reaper_enabled: false,
        close_timeout: Duration::from_secs(10),
    }
}

fn cache_with(provider: MockProvider, config: CacheConfig) -> (Arc<MockProvider>, Arc<ConnectionCache<MockProvider>>) {
    let provider = Arc::new(provider);
    let cache = Arc::new(ConnectionCache::new(provider.clone(), config, PoolLimits::default()));
    (provider, cache)
}

async fn tick(seconds: u64) {
    tokio::time::advance(Duration::from_secs(seconds)).await;
}

#[tokio::test(start_paused = true)]
async fn test_repeated_acquire_reuses_one_entry() {
    let (provider, cache) = cache_with(MockProvider::postgres(), config(20));

    let first = cache.acquire_by_name("postgres", Some("tenantA")).await.unwrap();
    let second = cache.acquire_by_name("postgres", Some("tenantA")).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(provider.connects(), 1);

    let stats = cache.stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.created, 1);
    assert_eq!(stats.tenant_entries, 1);
    assert_eq!(cache.entry(EngineKind::Postgres, Some("tenantA")).unwrap().acquisitions, 1);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_acquires_create_one_entry() {
    let provider = MockProvider::postgres().delay("tenantA", Duration::from_millis(250));
    let (provider, cache) = cache_with(provider, config(20));

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let cache = cache.clone();
            tokio::spawn(async move { cache.acquire(EngineKind::Postgres, Some("tenantA")).await })
        })
        .collect();

    let mut ids = HashSet::new();
    for task in tasks {
        ids.insert(task.await.unwrap().unwrap().id);
    }

    assert_eq!(ids.len(), 1);
    assert_eq!(provider.connects(), 1);
    assert_eq!(cache.stats().tenant_entries, 1);
}

#[tokio::test(start_paused = true)]
async fn test_unrelated_keys_are_not_blocked_by_slow_initialization() {
    let provider = MockProvider::postgres().delay("slow", Duration::from_secs(20));
    let (_provider, cache) = cache_with(provider, config(20));

    let slow = {
        let cache = cache.clone();
        tokio::spawn(async move { cache.acquire(EngineKind::Postgres, Some("slow")).await })
    };
    tokio::task::yield_now().await;
    assert_eq!(cache.stats().pending, 1);

    cache.acquire(EngineKind::Postgres, Some("fast")).await.unwrap();
    cache.acquire(EngineKind::Postgres, None).await.unwrap();
    assert!(!slow.is_finished());

    slow.await.unwrap().unwrap();
    assert_eq!(cache.stats().tenant_entries, 2);
}

#[tokio::test(start_paused = true)]
async fn test_capacity_evicts_least_recently_used() {
    let (provider, cache) = cache_with(MockProvider::postgres(), config(2));

    cache.acquire(EngineKind::Postgres, Some("db1")).await.unwrap();
    tick(1).await;
    cache.acquire(EngineKind::Postgres, Some("db2")).await.unwrap();
    tick(1).await;
    cache.acquire(EngineKind::Postgres, Some("db1")).await.unwrap();
    tick(1).await;
    cache.acquire(EngineKind::Postgres, Some("db3")).await.unwrap();

    assert!(cache.contains(EngineKind::Postgres, Some("db1")));
    assert!(!cache.contains(EngineKind::Postgres, Some("db2")));
    assert!(cache.contains(EngineKind::Postgres, Some("db3")));
    assert_eq!(provider.closed(), vec!["postgres/db2".to_string()]);

    let stats = cache.stats();
    assert_eq!(stats.tenant_entries, 2);
    assert_eq!(stats.evicted_capacity, 1);
}

#[tokio::test(start_paused = true)]
async fn test_capacity_victim_closes_even_if_claimer_is_aborted() {
    let provider = MockProvider::postgres();
    provider.slow_close.lock().insert("a".to_string(), Duration::from_secs(5));
    let (provider, cache) = cache_with(provider, config(1));

    let victim = cache.acquire(EngineKind::Postgres, Some("a")).await.unwrap();

    let claimer = {
        let cache = cache.clone();
        tokio::spawn(async move { cache.acquire(EngineKind::Postgres, Some("b")).await })
    };
    tokio::time::sleep(Duration::from_secs(1)).await;

    // "a" is out of the map and its close is still running.
    assert!(!cache.contains(EngineKind::Postgres, Some("a")));
    assert!(victim.is_alive());

    claimer.abort();
    let _ = claimer.await;
    tokio::time::sleep(Duration::from_secs(30)).await;

    assert!(!victim.is_alive());
    assert_eq!(provider.closed(), vec!["postgres/a".to_string()]);

    let stats = cache.stats();
    assert_eq!(stats.evicted_capacity, 1);
    assert_eq!(stats.pending, 0);
    assert!(!cache.contains(EngineKind::Postgres, Some("b")));
}

#[tokio::test(start_paused = true)]
async fn test_capacity_tie_breaks_on_key_order() {
    let (provider, cache) = cache_with(MockProvider::postgres(), config(2));

    cache.acquire(EngineKind::Postgres, Some("beta")).await.unwrap();
    cache.acquire(EngineKind::Postgres, Some("alpha")).await.unwrap();
    cache.acquire(EngineKind::Postgres, Some("gamma")).await.unwrap();

    assert_eq!(provider.closed(), vec!["postgres/alpha".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_idle_entries_are_evicted() {
    let (provider, cache) = cache_with(MockProvider::postgres(), config(20));

    let handle = cache.acquire(EngineKind::Postgres, Some("db1")).await.unwrap();
    tick(11 * 60).await;

    let report = cache.evict_idle().await;
    assert_eq!(report.scanned, 1);
    assert_eq!(report.evicted, 1);
    assert!(report.failures.is_empty());

    assert!(!cache.contains(EngineKind::Postgres, Some("db1")));
    assert!(!handle.is_alive());
    assert!(cache.contains(EngineKind::Postgres, None));
    assert_eq!(provider.closed(), vec!["postgres/db1".to_string()]);
    assert_eq!(cache.stats().evicted_idle, 1);

    let fresh = cache.acquire(EngineKind::Postgres, Some("db1")).await.unwrap();
    assert_ne!(fresh.id, handle.id);
    assert!(fresh.is_alive());
    assert_eq!(provider.connects(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_recent_use_keeps_entry_alive() {
    let (_provider, cache) = cache_with(MockProvider::postgres(), config(20));

    cache.acquire(EngineKind::Postgres, Some("db1")).await.unwrap();
    tick(9 * 60).await;
    cache.acquire(EngineKind::Postgres, Some("db1")).await.unwrap();
    tick(9 * 60).await;

    let report = cache.evict_idle().await;
    assert_eq!(report.evicted, 0);
    assert!(cache.contains(EngineKind::Postgres, Some("db1")));
}

#[tokio::test(start_paused = true)]
async fn test_base_entries_survive_idle_and_capacity() {
    let (provider, cache) = cache_with(MockProvider::postgres(), config(1));
    let base = cache.acquire(EngineKind::Postgres, None).await.unwrap();

    cache.acquire(EngineKind::Postgres, Some("db1")).await.unwrap();
    cache.acquire(EngineKind::Postgres, Some("db2")).await.unwrap();
    tick(24 * 60 * 60).await;
    cache.evict_idle().await;

    assert!(cache.contains(EngineKind::Postgres, None));
    assert!(base.is_alive());
    assert!(!provider.closed().contains(&"postgres/<base>".to_string()));
    assert_eq!(cache.acquire(EngineKind::Postgres, None).await.unwrap().id, base.id);
    assert_eq!(provider.connects(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_unsupported_engine_is_rejected() {
    let (provider, cache) = cache_with(MockProvider::postgres(), config(20));
    let before = cache.len();

    let err = cache
        .acquire_by_name("unsupported-engine", Some("db"))
        .await
        .unwrap_err();
    assert!(matches!(err, ConnectionCacheError::UnsupportedEngine(e) if e == "unsupported-engine"));

    // Known engine, but nothing configured for it.
    let err = cache.acquire(EngineKind::MySql, Some("db")).await.unwrap_err();
    assert!(matches!(err, ConnectionCacheError::UnsupportedEngine(_)));

    assert_eq!(cache.len(), before);
    assert_eq!(provider.connects(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_failed_initialization_leaves_no_entry() {
    let provider = MockProvider::postgres();
    provider.failing.lock().insert("broken".to_string());
    let (provider, cache) = cache_with(provider, config(20));

    let err = cache.acquire(EngineKind::Postgres, Some("broken")).await.unwrap_err();
    match err {
        ConnectionCacheError::ConnectionInitFailure { engine, database, source } => {
            assert_eq!(engine, EngineKind::Postgres);
            assert_eq!(database, "broken");
            assert!(matches!(source, ConnectionError::Connect(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!cache.contains(EngineKind::Postgres, Some("broken")));
    assert_eq!(cache.stats().pending, 0);

    provider.failing.lock().clear();
    cache.acquire(EngineKind::Postgres, Some("broken")).await.unwrap();
    assert_eq!(provider.connects(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_initialization_timeout() {
    let provider = MockProvider::postgres().delay("stuck", Duration::from_secs(300));
    let provider = Arc::new(provider);
    let limits = PoolLimits {
        acquire_timeout: Duration::from_secs(5),
        ..PoolLimits::default()
    };
    let cache = ConnectionCache::new(provider.clone(), config(20), limits);

    let err = cache.acquire(EngineKind::Postgres, Some("stuck")).await.unwrap_err();
    assert!(matches!(
        err,
        ConnectionCacheError::ConnectionInitFailure {
            source: ConnectionError::Timeout(t),
            ..
        } if t == Duration::from_secs(5)
    ));
    assert!(!cache.contains(EngineKind::Postgres, Some("stuck")));
    assert_eq!(cache.stats().pending, 0);
}

#[tokio::test(start_paused = true)]
async fn test_waiters_retry_after_failed_initialization() {
    let provider = MockProvider::postgres().delay("flaky", Duration::from_millis(100));
    provider.fail_once.lock().insert("flaky".to_string());
    let (provider, cache) = cache_with(provider, config(20));

    let first = {
        let cache = cache.clone();
        tokio::spawn(async move { cache.acquire(EngineKind::Postgres, Some("flaky")).await })
    };
    tokio::task::yield_now().await;
    let second = {
        let cache = cache.clone();
        tokio::spawn(async move { cache.acquire(EngineKind::Postgres, Some("flaky")).await })
    };

    assert!(first.await.unwrap().is_err());
    assert!(second.await.unwrap().is_ok());
    assert_eq!(provider.connects(), 2);
    assert!(cache.contains(EngineKind::Postgres, Some("flaky")));
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_initialization_releases_claim() {
    let provider = MockProvider::postgres().delay("db1", Duration::from_secs(10));
    let (provider, cache) = cache_with(provider, config(20));

    let claimer = {
        let cache = cache.clone();
        tokio::spawn(async move { cache.acquire(EngineKind::Postgres, Some("db1")).await })
    };
    tokio::task::yield_now().await;
    assert_eq!(cache.stats().pending, 1);

    claimer.abort();
    let _ = claimer.await;
    assert_eq!(cache.stats().pending, 0);

    provider.delays.lock().clear();
    cache.acquire(EngineKind::Postgres, Some("db1")).await.unwrap();
    assert_eq!(provider.connects(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_dead_handle_is_reprovisioned() {
    let (provider, cache) = cache_with(MockProvider::postgres(), config(20));

    let first = cache.acquire(EngineKind::Postgres, Some("db1")).await.unwrap();
    first.close().await.unwrap();

    let second = cache.acquire(EngineKind::Postgres, Some("db1")).await.unwrap();
    assert_ne!(first.id, second.id);
    assert!(second.is_alive());
    assert_eq!(provider.connects(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_eviction_failures_are_counted_and_do_not_stop_sweep() {
    let provider = MockProvider::postgres();
    provider.failing_close.lock().insert("db1".to_string());
    let (provider, cache) = cache_with(provider, config(20));

    cache.acquire(EngineKind::Postgres, Some("db1")).await.unwrap();
    cache.acquire(EngineKind::Postgres, Some("db2")).await.unwrap();
    tick(11 * 60).await;

    let report = cache.evict_idle().await;
    assert_eq!(report.evicted, 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].database.as_deref(), Some("db1"));

    assert!(!cache.contains(EngineKind::Postgres, Some("db1")));
    assert!(!cache.contains(EngineKind::Postgres, Some("db2")));
    assert_eq!(provider.closed(), vec!["postgres/db2".to_string()]);
    assert_eq!(cache.stats().eviction_failures, 1);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_is_idempotent() {
    let (provider, cache) = cache_with(MockProvider::postgres(), config(20));
    cache.acquire(EngineKind::Postgres, Some("db1")).await.unwrap();
    cache.acquire(EngineKind::Postgres, Some("db2")).await.unwrap();

    let report = cache.shutdown().await;
    assert_eq!(report.closed, 3);
    assert!(report.failures.is_empty());
    assert!(cache.is_empty());
    assert_eq!(provider.closed().len(), 3);

    let again = cache.shutdown().await;
    assert_eq!(again.closed, 0);
    assert_eq!(provider.closed().len(), 3);

    let err = cache.acquire(EngineKind::Postgres, Some("db1")).await.unwrap_err();
    assert!(matches!(err, ConnectionCacheError::ShutDown));
}

#[tokio::test(start_paused = true)]
async fn test_initialization_in_flight_during_shutdown_is_closed() {
    let provider = MockProvider::postgres().delay("db1", Duration::from_secs(1));
    let (provider, cache) = cache_with(provider, config(20));

    let pending = {
        let cache = cache.clone();
        tokio::spawn(async move { cache.acquire(EngineKind::Postgres, Some("db1")).await })
    };
    tokio::task::yield_now().await;

    cache.shutdown().await;
    let err = pending.await.unwrap().unwrap_err();
    assert!(matches!(err, ConnectionCacheError::ShutDown));
    assert!(cache.is_empty());
    assert!(provider.closed().contains(&"postgres/db1".to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_reaper_evicts_on_schedule() {
    let provider = Arc::new(MockProvider::postgres());
    let config = CacheConfig {
        reaper_enabled: true,
        ..config(20)
    };
    let cache = ConnectionCache::start(provider.clone(), config, PoolLimits::default());

    cache.acquire(EngineKind::Postgres, Some("db1")).await.unwrap();

    // First sweep happens one full period after start.
    tick(30 * 60).await;
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert!(cache.contains(EngineKind::Postgres, Some("db1")));

    tick(31 * 60).await;
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert!(!cache.contains(EngineKind::Postgres, Some("db1")));
    assert!(cache.contains(EngineKind::Postgres, None));

    cache.shutdown().await;
    assert_eq!(provider.closed().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_zero_reap_interval_leaves_reaper_off() {
    let provider = Arc::new(MockProvider::postgres());
    let config = CacheConfig {
        reaper_enabled: true,
        reap_interval: Duration::ZERO,
        idle_ttl: Duration::from_secs(60),
        ..config(20)
    };
    let cache = ConnectionCache::start(provider.clone(), config, PoolLimits::default());

    cache.acquire(EngineKind::Postgres, Some("db1")).await.unwrap();
    tick(10 * 60).await;
    tokio::time::sleep(Duration::from_millis(1)).await;
    assert!(cache.contains(EngineKind::Postgres, Some("db1")));

    // Manual sweeps still work without the reaper.
    assert_eq!(cache.manual_cleanup().await.evicted, 1);

    let report = cache.shutdown().await;
    assert!(report.failures.is_empty());
    assert_eq!(provider.closed().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_stats_snapshot() {
    let (_provider, cache) = cache_with(MockProvider::postgres(), config(20));
    cache.acquire(EngineKind::Postgres, Some("db1")).await.unwrap();
    tick(90).await;

    let stats = cache.stats();
    assert_eq!(stats.entry_count, 2);
    assert_eq!(stats.tenant_entries, 1);
    assert_eq!(stats.max_entries, 20);
    assert_eq!(stats.idle_ttl_seconds, 600);

    assert!(stats.entries[0].is_base);
    assert_eq!(stats.entries[0].database, None);
    assert_eq!(stats.entries[1].database.as_deref(), Some("db1"));
    assert_eq!(stats.entries[1].idle_seconds, 90);

    let json = serde_json::to_value(&stats).unwrap();
    assert_eq!(json["entries"][1]["engine"], "postgres");
}
