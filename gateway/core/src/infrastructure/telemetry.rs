// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Connection cache metrics
//!
//! Thin wrappers over the `metrics` facade. Without an installed recorder
//! (tests, `metrics_enabled: false`) every call is a no-op.

use metrics::{counter, gauge};

pub const CACHE_HITS: &str = "polytenant_cache_hits_total";
pub const CACHE_MISSES: &str = "polytenant_cache_misses_total";
pub const CACHE_EVICTIONS: &str = "polytenant_cache_evictions_total";
pub const CACHE_EVICTION_FAILURES: &str = "polytenant_cache_eviction_failures_total";
pub const CACHE_ENTRIES: &str = "polytenant_cache_entries";

pub fn record_hit() {
    counter!(CACHE_HITS).increment(1);
}

pub fn record_miss() {
    counter!(CACHE_MISSES).increment(1);
}

pub fn record_eviction(reason: &'static str) {
    counter!(CACHE_EVICTIONS, "reason" => reason).increment(1);
}

pub fn record_eviction_failure() {
    counter!(CACHE_EVICTION_FAILURES).increment(1);
}

pub fn set_entries(count: usize) {
    gauge!(CACHE_ENTRIES).set(count as f64);
}
