// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod connection_cache;
pub mod idle_reaper;
pub mod schema_service;
pub mod tenant_data;
pub mod database_admin;

// Re-export services for convenience
pub use connection_cache::{
    CacheEntry, CacheStats, ConnectionCache, ConnectionCacheError, EntryStats, EvictionFailure,
    ShutdownReport, SweepReport,
};
pub use database_admin::{AdminError, DatabaseAdminService, DatabaseCreation};
pub use idle_reaper::IdleReaper;
pub use schema_service::{SchemaError, SchemaService};
pub use tenant_data::{DataError, TenantDataService};
