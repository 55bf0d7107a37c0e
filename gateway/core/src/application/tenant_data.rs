// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Tenant Data Service
//!
//! Generic row CRUD over a tenant's tables. Each call resolves the tenant,
//! acquires its pool from the connection cache and runs one statement.
//! Rows travel as JSON objects in both directions.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** CRUD glue between the HTTP surface and the connection cache

use serde_json::{Map, Value};
use sqlx::postgres::PgPool;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

use crate::application::connection_cache::{ConnectionCache, ConnectionCacheError};
use crate::domain::connection::ConnectionProvider;
use crate::domain::identifier::{Identifier, InvalidIdentifier};
use crate::domain::tenant::{TenantDirectory, TenantError};
use crate::infrastructure::postgres::sql;

pub const DEFAULT_LIMIT: u32 = 100;
pub const MAX_LIMIT: u32 = 1000;

#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error(transparent)]
    Tenant(#[from] TenantError),

    #[error(transparent)]
    Connection(#[from] ConnectionCacheError),

    #[error(transparent)]
    InvalidIdentifier(#[from] InvalidIdentifier),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub struct TenantDataService<P: ConnectionProvider<Handle = PgPool>> {
    cache: Arc<ConnectionCache<P>>,
    tenants: Arc<TenantDirectory>,
}

impl<P: ConnectionProvider<Handle = PgPool>> TenantDataService<P> {
    pub fn new(cache: Arc<ConnectionCache<P>>, tenants: Arc<TenantDirectory>) -> Self {
        Self { cache, tenants }
    }

    async fn tenant_pool(&self, tenant: &str) -> Result<PgPool, DataError> {
        let binding = self.tenants.resolve(tenant)?;
        Ok(self.cache.acquire(binding.engine, Some(&binding.database)).await?)
    }

    /// Insert `rows` and return them as stored (defaults and generated keys filled in).
    ///
    /// Rows are grouped by their key set and each group is inserted with its
    /// own column list, so a column a row omits takes its DEFAULT even when
    /// another row supplies it. All groups share one transaction; the result
    /// follows group order (first appearance of each key set).
    pub async fn insert_data(&self, tenant: &str, table: &str, rows: Vec<Value>) -> Result<Vec<Value>, DataError> {
        let table = Identifier::parse("table", table)?;
        let groups = group_by_columns(rows)?;

        let pool = self.tenant_pool(tenant).await?;
        let mut tx = pool.begin().await?;
        let mut inserted: Vec<Value> = Vec::new();
        for (columns, rows) in groups {
            let batch: Vec<Value> = sqlx::query_scalar(&sql::insert_rows(&table, &columns))
                .bind(Value::Array(rows))
                .fetch_all(&mut *tx)
                .await?;
            inserted.extend(batch);
        }
        tx.commit().await?;

        debug!(tenant, table = %table, rows = inserted.len(), "Inserted rows");
        Ok(inserted)
    }

    /// Rows whose columns equal every key of `filter`. An empty filter matches all rows.
    pub async fn get_data(
        &self,
        tenant: &str,
        table: &str,
        filter: Map<String, Value>,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<Vec<Value>, DataError> {
        let table = Identifier::parse("table", table)?;
        parse_columns(filter.keys().map(String::as_str))?;
        let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
        let offset = offset.unwrap_or(0);

        let pool = self.tenant_pool(tenant).await?;
        let rows: Vec<Value> = sqlx::query_scalar(&sql::select_rows(&table))
            .bind(Value::Object(filter))
            .bind(i64::from(limit))
            .bind(i64::from(offset))
            .fetch_all(&pool)
            .await?;

        debug!(tenant, table = %table, rows = rows.len(), "Fetched rows");
        Ok(rows)
    }

    /// Apply `changes` to every row matching `filter`; returns the updated rows.
    pub async fn find_and_update(
        &self,
        tenant: &str,
        table: &str,
        filter: Map<String, Value>,
        changes: Map<String, Value>,
    ) -> Result<Vec<Value>, DataError> {
        let table = Identifier::parse("table", table)?;
        require_filter(&filter)?;
        parse_columns(filter.keys().map(String::as_str))?;
        if changes.is_empty() {
            return Err(DataError::InvalidRequest("no changes given".to_string()));
        }
        let columns = parse_columns(changes.keys().map(String::as_str))?;

        let pool = self.tenant_pool(tenant).await?;
        let rows: Vec<Value> = sqlx::query_scalar(&sql::update_rows(&table, &columns))
            .bind(Value::Object(filter))
            .bind(Value::Object(changes))
            .fetch_all(&pool)
            .await?;

        debug!(tenant, table = %table, rows = rows.len(), "Updated rows");
        Ok(rows)
    }

    /// Delete every row matching `filter`; returns the number of rows removed.
    pub async fn delete_data(&self, tenant: &str, table: &str, filter: Map<String, Value>) -> Result<u64, DataError> {
        let table = Identifier::parse("table", table)?;
        require_filter(&filter)?;
        parse_columns(filter.keys().map(String::as_str))?;

        let pool = self.tenant_pool(tenant).await?;
        let deleted = sqlx::query(&sql::delete_rows(&table))
            .bind(Value::Object(filter))
            .execute(&pool)
            .await?
            .rows_affected();

        debug!(tenant, table = %table, rows = deleted, "Deleted rows");
        Ok(deleted)
    }
}

fn parse_columns<'a>(names: impl Iterator<Item = &'a str>) -> Result<Vec<Identifier>, InvalidIdentifier> {
    names.map(|name| Identifier::parse("column", name)).collect()
}

// Containment of `{}` matches every row.
fn require_filter(filter: &Map<String, Value>) -> Result<(), DataError> {
    if filter.is_empty() {
        return Err(DataError::InvalidRequest(
            "a non-empty filter is required".to_string(),
        ));
    }
    Ok(())
}

/// Split rows into batches sharing the same set of keys, keeping the order in
/// which each key set first appears.
fn group_by_columns(rows: Vec<Value>) -> Result<Vec<(Vec<Identifier>, Vec<Value>)>, DataError> {
    if rows.is_empty() {
        return Err(DataError::InvalidRequest("at least one row is required".to_string()));
    }

    let mut groups: Vec<(BTreeSet<String>, Vec<Value>)> = Vec::new();
    for row in rows {
        let object = row
            .as_object()
            .ok_or_else(|| DataError::InvalidRequest("rows must be JSON objects".to_string()))?;
        if object.is_empty() {
            return Err(DataError::InvalidRequest("rows have no columns".to_string()));
        }
        let keys: BTreeSet<String> = object.keys().cloned().collect();
        match groups.iter_mut().find(|(existing, _)| *existing == keys) {
            Some((_, batch)) => batch.push(row),
            None => groups.push((keys, vec![row])),
        }
    }

    groups
        .into_iter()
        .map(|(keys, batch)| Ok((parse_columns(keys.iter().map(String::as_str))?, batch)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::connection::{CacheConfig, PoolLimits};
    use crate::domain::engine::EngineKind;
    use crate::domain::tenant::TenantBinding;
    use crate::infrastructure::postgres::PostgresProvider;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn service() -> TenantDataService<PostgresProvider> {
        let provider = PostgresProvider::lazy("postgres://gateway@localhost:5432/postgres").unwrap();
        let cache = Arc::new(ConnectionCache::new(
            Arc::new(provider),
            CacheConfig::default(),
            PoolLimits::default(),
        ));
        let mut bindings = BTreeMap::new();
        bindings.insert(
            "acme".to_string(),
            TenantBinding {
                engine: EngineKind::Postgres,
                database: "acme_db".to_string(),
            },
        );
        TenantDataService::new(cache, Arc::new(TenantDirectory::new(bindings)))
    }

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_unknown_tenant() {
        let err = service()
            .get_data("globex", "users", Map::new(), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DataError::Tenant(TenantError::NotFound(t)) if t == "globex"));
    }

    #[tokio::test]
    async fn test_invalid_table_name() {
        let err = service()
            .insert_data("acme", "users; drop table x", vec![json!({"id": 1})])
            .await
            .unwrap_err();
        assert!(matches!(err, DataError::InvalidIdentifier(_)));
    }

    #[tokio::test]
    async fn test_invalid_column_name() {
        let err = service()
            .insert_data("acme", "users", vec![json!({"bad name": 1})])
            .await
            .unwrap_err();
        assert!(matches!(err, DataError::InvalidIdentifier(_)));
    }

    #[tokio::test]
    async fn test_rows_must_be_objects() {
        let err = service()
            .insert_data("acme", "users", vec![json!([1, 2])])
            .await
            .unwrap_err();
        assert!(matches!(err, DataError::InvalidRequest(_)));

        let err = service().insert_data("acme", "users", vec![]).await.unwrap_err();
        assert!(matches!(err, DataError::InvalidRequest(_)));
    }

    #[test]
    fn test_rows_grouped_by_key_set() {
        let groups = group_by_columns(vec![
            json!({"id": 1, "name": "ada"}),
            json!({"id": 2}),
            json!({"name": "grace", "id": 3}),
        ])
        .unwrap();

        assert_eq!(groups.len(), 2);
        let columns: Vec<&str> = groups[0].0.iter().map(Identifier::as_str).collect();
        assert_eq!(columns, vec!["id", "name"]);
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[0].1[1]["name"], "grace");

        let columns: Vec<&str> = groups[1].0.iter().map(Identifier::as_str).collect();
        assert_eq!(columns, vec!["id"]);
        assert_eq!(groups[1].1, vec![json!({"id": 2})]);

        let err = group_by_columns(vec![json!({"id": 1}), json!({})]).unwrap_err();
        assert!(matches!(err, DataError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_delete_requires_filter() {
        let err = service().delete_data("acme", "users", Map::new()).await.unwrap_err();
        assert!(matches!(err, DataError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_update_requires_changes() {
        let err = service()
            .find_and_update("acme", "users", object(json!({"id": 1})), Map::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DataError::InvalidRequest(_)));
    }
}
