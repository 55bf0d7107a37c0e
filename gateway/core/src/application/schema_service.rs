// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Schema Service
//!
//! Brings a tenant table in line with a requested column set. A missing table
//! is created outright; an existing one is reconciled in a single transaction
//! following [`plan_reconciliation`]. A retype whose column still holds data
//! is skipped and reported as a [`ColumnConflict`].
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Implements createOrUpdateTable over the connection cache

use sqlx::postgres::PgPool;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

use crate::application::connection_cache::{ConnectionCache, ConnectionCacheError};
use crate::domain::connection::ConnectionProvider;
use crate::domain::identifier::{Identifier, InvalidIdentifier};
use crate::domain::schema::{
    plan_reconciliation, validate_type, ColumnChange, ColumnConflict, ColumnSpec, InvalidColumnType,
    TableReconciliation,
};
use crate::domain::tenant::{TenantDirectory, TenantError};
use crate::infrastructure::postgres::{catalog, sql};

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error(transparent)]
    Tenant(#[from] TenantError),

    #[error(transparent)]
    Connection(#[from] ConnectionCacheError),

    #[error(transparent)]
    InvalidIdentifier(#[from] InvalidIdentifier),

    #[error(transparent)]
    InvalidColumnType(#[from] InvalidColumnType),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub struct SchemaService<P: ConnectionProvider<Handle = PgPool>> {
    cache: Arc<ConnectionCache<P>>,
    tenants: Arc<TenantDirectory>,
}

impl<P: ConnectionProvider<Handle = PgPool>> SchemaService<P> {
    pub fn new(cache: Arc<ConnectionCache<P>>, tenants: Arc<TenantDirectory>) -> Self {
        Self { cache, tenants }
    }

    pub async fn create_or_update_table(
        &self,
        tenant: &str,
        table: &str,
        columns: Vec<ColumnSpec>,
    ) -> Result<TableReconciliation, SchemaError> {
        let table = Identifier::parse("table", table)?;
        let names = validate_columns(&columns)?;

        let binding = self.tenants.resolve(tenant)?;
        let pool = self.cache.acquire(binding.engine, Some(&binding.database)).await?;

        if !catalog::table_exists(&pool, &table).await? {
            let definitions: Vec<(Identifier, &ColumnSpec)> = names.into_iter().zip(columns.iter()).collect();
            sqlx::query(&sql::create_table(&table, &definitions))
                .execute(&pool)
                .await?;

            info!(tenant, table = %table, columns = columns.len(), "Created tenant table");
            return Ok(TableReconciliation {
                table: table.to_string(),
                created: true,
                added: columns.into_iter().map(|c| c.name).collect(),
                ..Default::default()
            });
        }

        let existing = catalog::table_columns(&pool, &table).await?;
        let plan = plan_reconciliation(&existing, &columns);

        let mut outcome = TableReconciliation {
            table: table.to_string(),
            ..Default::default()
        };
        if plan.is_empty() {
            return Ok(outcome);
        }

        let mut tx = pool.begin().await?;
        for change in plan {
            match change {
                ColumnChange::Add(spec) => {
                    let column = Identifier::parse("column", &spec.name)?;
                    sqlx::query(&sql::add_column(&table, &column, &spec))
                        .execute(&mut *tx)
                        .await?;
                    outcome.added.push(spec.name);
                }
                ColumnChange::Retype { column, from, to } => {
                    let ident = Identifier::parse("column", &column)?;
                    let non_null_rows = catalog::count_non_null(&mut *tx, &table, &ident).await?;
                    if non_null_rows > 0 {
                        warn!(
                            tenant,
                            table = %table,
                            column = %column,
                            from = %from,
                            to = %to,
                            non_null_rows,
                            "Column holds data, leaving its type unchanged"
                        );
                        outcome.conflicts.push(ColumnConflict {
                            column,
                            from,
                            to,
                            non_null_rows,
                        });
                        continue;
                    }
                    sqlx::query(&sql::retype_column(&table, &ident, &to))
                        .execute(&mut *tx)
                        .await?;
                    outcome.retyped.push(column);
                }
                ColumnChange::Drop { column } => {
                    let ident = Identifier::parse("column", &column)?;
                    sqlx::query(&sql::drop_column(&table, &ident))
                        .execute(&mut *tx)
                        .await?;
                    outcome.dropped.push(column);
                }
            }
        }
        tx.commit().await?;

        info!(
            tenant,
            table = %table,
            added = outcome.added.len(),
            retyped = outcome.retyped.len(),
            dropped = outcome.dropped.len(),
            conflicts = outcome.conflicts.len(),
            "Reconciled tenant table"
        );
        Ok(outcome)
    }
}

/// Validate names and types up front so nothing runs against a bad request.
fn validate_columns(columns: &[ColumnSpec]) -> Result<Vec<Identifier>, SchemaError> {
    if columns.is_empty() {
        return Err(SchemaError::InvalidRequest("at least one column is required".to_string()));
    }

    let mut seen = HashSet::new();
    let mut names = Vec::with_capacity(columns.len());
    for column in columns {
        let name = Identifier::parse("column", &column.name)?;
        validate_type(&column.data_type)?;
        if !seen.insert(column.name.as_str()) {
            return Err(SchemaError::InvalidRequest(format!(
                "column '{}' is listed more than once",
                column.name
            )));
        }
        names.push(name);
    }
    Ok(names)
}
