// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Database Administration Service
//!
//! Creates physical databases through an engine's base connection. Creation
//! is idempotent: an existing database, or one created concurrently by
//! another caller, reports [`DatabaseCreation::AlreadyExists`].

use serde::{Deserialize, Serialize};
use sqlx::postgres::PgPool;
use std::sync::Arc;
use tracing::info;

use crate::application::connection_cache::{ConnectionCache, ConnectionCacheError};
use crate::domain::connection::ConnectionProvider;
use crate::domain::identifier::{Identifier, InvalidIdentifier};
use crate::infrastructure::postgres::catalog;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatabaseCreation {
    Created,
    AlreadyExists,
}

#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error(transparent)]
    Connection(#[from] ConnectionCacheError),

    #[error(transparent)]
    InvalidIdentifier(#[from] InvalidIdentifier),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub struct DatabaseAdminService<P: ConnectionProvider<Handle = PgPool>> {
    cache: Arc<ConnectionCache<P>>,
}

impl<P: ConnectionProvider<Handle = PgPool>> DatabaseAdminService<P> {
    pub fn new(cache: Arc<ConnectionCache<P>>) -> Self {
        Self { cache }
    }

    pub async fn create_database(&self, engine: &str, database: &str) -> Result<DatabaseCreation, AdminError> {
        let database = Identifier::parse("database", database)?;
        let base = self.cache.acquire_by_name(engine, None).await?;

        if catalog::database_exists(&base, &database).await? {
            info!(engine, database = %database, "Database already exists");
            return Ok(DatabaseCreation::AlreadyExists);
        }

        match catalog::create_database(&base, &database).await {
            Ok(()) => {
                info!(engine, database = %database, "Created database");
                Ok(DatabaseCreation::Created)
            }
            Err(e) if catalog::is_duplicate_database(&e) => {
                info!(engine, database = %database, "Database created concurrently");
                Ok(DatabaseCreation::AlreadyExists)
            }
            Err(e) => Err(e.into()),
        }
    }
}
