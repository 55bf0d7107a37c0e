// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Request and response bodies

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::application::database_admin::DatabaseCreation;
use crate::domain::schema::ColumnSpec;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateTableRequest {
    pub columns: Vec<ColumnSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InsertRowsRequest {
    pub rows: Vec<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryRowsRequest {
    #[serde(default)]
    pub filter: Map<String, Value>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRowsRequest {
    pub filter: Map<String, Value>,
    pub changes: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteRowsRequest {
    pub filter: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowsResponse {
    pub count: usize,
    pub rows: Vec<Value>,
}

impl From<Vec<Value>> for RowsResponse {
    fn from(rows: Vec<Value>) -> Self {
        Self {
            count: rows.len(),
            rows,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteRowsResponse {
    pub deleted: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDatabaseRequest {
    pub engine: String,
    pub database: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDatabaseResponse {
    pub engine: String,
    pub database: String,
    pub status: DatabaseCreation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_seconds: u64,
    pub cached_connections: usize,
}
