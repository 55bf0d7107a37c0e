// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! HTTP error mapping
//!
//! Every failure renders as `{"error": <code>, "message": <text>}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use crate::application::connection_cache::ConnectionCacheError;
use crate::application::database_admin::AdminError;
use crate::application::schema_service::SchemaError;
use crate::application::tenant_data::DataError;
use crate::domain::identifier::InvalidIdentifier;
use crate::domain::schema::InvalidColumnType;
use crate::domain::tenant::TenantError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_request", message)
    }

    fn database(err: sqlx::Error) -> Self {
        error!(error = %err, "Database operation failed");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "database_error", err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.code,
            "message": self.message,
        }));
        (self.status, body).into_response()
    }
}

impl From<ConnectionCacheError> for ApiError {
    fn from(err: ConnectionCacheError) -> Self {
        let message = err.to_string();
        match err {
            ConnectionCacheError::UnsupportedEngine(_) => {
                Self::new(StatusCode::BAD_REQUEST, "unsupported_engine", message)
            }
            ConnectionCacheError::ConnectionInitFailure { .. } => {
                Self::new(StatusCode::SERVICE_UNAVAILABLE, "connection_init_failure", message)
            }
            ConnectionCacheError::ShutDown => Self::new(StatusCode::SERVICE_UNAVAILABLE, "shut_down", message),
        }
    }
}

impl From<TenantError> for ApiError {
    fn from(err: TenantError) -> Self {
        Self::new(StatusCode::NOT_FOUND, "tenant_not_found", err.to_string())
    }
}

impl From<InvalidIdentifier> for ApiError {
    fn from(err: InvalidIdentifier) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_identifier", err.to_string())
    }
}

impl From<InvalidColumnType> for ApiError {
    fn from(err: InvalidColumnType) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_column_type", err.to_string())
    }
}

impl From<DataError> for ApiError {
    fn from(err: DataError) -> Self {
        match err {
            DataError::Tenant(e) => e.into(),
            DataError::Connection(e) => e.into(),
            DataError::InvalidIdentifier(e) => e.into(),
            DataError::InvalidRequest(message) => Self::bad_request(message),
            DataError::Database(e) => Self::database(e),
        }
    }
}

impl From<SchemaError> for ApiError {
    fn from(err: SchemaError) -> Self {
        match err {
            SchemaError::Tenant(e) => e.into(),
            SchemaError::Connection(e) => e.into(),
            SchemaError::InvalidIdentifier(e) => e.into(),
            SchemaError::InvalidColumnType(e) => e.into(),
            SchemaError::InvalidRequest(message) => Self::bad_request(message),
            SchemaError::Database(e) => Self::database(e),
        }
    }
}

impl From<AdminError> for ApiError {
    fn from(err: AdminError) -> Self {
        match err {
            AdminError::Connection(e) => e.into(),
            AdminError::InvalidIdentifier(e) => e.into(),
            AdminError::Database(e) => Self::database(e),
        }
    }
}
