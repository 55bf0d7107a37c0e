// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! HTTP API
//!
//! | Method & path | Handler |
//! |---|---|
//! | `GET /health` | liveness and uptime |
//! | `PUT /api/tenants/{tenant}/tables/{table}` | create or reconcile a table |
//! | `POST /api/tenants/{tenant}/tables/{table}/rows` | insert rows |
//! | `POST /api/tenants/{tenant}/tables/{table}/rows/query` | filtered read |
//! | `PATCH /api/tenants/{tenant}/tables/{table}/rows` | filtered update |
//! | `DELETE /api/tenants/{tenant}/tables/{table}/rows` | filtered delete |
//! | `POST /admin/databases` | create a database |
//! | `GET /admin/connections` | connection cache stats |
//! | `POST /admin/connections/cleanup` | on-demand idle sweep |

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;

use crate::application::connection_cache::{CacheStats, ConnectionCache, SweepReport};
use crate::application::database_admin::{DatabaseAdminService, DatabaseCreation};
use crate::application::schema_service::SchemaService;
use crate::application::tenant_data::TenantDataService;
use crate::domain::schema::TableReconciliation;
use crate::domain::tenant::TenantDirectory;
use crate::infrastructure::postgres::PostgresProvider;
use crate::presentation::dto::{
    CreateDatabaseRequest, CreateDatabaseResponse, CreateTableRequest, DeleteRowsRequest, DeleteRowsResponse,
    HealthResponse, InsertRowsRequest, QueryRowsRequest, RowsResponse, UpdateRowsRequest,
};
use crate::presentation::error::ApiError;

pub type GatewayCache = ConnectionCache<PostgresProvider>;

pub struct AppState {
    pub cache: Arc<GatewayCache>,
    pub schema_service: SchemaService<PostgresProvider>,
    pub data_service: TenantDataService<PostgresProvider>,
    pub admin_service: DatabaseAdminService<PostgresProvider>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(cache: Arc<GatewayCache>, tenants: TenantDirectory) -> Self {
        let tenants = Arc::new(tenants);
        Self {
            schema_service: SchemaService::new(cache.clone(), tenants.clone()),
            data_service: TenantDataService::new(cache.clone(), tenants),
            admin_service: DatabaseAdminService::new(cache.clone()),
            cache,
            start_time: Instant::now(),
        }
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/tenants/{tenant}/tables/{table}", put(create_or_update_table_handler))
        .route(
            "/api/tenants/{tenant}/tables/{table}/rows",
            post(insert_rows_handler)
                .patch(update_rows_handler)
                .delete(delete_rows_handler),
        )
        .route("/api/tenants/{tenant}/tables/{table}/rows/query", post(query_rows_handler))
        .route("/admin/databases", post(create_database_handler))
        .route("/admin/connections", get(connection_stats_handler))
        .route("/admin/connections/cleanup", post(connection_cleanup_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let status = if state.cache.is_shut_down() { "shutting_down" } else { "healthy" };
    Json(HealthResponse {
        status: status.to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        cached_connections: state.cache.len(),
    })
}

async fn create_or_update_table_handler(
    State(state): State<Arc<AppState>>,
    Path((tenant, table)): Path<(String, String)>,
    Json(request): Json<CreateTableRequest>,
) -> Result<Json<TableReconciliation>, ApiError> {
    let outcome = state
        .schema_service
        .create_or_update_table(&tenant, &table, request.columns)
        .await?;
    Ok(Json(outcome))
}

async fn insert_rows_handler(
    State(state): State<Arc<AppState>>,
    Path((tenant, table)): Path<(String, String)>,
    Json(request): Json<InsertRowsRequest>,
) -> Result<(StatusCode, Json<RowsResponse>), ApiError> {
    let rows = state.data_service.insert_data(&tenant, &table, request.rows).await?;
    Ok((StatusCode::CREATED, Json(rows.into())))
}

async fn query_rows_handler(
    State(state): State<Arc<AppState>>,
    Path((tenant, table)): Path<(String, String)>,
    Json(request): Json<QueryRowsRequest>,
) -> Result<Json<RowsResponse>, ApiError> {
    let rows = state
        .data_service
        .get_data(&tenant, &table, request.filter, request.limit, request.offset)
        .await?;
    Ok(Json(rows.into()))
}

async fn update_rows_handler(
    State(state): State<Arc<AppState>>,
    Path((tenant, table)): Path<(String, String)>,
    Json(request): Json<UpdateRowsRequest>,
) -> Result<Json<RowsResponse>, ApiError> {
    let rows = state
        .data_service
        .find_and_update(&tenant, &table, request.filter, request.changes)
        .await?;
    Ok(Json(rows.into()))
}

async fn delete_rows_handler(
    State(state): State<Arc<AppState>>,
    Path((tenant, table)): Path<(String, String)>,
    Json(request): Json<DeleteRowsRequest>,
) -> Result<Json<DeleteRowsResponse>, ApiError> {
    let deleted = state.data_service.delete_data(&tenant, &table, request.filter).await?;
    Ok(Json(DeleteRowsResponse { deleted }))
}

async fn create_database_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateDatabaseRequest>,
) -> Result<(StatusCode, Json<CreateDatabaseResponse>), ApiError> {
    let status = state
        .admin_service
        .create_database(&request.engine, &request.database)
        .await?;
    let code = match status {
        DatabaseCreation::Created => StatusCode::CREATED,
        DatabaseCreation::AlreadyExists => StatusCode::OK,
    };
    Ok((
        code,
        Json(CreateDatabaseResponse {
            engine: request.engine,
            database: request.database,
            status,
        }),
    ))
}

async fn connection_stats_handler(State(state): State<Arc<AppState>>) -> Json<CacheStats> {
    Json(state.cache.stats())
}

async fn connection_cleanup_handler(State(state): State<Arc<AppState>>) -> Json<SweepReport> {
    Json(state.cache.manual_cleanup().await)
}
