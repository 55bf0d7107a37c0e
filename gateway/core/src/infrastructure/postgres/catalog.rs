// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Catalog queries
//!
//! Table and column introspection scoped to `current_schema()`, plus the
//! database-level statements used by administration.

use sqlx::postgres::{PgPool, Postgres};
use sqlx::{Executor, Row};

use crate::domain::identifier::Identifier;
use crate::domain::schema::ExistingColumn;
use crate::infrastructure::postgres::sql;

/// `duplicate_database`
const SQLSTATE_DUPLICATE_DATABASE: &str = "42P04";
/// `unique_violation`, raised on `pg_database` when two creators race.
const SQLSTATE_UNIQUE_VIOLATION: &str = "23505";

pub async fn table_exists(pool: &PgPool, table: &Identifier) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        SELECT EXISTS (
            SELECT 1
            FROM pg_class c
            JOIN pg_namespace n ON n.oid = c.relnamespace
            WHERE n.nspname = current_schema()
              AND c.relname = $1
              AND c.relkind IN ('r', 'p')
        )
        "#,
    )
    .bind(table.as_str())
    .fetch_one(pool)
    .await
}

/// Columns in ordinal order with their formatted type and primary-key membership.
pub async fn table_columns(pool: &PgPool, table: &Identifier) -> Result<Vec<ExistingColumn>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT
            a.attname::text AS name,
            format_type(a.atttypid, a.atttypmod) AS data_type,
            COALESCE(bool_or(i.indisprimary), false) AS is_primary
        FROM pg_attribute a
        JOIN pg_class c ON c.oid = a.attrelid
        JOIN pg_namespace n ON n.oid = c.relnamespace
        LEFT JOIN pg_index i
            ON i.indrelid = c.oid
           AND i.indisprimary
           AND a.attnum = ANY(i.indkey)
        WHERE n.nspname = current_schema()
          AND c.relname = $1
          AND a.attnum > 0
          AND NOT a.attisdropped
        GROUP BY a.attnum, a.attname, a.atttypid, a.atttypmod
        ORDER BY a.attnum
        "#,
    )
    .bind(table.as_str())
    .fetch_all(pool)
    .await?;

    let mut columns = Vec::with_capacity(rows.len());
    for row in rows {
        columns.push(ExistingColumn {
            name: row.try_get("name")?,
            data_type: row.try_get("data_type")?,
            primary: row.try_get("is_primary")?,
        });
    }
    Ok(columns)
}

pub async fn count_non_null<'c, E>(executor: E, table: &Identifier, column: &Identifier) -> Result<i64, sqlx::Error>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_scalar(&sql::count_non_null(table, column))
        .fetch_one(executor)
        .await
}

pub async fn database_exists(pool: &PgPool, database: &Identifier) -> Result<bool, sqlx::Error> {
    let found: Option<i32> = sqlx::query_scalar("SELECT 1 FROM pg_database WHERE datname = $1")
        .bind(database.as_str())
        .fetch_optional(pool)
        .await?;
    Ok(found.is_some())
}

pub async fn create_database(pool: &PgPool, database: &Identifier) -> Result<(), sqlx::Error> {
    sqlx::query(&sql::create_database(database))
        .execute(pool)
        .await?;
    Ok(())
}

/// Whether `err` means the database already exists.
pub fn is_duplicate_database(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .map(|code| code == SQLSTATE_DUPLICATE_DATABASE || code == SQLSTATE_UNIQUE_VIOLATION)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_errors_are_not_duplicates() {
        assert!(!is_duplicate_database(&sqlx::Error::RowNotFound));
        assert!(!is_duplicate_database(&sqlx::Error::PoolTimedOut));
    }
}
