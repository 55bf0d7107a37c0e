// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Statement builders
//!
//! Every identifier reaching this module is an [`Identifier`], so quoting is
//! the only escaping needed. Values always travel as bind parameters: rows
//! and filters are bound as JSONB and expanded server-side with
//! `jsonb_populate_record(set)`, using the table's own row type.

use crate::domain::identifier::Identifier;
use crate::domain::schema::ColumnSpec;

fn column_list(columns: &[Identifier]) -> String {
    columns.iter().map(Identifier::quoted).collect::<Vec<_>>().join(", ")
}

/// `$1`: JSONB array of row objects.
pub fn insert_rows(table: &Identifier, columns: &[Identifier]) -> String {
    let t = table.quoted();
    let cols = column_list(columns);
    format!(
        "INSERT INTO {t} AS t ({cols}) SELECT {cols} FROM jsonb_populate_recordset(NULL::{t}, $1) RETURNING to_jsonb(t) AS row"
    )
}

/// `$1`: JSONB filter object, `$2`: limit, `$3`: offset.
pub fn select_rows(table: &Identifier) -> String {
    format!(
        "SELECT to_jsonb(t) AS row FROM {} AS t WHERE to_jsonb(t) @> $1 LIMIT $2 OFFSET $3",
        table.quoted()
    )
}

/// `$1`: JSONB filter object, `$2`: JSONB object of new values.
pub fn update_rows(table: &Identifier, columns: &[Identifier]) -> String {
    let t = table.quoted();
    let assignments = columns
        .iter()
        .map(|c| {
            let c = c.quoted();
            format!("{c} = (jsonb_populate_record(NULL::{t}, $2)).{c}")
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("UPDATE {t} AS t SET {assignments} WHERE to_jsonb(t) @> $1 RETURNING to_jsonb(t) AS row")
}

/// `$1`: JSONB filter object.
pub fn delete_rows(table: &Identifier) -> String {
    format!("DELETE FROM {} AS t WHERE to_jsonb(t) @> $1", table.quoted())
}

fn column_definition(column: &Identifier, spec: &ColumnSpec) -> String {
    let mut def = format!("{} {}", column.quoted(), spec.data_type.trim());
    if !spec.nullable && !spec.primary {
        def.push_str(" NOT NULL");
    }
    def
}

/// `columns` pairs each validated name with its requested spec.
pub fn create_table(table: &Identifier, columns: &[(Identifier, &ColumnSpec)]) -> String {
    let mut parts: Vec<String> = columns
        .iter()
        .map(|(name, spec)| column_definition(name, spec))
        .collect();

    let primary: Vec<String> = columns
        .iter()
        .filter(|(_, spec)| spec.primary)
        .map(|(name, _)| name.quoted())
        .collect();
    if !primary.is_empty() {
        parts.push(format!("PRIMARY KEY ({})", primary.join(", ")));
    }

    format!("CREATE TABLE {} ({})", table.quoted(), parts.join(", "))
}

pub fn add_column(table: &Identifier, column: &Identifier, spec: &ColumnSpec) -> String {
    format!(
        "ALTER TABLE {} ADD COLUMN {}",
        table.quoted(),
        column_definition(column, spec)
    )
}

/// Only issued for columns holding no data, so the old values are discarded.
pub fn retype_column(table: &Identifier, column: &Identifier, data_type: &str) -> String {
    let data_type = data_type.trim();
    format!(
        "ALTER TABLE {} ALTER COLUMN {} TYPE {data_type} USING NULL::{data_type}",
        table.quoted(),
        column.quoted()
    )
}

pub fn drop_column(table: &Identifier, column: &Identifier) -> String {
    format!("ALTER TABLE {} DROP COLUMN {}", table.quoted(), column.quoted())
}

pub fn count_non_null(table: &Identifier, column: &Identifier) -> String {
    format!(
        "SELECT COUNT(*) FROM {} WHERE {} IS NOT NULL",
        table.quoted(),
        column.quoted()
    )
}

pub fn create_database(database: &Identifier) -> String {
    format!("CREATE DATABASE {}", database.quoted())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(value: &str) -> Identifier {
        Identifier::parse("column", value).unwrap()
    }

    fn spec(name: &str, data_type: &str, primary: bool, nullable: bool) -> ColumnSpec {
        ColumnSpec {
            name: name.to_string(),
            data_type: data_type.to_string(),
            primary,
            nullable,
        }
    }

    #[test]
    fn test_insert_rows() {
        let sql = insert_rows(&ident("users"), &[ident("id"), ident("name")]);
        assert_eq!(
            sql,
            r#"INSERT INTO "users" AS t ("id", "name") SELECT "id", "name" FROM jsonb_populate_recordset(NULL::"users", $1) RETURNING to_jsonb(t) AS row"#
        );
    }

    #[test]
    fn test_update_rows() {
        let sql = update_rows(&ident("users"), &[ident("name")]);
        assert_eq!(
            sql,
            r#"UPDATE "users" AS t SET "name" = (jsonb_populate_record(NULL::"users", $2))."name" WHERE to_jsonb(t) @> $1 RETURNING to_jsonb(t) AS row"#
        );
    }

    #[test]
    fn test_create_table_with_primary_key() {
        let id = spec("id", "bigint", true, false);
        let email = spec("email", "varchar(255)", false, false);
        let note = spec("note", "text", false, true);
        let sql = create_table(
            &ident("accounts"),
            &[(ident("id"), &id), (ident("email"), &email), (ident("note"), &note)],
        );
        assert_eq!(
            sql,
            r#"CREATE TABLE "accounts" ("id" bigint, "email" varchar(255) NOT NULL, "note" text, PRIMARY KEY ("id"))"#
        );
    }

    #[test]
    fn test_retype_discards_values() {
        let sql = retype_column(&ident("accounts"), &ident("age"), " bigint ");
        assert_eq!(
            sql,
            r#"ALTER TABLE "accounts" ALTER COLUMN "age" TYPE bigint USING NULL::bigint"#
        );
    }

    #[test]
    fn test_select_and_delete_use_containment() {
        assert!(select_rows(&ident("t1")).contains("to_jsonb(t) @> $1"));
        assert_eq!(
            delete_rows(&ident("t1")),
            r#"DELETE FROM "t1" AS t WHERE to_jsonb(t) @> $1"#
        );
    }
}
