// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Table Schema Model
//!
//! Column specifications requested by clients, columns found in the catalog,
//! and the pure three-way diff between them:
//!
//! - requested but missing → **add**
//! - present with a different (normalized) type → **retype**, applied only
//!   when the column holds no non-null data; the check itself needs a
//!   database, so the plan only proposes it
//! - present but not requested → **drop**, except primary-key columns

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static TYPE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?P<name>[a-z_][a-z0-9_]*(?:\s+[a-z_][a-z0-9_]*)*)\s*(?:\(\s*\d+\s*(?:,\s*\d+\s*)?\))?(?P<zone>\s+with(?:out)?\s+time\s+zone)?(?:\s*\[\])?$",
    )
    .expect("invalid column type regex")
});

/// Type names made of more than one word. Any other name must be one word.
const MULTI_WORD_TYPES: &[&str] = &[
    "double precision",
    "character varying",
    "bit varying",
    "timestamp with time zone",
    "timestamp without time zone",
    "time with time zone",
    "time without time zone",
];

/// A column as requested by a createOrUpdateTable call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,

    #[serde(rename = "type")]
    pub data_type: String,

    #[serde(default)]
    pub primary: bool,

    #[serde(default = "default_nullable")]
    pub nullable: bool,
}

fn default_nullable() -> bool {
    true
}

/// A column as it currently exists in the database catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingColumn {
    pub name: String,
    pub data_type: String,
    pub primary: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnChange {
    Add(ColumnSpec),
    Retype {
        column: String,
        from: String,
        to: String,
    },
    Drop {
        column: String,
    },
}

/// A retype that was refused because the column still holds data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnConflict {
    pub column: String,
    pub from: String,
    pub to: String,
    pub non_null_rows: i64,
}

/// Outcome of one createOrUpdateTable call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableReconciliation {
    pub table: String,
    pub created: bool,
    pub added: Vec<String>,
    pub retyped: Vec<String>,
    pub dropped: Vec<String>,
    pub conflicts: Vec<ColumnConflict>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid column type '{0}'")]
pub struct InvalidColumnType(pub String);

/// Accept a type name with optional precision arguments, an optional time
/// zone qualifier (`time`/`timestamp` only) and an optional array suffix.
///
/// Names are one word unless listed in `MULTI_WORD_TYPES`, so column
/// clauses (`DEFAULT`, `REFERENCES`, `NOT NULL`, ...) cannot ride along.
pub fn validate_type(raw: &str) -> Result<(), InvalidColumnType> {
    let invalid = || InvalidColumnType(raw.to_string());
    let caps = TYPE_RE.captures(raw.trim()).ok_or_else(invalid)?;

    let name = caps["name"]
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase();

    if name.contains(' ') && !MULTI_WORD_TYPES.contains(&name.as_str()) {
        return Err(invalid());
    }
    if caps.name("zone").is_some() && name != "timestamp" && name != "time" {
        return Err(invalid());
    }
    Ok(())
}

/// Canonical spelling of a type name so that aliases compare equal
/// (`int` / `int4` / `integer`, `varchar(20)` / `character varying(20)`).
pub fn normalize_type(raw: &str) -> String {
    let collapsed = raw
        .trim()
        .to_ascii_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    let (body, array) = match collapsed.strip_suffix("[]") {
        Some(body) => (body.trim_end().to_string(), true),
        None => (collapsed.clone(), false),
    };

    let (base, args) = match body.find('(') {
        Some(open) => {
            let close = match body.rfind(')') {
                Some(close) if close > open => close,
                _ => return collapsed,
            };
            // Modifiers in the middle ("timestamp(3) with time zone") are left as written.
            if close + 1 != body.len() {
                return collapsed;
            }
            let args: String = body[open..=close].chars().filter(|c| !c.is_whitespace()).collect();
            (body[..open].trim_end().to_string(), Some(args))
        }
        None => (body, None),
    };

    let canonical = match base.as_str() {
        "int" | "int4" | "integer" | "serial" | "serial4" => "integer",
        "int8" | "bigint" | "bigserial" | "serial8" => "bigint",
        "int2" | "smallint" | "smallserial" | "serial2" => "smallint",
        "bool" | "boolean" => "boolean",
        "varchar" | "character varying" => "character varying",
        "char" | "character" | "bpchar" => "character",
        "float" | "float8" | "double precision" => "double precision",
        "float4" | "real" => "real",
        "decimal" | "numeric" => "numeric",
        "timestamptz" | "timestamp with time zone" => "timestamp with time zone",
        "timestamp" | "timestamp without time zone" => "timestamp without time zone",
        "timetz" | "time with time zone" => "time with time zone",
        "time" | "time without time zone" => "time without time zone",
        other => other,
    };

    let mut normalized = canonical.to_string();
    match args {
        Some(args) => normalized.push_str(&args),
        None if canonical == "character" => normalized.push_str("(1)"),
        None => {}
    }
    if array {
        normalized.push_str("[]");
    }
    normalized
}

/// Diff the catalog against the requested column set.
///
/// Adds come first in requested order, then retypes in requested order, then
/// drops in catalog order. Primary-key columns are never dropped.
pub fn plan_reconciliation(existing: &[ExistingColumn], requested: &[ColumnSpec]) -> Vec<ColumnChange> {
    let mut adds = Vec::new();
    let mut retypes = Vec::new();

    for spec in requested {
        match existing.iter().find(|col| col.name == spec.name) {
            None => adds.push(ColumnChange::Add(spec.clone())),
            Some(col) if normalize_type(&col.data_type) != normalize_type(&spec.data_type) => {
                retypes.push(ColumnChange::Retype {
                    column: spec.name.clone(),
                    from: col.data_type.clone(),
                    to: spec.data_type.clone(),
                });
            }
            Some(_) => {}
        }
    }

    let drops = existing
        .iter()
        .filter(|col| !col.primary)
        .filter(|col| !requested.iter().any(|spec| spec.name == col.name))
        .map(|col| ColumnChange::Drop {
            column: col.name.clone(),
        });

    adds.into_iter().chain(retypes).chain(drops).collect()
}
