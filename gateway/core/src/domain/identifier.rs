// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Validated SQL identifiers
//!
//! Table, column and database names arrive from HTTP paths and JSON bodies
//! and end up spliced into statements. They are only ever used through
//! [`Identifier`], which guarantees the PostgreSQL unquoted-identifier shape
//! and renders double-quoted.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// 63 bytes is PostgreSQL's NAMEDATALEN - 1.
static IDENTIFIER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").expect("invalid identifier regex")
});

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} name '{value}': must match [A-Za-z_][A-Za-z0-9_]* and be at most 63 characters")]
pub struct InvalidIdentifier {
    pub kind: &'static str,
    pub value: String,
}

/// A table, column or database name safe to embed in SQL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(String);

impl Identifier {
    /// `kind` names what the identifier is for in the error message
    /// ("table", "column", "database").
    pub fn parse(kind: &'static str, value: &str) -> Result<Self, InvalidIdentifier> {
        if IDENTIFIER_RE.is_match(value) {
            Ok(Self(value.to_string()))
        } else {
            Err(InvalidIdentifier {
                kind,
                value: value.to_string(),
            })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Double-quoted form for use in statements.
    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.0)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
