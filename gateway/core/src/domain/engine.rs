// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Engine kinds and cache keys
//!
//! A cache slot is identified by a [`ConnectionKey`]: the engine kind plus
//! either the engine's base connection or a named tenant database. The base
//! slot is an explicit variant, so a tenant database literally called
//! `default` never shares a slot with the base connection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Relational engine families the gateway knows how to name.
///
/// Knowing a name is not the same as supporting it: an engine is usable only
/// when the running provider has a base connection configured for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EngineKind {
    Postgres,
    MySql,
    MsSql,
}

impl EngineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::Postgres => "postgres",
            EngineKind::MySql => "mysql",
            EngineKind::MsSql => "mssql",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when an engine name matches no known engine family.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown database engine '{0}'")]
pub struct UnknownEngine(pub String);

impl FromStr for EngineKind {
    type Err = UnknownEngine;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(EngineKind::Postgres),
            "mysql" | "mariadb" => Ok(EngineKind::MySql),
            "mssql" | "sqlserver" => Ok(EngineKind::MsSql),
            _ => Err(UnknownEngine(s.to_string())),
        }
    }
}

impl TryFrom<String> for EngineKind {
    type Error = UnknownEngine;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EngineKind> for String {
    fn from(kind: EngineKind) -> Self {
        kind.as_str().to_string()
    }
}

/// Which database on an engine a cache slot points at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DatabaseTarget {
    /// The engine's template connection, created at startup.
    Base,
    /// A tenant database, provisioned lazily from the base template.
    Named(String),
}

impl DatabaseTarget {
    pub fn from_optional(database: Option<&str>) -> Self {
        match database {
            Some(name) => DatabaseTarget::Named(name.to_string()),
            None => DatabaseTarget::Base,
        }
    }

    pub fn is_base(&self) -> bool {
        matches!(self, DatabaseTarget::Base)
    }

    pub fn database_name(&self) -> Option<&str> {
        match self {
            DatabaseTarget::Base => None,
            DatabaseTarget::Named(name) => Some(name),
        }
    }
}

impl fmt::Display for DatabaseTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseTarget::Base => f.write_str("<base>"),
            DatabaseTarget::Named(name) => f.write_str(name),
        }
    }
}

/// Uniquely identifies one slot of the connection cache.
///
/// Ordering is lexical on `(engine, target)` and is what capacity eviction
/// uses to break ties between entries with identical `last_used`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionKey {
    pub engine: EngineKind,
    pub target: DatabaseTarget,
}

impl ConnectionKey {
    pub fn new(engine: EngineKind, target: DatabaseTarget) -> Self {
        Self { engine, target }
    }

    pub fn base(engine: EngineKind) -> Self {
        Self::new(engine, DatabaseTarget::Base)
    }

    pub fn named(engine: EngineKind, database: impl Into<String>) -> Self {
        Self::new(engine, DatabaseTarget::Named(database.into()))
    }

    pub fn is_base(&self) -> bool {
        self.target.is_base()
    }
}

impl fmt::Display for ConnectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.engine, self.target)
    }
}
