// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Tenant resolution
//!
//! Static lookup table from tenant id to the `(engine, database)` pair its
//! data lives in. Loaded from the `tenants:` section of the gateway config.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::engine::EngineKind;

/// Where one tenant's data lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantBinding {
    pub engine: EngineKind,
    pub database: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TenantError {
    #[error("tenant '{0}' not found")]
    NotFound(String),
}

#[derive(Debug, Clone, Default)]
pub struct TenantDirectory {
    bindings: BTreeMap<String, TenantBinding>,
}

impl TenantDirectory {
    pub fn new(bindings: BTreeMap<String, TenantBinding>) -> Self {
        Self { bindings }
    }

    /// Tenant ids are matched exactly.
    pub fn resolve(&self, tenant: &str) -> Result<&TenantBinding, TenantError> {
        self.bindings
            .get(tenant)
            .ok_or_else(|| TenantError::NotFound(tenant.to_string()))
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &TenantBinding)> {
        self.bindings.iter()
    }
}
