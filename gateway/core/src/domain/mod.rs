// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Layer (`polytenant-core`)
//!
//! Technology-agnostic vocabulary of the gateway. Nothing in here talks to a
//! database; infrastructure adapters implement the traits declared here.
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`engine`] | `EngineKind`, `DatabaseTarget`, `ConnectionKey` |
//! | [`connection`] | `PooledHandle` / `ConnectionProvider` contracts, `PoolLimits` |
//! | [`gateway_config`] | YAML configuration manifest |
//! | [`tenant`] | Static tenant → database lookup |
//! | [`schema`] | Column model and reconciliation planning |
//! | [`identifier`] | Validated SQL identifiers |

pub mod engine;
pub mod connection;
pub mod gateway_config;
pub mod tenant;
pub mod schema;
pub mod identifier;
