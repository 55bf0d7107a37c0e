// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Polytenant core
//!
//! Multi-tenant data gateway: a process-wide connection-pool cache keyed by
//! `(engine, database)`, the CRUD and schema services that funnel through it,
//! and the HTTP surface exposing both.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Wires domain, application, infrastructure and presentation

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
