// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the polytenant CLI

pub mod config;
pub mod connections;
pub mod serve;

pub use self::config::ConfigCommand;
pub use self::connections::ConnectionsCommand;
