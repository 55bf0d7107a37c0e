// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `polytenant serve`

use anyhow::Result;
use std::path::PathBuf;
use tracing::info;

use crate::server;

pub async fn handle_command(config_override: Option<PathBuf>, host: Option<String>, port: Option<u16>) -> Result<()> {
    info!("Starting polytenant gateway");
    server::start_server(config_override, host, port).await
}
