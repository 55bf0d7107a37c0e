// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Connection cache commands against a running gateway
//!
//! Commands: stats, cleanup

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use polytenant_core::application::{CacheStats, SweepReport};

use crate::server::GatewayClient;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;

#[derive(Subcommand)]
pub enum ConnectionsCommand {
    /// Show connection cache statistics
    Stats {
        /// Print the raw JSON response
        #[arg(long)]
        json: bool,
    },

    /// Evict idle tenant connections now
    Cleanup,
}

pub async fn handle_command(command: ConnectionsCommand, host: Option<&str>, port: Option<u16>) -> Result<()> {
    let client = GatewayClient::new(host.unwrap_or(DEFAULT_HOST), port.unwrap_or(DEFAULT_PORT))?;

    match command {
        ConnectionsCommand::Stats { json } => {
            let stats = client.connection_stats().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print_stats(&stats);
            }
        }
        ConnectionsCommand::Cleanup => {
            let report = client.cleanup().await?;
            print_sweep(&report);
        }
    }

    Ok(())
}

fn print_stats(stats: &CacheStats) {
    println!("{}", "Connection cache:".bold());
    println!(
        "  Entries: {} ({} tenant / max {}), {} initializing",
        stats.entry_count, stats.tenant_entries, stats.max_entries, stats.pending
    );
    println!("  Idle TTL: {}s", stats.idle_ttl_seconds);
    println!(
        "  Hits: {}  Misses: {}  Created: {}",
        stats.hits, stats.misses, stats.created
    );
    let failures = if stats.eviction_failures > 0 {
        stats.eviction_failures.to_string().red().to_string()
    } else {
        stats.eviction_failures.to_string()
    };
    println!(
        "  Evicted: {} idle, {} capacity  Close failures: {}",
        stats.evicted_idle, stats.evicted_capacity, failures
    );
    println!();

    if stats.entries.is_empty() {
        println!("  {}", "(no cached connections)".dimmed());
        return;
    }

    println!(
        "  {:<10} {:<24} {:>10} {:>10} {:>8}",
        "ENGINE", "DATABASE", "AGE", "IDLE", "USES"
    );
    for entry in &stats.entries {
        let database = match &entry.database {
            Some(name) => name.clone(),
            None => "<base>".dimmed().to_string(),
        };
        println!(
            "  {:<10} {:<24} {:>9}s {:>9}s {:>8}",
            entry.engine.to_string(),
            database,
            entry.age_seconds,
            entry.idle_seconds,
            entry.acquisitions
        );
    }
}

fn print_sweep(report: &SweepReport) {
    println!(
        "{}",
        format!(
            "✓ Cleanup finished: {} scanned, {} evicted",
            report.scanned, report.evicted
        )
        .green()
    );
    for failure in &report.failures {
        println!(
            "  {} {}/{}: {}",
            "✗".red(),
            failure.engine,
            failure.database.as_deref().unwrap_or("<base>"),
            failure.error
        );
    }
}
