// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Configuration management commands
//!
//! Commands: show, validate, generate

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;
use std::path::PathBuf;

use polytenant_core::domain::gateway_config::{GatewayConfigManifest, CONFIG_PATH_ENV};

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Show config file paths checked
        #[arg(long)]
        paths: bool,
    },

    /// Validate configuration file
    Validate {
        /// Path to config file (default: discover)
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Generate sample configuration
    Generate {
        /// Output path (default: ./polytenant-config.yaml)
        #[arg(short, long, default_value = "./polytenant-config.yaml")]
        output: PathBuf,

        /// Include examples and comments
        #[arg(long)]
        examples: bool,
    },
}

pub async fn handle_command(command: ConfigCommand, config_override: Option<PathBuf>) -> Result<()> {
    match command {
        ConfigCommand::Show { paths } => show(config_override, paths).await,
        ConfigCommand::Validate { file } => validate(file.or(config_override)).await,
        ConfigCommand::Generate { output, examples } => generate(output, examples).await,
    }
}

async fn show(config_override: Option<PathBuf>, show_paths: bool) -> Result<()> {
    let config = GatewayConfigManifest::load_or_default(config_override.clone())
        .context("Failed to load configuration")?;

    if show_paths {
        println!("{}", "Configuration discovery paths:".bold());
        if let Some(path) = &config_override {
            println!("  1. --config flag: {}", path.display());
        } else {
            println!("  1. --config flag: {}", "(not set)".dimmed());
        }
        println!(
            "  2. {}: {}",
            CONFIG_PATH_ENV,
            std::env::var(CONFIG_PATH_ENV)
                .unwrap_or_else(|_| "(not set)".to_string())
                .dimmed()
        );
        println!("  3. ./polytenant-config.yaml");
        println!("  4. ~/.polytenant/config.yaml");
        println!("  5. /etc/polytenant/config.yaml");
        println!();
    }

    let spec = &config.spec;
    println!("{}", "Current configuration:".bold());
    println!();

    println!("{}", "Gateway:".bold());
    println!("  Name: {}", config.metadata.name);
    println!("  Listen: {}:{}", spec.server.bind_address, spec.server.port);
    println!();

    println!("{}", "Engines:".bold());
    if spec.engines.is_empty() {
        println!("  {}", "(none configured)".dimmed());
    }
    for engine in &spec.engines {
        println!("  {} {}", engine.kind.to_string().bold(), redact_url(&engine.url));
        println!("    Base pool size: {}", engine.max_connections);
    }
    println!();

    println!("{}", "Connection cache:".bold());
    println!("  Max tenant entries: {}", spec.cache.max_entries);
    println!("  Idle TTL: {:?}", spec.cache.idle_ttl);
    println!(
        "  Reaper: every {:?}{}",
        spec.cache.reap_interval,
        if spec.cache.reaper_enabled { "" } else { " (disabled)" }
    );
    println!(
        "  Tenant pools: {}..{} connections, idle timeout {:?}, acquire timeout {:?}",
        spec.pool.min_connections, spec.pool.max_connections, spec.pool.idle_timeout, spec.pool.acquire_timeout
    );
    println!();

    println!("{}", "Tenants:".bold());
    if spec.tenants.is_empty() {
        println!("  {}", "(none configured)".dimmed());
    }
    for (tenant, binding) in &spec.tenants {
        println!("  {} → {}/{}", tenant, binding.engine, binding.database);
    }
    println!();

    Ok(())
}

async fn validate(config_path: Option<PathBuf>) -> Result<()> {
    println!("Validating configuration...");

    let config = GatewayConfigManifest::load_or_default(config_path)
        .context("Failed to load configuration")?;

    config.validate().context("Configuration validation failed")?;

    println!("{}", "✓ Configuration is valid".green());

    Ok(())
}

async fn generate(output: PathBuf, with_examples: bool) -> Result<()> {
    let sample = if with_examples {
        include_str!("../../templates/config-with-examples.yaml")
    } else {
        include_str!("../../templates/config-minimal.yaml")
    };

    std::fs::write(&output, sample)
        .with_context(|| format!("Failed to write config to {:?}", output))?;

    println!(
        "{}",
        format!("✓ Configuration generated: {}", output.display()).green()
    );

    Ok(())
}

/// Hide the password of a connection URL. `env:` references are shown as is.
fn redact_url(raw: &str) -> String {
    if raw.starts_with("env:") {
        return raw.to_string();
    }
    match reqwest::Url::parse(raw) {
        Ok(mut url) if url.password().is_some() => {
            // Only fails for cannot-be-a-base URLs, which carry no password.
            let _ = url.set_password(Some("****"));
            url.to_string()
        }
        Ok(url) => url.to_string(),
        Err(_) => "(unparseable url)".to_string(),
    }
}
