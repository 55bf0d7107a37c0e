// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! HTTP client for the admin endpoints of a running gateway

use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;

use polytenant_core::application::{CacheStats, SweepReport};
use polytenant_core::presentation::dto::HealthResponse;

#[derive(Debug, Clone)]
pub struct GatewayClient {
    client: Client,
    base_url: String,
}

impl GatewayClient {
    pub fn new(host: &str, port: u16) -> Result<Self> {
        Self::with_base_url(format!("http://{}:{}", host, port))
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .context("Failed to reach gateway")?;

        if !response.status().is_success() {
            anyhow::bail!("Health check failed with status {}", response.status());
        }

        response.json().await.context("Failed to parse health response")
    }

    pub async fn connection_stats(&self) -> Result<CacheStats> {
        let response = self
            .client
            .get(format!("{}/admin/connections", self.base_url))
            .send()
            .await
            .context("Failed to get connection stats")?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Failed to get connection stats: {}", error_text);
        }

        response.json().await.context("Failed to parse connection stats")
    }

    pub async fn cleanup(&self) -> Result<SweepReport> {
        let response = self
            .client
            .post(format!("{}/admin/connections/cleanup", self.base_url))
            .send()
            .await
            .context("Failed to trigger connection cleanup")?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Failed to trigger connection cleanup: {}", error_text);
        }

        response.json().await.context("Failed to parse cleanup report")
    }
}
