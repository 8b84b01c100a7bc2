// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! InfluxDB 2.x sink.
//!
//! Primary path is the HTTP write API; on a primary failure, exactly
//! one attempt is made through the optional fallback command with the
//! line protocol fed on stdin.

use crate::line::LineEncoder;
use crate::{Sink, SinkError};
use acqd_core::{CanonicalPoint, Clock, SinkConfig, SystemClock};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

pub struct InfluxSink {
    config: SinkConfig,
    client: Option<reqwest::Client>,
    encoder: LineEncoder,
}

impl InfluxSink {
    pub fn new(config: SinkConfig) -> Self {
        Self {
            config,
            client: None,
            encoder: LineEncoder::new(),
        }
    }

    fn write_url(&self) -> String {
        format!(
            "{}/api/v2/write?org={}&bucket={}&precision=ns",
            self.config.url.trim_end_matches('/'),
            self.config.org,
            self.config.bucket
        )
    }

    async fn post_lines(&self, lines: &str) -> Result<(), String> {
        let client = self.client.as_ref().ok_or("not connected")?;
        let response = client
            .post(self.write_url())
            .header("Authorization", format!("Token {}", self.config.token))
            .header("Content-Type", "text/plain; charset=utf-8")
            .body(lines.to_string())
            .send()
            .await
            .map_err(|e| format!("transport error: {}", e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(format!("http {}: {}", status, body))
    }

    /// Single fallback attempt: run the configured command with the
    /// encoded lines on stdin.
    async fn write_via_fallback(&self, command: &str, lines: &str) -> Result<(), String> {
        tracing::info!(command, "attempting fallback write");
        let mut child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| format!("fallback spawn failed: {}", e))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(lines.as_bytes())
                .await
                .map_err(|e| format!("fallback stdin failed: {}", e))?;
        }

        let output = tokio::time::timeout(HTTP_TIMEOUT, child.wait_with_output())
            .await
            .map_err(|_| "fallback write timed out".to_string())?
            .map_err(|e| format!("fallback wait failed: {}", e))?;

        if output.status.success() {
            Ok(())
        } else {
            Err(format!(
                "fallback exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr)
            ))
        }
    }
}

#[async_trait]
impl Sink for InfluxSink {
    async fn connect(&mut self) -> Result<(), SinkError> {
        if self.client.is_some() {
            return Ok(());
        }
        self.config
            .validate()
            .map_err(|e| SinkError::Connection(e.to_string()))?;
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| SinkError::Connection(format!("client build failed: {}", e)))?;
        self.client = Some(client);
        tracing::info!(url = %self.config.url, bucket = %self.config.bucket, "influx sink connected");
        Ok(())
    }

    async fn write(&mut self, batch: &[CanonicalPoint]) -> Result<(), SinkError> {
        if batch.is_empty() {
            return Ok(());
        }
        if self.client.is_none() {
            self.connect().await?;
        }

        let lines = self.encoder.encode_batch(batch, SystemClock.now_ns())?;
        if lines.is_empty() {
            return Ok(());
        }

        match self.post_lines(&lines).await {
            Ok(()) => {
                tracing::debug!(points = batch.len(), "wrote batch");
                Ok(())
            }
            Err(primary_error) => {
                tracing::error!(error = %primary_error, "primary write failed");
                if let Some(fallback) = self.config.fallback.clone() {
                    match self.write_via_fallback(&fallback, &lines).await {
                        Ok(()) => {
                            tracing::info!(points = batch.len(), "fallback write succeeded");
                            return Ok(());
                        }
                        Err(fallback_error) => {
                            tracing::error!(error = %fallback_error, "fallback write failed");
                        }
                    }
                }
                Err(SinkError::Write(primary_error))
            }
        }
    }

    async fn health(&mut self) -> bool {
        let client = match self.client.as_ref() {
            Some(client) => client,
            None => return false,
        };
        let url = format!("{}/health", self.config.url.trim_end_matches('/'));
        match client.get(url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::warn!(error = %e, "sink health check failed");
                false
            }
        }
    }

    async fn disconnect(&mut self) {
        if self.client.take().is_some() {
            tracing::info!(url = %self.config.url, "influx sink disconnected");
        }
    }
}

#[cfg(test)]
#[path = "influx_tests.rs"]
mod tests;
