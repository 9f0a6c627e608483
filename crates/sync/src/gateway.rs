// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Gateway abstraction for the batched record upsert.
//!
//! Provides a trait-based seam that enables:
//! - Real HTTP calls against the remote record store in production
//! - Mock gateways for unit testing the sync engine

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tend_core::{BatchUpsertRequest, BatchUpsertResponse, UploadEnvelope, UpsertResult};

/// Error type for gateway operations.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The batch call itself failed to complete.
    #[error("upsert call failed: {0}")]
    CallFailed(String),

    /// The remote store answered with a non-success status.
    #[error("remote store returned status {0}")]
    Status(u16),

    /// The response body could not be decoded.
    #[error("malformed upsert response: {0}")]
    MalformedResponse(String),
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Batched "upsert by key" seam the sync engine depends on.
///
/// Implementations match results to envelopes by idempotency key and may
/// reorder the response. A key the remote store has already applied must
/// be reported as `ok: true, created: false`, never as an error, and a
/// partial-batch failure as per-item `ok: false` rather than failing the
/// whole call.
pub trait RecordGateway: Send {
    /// Submit one batch of envelopes and return per-item outcomes.
    fn upsert(
        &mut self,
        envelopes: Vec<UploadEnvelope>,
    ) -> Pin<Box<dyn Future<Output = GatewayResult<Vec<UpsertResult>>> + Send + '_>>;
}

/// Configuration for the HTTP gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL of the remote record store.
    pub base_url: String,
    /// Request timeout in seconds (default: 10).
    pub timeout_secs: u64,
}

impl GatewayConfig {
    /// Config for a store at the given base URL with the default timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        GatewayConfig {
            base_url: base_url.into(),
            timeout_secs: 10,
        }
    }
}

/// HTTP gateway posting batches to the remote record store.
///
/// Authentication (session headers) is the host application's concern;
/// install it on the request path via `reqwest` default headers when
/// constructing a client for a signed-in session.
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpGateway {
    /// Create an HTTP gateway from config.
    pub fn new(config: &GatewayConfig) -> GatewayResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GatewayError::CallFailed(e.to_string()))?;

        Ok(HttpGateway {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl RecordGateway for HttpGateway {
    fn upsert(
        &mut self,
        envelopes: Vec<UploadEnvelope>,
    ) -> Pin<Box<dyn Future<Output = GatewayResult<Vec<UpsertResult>>> + Send + '_>> {
        Box::pin(async move {
            let url = format!("{}/v1/records/batch-upsert", self.base_url);
            let body = BatchUpsertRequest { records: envelopes };

            let response = self
                .client
                .post(&url)
                .json(&body)
                .send()
                .await
                .map_err(|e| GatewayError::CallFailed(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                return Err(GatewayError::Status(status.as_u16()));
            }

            let parsed: BatchUpsertResponse = response
                .json()
                .await
                .map_err(|e| GatewayError::MalformedResponse(e.to_string()))?;

            Ok(parsed.results)
        })
    }
}
