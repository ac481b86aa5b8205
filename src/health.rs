//! Health check endpoint for spaceship-ddns
//!
//! This module provides a lightweight HTTP endpoint reporting loop progress.
//! `GET /metrics` returns the Prometheus text format; every other path
//! returns the JSON health summary.

use std::net::SocketAddr;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Mutex};
use tracing::{error, info};

use crate::error::{DdnsError, Result};
use crate::metrics::gather_metrics;
use crate::scheduler::{PassOutcome, PassState};

//==============================================================================
// Types
//==============================================================================

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall health status
    pub status: String,
    /// Outcome of the last pass
    pub last_pass: String,
    /// Number of passes run so far
    pub passes: u64,
    /// Time since last successful pass (in seconds, or null if none yet)
    pub last_success_seconds_ago: Option<i64>,
    /// Number of consecutive failed passes
    pub consecutive_failures: u64,
    /// Address the records were last reconciled to
    pub address: Option<String>,
    /// Whether the last pass succeeded
    pub healthy: bool,
}

/// Health check server
pub struct HealthServer {
    /// Shutdown channel sender
    shutdown_tx: Option<oneshot::Sender<()>>,
    local_addr: SocketAddr,
}

//==============================================================================
// Implementation
//==============================================================================

impl HealthServer {
    /// Starts the health check server
    pub async fn start(addr: SocketAddr, state: Arc<Mutex<PassState>>) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| DdnsError::config(format!("Cannot bind health port {}: {}", addr, e)))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| DdnsError::config(format!("Health listener address: {}", e)))?;
        info!(%local_addr, "Health check server listening");

        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => {
                        break;
                    }
                    accept = listener.accept() => {
                        match accept {
                            Ok((mut socket, _peer)) => {
                                let state = Arc::clone(&state);
                                tokio::spawn(async move {
                                    let mut buf = [0u8; 1024];
                                    let n = socket.read(&mut buf).await.unwrap_or(0);
                                    let request = String::from_utf8_lossy(&buf[..n]);

                                    let (content_type, body) = if request.starts_with("GET /metrics") {
                                        ("text/plain; version=0.0.4", gather_metrics())
                                    } else {
                                        let snapshot = state.lock().await;
                                        let body = serde_json::to_string(&build_response(&snapshot))
                                            .unwrap_or_else(|_| "{\"status\":\"error\"}".to_string());
                                        ("application/json", body)
                                    };

                                    let reply = format!(
                                        "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                                        content_type,
                                        body.len(),
                                        body
                                    );

                                    if let Err(e) = socket.write_all(reply.as_bytes()).await {
                                        error!("Health response write failed: {}", e);
                                    }
                                    let _ = socket.shutdown().await;
                                });
                            }
                            Err(e) => {
                                error!("Health listener accept error: {}", e);
                            }
                        }
                    }
                }
            }
        });

        Ok(Self {
            shutdown_tx: Some(shutdown_tx),
            local_addr,
        })
    }

    /// Address the server is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stops the health check server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

//==============================================================================
// Helpers
//==============================================================================

fn build_response(state: &PassState) -> HealthResponse {
    let (last_pass, healthy) = match &state.outcome {
        PassOutcome::Pending => ("pending".to_string(), false),
        PassOutcome::Succeeded => ("succeeded".to_string(), true),
        PassOutcome::Failed(kind) => (format!("failed: {}", kind), false),
    };

    let last_success_seconds_ago = state
        .last_success
        .map(|ts| (Utc::now() - ts).num_seconds().max(0));

    HealthResponse {
        status: if healthy { "ok".to_string() } else { "degraded".to_string() },
        last_pass,
        passes: state.passes,
        last_success_seconds_ago,
        consecutive_failures: state.consecutive_failures,
        address: state.last_address.clone(),
        healthy,
    }
}

//==============================================================================
// Tests
//==============================================================================
