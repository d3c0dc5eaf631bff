// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::services::mining::worker::MiningStats;
use alloy::primitives::U256;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Attempts per second over `elapsed`.
pub fn hash_rate(delta: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return 0.0;
    }
    delta as f64 / secs
}

/// Logs throughput every `interval` until shutdown.
pub fn spawn_monitor(
    stats: Arc<MiningStats>,
    interval: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut last_attempts = stats.attempts();
        let mut last_tick = Instant::now();
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }
            let attempts = stats.attempts();
            let now = Instant::now();
            let rate = hash_rate(attempts.saturating_sub(last_attempts), now - last_tick);
            tracing::info!(
                target: "metrics",
                hashes_per_sec = rate,
                attempts,
                accepted = stats.accepted(),
                confirmed = stats.confirmed(),
                "hash rate"
            );
            last_attempts = attempts;
            last_tick = now;
        }
    })
}

pub async fn spawn_metrics_server(
    port: u16,
    stats: Arc<MiningStats>,
    target: watch::Receiver<U256>,
) -> Option<SocketAddr> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = match TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::warn!(target: "metrics", "Metrics server failed to bind: {}", e);
            return None;
        }
    };

    let local = listener.local_addr().ok();
    if let Some(addr) = local {
        tracing::info!(target: "metrics", "Metrics server listening on {}", addr);
    }

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let mut buf = [0u8; 1024];
                    let n = socket.read(&mut buf).await.unwrap_or(0);
                    let req = String::from_utf8_lossy(&buf[..n]).to_string();
                    let path = req
                        .lines()
                        .next()
                        .and_then(|l| l.split_whitespace().nth(1))
                        .unwrap_or("/");

                    let current = *target.borrow();
                    let (content_type, body) = if path.starts_with("/dashboard") {
                        ("application/json", render_dashboard_json(&stats, current))
                    } else {
                        ("text/plain", render_metrics(&stats, current))
                    };
                    let response = format!(
                        "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\n\r\n{}",
                        content_type,
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                }
                Err(e) => {
                    tracing::warn!(target: "metrics", "Metrics accept error: {}", e);
                    continue;
                }
            }
        }
    });

    local
}

pub fn render_metrics(stats: &MiningStats, target: U256) -> String {
    format!(
        concat!(
            "# TYPE blobmint_hashes_total counter\nblobmint_hashes_total {}\n",
            "# TYPE blobmint_candidates_total counter\nblobmint_candidates_total {}\n",
            "# TYPE blobmint_submitted_total counter\nblobmint_submitted_total {}\n",
            "# TYPE blobmint_confirmed_total counter\nblobmint_confirmed_total {}\n",
            "# TYPE blobmint_failed_total counter\nblobmint_failed_total {}\n",
            "# TYPE blobmint_target gauge\nblobmint_target {}\n"
        ),
        stats.attempts(),
        stats.accepted(),
        stats.submitted(),
        stats.confirmed(),
        stats.failed(),
        target
    )
}

fn render_dashboard_json(stats: &MiningStats, target: U256) -> String {
    serde_json::json!({
        "attempts": stats.attempts(),
        "accepted": stats.accepted(),
        "submitted": stats.submitted(),
        "confirmed": stats.confirmed(),
        "failed": stats.failed(),
        "target": target.to_string(),
        "targetHex": format!("{:#x}", target),
    })
    .to_string()
}
