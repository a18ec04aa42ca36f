//! Relay orchestrator client.

use crate::error::{ReplicationError, Result};
use async_trait::async_trait;
use plexus_graph::GraphDelta;
use std::time::Duration;
use tracing::{debug, trace};

/// A peer that forwards deltas to the rest of the network.
#[async_trait]
pub trait Relay: Send + Sync {
    /// Liveness probe. Never errors; unreachable means `false`.
    async fn is_healthy(&self) -> bool;

    /// Deliver one delta. Success is purely status based; no retries.
    async fn sync(&self, delta: &GraphDelta) -> Result<()>;
}

/// HTTP relay speaking `GET /health` and `POST /sync`.
#[derive(Debug, Clone)]
pub struct HttpRelay {
    client: reqwest::Client,
    base_url: String,
    health_timeout: Duration,
    sync_timeout: Duration,
}

impl HttpRelay {
    /// Default bound on the health probe.
    pub const HEALTH_TIMEOUT: Duration = Duration::from_secs(3);

    /// Default bound on delta delivery.
    pub const SYNC_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            health_timeout: Self::HEALTH_TIMEOUT,
            sync_timeout: Self::SYNC_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_timeouts(mut self, health: Duration, sync: Duration) -> Self {
        self.health_timeout = health;
        self.sync_timeout = sync;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Relay for HttpRelay {
    async fn is_healthy(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        match self.client.get(&url).timeout(self.health_timeout).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                trace!(%url, error = %e, "Relay health probe failed");
                false
            }
        }
    }

    async fn sync(&self, delta: &GraphDelta) -> Result<()> {
        let url = format!("{}/sync", self.base_url);
        let response = self
            .client
            .post(&url)
            .timeout(self.sync_timeout)
            .json(delta)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReplicationError::RelayRejected(status.as_u16()));
        }

        debug!(%url, changes = delta.change_count(), "Delta delivered to relay");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::{get, post}, Json, Router};
    use std::sync::{Arc, Mutex};

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn healthy_relay_accepts_delta() {
        let received = Arc::new(Mutex::new(Vec::<GraphDelta>::new()));
        let sink = Arc::clone(&received);
        let app = Router::new()
            .route("/health", get(|| async { "OK" }))
            .route(
                "/sync",
                post(move |Json(delta): Json<GraphDelta>| {
                    let sink = Arc::clone(&sink);
                    async move {
                        sink.lock().unwrap().push(delta);
                        StatusCode::NO_CONTENT
                    }
                }),
            );
        let relay = HttpRelay::new(serve(app).await);

        assert!(relay.is_healthy().await);
        relay.sync(&GraphDelta::new("alpha").with_removed_edge("a->b")).await.unwrap();

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].removed_edges, vec!["a->b".to_string()]);
    }

    #[tokio::test]
    async fn non_success_status_is_rejection() {
        let app = Router::new().route("/sync", post(|| async { StatusCode::SERVICE_UNAVAILABLE }));
        let relay = HttpRelay::new(serve(app).await);

        let err = relay.sync(&GraphDelta::new("alpha")).await.unwrap_err();
        assert!(matches!(err, ReplicationError::RelayRejected(503)));
        // no /health route
        assert!(!relay.is_healthy().await);
    }

    #[tokio::test]
    async fn unreachable_relay_is_unhealthy() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let relay = HttpRelay::new(format!("http://{}/", addr))
            .with_timeouts(Duration::from_millis(500), Duration::from_millis(500));
        assert_eq!(relay.base_url(), format!("http://{}", addr));
        assert!(!relay.is_healthy().await);
        assert!(relay.sync(&GraphDelta::new("alpha")).await.is_err());
    }
}
