//! Replication Coordinator - per-call mode selection and delivery.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use plexus_graph::{GraphDelta, GraphStore};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::mode::ReplicationMode;
use crate::queue::OfflineQueue;
use crate::relay::{HttpRelay, Relay};

/// Configuration for a replication coordinator.
#[derive(Debug, Clone)]
pub struct ReplicationConfig {
    /// Base URL of the relay orchestrator. No relay tier when unset.
    pub relay_url: Option<String>,

    /// Bound on the relay health probe.
    pub health_timeout: Duration,

    /// Bound on a single delta delivery.
    pub sync_timeout: Duration,

    /// JSON-lines log backing the offline queue. In-memory when unset.
    pub wal_path: Option<PathBuf>,

    /// Whether the store is the shared live store peers read from. A
    /// station-local store never carries deltas to anyone.
    pub shared_store: bool,
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            relay_url: None,
            health_timeout: HttpRelay::HEALTH_TIMEOUT,
            sync_timeout: HttpRelay::SYNC_TIMEOUT,
            wal_path: None,
            shared_store: true,
        }
    }
}

impl ReplicationConfig {
    #[must_use]
    pub fn with_relay_url(mut self, url: impl Into<String>) -> Self {
        self.relay_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn with_timeouts(mut self, health: Duration, sync: Duration) -> Self {
        self.health_timeout = health;
        self.sync_timeout = sync;
        self
    }

    #[must_use]
    pub fn with_wal_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.wal_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_shared_store(mut self, shared: bool) -> Self {
        self.shared_store = shared;
        self
    }
}

/// Outcome of one [`ReplicationCoordinator::replicate`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicationResult {
    pub success: bool,
    pub mode: ReplicationMode,
    /// Previously queued deltas delivered ahead of this one
    pub drained: usize,
}

/// Picks the best reachable consistency strategy for every delta.
///
/// Priority is strict: a healthy shared store wins, then a healthy relay,
/// then the offline queue. Nothing is cached between calls.
pub struct ReplicationCoordinator<S: ?Sized> {
    store: Arc<S>,
    shared_store: bool,
    relay: Option<Arc<dyn Relay>>,
    queue: Mutex<OfflineQueue>,
}

impl<S: GraphStore + ?Sized> ReplicationCoordinator<S> {
    /// Build from config, opening the queue log if one is configured.
    pub fn new(store: Arc<S>, config: ReplicationConfig) -> Result<Self> {
        let relay = config.relay_url.map(|url| {
            Arc::new(HttpRelay::new(url).with_timeouts(config.health_timeout, config.sync_timeout))
                as Arc<dyn Relay>
        });
        let queue = match config.wal_path {
            Some(path) => OfflineQueue::open(path)?,
            None => OfflineQueue::in_memory(),
        };
        Ok(Self::with_parts(store, relay, queue).with_shared_store(config.shared_store))
    }

    /// Build from explicit parts.
    pub fn with_parts(store: Arc<S>, relay: Option<Arc<dyn Relay>>, queue: OfflineQueue) -> Self {
        Self {
            store,
            shared_store: true,
            relay,
            queue: Mutex::new(queue),
        }
    }

    /// Enable or skip the shared-store tier.
    #[must_use]
    pub fn with_shared_store(mut self, shared: bool) -> Self {
        self.shared_store = shared;
        self
    }

    /// Probe connectivity in priority order. Never fails.
    pub async fn detect_replication_mode(&self) -> ReplicationMode {
        if self.shared_store && self.store.is_healthy().await {
            return ReplicationMode::SharedStore;
        }
        if let Some(relay) = &self.relay {
            if relay.is_healthy().await {
                return ReplicationMode::Relay;
            }
        }
        ReplicationMode::Offline
    }

    /// Propagate `delta` through the best available channel.
    ///
    /// Any queued backlog is flushed first so peers see deltas in the order
    /// they were produced. A relay failure keeps the delta queued.
    pub async fn replicate(&self, delta: GraphDelta) -> ReplicationResult {
        let mode = self.detect_replication_mode().await;

        match mode {
            ReplicationMode::SharedStore => {
                let drained = self.drain(mode).await;
                debug!(station = %delta.station_id, drained, "Shared store carries delta");
                ReplicationResult { success: true, mode, drained }
            }
            ReplicationMode::Relay => {
                let drained = self.drain(mode).await;
                let backlog = self.queue.lock().await.len();

                let success = if backlog > 0 {
                    warn!(backlog, "Relay backlog not cleared, queueing delta behind it");
                    self.queue_for_offline_sync(delta).await;
                    false
                } else {
                    match self.deliver(mode, &delta).await {
                        Ok(()) => true,
                        Err(e) => {
                            warn!(station = %delta.station_id, error = %e, "Relay sync failed, queueing delta");
                            self.queue_for_offline_sync(delta).await;
                            false
                        }
                    }
                };
                ReplicationResult { success, mode, drained }
            }
            ReplicationMode::Offline => {
                self.queue_for_offline_sync(delta).await;
                ReplicationResult { success: true, mode, drained: 0 }
            }
        }
    }

    /// Hold a delta until an online mode becomes available.
    pub async fn queue_for_offline_sync(&self, delta: GraphDelta) {
        let mut queue = self.queue.lock().await;
        let station = delta.station_id.clone();
        if let Err(e) = queue.push(delta) {
            error!(%station, error = %e, "Failed to persist queued delta");
        }
        debug!(%station, queued = queue.len(), "Delta queued for offline sync");
    }

    /// Snapshot of queued deltas, oldest first.
    pub async fn offline_queue(&self) -> Vec<GraphDelta> {
        self.queue.lock().await.to_vec()
    }

    pub async fn clear_offline_queue(&self) {
        if let Err(e) = self.queue.lock().await.clear() {
            error!(error = %e, "Failed to truncate offline queue log");
        }
    }

    /// Deliver queued deltas oldest first, stopping at the first failure.
    async fn drain(&self, mode: ReplicationMode) -> usize {
        let mut queue = self.queue.lock().await;
        if queue.is_empty() {
            return 0;
        }

        let pending = queue.to_vec();
        let mut delivered = 0;
        for delta in &pending {
            if let Err(e) = self.deliver(mode, delta).await {
                warn!(%mode, delivered, remaining = pending.len() - delivered, error = %e, "Offline queue drain interrupted");
                break;
            }
            delivered += 1;
        }

        if let Err(e) = queue.acknowledge(delivered) {
            error!(error = %e, "Failed to rewrite offline queue log");
        }
        if delivered > 0 {
            info!(%mode, delivered, remaining = queue.len(), "Drained offline queue");
        }
        delivered
    }

    async fn deliver(&self, mode: ReplicationMode, delta: &GraphDelta) -> Result<()> {
        match (mode, &self.relay) {
            (ReplicationMode::SharedStore, _) => {
                self.store.apply_delta(delta).await?;
                Ok(())
            }
            (ReplicationMode::Relay, Some(relay)) => relay.sync(delta).await,
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReplicationError;
    use async_trait::async_trait;
    use plexus_graph::{Edge, EdgeType, MemoryStore, Node, NodeType};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tempfile::TempDir;

    #[derive(Default)]
    struct MockRelay {
        healthy: AtomicBool,
        rejecting: AtomicBool,
        probes: AtomicUsize,
        received: std::sync::Mutex<Vec<GraphDelta>>,
    }

    impl MockRelay {
        fn healthy() -> Arc<Self> {
            let relay = Self::default();
            relay.healthy.store(true, Ordering::SeqCst);
            Arc::new(relay)
        }

        fn received(&self) -> Vec<GraphDelta> {
            self.received.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Relay for MockRelay {
        async fn is_healthy(&self) -> bool {
            self.probes.fetch_add(1, Ordering::SeqCst);
            self.healthy.load(Ordering::SeqCst)
        }

        async fn sync(&self, delta: &GraphDelta) -> Result<()> {
            if self.rejecting.load(Ordering::SeqCst) {
                return Err(ReplicationError::RelayRejected(502));
            }
            self.received.lock().unwrap().push(delta.clone());
            Ok(())
        }
    }

    fn coordinator(
        store: &Arc<MemoryStore>,
        relay: Option<Arc<MockRelay>>,
    ) -> ReplicationCoordinator<MemoryStore> {
        ReplicationCoordinator::with_parts(
            Arc::clone(store),
            relay.map(|r| r as Arc<dyn Relay>),
            OfflineQueue::in_memory(),
        )
    }

    fn delta(edge: &str) -> GraphDelta {
        GraphDelta::new("alpha").with_removed_edge(edge)
    }

    #[tokio::test]
    async fn healthy_store_wins_without_probing_relay() {
        let store = Arc::new(MemoryStore::new());
        let relay = MockRelay::healthy();
        let coord = coordinator(&store, Some(Arc::clone(&relay)));

        assert_eq!(coord.detect_replication_mode().await, ReplicationMode::SharedStore);
        let result = coord.replicate(delta("a->b")).await;

        assert_eq!(result.mode, ReplicationMode::SharedStore);
        assert!(result.success);
        assert_eq!(relay.probes.load(Ordering::SeqCst), 0);
        assert!(relay.received().is_empty());
    }

    #[tokio::test]
    async fn unhealthy_store_falls_back_to_relay() {
        let store = Arc::new(MemoryStore::new());
        store.set_healthy(false);
        let relay = MockRelay::healthy();
        let coord = coordinator(&store, Some(Arc::clone(&relay)));

        let result = coord.replicate(delta("a->b")).await;

        assert_eq!(result, ReplicationResult { success: true, mode: ReplicationMode::Relay, drained: 0 });
        assert_eq!(relay.received().len(), 1);
        assert!(coord.offline_queue().await.is_empty());
    }

    #[tokio::test]
    async fn nothing_reachable_queues_offline() {
        let store = Arc::new(MemoryStore::new());
        store.set_healthy(false);
        let relay = Arc::new(MockRelay::default());
        let coord = coordinator(&store, Some(Arc::clone(&relay)));

        let result = coord.replicate(delta("a->b")).await;
        assert_eq!(result.mode, ReplicationMode::Offline);
        assert!(result.success);
        assert_eq!(coord.offline_queue().await.len(), 1);

        // no relay configured at all behaves the same
        let bare = coordinator(&store, None);
        assert_eq!(bare.detect_replication_mode().await, ReplicationMode::Offline);
    }

    #[tokio::test]
    async fn mode_is_reprobed_every_call() {
        let store = Arc::new(MemoryStore::new());
        let relay = MockRelay::healthy();
        let coord = coordinator(&store, Some(Arc::clone(&relay)));

        assert_eq!(coord.replicate(delta("a->b")).await.mode, ReplicationMode::SharedStore);
        store.set_healthy(false);
        assert_eq!(coord.replicate(delta("b->c")).await.mode, ReplicationMode::Relay);
        relay.healthy.store(false, Ordering::SeqCst);
        assert_eq!(coord.replicate(delta("c->d")).await.mode, ReplicationMode::Offline);
        store.set_healthy(true);
        assert_eq!(coord.replicate(delta("d->e")).await.mode, ReplicationMode::SharedStore);
    }

    #[tokio::test]
    async fn local_store_skips_shared_tier() {
        let store = Arc::new(MemoryStore::new());
        let relay = MockRelay::healthy();
        let coord = coordinator(&store, Some(Arc::clone(&relay))).with_shared_store(false);

        assert_eq!(coord.detect_replication_mode().await, ReplicationMode::Relay);
        assert!(coord.replicate(delta("a->b")).await.success);
        assert_eq!(relay.received().len(), 1);
    }

    #[tokio::test]
    async fn relay_failure_keeps_delta_queued() {
        let store = Arc::new(MemoryStore::new());
        store.set_healthy(false);
        let relay = MockRelay::healthy();
        relay.rejecting.store(true, Ordering::SeqCst);
        let coord = coordinator(&store, Some(Arc::clone(&relay)));

        let result = coord.replicate(delta("a->b")).await;
        assert_eq!(result.mode, ReplicationMode::Relay);
        assert!(!result.success);
        assert_eq!(coord.offline_queue().await.len(), 1);
    }

    #[tokio::test]
    async fn reconnect_drains_backlog_in_order() {
        let store = Arc::new(MemoryStore::new());
        store.set_healthy(false);
        let relay = Arc::new(MockRelay::default());
        let coord = coordinator(&store, Some(Arc::clone(&relay)));

        coord.replicate(delta("a->b")).await;
        coord.replicate(delta("b->c")).await;
        assert_eq!(coord.offline_queue().await.len(), 2);

        relay.healthy.store(true, Ordering::SeqCst);
        let result = coord.replicate(delta("c->d")).await;

        assert_eq!(result, ReplicationResult { success: true, mode: ReplicationMode::Relay, drained: 2 });
        let order: Vec<_> = relay.received().into_iter().flat_map(|d| d.removed_edges).collect();
        assert_eq!(order, vec!["a->b", "b->c", "c->d"]);
        assert!(coord.offline_queue().await.is_empty());
    }

    #[tokio::test]
    async fn shared_store_recovery_applies_backlog() {
        let store = Arc::new(MemoryStore::new());
        let coord = coordinator(&store, None);

        store.set_healthy(false);
        let node = Node::new("alpha:compute", NodeType::Capability, "compute", "alpha");
        let edge = Edge::new("alpha", "alpha:compute", EdgeType::Activation, "alpha");
        let mut queued = GraphDelta::new("alpha");
        queued.added_nodes.push(node);
        queued.added_edges.push(edge);
        coord.replicate(queued).await;

        store.set_healthy(true);
        let result = coord.replicate(GraphDelta::new("alpha")).await;

        assert_eq!(result.drained, 1);
        assert!(store.get_node("alpha:compute").await.unwrap().is_some());
        assert!(store.get_edge("alpha->alpha:compute").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn clear_discards_backlog() {
        let store = Arc::new(MemoryStore::new());
        store.set_healthy(false);
        let coord = coordinator(&store, None);

        coord.queue_for_offline_sync(delta("a->b")).await;
        coord.clear_offline_queue().await;
        assert!(coord.offline_queue().await.is_empty());
    }

    #[tokio::test]
    async fn queue_log_survives_restart() {
        let dir = TempDir::new().unwrap();
        let config = ReplicationConfig::default().with_wal_path(dir.path().join("queue.jsonl"));
        let store = Arc::new(MemoryStore::new());
        store.set_healthy(false);

        {
            let coord = ReplicationCoordinator::new(Arc::clone(&store), config.clone()).unwrap();
            coord.replicate(delta("a->b")).await;
        }

        let restarted = ReplicationCoordinator::new(Arc::clone(&store), config).unwrap();
        let queued = restarted.offline_queue().await;
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].removed_edges, vec!["a->b".to_string()]);
    }
}
