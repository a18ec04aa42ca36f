//! Station Node - the main application entry point.
//!
//! Architecture:
//! - One RocksDB graph store per station, seeded with the genesis topology
//! - Evolution scheduler whose cycle deltas are replicated as they complete
//! - Consensus coordinator for proposals raised by this station
//! - HTTP API for peers (votes, relayed deltas) and operators

use crate::api;
use crate::config::NodeConfig;
use crate::error::Result;
use plexus_consensus::{
    apply_outcome, record_failed_outcome, ConsensusConfig, ConsensusCoordinator, ConsensusRequest,
    Proposal, ProposalId, Resolution, Vote,
};
use plexus_evolution::{CycleReport, EvolutionConfig, EvolutionEngine, EvolutionScheduler};
use plexus_graph::{seed, GraphDelta, GraphStore, RocksStore};
use plexus_replication::{ReplicationConfig, ReplicationCoordinator, ReplicationResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Result of asking a station to resolve one of its proposals.
#[derive(Debug)]
pub enum ResolveOutcome {
    /// No such open proposal
    Unknown,
    /// Still waiting on these stations
    Pending { missing_voters: Vec<String> },
    /// Resolved, applied and handed to replication
    Resolved {
        resolution: Resolution,
        replication: ReplicationResult,
    },
    /// Resolved, but the change could not be applied; closed as rejected
    Failed {
        resolution: Resolution,
        error: String,
        replication: ReplicationResult,
    },
}

/// Shared state for a station - single store instance shared by all components.
pub struct StationState<S> {
    station_id: String,
    store: Arc<S>,
    engine: Arc<EvolutionEngine<S>>,
    consensus: RwLock<ConsensusCoordinator>,
    replication: ReplicationCoordinator<S>,
}

impl<S: GraphStore + 'static> StationState<S> {
    pub fn new(
        station_id: impl Into<String>,
        store: Arc<S>,
        evolution: EvolutionConfig,
        consensus: ConsensusConfig,
        replication: ReplicationConfig,
    ) -> Result<Self> {
        Ok(Self {
            station_id: station_id.into(),
            engine: Arc::new(EvolutionEngine::new(Arc::clone(&store), evolution)),
            consensus: RwLock::new(ConsensusCoordinator::new(consensus)),
            replication: ReplicationCoordinator::new(Arc::clone(&store), replication)?,
            store,
        })
    }

    pub fn station_id(&self) -> &str {
        &self.station_id
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn engine(&self) -> &Arc<EvolutionEngine<S>> {
        &self.engine
    }

    pub fn replication(&self) -> &ReplicationCoordinator<S> {
        &self.replication
    }

    /// Hand a locally applied delta to the replication coordinator.
    pub async fn replicate(&self, delta: GraphDelta) -> ReplicationResult {
        let changes = delta.change_count();
        let result = self.replication.replicate(delta).await;
        if result.success {
            debug!(station = %self.station_id, mode = %result.mode, changes, "Delta replicated");
        } else {
            warn!(station = %self.station_id, mode = %result.mode, changes, "Delta replication failed, kept queued");
        }
        result
    }

    /// Run an evolution cycle now and replicate what it changed.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let report = self.engine.run_evolution_cycle(&self.station_id).await?;
        if !report.delta.is_empty() {
            self.replicate(report.delta.clone()).await;
        }
        Ok(report)
    }

    /// Open a proposal with this station as proposer.
    pub async fn propose(&self, proposal: Proposal, affected_station_ids: Vec<String>) -> ProposalId {
        self.consensus
            .write()
            .await
            .propose(proposal, &self.station_id, affected_station_ids)
    }

    pub async fn cast_vote(&self, proposal_id: &ProposalId, station_id: &str, vote: Vote) -> bool {
        self.consensus.write().await.cast_vote(proposal_id, station_id, vote)
    }

    pub async fn list_pending(&self) -> Vec<ConsensusRequest> {
        self.consensus.read().await.list_pending()
    }

    /// Resolve a proposal; once every affected station voted, apply the
    /// outcome and replicate it.
    ///
    /// A change the graph refuses (missing target, colliding edge, malformed
    /// payload) closes the proposal with a rejected outcome event. If the
    /// store itself is failing the proposal is reopened with its votes and
    /// the error is returned.
    pub async fn resolve(&self, proposal_id: &ProposalId) -> Result<ResolveOutcome> {
        let resolution = {
            let mut consensus = self.consensus.write().await;
            let missing_voters: Vec<String> = match consensus.get(proposal_id) {
                Some(request) => request.missing_voters().into_iter().map(String::from).collect(),
                None => return Ok(ResolveOutcome::Unknown),
            };
            match consensus.resolve(proposal_id) {
                Some(resolution) => resolution,
                None => return Ok(ResolveOutcome::Pending { missing_voters }),
            }
        };

        match self.settle(&resolution).await {
            Ok(replication) => Ok(ResolveOutcome::Resolved {
                resolution,
                replication,
            }),
            Err(e) if e.is_transient() => {
                self.consensus.write().await.reinstate(resolution.request);
                Err(e.into())
            }
            Err(e) => {
                let error = e.to_string();
                let delta = match record_failed_outcome(
                    self.store.as_ref(),
                    &resolution,
                    &self.station_id,
                    &error,
                )
                .await
                {
                    Ok(delta) => delta,
                    Err(record_err) => {
                        self.consensus.write().await.reinstate(resolution.request);
                        return Err(record_err.into());
                    }
                };
                let replication = self.replicate(delta).await;
                Ok(ResolveOutcome::Failed {
                    resolution,
                    error,
                    replication,
                })
            }
        }
    }

    /// Reject proposals past the consensus deadline and record their outcome.
    pub async fn expire_stale_proposals(&self) -> usize {
        let expired = self.consensus.write().await.expire_stale();
        let count = expired.len();
        for resolution in expired {
            match self.settle(&resolution).await {
                Ok(_) => {}
                Err(e) if e.is_transient() => {
                    error!(proposal_id = %resolution.proposal_id, error = %e, "Failed to record expired proposal");
                    self.consensus.write().await.reinstate(resolution.request);
                }
                Err(e) => {
                    error!(proposal_id = %resolution.proposal_id, error = %e, "Failed to record expired proposal");
                }
            }
        }
        count
    }

    async fn settle(&self, resolution: &Resolution) -> plexus_consensus::Result<ReplicationResult> {
        let delta = apply_outcome(self.store.as_ref(), resolution, &self.station_id).await?;
        info!(
            proposal_id = %resolution.proposal_id,
            approved = resolution.approved,
            approve = resolution.approve_count,
            reject = resolution.reject_count,
            "Proposal resolved"
        );
        Ok(self.replicate(delta).await)
    }
}

/// Replicate the delta of every completed scheduler cycle.
pub(crate) fn spawn_report_forwarder<S>(
    state: Arc<StationState<S>>,
    mut reports: broadcast::Receiver<CycleReport>,
) -> JoinHandle<()>
where
    S: GraphStore + 'static,
{
    tokio::spawn(async move {
        loop {
            match reports.recv().await {
                Ok(report) => {
                    if !report.delta.is_empty() {
                        state.replicate(report.delta).await;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Cycle reports dropped before replication");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

/// Periodically reject proposals that outlived the consensus deadline.
pub(crate) fn spawn_expiry_sweeper<S>(state: Arc<StationState<S>>, timeout: Duration) -> JoinHandle<()>
where
    S: GraphStore + 'static,
{
    let period = (timeout / 4).max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            let expired = state.expire_stale_proposals().await;
            if expired > 0 {
                info!(expired, "Expired stale proposals");
            }
        }
    })
}

/// A station node instance.
pub struct StationNode {
    state: Arc<StationState<RocksStore>>,
    config: NodeConfig,
}

impl StationNode {
    /// Open the store and seed the genesis topology.
    pub async fn new(config: NodeConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;

        let store = Arc::new(RocksStore::open(config.data_dir.join("graph"))?);

        let seeded = seed(store.as_ref(), &config.station_id).await?;
        info!(
            station = %config.station_id,
            nodes = seeded.nodes_created,
            edges = seeded.edges_created,
            "Genesis seeding complete"
        );

        let state = Arc::new(StationState::new(
            config.station_id.clone(),
            store,
            config.evolution_config(),
            config.consensus_config(),
            config.replication_config(),
        )?);

        Ok(Self { state, config })
    }

    /// Get the shared state (for API handlers).
    pub fn state(&self) -> Arc<StationState<RocksStore>> {
        Arc::clone(&self.state)
    }

    /// Run the node (scheduler, expiry sweeper and HTTP server) until ctrl-c.
    pub async fn run(self) -> Result<()> {
        info!("Station {} starting", self.config.station_id);
        info!("  API: http://{}", self.config.api_addr);
        info!("  Data: {:?}", self.config.data_dir);
        info!("  Relay: {}", self.config.relay_url.as_deref().unwrap_or("none"));

        let scheduler = EvolutionScheduler::start(
            Arc::clone(self.state.engine()),
            self.config.station_id.clone(),
            self.config.evolution_interval,
        );
        let forwarder = spawn_report_forwarder(Arc::clone(&self.state), scheduler.subscribe());
        let sweeper = self
            .config
            .consensus_timeout
            .map(|timeout| spawn_expiry_sweeper(Arc::clone(&self.state), timeout));

        let app = api::build_router(Arc::clone(&self.state));
        let listener = tokio::net::TcpListener::bind(self.config.api_addr).await?;
        info!("HTTP server listening on {}", self.config.api_addr);

        let served = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await;

        scheduler.stop().await;
        forwarder.abort();
        if let Some(sweeper) = sweeper {
            sweeper.abort();
        }
        served?;

        info!("Station {} stopped", self.config.station_id);
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
}
