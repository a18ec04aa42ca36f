//! Station configuration.

use crate::error::{Error, Result};
use plexus_consensus::ConsensusConfig;
use plexus_evolution::EvolutionConfig;
use plexus_replication::ReplicationConfig;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Configuration for a station node.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Station identifier; also the id of the station's own graph node
    pub station_id: String,

    /// Data directory for the graph store
    pub data_dir: PathBuf,

    /// HTTP API listen address
    pub api_addr: SocketAddr,

    /// Relay orchestrator base URL
    pub relay_url: Option<String>,

    /// Evolution scheduler interval
    pub evolution_interval: Duration,

    /// Offline queue log
    pub wal_path: PathBuf,

    /// Consensus deadline; proposals stay open forever when unset
    pub consensus_timeout: Option<Duration>,

    /// Treat the graph store as the network's shared live store
    pub shared_store: bool,
}

impl NodeConfig {
    /// Create config from `PLEXUS_*` environment variables with defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let station_id = var("PLEXUS_STATION_ID").unwrap_or_else(|| "station-local".to_string());
        let data_dir = PathBuf::from(var("PLEXUS_DATA_DIR").unwrap_or_else(|| "./plexus-data".to_string()));

        let api_addr = parse(var("PLEXUS_API_ADDR"), "PLEXUS_API_ADDR")?
            .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 8080)));

        let evolution_interval = parse::<u64>(var("PLEXUS_EVOLUTION_INTERVAL_SECS"), "PLEXUS_EVOLUTION_INTERVAL_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(EvolutionConfig::DEFAULT_INTERVAL);
        if evolution_interval.is_zero() {
            return Err(Error::Config("PLEXUS_EVOLUTION_INTERVAL_SECS must be positive".into()));
        }

        let consensus_timeout = parse::<u64>(var("PLEXUS_CONSENSUS_TIMEOUT_SECS"), "PLEXUS_CONSENSUS_TIMEOUT_SECS")?
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        let shared_store = parse::<bool>(var("PLEXUS_SHARED_STORE"), "PLEXUS_SHARED_STORE")?.unwrap_or(false);

        let wal_path = var("PLEXUS_WAL_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("offline-queue.jsonl"));

        Ok(Self {
            station_id,
            data_dir,
            api_addr,
            relay_url: var("PLEXUS_RELAY_URL"),
            evolution_interval,
            wal_path,
            consensus_timeout,
            shared_store,
        })
    }

    pub fn evolution_config(&self) -> EvolutionConfig {
        EvolutionConfig::default().with_interval(self.evolution_interval)
    }

    pub fn consensus_config(&self) -> ConsensusConfig {
        match self.consensus_timeout {
            Some(timeout) => ConsensusConfig::default().with_timeout(timeout),
            None => ConsensusConfig::default(),
        }
    }

    pub fn replication_config(&self) -> ReplicationConfig {
        let config = ReplicationConfig::default()
            .with_wal_path(self.wal_path.clone())
            .with_shared_store(self.shared_store);
        match &self.relay_url {
            Some(url) => config.with_relay_url(url.clone()),
            None => config,
        }
    }
}

fn parse<T>(value: Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .map(|v| v.parse::<T>().map_err(|e| Error::Config(format!("{key}={v}: {e}"))))
        .transpose()
}
