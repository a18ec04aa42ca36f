//! Fixed-interval scheduler for evolution cycles.
//!
//! The scheduler is the error boundary for the engine: a failing cycle is
//! logged and counted, and the next tick fires as usual. Each cycle runs as
//! its own task, so a panicking cycle counts as a failure instead of ending
//! the timer.

use crate::engine::{CycleReport, EvolutionEngine};
use plexus_graph::GraphStore;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

/// Capacity of the cycle report channel.
const REPORT_CHANNEL_CAPACITY: usize = 16;

/// Counters describing the scheduler's history.
#[derive(Debug, Default)]
pub struct SchedulerStats {
    completed: AtomicU64,
    failed: AtomicU64,
}

impl SchedulerStats {
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}

/// Handle to a running evolution timer.
///
/// The first cycle runs immediately, then once per interval. Dropping the
/// handle also stops the timer, but only [`stop`](Self::stop) waits for the
/// in-flight cycle.
pub struct EvolutionScheduler {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
    reports: broadcast::Sender<CycleReport>,
    stats: Arc<SchedulerStats>,
}

impl EvolutionScheduler {
    /// Start running cycles for `station_id` every `interval`.
    pub fn start<S>(engine: Arc<EvolutionEngine<S>>, station_id: impl Into<String>, interval: Duration) -> Self
    where
        S: GraphStore + 'static,
    {
        let station_id = station_id.into();
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
        let (reports, _) = broadcast::channel(REPORT_CHANNEL_CAPACITY);
        let stats = Arc::new(SchedulerStats::default());

        let task_reports = reports.clone();
        let task_stats = Arc::clone(&stats);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            info!(%station_id, ?interval, "Evolution scheduler started");

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {
                        let cycle_engine = Arc::clone(&engine);
                        let cycle_station = station_id.clone();
                        let cycle = tokio::spawn(async move {
                            cycle_engine.run_evolution_cycle(&cycle_station).await
                        });
                        match cycle.await {
                            Ok(Ok(report)) => {
                                task_stats.completed.fetch_add(1, Ordering::Relaxed);
                                // no subscribers is fine
                                let _ = task_reports.send(report);
                            }
                            Ok(Err(e)) => {
                                task_stats.failed.fetch_add(1, Ordering::Relaxed);
                                error!(%station_id, error = %e, "Evolution cycle failed");
                            }
                            Err(e) => {
                                task_stats.failed.fetch_add(1, Ordering::Relaxed);
                                error!(%station_id, error = %e, "Evolution cycle aborted");
                            }
                        }
                    }
                }
            }

            info!(%station_id, "Evolution scheduler stopped");
        });

        Self {
            shutdown: Some(shutdown_tx),
            task,
            reports,
            stats,
        }
    }

    /// Receive a copy of every successful cycle report.
    pub fn subscribe(&self) -> broadcast::Receiver<CycleReport> {
        self.reports.subscribe()
    }

    pub fn stats(&self) -> Arc<SchedulerStats> {
        Arc::clone(&self.stats)
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop the timer and wait for an in-flight cycle to finish.
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Err(e) = (&mut self.task).await {
            warn!(error = %e, "Evolution scheduler task ended abnormally");
        }
    }
}
