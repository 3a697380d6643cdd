//! Orchestration Loop Controller.
//!
//! Owns at most one background task that runs cycles forever:
//! 1. Run one cycle under the loop deadline
//! 2. Record the outcome (stats, and the timestamp for live outcomes)
//! 3. Sleep the fixed interval, whatever the outcome
//!
//! Shutdown signals the task over a watch channel and awaits it. The signal
//! is observed between and during cycles, so an in-flight collaborator call
//! is dropped rather than waited out.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{RwLock, watch};
use tokio::task::JoinHandle;

use crate::client::CollaboratorClient;
use crate::config::{Config, LoopConfig};
use crate::cycle::{CycleEndpoints, CycleExecutor};
use crate::domain::{CollaboratorDescriptor, CycleOutcome};
use crate::orchestrator::stats::{LoopStats, LoopStatsSnapshot};

/// State written by the loop and read by the health endpoint
#[derive(Debug, Clone, Copy, Default)]
pub struct LoopState {
    /// End of the last cycle that completed or was blocked by the gate
    pub last_successful_run: Option<DateTime<Utc>>,
}

impl LoopState {
    /// Never moves backwards, even if the wall clock does
    fn mark_success(&mut self, now: DateTime<Utc>) {
        self.last_successful_run = Some(match self.last_successful_run {
            Some(prev) if prev > now => prev,
            _ => now,
        });
    }
}

/// Handle to the running background task
struct RunningLoop {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Everything the background task shares with the controller
struct Shared<C: CollaboratorClient> {
    executor: CycleExecutor<C>,
    config: LoopConfig,
    state: RwLock<LoopState>,
    stats: LoopStats,
    /// Collaborators polled before the first cycle when readiness is enabled
    readiness: Vec<CollaboratorDescriptor>,
    probe_timeout: Duration,
}

/// Drives the perpetual orchestration loop
pub struct LoopController<C: CollaboratorClient + 'static> {
    shared: Arc<Shared<C>>,
    running: Mutex<Option<RunningLoop>>,
}

fn guard<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<C: CollaboratorClient + 'static> LoopController<C> {
    /// Build an idle controller; nothing runs until [`start`](Self::start)
    pub fn new(client: Arc<C>, config: &Config) -> Self {
        let executor = CycleExecutor::new(
            client,
            CycleEndpoints::from_config(&config.collaborators),
            config.loop_config.call_timeout(),
        );
        Self {
            shared: Arc::new(Shared {
                executor,
                config: config.loop_config.clone(),
                state: RwLock::new(LoopState::default()),
                stats: LoopStats::new(),
                readiness: config.collaborators.pipeline_descriptors(),
                probe_timeout: config.audit.probe_timeout(),
            }),
            running: Mutex::new(None),
        }
    }

    pub fn loop_config(&self) -> &LoopConfig {
        &self.shared.config
    }

    /// Spawn the background task. Returns false if one is already running.
    pub fn start(&self) -> bool {
        let mut running = guard(&self.running);
        if running.as_ref().is_some_and(|rl| !rl.handle.is_finished()) {
            tracing::debug!("Loop already running; start ignored");
            return false;
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let shared = self.shared.clone();
        let handle = tokio::spawn(run_loop(shared, shutdown_rx));
        *running = Some(RunningLoop { shutdown_tx, handle });

        tracing::info!(
            timeout_secs = self.shared.config.timeout_seconds,
            interval_secs = self.shared.config.interval_seconds,
            "Loop started"
        );
        true
    }

    pub fn is_running(&self) -> bool {
        guard(&self.running)
            .as_ref()
            .is_some_and(|rl| !rl.handle.is_finished())
    }

    /// Signal the background task and wait for it to unwind
    pub async fn shutdown(&self) {
        let running = guard(&self.running).take();
        let Some(rl) = running else {
            return;
        };

        // Err here only means the task already exited
        let _ = rl.shutdown_tx.send(true);
        if let Err(e) = rl.handle.await {
            tracing::error!(error = ?e, "Loop task panicked");
        }
        tracing::info!("Loop stopped");
    }

    /// Run one deadline-bound iteration and record it, as the loop does
    pub async fn tick(&self) -> CycleOutcome {
        self.shared.tick().await
    }

    /// Run one deadline-bound cycle without touching loop state or stats
    pub async fn run_once(&self) -> CycleOutcome {
        self.shared.run_bounded().await
    }

    pub async fn last_successful_run(&self) -> Option<DateTime<Utc>> {
        self.shared.state.read().await.last_successful_run
    }

    pub fn stats(&self) -> LoopStatsSnapshot {
        self.shared.stats.snapshot()
    }
}

impl<C: CollaboratorClient> Shared<C> {
    async fn run_bounded(&self) -> CycleOutcome {
        let deadline = self.config.timeout();
        match tokio::time::timeout(deadline, self.executor.run_cycle()).await {
            Ok(outcome) => outcome,
            Err(_) => CycleOutcome::TimedOut,
        }
    }

    async fn tick(&self) -> CycleOutcome {
        let outcome = self.run_bounded().await;
        self.stats.record(&outcome);
        if outcome.is_alive() {
            self.state.write().await.mark_success(Utc::now());
        }

        match &outcome {
            CycleOutcome::Completed { correlation_id } => {
                tracing::info!(correlation_id = %correlation_id, "Cycle completed");
            }
            CycleOutcome::BlockedBySafety { reason } => {
                tracing::info!(reason = %reason, "Cycle blocked by safety gate");
            }
            CycleOutcome::TimedOut => {
                tracing::warn!(
                    timeout_secs = self.config.timeout_seconds,
                    timeouts = self.stats.snapshot().timed_out,
                    "Cycle timed out"
                );
            }
            CycleOutcome::Failed { cause } => {
                tracing::error!(cause = %cause, "Cycle failed");
            }
        }
        outcome
    }

    /// Poll every pipeline collaborator's health until each answers
    async fn wait_for_collaborators(&self) {
        let retry = self.config.readiness_retry();
        for descriptor in &self.readiness {
            loop {
                match self
                    .executor
                    .client()
                    .get_json(descriptor.health_url(), self.probe_timeout)
                    .await
                {
                    Ok(_) => {
                        tracing::info!(collaborator = %descriptor.name(), "Collaborator ready");
                        break;
                    }
                    Err(e) => {
                        tracing::info!(
                            collaborator = %descriptor.name(),
                            error = %e,
                            retry_secs = retry.as_secs_f64(),
                            "Waiting for collaborator"
                        );
                        tokio::time::sleep(retry).await;
                    }
                }
            }
        }
    }
}

async fn run_loop<C: CollaboratorClient>(shared: Arc<Shared<C>>, mut shutdown: watch::Receiver<bool>) {
    if shared.config.wait_for_collaborators {
        tokio::select! {
            biased;
            _ = shutdown.changed() => return,
            _ = shared.wait_for_collaborators() => {}
        }
    }

    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            _ = shared.tick() => {}
        }
        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            _ = tokio::time::sleep(shared.config.interval()) => {}
        }
    }
}
