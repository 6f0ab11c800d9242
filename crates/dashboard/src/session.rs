//! The refresh lifecycle of one dashboard view.
//!
//! A session task owns the filter state, the refresh timer and the cycle
//! counter. Each cycle gets the next generation number; an outcome is
//! committed only while its generation is still the latest, so a slow cycle
//! that was overtaken by a filter change can never overwrite newer data.
//! After teardown nothing is committed, even by cycles still in flight.

use common::filters::{FilterKey, FilterParams};
use common::monitor_api::MonitorApi;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::filter_state::FilterState;
use crate::orchestrator::{CycleData, CycleFailure, DataOrchestrator};
use crate::sources::DashboardSnapshot;

const COMMAND_BUFFER: usize = 32;
const OUTCOME_BUFFER: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("dashboard session is closed")]
    Closed,
}

/// Result of a filter update as seen by the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterUpdate {
    /// `false` when the value was rejected or already current.
    pub applied: bool,
    pub filters: FilterParams,
    pub url: String,
}

enum Command {
    SetFilter {
        key: FilterKey,
        value: f64,
        reply: oneshot::Sender<FilterUpdate>,
    },
}

type Outcome = (u64, Result<CycleData, CycleFailure>);

/// Cheap handle for observing a session and changing its filters.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    snapshot: watch::Receiver<DashboardSnapshot>,
    cancel: CancellationToken,
}

impl SessionHandle {
    /// The most recently published snapshot.
    pub fn snapshot(&self) -> DashboardSnapshot {
        self.snapshot.borrow().clone()
    }

    /// A receiver that is notified on every published change.
    pub fn subscribe(&self) -> watch::Receiver<DashboardSnapshot> {
        self.snapshot.clone()
    }

    /// Apply one filter change. An applied change restarts the refresh
    /// immediately with the new filters and postpones the next timer tick by
    /// a full period.
    pub async fn set_filter(&self, key: FilterKey, value: f64) -> Result<FilterUpdate, SessionError> {
        if self.cancel.is_cancelled() {
            return Err(SessionError::Closed);
        }
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::SetFilter { key, value, reply })
            .await
            .map_err(|_closed| SessionError::Closed)?;
        response.await.map_err(|_dropped| SessionError::Closed)
    }
}

/// A running view. Dropping it stops the refresh loop; [`Session::teardown`]
/// additionally waits for the loop to exit.
pub struct Session {
    handle: SessionHandle,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl Session {
    pub(crate) fn spawn<A: MonitorApi + 'static>(
        orchestrator: DataOrchestrator<A>,
        filters: FilterState,
    ) -> Self {
        let cancel = CancellationToken::new();
        let initial = DashboardSnapshot::new(*filters.params(), filters.shareable_url());
        let (snapshot_tx, snapshot_rx) = watch::channel(initial);
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);
        let (outcomes_tx, outcomes_rx) = mpsc::channel(OUTCOME_BUFFER);

        let runner = Runner {
            orchestrator,
            filters,
            generation: 0,
            snapshot: snapshot_tx,
            outcomes: outcomes_tx,
        };
        let task = tokio::spawn(runner.run(commands_rx, outcomes_rx, cancel.clone()));

        Self {
            handle: SessionHandle {
                commands: commands_tx,
                snapshot: snapshot_rx,
                cancel: cancel.clone(),
            },
            cancel,
            task: Some(task),
        }
    }

    pub fn handle(&self) -> SessionHandle {
        self.handle.clone()
    }

    pub fn is_active(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// Stop the refresh loop and wait for it to exit. In-flight requests are
    /// left to finish but their results are discarded.
    pub async fn teardown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                error!(error = %err, "dashboard session task ended abnormally");
            }
        }
        info!("dashboard session torn down");
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct Runner<A> {
    orchestrator: DataOrchestrator<A>,
    filters: FilterState,
    generation: u64,
    snapshot: watch::Sender<DashboardSnapshot>,
    outcomes: mpsc::Sender<Outcome>,
}

impl<A: MonitorApi + 'static> Runner<A> {
    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut outcomes: mpsc::Receiver<Outcome>,
        cancel: CancellationToken,
    ) {
        let period = self.orchestrator.period();
        info!(period_secs = period.as_secs(), url = %self.filters.shareable_url(), "dashboard session started");

        self.start_cycle();
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(generation = self.generation, "dashboard session cancelled");
                    break;
                }
                Some((generation, outcome)) = outcomes.recv() => {
                    self.settle(generation, outcome);
                }
                Some(command) = commands.recv() => {
                    self.handle_command(command, &mut interval);
                }
                _ = interval.tick() => {
                    self.start_cycle();
                }
            }
        }
    }

    fn handle_command(&mut self, command: Command, interval: &mut Interval) {
        match command {
            Command::SetFilter { key, value, reply } => {
                let applied = self.filters.set(key, value);
                metrics::counter!(
                    "dashboard_filter_updates_total",
                    "applied" => if applied { "true" } else { "false" }
                )
                .increment(1);

                if applied {
                    info!(key = %key, value, url = %self.filters.shareable_url(), "filters changed");
                    interval.reset();
                    self.start_cycle();
                }
                let update = FilterUpdate {
                    applied,
                    filters: *self.filters.params(),
                    url: self.filters.shareable_url(),
                };
                if reply.send(update).is_err() {
                    debug!(key = %key, "filter update caller went away");
                }
            }
        }
    }

    /// Publish the loading state and put all five requests in flight.
    fn start_cycle(&mut self) {
        self.generation += 1;
        let generation = self.generation;
        let filters = *self.filters.params();
        let address = self.filters.shareable_url();
        self.snapshot.send_modify(|snap| {
            snap.generation = generation;
            snap.filters = filters;
            snap.address = address;
            snap.mark_all_loading();
        });

        let orchestrator = self.orchestrator.clone();
        let outcomes = self.outcomes.clone();
        let span = info_span!("refresh_cycle", generation);
        tokio::spawn(
            async move {
                let fetch = tokio::spawn(
                    async move { orchestrator.refresh(&filters).await }.in_current_span(),
                );
                let outcome = match fetch.await {
                    Ok(outcome) => outcome,
                    Err(err) => {
                        error!(error = %err, "refresh task did not complete");
                        Err(CycleFailure::generic())
                    }
                };
                if outcomes.send((generation, outcome)).await.is_err() {
                    debug!("session gone, dropping cycle outcome");
                }
            }
            .instrument(span),
        );
    }

    fn settle(&mut self, generation: u64, outcome: Result<CycleData, CycleFailure>) {
        if generation != self.generation {
            metrics::counter!("dashboard_refresh_cycles_total", "outcome" => "stale").increment(1);
            debug!(generation, latest = self.generation, "discarding superseded cycle");
            return;
        }
        match outcome {
            Ok(data) => {
                metrics::counter!("dashboard_refresh_cycles_total", "outcome" => "ok").increment(1);
                info!(
                    generation,
                    smart_money = data.smart_money.len(),
                    whales = data.whales.len(),
                    top_profit = data.top_profit.len(),
                    hot_markets = data.hot_markets.len(),
                    suspicious_wallets = data.suspicious_wallets.len(),
                    "refresh cycle committed"
                );
                self.snapshot.send_modify(|snap| data.apply_to(snap));
            }
            Err(failure) => {
                metrics::counter!("dashboard_refresh_cycles_total", "outcome" => "error")
                    .increment(1);
                warn!(generation, source = ?failure.source, error = %failure, "refresh cycle failed");
                self.snapshot
                    .send_modify(|snap| snap.mark_all_failed(&failure.message));
            }
        }
    }
}
