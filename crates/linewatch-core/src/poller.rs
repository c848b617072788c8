// ── Poll scheduler ──
//
// Owns the repeat timer for the selected machine. Each tick spawns an
// independent round task, so a hung fetch never delays the next round.
// A round issues the three fetches concurrently and hands each result to
// the `ViewStore` as soon as it resolves; the store's cycle check is what
// keeps results for a previous selection out of the view.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::model::MachineId;
use crate::source::TelemetrySource;
use crate::store::{CycleId, RoundOutcome, ViewStore};

/// Default interval between poll rounds.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

struct ActiveCycle {
    machine: MachineId,
    cycle: CycleId,
    cancel: CancellationToken,
    timer: JoinHandle<()>,
}

/// Repeating fetch cycle for one consumer.
///
/// At most one cycle is active. [`start`](Self::start) and
/// [`stop`](Self::stop) are synchronous: the previous cycle is invalidated
/// before they return. Dropping the poller stops it.
pub struct Poller<S: TelemetrySource> {
    source: Arc<S>,
    store: Arc<ViewStore>,
    interval: Duration,
    active: Mutex<Option<ActiveCycle>>,
}

impl<S: TelemetrySource> Poller<S> {
    /// Fails with `CoreError::Config` for a zero interval, which the
    /// timer cannot tick on.
    pub fn new(
        source: Arc<S>,
        store: Arc<ViewStore>,
        interval: Duration,
    ) -> Result<Self, CoreError> {
        if interval.is_zero() {
            return Err(CoreError::config("poll interval must be greater than zero"));
        }
        Ok(Self {
            source,
            store,
            interval,
            active: Mutex::new(None),
        })
    }

    /// Begin polling `machine`: one round immediately, then one every
    /// interval until stopped or restarted for another machine.
    ///
    /// Starting the machine that is already being polled is a no-op.
    /// Must be called from within a Tokio runtime.
    pub fn start(&self, machine: MachineId) {
        let mut slot = self.active.lock().unwrap_or_else(PoisonError::into_inner);

        if slot.as_ref().is_some_and(|a| a.machine == machine) {
            debug!(%machine, "already polling");
            return;
        }

        if let Some(previous) = slot.take() {
            previous.cancel.cancel();
            debug!(machine = %previous.machine, cycle = previous.cycle.get(), "cycle replaced");
        }

        // Invalidate before the first fetch for the new machine is issued.
        let cycle = self.store.begin_selection(machine.clone());
        let cancel = CancellationToken::new();

        let timer = tokio::spawn(cycle_task(
            Arc::clone(&self.source),
            Arc::clone(&self.store),
            machine.clone(),
            cycle,
            self.interval,
            cancel.clone(),
        ));

        info!(%machine, cycle = cycle.get(), interval = ?self.interval, "polling started");
        *slot = Some(ActiveCycle {
            machine,
            cycle,
            cancel,
            timer,
        });
    }

    /// Halt the timer and invalidate the active cycle. Idempotent; rounds
    /// still in flight finish but their results are discarded.
    pub fn stop(&self) {
        let mut slot = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(active) = slot.take() else {
            return;
        };
        active.cancel.cancel();
        self.store.end_selection();
        info!(machine = %active.machine, cycle = active.cycle.get(), "polling stopped");
    }

    pub fn is_active(&self) -> bool {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|a| !a.timer.is_finished())
    }
}

impl<S: TelemetrySource> Drop for Poller<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

// ── Background tasks ─────────────────────────────────────────────

/// Tick until cancelled, spawning one round per tick. The first tick
/// completes immediately.
async fn cycle_task<S: TelemetrySource>(
    source: Arc<S>,
    store: Arc<ViewStore>,
    machine: MachineId,
    cycle: CycleId,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                tokio::spawn(run_round(
                    Arc::clone(&source),
                    Arc::clone(&store),
                    machine.clone(),
                    cycle,
                ));
            }
        }
    }
    debug!(%machine, cycle = cycle.get(), "timer task exited");
}

/// One fetch round: three concurrent fetches, each merged as it resolves.
pub(crate) async fn run_round<S: TelemetrySource>(
    source: Arc<S>,
    store: Arc<ViewStore>,
    machine: MachineId,
    cycle: CycleId,
) {
    let deliver = |outcome: RoundOutcome| {
        if let Some(err) = outcome.error() {
            warn!(%machine, kind = outcome.kind(), error = %err, "fetch failed");
        }
        store.apply(cycle, outcome);
    };

    tokio::join!(
        async { deliver(RoundOutcome::Snapshot(source.fetch_snapshot(&machine).await)) },
        async { deliver(RoundOutcome::History(source.fetch_history(&machine).await)) },
        async {
            deliver(RoundOutcome::Distribution(
                source.fetch_distribution(&machine).await,
            ));
        },
    );
}
