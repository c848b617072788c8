// ── View state reducer ──
//
// Merges fetch results for the selected machine into one renderable
// `DashboardView`. The view lives in a `watch` channel together with the
// id of the cycle allowed to write to it; `apply` checks that id and
// mutates inside a single `send_if_modified` closure, so once a cycle is
// replaced or ended none of its results can land.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::debug;

use crate::error::CoreError;
use crate::model::{DistributionSlice, HistoryPoint, MachineId, Snapshot};
use crate::stream::ViewStream;

// ── Cycle identity ───────────────────────────────────────────────

/// Liveness marker for one poll cycle. Never reused within a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CycleId(u64);

impl CycleId {
    pub fn get(self) -> u64 {
        self.0
    }
}

// ── View ─────────────────────────────────────────────────────────

/// Load phase of the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum LoadState {
    /// Nothing selected.
    #[default]
    Idle,
    /// Selected, no snapshot merged yet.
    Loading,
    /// At least one snapshot merged for this selection.
    Ready,
    /// The store reported no such machine before anything loaded.
    NotFound,
}

/// Everything a renderer needs for the selected machine.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DashboardView {
    pub selection: Option<MachineId>,
    pub load_state: LoadState,
    pub snapshot: Option<Snapshot>,
    pub history: Vec<HistoryPoint>,
    pub distribution: Vec<DistributionSlice>,
    /// Time of the last successfully merged sub-fetch.
    pub last_updated: Option<DateTime<Utc>>,
    /// Most recent sub-fetch failure for this selection. Cleared by a
    /// successful snapshot.
    pub last_error: Option<CoreError>,
    cycle: Option<CycleId>,
}

impl DashboardView {
    /// The cycle currently allowed to write, if any.
    pub fn cycle(&self) -> Option<CycleId> {
        self.cycle
    }

    pub fn is_loading(&self) -> bool {
        self.load_state == LoadState::Loading
    }

    /// `true` when nothing has merged yet or the last merge is older than
    /// `max_age`.
    pub fn is_stale(&self, max_age: Duration) -> bool {
        match self.last_updated {
            None => true,
            Some(at) => (Utc::now() - at)
                .to_std()
                .is_ok_and(|age| age > max_age),
        }
    }

    /// Distribution rows from the store, or shares derived from the
    /// snapshot's uptime breakdown when the store has none.
    pub fn distribution_or_derived(&self) -> Vec<DistributionSlice> {
        match (&self.snapshot, self.distribution.is_empty()) {
            (Some(snap), true) => snap.time.derived_distribution(),
            _ => self.distribution.clone(),
        }
    }
}

// ── Round outcomes ───────────────────────────────────────────────

/// One resolved sub-fetch of a poll round.
#[derive(Debug, Clone)]
pub enum RoundOutcome {
    Snapshot(Result<Snapshot, CoreError>),
    History(Result<Vec<HistoryPoint>, CoreError>),
    Distribution(Result<Vec<DistributionSlice>, CoreError>),
}

impl RoundOutcome {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Snapshot(_) => "snapshot",
            Self::History(_) => "history",
            Self::Distribution(_) => "distribution",
        }
    }

    pub fn error(&self) -> Option<&CoreError> {
        match self {
            Self::Snapshot(r) => r.as_ref().err(),
            Self::History(r) => r.as_ref().err(),
            Self::Distribution(r) => r.as_ref().err(),
        }
    }
}

// ── ViewStore ────────────────────────────────────────────────────

/// Exclusive owner of the merged view for one consumer.
pub struct ViewStore {
    view: watch::Sender<DashboardView>,
    next_cycle: AtomicU64,
}

impl Default for ViewStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewStore {
    pub fn new() -> Self {
        let (view, _) = watch::channel(DashboardView::default());
        Self {
            view,
            next_cycle: AtomicU64::new(1),
        }
    }

    /// Clone of the current view.
    pub fn current(&self) -> DashboardView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> ViewStream {
        ViewStream::new(self.view.subscribe())
    }

    pub fn active_cycle(&self) -> Option<CycleId> {
        self.view.borrow().cycle
    }

    /// Start a new selection: clear the previous machine's slices, enter
    /// `Loading`, and make a fresh cycle the only one allowed to write.
    pub fn begin_selection(&self, machine: MachineId) -> CycleId {
        let cycle = CycleId(self.next_cycle.fetch_add(1, Ordering::Relaxed));
        self.view.send_modify(|view| {
            *view = DashboardView {
                selection: Some(machine),
                load_state: LoadState::Loading,
                cycle: Some(cycle),
                ..DashboardView::default()
            };
        });
        cycle
    }

    /// Revoke write access for the active cycle. The merged data and the
    /// selection stay visible. Returns `false` if no cycle was active.
    pub fn end_selection(&self) -> bool {
        self.view.send_if_modified(|view| view.cycle.take().is_some())
    }

    /// Merge one sub-fetch result. Returns `false` when `cycle` is no
    /// longer the active one and the result was discarded.
    pub fn apply(&self, cycle: CycleId, outcome: RoundOutcome) -> bool {
        let mut accepted = false;
        self.view.send_if_modified(|view| {
            if view.cycle != Some(cycle) {
                return false;
            }
            accepted = true;
            merge(view, outcome);
            true
        });
        if !accepted {
            debug!(cycle = cycle.get(), "discarded result from inactive cycle");
        }
        accepted
    }
}

fn merge(view: &mut DashboardView, outcome: RoundOutcome) {
    match outcome {
        RoundOutcome::Snapshot(Ok(snapshot)) => {
            view.snapshot = Some(snapshot);
            view.load_state = LoadState::Ready;
            view.last_error = None;
            view.last_updated = Some(Utc::now());
        }
        RoundOutcome::Snapshot(Err(err)) => {
            if err.is_not_found() && view.load_state == LoadState::Loading {
                view.load_state = LoadState::NotFound;
            }
            view.last_error = Some(err);
        }
        RoundOutcome::History(Ok(history)) => {
            view.history = history;
            view.last_updated = Some(Utc::now());
        }
        RoundOutcome::Distribution(Ok(distribution)) => {
            view.distribution = distribution;
            view.last_updated = Some(Utc::now());
        }
        RoundOutcome::History(Err(err)) | RoundOutcome::Distribution(Err(err)) => {
            view.last_error = Some(err);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{Machine, MachineStatus, ProductionMetrics, TimeMetrics};
    use chrono::NaiveTime;

    fn snapshot(id: &str, efficiency: f64) -> Snapshot {
        Snapshot {
            machine: Machine {
                id: MachineId::from(id),
                name: "CNC Machine 01".into(),
                status: MachineStatus::Running,
            },
            production: ProductionMetrics {
                total_produced: 4582,
                total_rejects: 47,
                accepted_pieces: 4535,
                ppm_rejection: 10256.0,
                efficiency,
                oee: 87.5,
            },
            time: TimeMetrics {
                on_time: 6.5,
                off_time: 0.5,
                idle_time: 0.75,
                fault_time: 0.25,
                shift_start: NaiveTime::from_hms_opt(6, 0, 0).unwrap(),
                shift_end: NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            },
        }
    }

    fn point(hour: i32) -> HistoryPoint {
        HistoryPoint {
            label: format!("{hour:02}:00"),
            hour,
            produced: 500,
            rejects: 5,
            efficiency: 90.0,
        }
    }

    #[test]
    fn new_selection_enters_loading_with_empty_slices() {
        let store = ViewStore::new();
        let cycle = store.begin_selection(MachineId::from("machine-1"));
        let view = store.current();

        assert_eq!(view.load_state, LoadState::Loading);
        assert_eq!(view.cycle(), Some(cycle));
        assert!(view.snapshot.is_none());
        assert!(view.history.is_empty());
        assert!(view.last_updated.is_none());
    }

    #[test]
    fn first_snapshot_moves_to_ready() {
        let store = ViewStore::new();
        let cycle = store.begin_selection(MachineId::from("machine-1"));

        assert!(store.apply(cycle, RoundOutcome::Snapshot(Ok(snapshot("machine-1", 92.3)))));
        let view = store.current();
        assert_eq!(view.load_state, LoadState::Ready);
        assert!(view.last_updated.is_some());
    }

    #[test]
    fn history_failure_leaves_history_untouched() {
        let store = ViewStore::new();
        let cycle = store.begin_selection(MachineId::from("machine-1"));
        store.apply(cycle, RoundOutcome::History(Ok(vec![point(6), point(7)])));

        store.apply(cycle, RoundOutcome::Snapshot(Ok(snapshot("machine-1", 80.0))));
        store.apply(
            cycle,
            RoundOutcome::History(Err(CoreError::unavailable("timeout"))),
        );

        let view = store.current();
        assert_eq!(view.history, vec![point(6), point(7)]);
        assert!((view.snapshot.unwrap().production.efficiency - 80.0).abs() < f64::EPSILON);
        assert_eq!(view.last_error, Some(CoreError::unavailable("timeout")));
    }

    #[test]
    fn failures_after_ready_do_not_reenter_loading() {
        let store = ViewStore::new();
        let cycle = store.begin_selection(MachineId::from("machine-1"));
        store.apply(cycle, RoundOutcome::Snapshot(Ok(snapshot("machine-1", 92.3))));
        let stamp = store.current().last_updated;

        store.apply(
            cycle,
            RoundOutcome::Snapshot(Err(CoreError::not_found("machine-1"))),
        );

        let view = store.current();
        assert_eq!(view.load_state, LoadState::Ready);
        assert!(view.snapshot.is_some());
        assert_eq!(view.last_updated, stamp);
    }

    #[test]
    fn not_found_while_loading_is_placeholder_state() {
        let store = ViewStore::new();
        let cycle = store.begin_selection(MachineId::from("machine-9"));

        store.apply(
            cycle,
            RoundOutcome::Snapshot(Err(CoreError::not_found("machine-9"))),
        );
        assert_eq!(store.current().load_state, LoadState::NotFound);

        // A record created later is still picked up.
        store.apply(cycle, RoundOutcome::Snapshot(Ok(snapshot("machine-9", 90.0))));
        assert_eq!(store.current().load_state, LoadState::Ready);
    }

    #[test]
    fn unavailable_while_loading_stays_loading() {
        let store = ViewStore::new();
        let cycle = store.begin_selection(MachineId::from("machine-1"));
        store.apply(
            cycle,
            RoundOutcome::Snapshot(Err(CoreError::unavailable("down"))),
        );
        assert_eq!(store.current().load_state, LoadState::Loading);
    }

    #[test]
    fn stale_cycle_is_discarded() {
        let store = ViewStore::new();
        let old = store.begin_selection(MachineId::from("machine-1"));
        let new = store.begin_selection(MachineId::from("machine-2"));
        let before = store.current();

        assert!(!store.apply(old, RoundOutcome::Snapshot(Ok(snapshot("machine-1", 92.3)))));
        assert_eq!(store.current(), before);

        assert!(store.apply(new, RoundOutcome::Snapshot(Ok(snapshot("machine-2", 78.4)))));
        assert_eq!(
            store.current().snapshot.unwrap().machine.id.as_str(),
            "machine-2"
        );
    }

    #[test]
    fn ended_selection_rejects_results_but_keeps_data() {
        let store = ViewStore::new();
        let cycle = store.begin_selection(MachineId::from("machine-1"));
        store.apply(cycle, RoundOutcome::Snapshot(Ok(snapshot("machine-1", 92.3))));

        assert!(store.end_selection());
        assert!(!store.end_selection());
        assert!(!store.apply(cycle, RoundOutcome::History(Ok(vec![point(6)]))));

        let view = store.current();
        assert!(view.history.is_empty());
        assert!(view.snapshot.is_some());
        assert_eq!(store.active_cycle(), None);
    }

    #[test]
    fn staleness_follows_last_merge() {
        let store = ViewStore::new();
        assert!(store.current().is_stale(Duration::from_secs(15)));

        let cycle = store.begin_selection(MachineId::from("machine-1"));
        store.apply(cycle, RoundOutcome::Distribution(Ok(Vec::new())));
        assert!(!store.current().is_stale(Duration::from_secs(15)));
    }

    #[test]
    fn derived_distribution_fills_empty_rows() {
        let store = ViewStore::new();
        let cycle = store.begin_selection(MachineId::from("machine-1"));
        store.apply(cycle, RoundOutcome::Snapshot(Ok(snapshot("machine-1", 92.3))));

        let slices = store.current().distribution_or_derived();
        assert_eq!(slices.len(), 4);
        assert_eq!(slices[0].name, "Running");
    }
}
