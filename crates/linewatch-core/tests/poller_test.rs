#![allow(clippy::unwrap_used, clippy::float_cmp)]
// Scheduler and reducer behavior driven by a scripted telemetry source
// on a paused clock.

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use chrono::NaiveTime;
use pretty_assertions::assert_eq;
use tokio::sync::oneshot;

use std::sync::Arc;

use linewatch_core::{
    CoreError, Dashboard, DistributionSlice, HistoryPoint, LoadState, Machine, MachineId,
    MachineStatus, Poller, ProductionMetrics, Snapshot, TelemetrySource, Tier, TierPolicy,
    TimeMetrics, ViewStore,
};

const INTERVAL: Duration = Duration::from_secs(5);

// ── Scripted source ─────────────────────────────────────────────────

enum Reply<T> {
    Ready(Result<T, CoreError>),
    Gated(oneshot::Receiver<Result<T, CoreError>>),
}

impl<T> Reply<T> {
    async fn resolve(self) -> Result<T, CoreError> {
        match self {
            Reply::Ready(result) => result,
            Reply::Gated(rx) => rx
                .await
                .unwrap_or_else(|_| Err(CoreError::unavailable("gate dropped"))),
        }
    }
}

#[derive(Default)]
struct Script {
    snapshot: VecDeque<Reply<Snapshot>>,
    history: VecDeque<Reply<Vec<HistoryPoint>>>,
    distribution: VecDeque<Reply<Vec<DistributionSlice>>>,
}

/// Answers each fetch with the next scripted reply for that machine and
/// kind. An exhausted script answers `Unavailable`.
#[derive(Default)]
struct ScriptedSource {
    scripts: Mutex<HashMap<String, Script>>,
    calls: Mutex<HashMap<(String, &'static str), usize>>,
    machines: Vec<Machine>,
}

impl ScriptedSource {
    fn script(&self, id: &str, f: impl FnOnce(&mut Script)) {
        let mut scripts = self.scripts.lock().unwrap();
        f(scripts.entry(id.to_owned()).or_default());
    }

    fn calls(&self, id: &str, kind: &'static str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(&(id.to_owned(), kind))
            .copied()
            .unwrap_or(0)
    }

    fn next<T>(
        &self,
        id: &MachineId,
        kind: &'static str,
        pick: impl FnOnce(&mut Script) -> &mut VecDeque<Reply<T>>,
    ) -> Reply<T> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry((id.to_string(), kind))
            .or_default() += 1;
        let mut scripts = self.scripts.lock().unwrap();
        scripts
            .get_mut(id.as_str())
            .and_then(|script| pick(script).pop_front())
            .unwrap_or_else(|| Reply::Ready(Err(CoreError::unavailable("script exhausted"))))
    }
}

impl TelemetrySource for ScriptedSource {
    fn fetch_snapshot(
        &self,
        id: &MachineId,
    ) -> impl Future<Output = Result<Snapshot, CoreError>> + Send {
        let reply = self.next(id, "snapshot", |s| &mut s.snapshot);
        reply.resolve()
    }

    fn fetch_history(
        &self,
        id: &MachineId,
    ) -> impl Future<Output = Result<Vec<HistoryPoint>, CoreError>> + Send {
        let reply = self.next(id, "history", |s| &mut s.history);
        reply.resolve()
    }

    fn fetch_distribution(
        &self,
        id: &MachineId,
    ) -> impl Future<Output = Result<Vec<DistributionSlice>, CoreError>> + Send {
        let reply = self.next(id, "distribution", |s| &mut s.distribution);
        reply.resolve()
    }

    fn list_machines(&self) -> impl Future<Output = Result<Vec<Machine>, CoreError>> + Send {
        let machines = self.machines.clone();
        async move { Ok(machines) }
    }
}

// ── Fixtures ────────────────────────────────────────────────────────

fn snapshot(id: &str, name: &str, status: MachineStatus, efficiency: f64, oee: f64) -> Snapshot {
    Snapshot {
        machine: Machine {
            id: MachineId::from(id),
            name: name.into(),
            status,
        },
        production: ProductionMetrics {
            total_produced: 4582,
            total_rejects: 47,
            accepted_pieces: 4535,
            ppm_rejection: 10256.0,
            efficiency,
            oee,
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

fn cnc(efficiency: f64) -> Snapshot {
    snapshot("machine-1", "CNC Machine 01", MachineStatus::Running, efficiency, 87.5)
}

fn assembly() -> Snapshot {
    snapshot("machine-2", "Assembly Line 02", MachineStatus::Idle, 78.4, 72.1)
}

fn history(start: i32, produced: i64) -> Vec<HistoryPoint> {
    (start..start + 3)
        .map(|hour| HistoryPoint {
            label: format!("{hour:02}:00"),
            hour,
            produced,
            rejects: 5,
            efficiency: 90.0,
        })
        .collect()
}

fn distribution(running: f64) -> Vec<DistributionSlice> {
    vec![
        DistributionSlice {
            name: "Running".into(),
            value: running,
        },
        DistributionSlice {
            name: "Idle".into(),
            value: 100.0 - running,
        },
    ]
}

fn dashboard(source: ScriptedSource) -> Dashboard<ScriptedSource> {
    Dashboard::new(source, INTERVAL, TierPolicy::default()).unwrap()
}

/// Let spawned timer and round tasks run without letting the paused
/// clock auto-advance.
async fn settle() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}

async fn next_round() {
    tokio::time::advance(INTERVAL).await;
    settle().await;
}

// ── Scenarios ───────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_machine_one_two_rounds() {
    let source = ScriptedSource::default();
    source.script("machine-1", |s| {
        s.snapshot.push_back(Reply::Ready(Ok(cnc(92.3))));
        s.snapshot.push_back(Reply::Ready(Ok(cnc(68.0))));
        s.history.push_back(Reply::Ready(Ok(history(6, 560))));
        s.history
            .push_back(Reply::Ready(Err(CoreError::unavailable("timeout"))));
        s.distribution.push_back(Reply::Ready(Ok(distribution(81.0))));
        s.distribution.push_back(Reply::Ready(Ok(distribution(81.0))));
    });
    let dash = dashboard(source);

    dash.select("machine-1");
    settle().await;

    let view = dash.view();
    assert_eq!(view.load_state, LoadState::Ready);
    assert_eq!(view.selection, Some(MachineId::from("machine-1")));
    assert_eq!(view.snapshot.as_ref().unwrap().production.efficiency, 92.3);
    assert_eq!(view.history, history(6, 560));
    assert_eq!(view.distribution, distribution(81.0));
    assert_eq!(dash.tiers().unwrap().efficiency, Tier::Success);
    assert_eq!(dash.tiers().unwrap().oee, Tier::Success);
    assert_eq!(dash.tiers().unwrap().ppm, Tier::Default);

    next_round().await;

    let view = dash.view();
    assert_eq!(view.load_state, LoadState::Ready);
    assert_eq!(view.snapshot.as_ref().unwrap().production.efficiency, 68.0);
    assert_eq!(dash.tiers().unwrap().efficiency, Tier::Danger);
    assert_eq!(view.history, history(6, 560), "failed history must not clear the slice");
    assert_eq!(view.distribution, distribution(81.0));
    assert!(matches!(view.last_error, Some(CoreError::Unavailable { .. })));
    assert_eq!(dash.source().calls("machine-1", "snapshot"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_switch_discards_inflight_round() {
    let (gate_tx, gate_rx) = oneshot::channel();

    let source = ScriptedSource::default();
    source.script("machine-1", |s| {
        s.snapshot.push_back(Reply::Ready(Ok(cnc(92.3))));
        s.snapshot.push_back(Reply::Gated(gate_rx));
        s.history.push_back(Reply::Ready(Ok(history(6, 560))));
        s.history.push_back(Reply::Ready(Ok(history(6, 560))));
        s.distribution.push_back(Reply::Ready(Ok(distribution(81.0))));
        s.distribution.push_back(Reply::Ready(Ok(distribution(81.0))));
    });
    source.script("machine-2", |s| {
        s.snapshot.push_back(Reply::Ready(Ok(assembly())));
        s.history.push_back(Reply::Ready(Ok(history(6, 300))));
        s.distribution.push_back(Reply::Ready(Ok(distribution(60.0))));
    });
    let dash = dashboard(source);

    dash.select("machine-1");
    settle().await;
    next_round().await;
    assert_eq!(dash.source().calls("machine-1", "snapshot"), 2);

    // Round 2 for machine-1 is still waiting on its snapshot.
    dash.select("machine-2");
    assert_eq!(dash.view().load_state, LoadState::Loading);
    assert!(dash.view().snapshot.is_none(), "previous machine's data must be cleared");
    settle().await;

    let switched = dash.view();
    assert_eq!(switched.snapshot.as_ref().unwrap().machine.name, "Assembly Line 02");

    gate_tx.send(Ok(cnc(10.0))).unwrap();
    settle().await;

    let view = dash.view();
    assert_eq!(view, switched);
    assert_eq!(view.selection, Some(MachineId::from("machine-2")));
    assert_eq!(view.history, history(6, 300));
    assert_eq!(view.distribution, distribution(60.0));
    assert_eq!(dash.tiers().unwrap().efficiency, Tier::Warning);
    assert_eq!(dash.tiers().unwrap().oee, Tier::Warning);
}

#[tokio::test(start_paused = true)]
async fn test_stop_twice_leaves_no_timer() {
    let source = ScriptedSource::default();
    source.script("machine-1", |s| {
        s.snapshot.push_back(Reply::Ready(Ok(cnc(92.3))));
    });
    let dash = dashboard(source);

    dash.select("machine-1");
    settle().await;
    assert!(dash.is_polling());

    dash.stop();
    dash.stop();
    assert!(!dash.is_polling());

    next_round().await;
    next_round().await;

    assert_eq!(dash.source().calls("machine-1", "snapshot"), 1);
    let view = dash.view();
    assert!(view.cycle().is_none());
    assert_eq!(view.load_state, LoadState::Ready, "last merged data stays readable");
}

#[tokio::test(start_paused = true)]
async fn test_stop_during_inflight_round_discards_result() {
    let (gate_tx, gate_rx) = oneshot::channel();

    let source = ScriptedSource::default();
    source.script("machine-1", |s| {
        s.snapshot.push_back(Reply::Ready(Ok(cnc(92.3))));
        s.snapshot.push_back(Reply::Gated(gate_rx));
        s.history.push_back(Reply::Ready(Ok(history(6, 560))));
        s.history.push_back(Reply::Ready(Ok(history(7, 590))));
        s.distribution.push_back(Reply::Ready(Ok(distribution(81.0))));
        s.distribution.push_back(Reply::Ready(Ok(distribution(81.0))));
    });
    let dash = dashboard(source);

    dash.select("machine-1");
    settle().await;
    next_round().await;
    assert_eq!(dash.source().calls("machine-1", "snapshot"), 2);

    // Round 2's snapshot is still gated.
    dash.stop();
    assert!(!dash.is_polling());
    let stopped = dash.view();
    assert_eq!(dash.selection(), Some(MachineId::from("machine-1")));
    assert!(!stopped.is_loading());
    assert_eq!(stopped.history, history(7, 590));

    gate_tx.send(Ok(cnc(10.0))).unwrap();
    settle().await;
    next_round().await;

    let view = dash.view();
    assert_eq!(view, stopped, "result released after stop must not land");
    assert_eq!(view.snapshot.as_ref().unwrap().production.efficiency, 92.3);
    assert_eq!(dash.source().calls("machine-1", "snapshot"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_hung_fetch_does_not_block_next_round() {
    let (_held_tx, hung_rx) = oneshot::channel();

    let source = ScriptedSource::default();
    source.script("machine-1", |s| {
        s.snapshot.push_back(Reply::Gated(hung_rx));
        s.snapshot.push_back(Reply::Ready(Ok(cnc(92.3))));
        s.history.push_back(Reply::Ready(Ok(history(6, 560))));
        s.history.push_back(Reply::Ready(Ok(history(7, 590))));
    });
    let dash = dashboard(source);

    dash.select("machine-1");
    settle().await;

    let view = dash.view();
    assert_eq!(view.load_state, LoadState::Loading);
    assert_eq!(view.history, history(6, 560), "siblings apply as they resolve");

    next_round().await;

    let view = dash.view();
    assert_eq!(view.load_state, LoadState::Ready);
    assert_eq!(view.history, history(7, 590));
    assert_eq!(dash.source().calls("machine-1", "snapshot"), 2);
}

#[tokio::test(start_paused = true)]
async fn test_reselecting_same_machine_is_noop() {
    let source = ScriptedSource::default();
    source.script("machine-1", |s| {
        s.snapshot.push_back(Reply::Ready(Ok(cnc(92.3))));
    });
    let dash = dashboard(source);

    dash.select("machine-1");
    settle().await;
    let cycle = dash.view().cycle();

    dash.select("machine-1");
    settle().await;

    assert_eq!(dash.view().cycle(), cycle);
    assert_eq!(dash.view().load_state, LoadState::Ready);
    assert_eq!(dash.source().calls("machine-1", "snapshot"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_not_found_keeps_polling() {
    let source = ScriptedSource::default();
    source.script("machine-9", |s| {
        s.snapshot
            .push_back(Reply::Ready(Err(CoreError::not_found("machine-9"))));
        s.snapshot.push_back(Reply::Ready(Ok(snapshot(
            "machine-9",
            "Press 09",
            MachineStatus::Off,
            0.0,
            0.0,
        ))));
    });
    let dash = dashboard(source);

    dash.select("machine-9");
    settle().await;
    assert_eq!(dash.view().load_state, LoadState::NotFound);
    assert!(dash.is_polling());

    next_round().await;
    assert_eq!(dash.view().load_state, LoadState::Ready);
    assert_eq!(dash.tiers().unwrap().efficiency, Tier::Danger);
}

#[tokio::test(start_paused = true)]
async fn test_persistent_failure_stays_loading() {
    let dash = dashboard(ScriptedSource::default());

    dash.select("machine-1");
    settle().await;
    next_round().await;
    next_round().await;

    let view = dash.view();
    assert_eq!(view.load_state, LoadState::Loading);
    assert!(view.last_updated.is_none());
    assert!(view.is_stale(Duration::from_secs(15)));
    assert_eq!(dash.source().calls("machine-1", "snapshot"), 3);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_dashboard_releases_view() {
    let source = ScriptedSource::default();
    source.script("machine-1", |s| {
        s.snapshot.push_back(Reply::Ready(Ok(cnc(92.3))));
    });
    let dash = dashboard(source);
    dash.select("machine-1");
    settle().await;

    let mut stream = dash.subscribe();
    drop(dash);
    settle().await;

    let drained = tokio::time::timeout(Duration::from_secs(1), async {
        while stream.changed().await.is_some() {}
    })
    .await;
    assert!(drained.is_ok(), "view channel still open after drop");
}

#[tokio::test(start_paused = true)]
async fn test_subscribers_observe_round() {
    let source = ScriptedSource::default();
    source.script("machine-1", |s| {
        s.snapshot.push_back(Reply::Ready(Ok(cnc(92.3))));
    });
    let dash = dashboard(source);
    let mut stream = dash.subscribe();
    assert_eq!(stream.current().load_state, LoadState::Idle);

    dash.select("machine-1");
    settle().await;

    let view = stream.changed().await.unwrap();
    assert_eq!(view.load_state, LoadState::Ready);
}

#[test]
fn test_zero_interval_is_rejected() {
    let dash = Dashboard::new(ScriptedSource::default(), Duration::ZERO, TierPolicy::default());
    assert!(matches!(dash, Err(CoreError::Config { .. })));

    let poller = Poller::new(
        Arc::new(ScriptedSource::default()),
        Arc::new(ViewStore::new()),
        Duration::ZERO,
    );
    assert!(matches!(poller, Err(CoreError::Config { .. })));
}

// ── One-shot & directory ────────────────────────────────────────────

#[tokio::test]
async fn test_load_once_runs_single_round() {
    let source = ScriptedSource::default();
    source.script("machine-1", |s| {
        s.snapshot.push_back(Reply::Ready(Ok(cnc(92.3))));
        s.history.push_back(Reply::Ready(Ok(history(6, 560))));
        s.distribution.push_back(Reply::Ready(Ok(Vec::new())));
    });
    let dash = dashboard(source);

    let view = dash.load_once("machine-1").await;

    assert_eq!(view.load_state, LoadState::Ready);
    assert_eq!(view.history.len(), 3);
    assert!(view.distribution.is_empty());
    assert_eq!(view.distribution_or_derived().len(), 4);
    assert!(!dash.is_polling());
    assert!(view.cycle().is_none());
}

#[tokio::test]
async fn test_refresh_machines_fills_directory() {
    let source = ScriptedSource {
        machines: vec![
            Machine {
                id: MachineId::from("machine-2"),
                name: "Assembly Line 02".into(),
                status: MachineStatus::Idle,
            },
            Machine {
                id: MachineId::from("machine-1"),
                name: "CNC Machine 01".into(),
                status: MachineStatus::Running,
            },
        ],
        ..ScriptedSource::default()
    };
    let dash = dashboard(source);
    assert!(dash.machines().is_empty());

    let machines = dash.refresh_machines().await.unwrap();

    assert_eq!(machines.len(), 2);
    assert_eq!(machines[0].id.as_str(), "machine-1");
    assert_eq!(
        dash.machine(&MachineId::from("machine-2")).unwrap().status,
        MachineStatus::Idle
    );
}
