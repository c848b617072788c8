// ── Dashboard facade ──
//
// What a renderer talks to: selection, the merged view, tiers for the
// current snapshot, and the machine directory. One dashboard per
// consumer; dropping it stops polling.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use linewatch_api::StoreClient;

use crate::classify::{MetricTiers, TierPolicy};
use crate::config::DashboardConfig;
use crate::error::CoreError;
use crate::model::{Machine, MachineId};
use crate::poller::{self, Poller};
use crate::source::TelemetrySource;
use crate::store::{DashboardView, MachineDirectory, ViewStore};
use crate::stream::ViewStream;

pub struct Dashboard<S: TelemetrySource> {
    source: Arc<S>,
    store: Arc<ViewStore>,
    poller: Poller<S>,
    directory: MachineDirectory,
    policy: TierPolicy,
}

impl Dashboard<StoreClient> {
    /// Build a dashboard backed by the PostgREST store described by `config`.
    /// Does not fetch anything until a machine is selected.
    pub fn connect(config: &DashboardConfig) -> Result<Self, CoreError> {
        config.validate()?;
        let client = StoreClient::new(
            config.store_url.clone(),
            &config.api_key,
            &config.transport(),
        )?;
        debug!(url = %config.store_url, "store client ready");
        Self::new(client, config.poll_interval, config.thresholds)
    }
}

impl<S: TelemetrySource> Dashboard<S> {
    /// Fails with `CoreError::Config` when `poll_interval` is zero.
    pub fn new(
        source: S,
        poll_interval: Duration,
        policy: TierPolicy,
    ) -> Result<Self, CoreError> {
        let source = Arc::new(source);
        let store = Arc::new(ViewStore::new());
        let poller = Poller::new(Arc::clone(&source), Arc::clone(&store), poll_interval)?;
        Ok(Self {
            source,
            store,
            poller,
            directory: MachineDirectory::new(),
            policy,
        })
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    // ── Selection ────────────────────────────────────────────────

    /// Select a machine and (re)start polling it. Selecting the current
    /// machine again changes nothing.
    pub fn select(&self, machine: impl Into<MachineId>) {
        self.poller.start(machine.into());
    }

    pub fn selection(&self) -> Option<MachineId> {
        self.store.current().selection
    }

    /// Stop polling. The last merged view stays readable.
    pub fn stop(&self) {
        self.poller.stop();
    }

    pub fn is_polling(&self) -> bool {
        self.poller.is_active()
    }

    /// Run a single fetch round for `machine` and return the merged view.
    ///
    /// Any active cycle is stopped first; no timer is left running.
    pub async fn load_once(&self, machine: impl Into<MachineId>) -> DashboardView {
        self.poller.stop();
        let machine = machine.into();
        let cycle = self.store.begin_selection(machine.clone());
        poller::run_round(Arc::clone(&self.source), Arc::clone(&self.store), machine, cycle)
            .await;
        self.store.end_selection();
        self.store.current()
    }

    // ── View ─────────────────────────────────────────────────────

    pub fn view(&self) -> DashboardView {
        self.store.current()
    }

    pub fn subscribe(&self) -> ViewStream {
        self.store.subscribe()
    }

    /// Tiers for the current snapshot, computed now from the active policy.
    pub fn tiers(&self) -> Option<MetricTiers> {
        self.store
            .current()
            .snapshot
            .map(|snap| self.policy.evaluate(&snap.production))
    }

    pub fn policy(&self) -> &TierPolicy {
        &self.policy
    }

    // ── Machine directory ────────────────────────────────────────

    /// Reload the machine directory from the source.
    pub async fn refresh_machines(&self) -> Result<Arc<Vec<Arc<Machine>>>, CoreError> {
        let machines = self.source.list_machines().await?;
        self.directory.replace_all(machines);
        debug!(machines = self.directory.len(), "machine directory refreshed");
        Ok(self.directory.snapshot())
    }

    /// Cached directory as of the last refresh.
    pub fn machines(&self) -> Arc<Vec<Arc<Machine>>> {
        self.directory.snapshot()
    }

    pub fn machine(&self, id: &MachineId) -> Option<Arc<Machine>> {
        self.directory.get(id)
    }
}
