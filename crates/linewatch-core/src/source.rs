// ── Telemetry source ──
//
// The fetch seam between the poller and whatever answers queries. The
// production implementation is the PostgREST `StoreClient`; tests drive
// the poller with scripted sources.

use std::future::Future;

use tracing::debug;

use linewatch_api::StoreClient;

use crate::convert;
use crate::error::CoreError;
use crate::model::{DistributionSlice, HistoryPoint, Machine, MachineId, Snapshot};

/// Independent, concurrently callable queries for one machine.
///
/// Implementations return typed errors and never panic across this
/// boundary; one failing query has no effect on its siblings.
pub trait TelemetrySource: Send + Sync + 'static {
    /// Current reading. `NotFound` when the store has no such machine.
    fn fetch_snapshot(
        &self,
        id: &MachineId,
    ) -> impl Future<Output = Result<Snapshot, CoreError>> + Send;

    /// Hourly history, ascending by hour. Empty when there are no rows.
    fn fetch_history(
        &self,
        id: &MachineId,
    ) -> impl Future<Output = Result<Vec<HistoryPoint>, CoreError>> + Send;

    /// Uptime shares. Empty when there are no rows.
    fn fetch_distribution(
        &self,
        id: &MachineId,
    ) -> impl Future<Output = Result<Vec<DistributionSlice>, CoreError>> + Send;

    /// Every known machine, ordered by id.
    fn list_machines(&self) -> impl Future<Output = Result<Vec<Machine>, CoreError>> + Send;
}

impl TelemetrySource for StoreClient {
    async fn fetch_snapshot(&self, id: &MachineId) -> Result<Snapshot, CoreError> {
        let row = self
            .get_machine(id.as_str())
            .await?
            .ok_or_else(|| CoreError::not_found(id.as_str()))?;
        Snapshot::try_from(row)
    }

    async fn fetch_history(&self, id: &MachineId) -> Result<Vec<HistoryPoint>, CoreError> {
        let rows = self.list_production_history(id.as_str()).await?;
        debug!(machine = %id, rows = rows.len(), "history fetched");
        Ok(convert::history_points(rows))
    }

    async fn fetch_distribution(
        &self,
        id: &MachineId,
    ) -> Result<Vec<DistributionSlice>, CoreError> {
        let rows = self.list_time_distribution(id.as_str()).await?;
        Ok(rows.into_iter().map(DistributionSlice::from).collect())
    }

    async fn list_machines(&self) -> Result<Vec<Machine>, CoreError> {
        let rows = StoreClient::list_machines(self).await?;
        let mut machines = rows
            .into_iter()
            .map(Machine::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        machines.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(machines)
    }
}
