// Per-machine telemetry endpoints
//
// Rolling hourly production history and the uptime distribution shares.
// Both return an empty vec (not an error) when the machine has no rows.

use tracing::debug;

use crate::client::StoreClient;
use crate::error::Error;
use crate::models::{DISTRIBUTION_COLUMNS, DistributionRow, HISTORY_COLUMNS, HistoryRow};

impl StoreClient {
    /// Fetch hourly production history for a machine, ascending by hour.
    ///
    /// `GET /rest/v1/production_history?select=...&machine_id=eq.{id}&order=hour.asc`
    pub async fn list_production_history(&self, machine_id: &str) -> Result<Vec<HistoryRow>, Error> {
        debug!(machine_id, "fetching production history");
        self.select(
            "production_history",
            &[
                ("select", HISTORY_COLUMNS.to_owned()),
                ("machine_id", format!("eq.{machine_id}")),
                ("order", "hour.asc".to_owned()),
            ],
        )
        .await
    }

    /// Fetch the uptime distribution shares for a machine.
    ///
    /// `GET /rest/v1/machine_time_distribution?select=name,value&machine_id=eq.{id}`
    pub async fn list_time_distribution(
        &self,
        machine_id: &str,
    ) -> Result<Vec<DistributionRow>, Error> {
        debug!(machine_id, "fetching time distribution");
        self.select(
            "machine_time_distribution",
            &[
                ("select", DISTRIBUTION_COLUMNS.to_owned()),
                ("machine_id", format!("eq.{machine_id}")),
            ],
        )
        .await
    }
}
