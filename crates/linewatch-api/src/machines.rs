// Machine table endpoints
//
// `GET /rest/v1/machines`: the directory (id, name, status) and the
// full per-machine snapshot row.

use tracing::debug;

use crate::client::StoreClient;
use crate::error::Error;
use crate::models::{MACHINE_COLUMNS, MACHINE_SUMMARY_COLUMNS, MachineRow, MachineSummaryRow};

const TABLE: &str = "machines";

impl StoreClient {
    /// List every known machine, ordered by id.
    ///
    /// `GET /rest/v1/machines?select=id,name,status&order=id.asc`
    pub async fn list_machines(&self) -> Result<Vec<MachineSummaryRow>, Error> {
        debug!("listing machines");
        self.select(
            TABLE,
            &[
                ("select", MACHINE_SUMMARY_COLUMNS.to_owned()),
                ("order", "id.asc".to_owned()),
            ],
        )
        .await
    }

    /// Fetch the snapshot row for one machine.
    ///
    /// `GET /rest/v1/machines?select=...&id=eq.{id}`
    ///
    /// Returns `Ok(None)` when no row matches; the id filter is on the
    /// primary key so at most one row comes back.
    pub async fn get_machine(&self, machine_id: &str) -> Result<Option<MachineRow>, Error> {
        debug!(machine_id, "fetching machine snapshot");
        let rows: Vec<MachineRow> = self
            .select(
                TABLE,
                &[
                    ("select", MACHINE_COLUMNS.to_owned()),
                    ("id", format!("eq.{machine_id}")),
                    ("limit", "1".to_owned()),
                ],
            )
            .await?;
        Ok(rows.into_iter().next())
    }
}
