// ── Machine directory collection ──
//
// Concurrent id -> machine map plus an id-ordered snapshot held in a
// `watch` cell. Refreshed wholesale from the store; entries missing from
// a refresh are pruned.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;

use crate::model::{Machine, MachineId};

pub(crate) struct MachineDirectory {
    by_id: DashMap<MachineId, Arc<Machine>>,

    /// Full snapshot ordered by id, rebuilt on mutation.
    snapshot: watch::Sender<Arc<Vec<Arc<Machine>>>>,
}

impl MachineDirectory {
    pub(crate) fn new() -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            by_id: DashMap::new(),
            snapshot,
        }
    }

    /// Upsert every incoming machine and drop ids that are no longer present.
    pub(crate) fn replace_all(&self, machines: Vec<Machine>) {
        let incoming: HashSet<MachineId> = machines.iter().map(|m| m.id.clone()).collect();

        for machine in machines {
            self.by_id.insert(machine.id.clone(), Arc::new(machine));
        }
        self.by_id.retain(|id, _| incoming.contains(id));

        self.rebuild_snapshot();
    }

    pub(crate) fn get(&self, id: &MachineId) -> Option<Arc<Machine>> {
        self.by_id.get(id).map(|r| Arc::clone(r.value()))
    }

    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<Machine>>> {
        self.snapshot.borrow().clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.by_id.len()
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn rebuild_snapshot(&self) {
        let mut values: Vec<Arc<Machine>> =
            self.by_id.iter().map(|r| Arc::clone(r.value())).collect();
        values.sort_by(|a, b| a.id.cmp(&b.id));
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(values));
    }
}
