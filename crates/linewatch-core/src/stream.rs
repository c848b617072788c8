// ── Reactive view stream ──
//
// Subscription type for consuming view changes from a `ViewStore`.

use tokio::sync::watch;

use crate::store::DashboardView;

/// A subscription to the merged dashboard view.
///
/// Provides point-in-time access and change notification via
/// [`changed()`](Self::changed).
pub struct ViewStream {
    current: DashboardView,
    receiver: watch::Receiver<DashboardView>,
}

impl ViewStream {
    pub(crate) fn new(mut receiver: watch::Receiver<DashboardView>) -> Self {
        let current = receiver.borrow_and_update().clone();
        Self { current, receiver }
    }

    /// The view as of creation or the last `changed()`.
    pub fn current(&self) -> &DashboardView {
        &self.current
    }

    /// Wait for the next change, returning the new view.
    /// Returns `None` once the owning store has been dropped.
    pub async fn changed(&mut self) -> Option<DashboardView> {
        self.receiver.changed().await.ok()?;
        let view = self.receiver.borrow_and_update().clone();
        self.current = view.clone();
        Some(view)
    }
}
