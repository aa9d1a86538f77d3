//! Single-permit admission gate with strict drop-not-block semantics
//! (design spec §4.5, §5).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A single-permit gate: at most one holder at a time. [`Gate::try_acquire`]
/// never blocks — on contention it returns `None` immediately rather than
/// queuing, which is what keeps the capture callback from ever building an
/// unbounded backlog.
#[derive(Debug, Default)]
pub struct Gate {
    taken: AtomicBool,
}

impl Gate {
    /// A fresh, unheld gate.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Attempt to take the permit without blocking.
    #[must_use]
    pub fn try_acquire(gate: &Arc<Self>) -> Option<GateGuard> {
        gate.taken
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| GateGuard { gate: Arc::clone(gate) })
    }
}

/// Releases the permit on drop, on every exit path (§5: "Consumers holding
/// the UI or processing permit must release it on all exit paths").
pub struct GateGuard {
    gate: Arc<Gate>,
}

impl Drop for GateGuard {
    fn drop(&mut self) {
        self.gate.taken.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::Gate;

    #[test]
    fn second_acquire_fails_while_held() {
        let gate = Gate::new();
        let first = Gate::try_acquire(&gate);
        assert!(first.is_some());
        assert!(Gate::try_acquire(&gate).is_none());
    }

    #[test]
    fn permit_releases_on_drop() {
        let gate = Gate::new();
        {
            let permit = Gate::try_acquire(&gate);
            assert!(permit.is_some());
        }
        assert!(Gate::try_acquire(&gate).is_some());
    }

    #[test]
    fn independent_gates_do_not_contend() {
        let processing = Gate::new();
        let ui = Gate::new();
        let _processing_permit = Gate::try_acquire(&processing);
        assert!(Gate::try_acquire(&ui).is_some());
    }
}
