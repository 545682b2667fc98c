// src/system/registry.rs

//! Bookkeeping for live child processes.
//!
//! Each `run` invocation owns its child and registers a signal channel here for
//! as long as the child is alive. `kill` requests are routed through that
//! channel, so the registry never touches a process it does not know is alive.

use crate::models::KillSignal;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;

/// Identifies one registered child process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProcessId(u64);

#[derive(Debug)]
struct LiveProcess {
    id: ProcessId,
    pid: Option<u32>,
    signals: mpsc::UnboundedSender<KillSignal>,
}

/// Registry of the children spawned by one shell, in spawn order.
#[derive(Debug, Default)]
pub struct ProcessRegistry {
    next_id: AtomicU64,
    live: Mutex<Vec<LiveProcess>>,
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LiveProcess>> {
        // The list stays consistent even if a holder panicked.
        self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a freshly spawned child. The returned receiver yields every
    /// signal requested for it until [`release`](Self::release) is called.
    pub fn register(&self, pid: Option<u32>) -> (ProcessId, mpsc::UnboundedReceiver<KillSignal>) {
        let id = ProcessId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (signals, receiver) = mpsc::unbounded_channel();
        self.lock().push(LiveProcess { id, pid, signals });
        log::trace!("Registered process {:?} (pid {:?}).", id, pid);
        (id, receiver)
    }

    /// Removes a child from the registry. Releasing twice is a no-op.
    pub fn release(&self, id: ProcessId) {
        let mut live = self.lock();
        if let Some(index) = live.iter().position(|p| p.id == id) {
            live.remove(index);
            log::trace!("Released process {:?}.", id);
        }
    }

    /// Requests `signal` for the most recently spawned live child.
    /// Returns `false` when nothing is running.
    pub fn signal_latest(&self, signal: KillSignal) -> bool {
        let live = self.lock();
        match live.last() {
            Some(process) => {
                log::debug!("Forwarding {} to pid {:?}.", signal, process.pid);
                process.signals.send(signal).is_ok()
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        !self.lock().is_empty()
    }

    /// The OS pid of the most recently spawned live child.
    pub fn latest_pid(&self) -> Option<u32> {
        self.lock().last().and_then(|p| p.pid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_without_running_process() {
        let registry = ProcessRegistry::new();
        assert!(!registry.is_running());
        assert!(!registry.signal_latest(KillSignal::Terminate));
    }

    #[test]
    fn test_signal_reaches_latest_registration() {
        let registry = ProcessRegistry::new();
        let (_first, mut first_rx) = registry.register(Some(10));
        let (second, mut second_rx) = registry.register(Some(20));
        assert_eq!(registry.latest_pid(), Some(20));

        assert!(registry.signal_latest(KillSignal::Interrupt));
        assert_eq!(second_rx.try_recv().ok(), Some(KillSignal::Interrupt));
        assert!(first_rx.try_recv().is_err());

        registry.release(second);
        assert_eq!(registry.latest_pid(), Some(10));
        assert!(registry.signal_latest(KillSignal::Kill));
        assert_eq!(first_rx.try_recv().ok(), Some(KillSignal::Kill));
    }

    #[test]
    fn test_release_is_idempotent() {
        let registry = ProcessRegistry::new();
        let (id, _rx) = registry.register(None);
        let (other, _other_rx) = registry.register(None);
        registry.release(id);
        registry.release(id);
        assert!(registry.is_running());
        registry.release(other);
        assert!(!registry.is_running());
        assert!(!registry.signal_latest(KillSignal::Terminate));
    }

    #[test]
    fn test_dropped_receiver_reports_failure() {
        let registry = ProcessRegistry::new();
        let (_id, rx) = registry.register(Some(1));
        drop(rx);
        assert!(!registry.signal_latest(KillSignal::Terminate));
    }
}
