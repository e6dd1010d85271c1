//! Wall-clock budget with a cooperative stop flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A deadline plus a flag another thread can raise to cancel the search.
///
/// Search loops poll [`Budget::expired`] between units of work and return
/// their best result so far once it fires.
#[derive(Debug, Clone)]
pub struct Budget {
    deadline: Option<Instant>,
    stop: Arc<AtomicBool>,
}

impl Budget {
    /// A budget that only ends when stopped.
    pub fn unbounded() -> Self {
        Budget {
            deadline: None,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn new(deadline: Instant, stop: Arc<AtomicBool>) -> Self {
        Budget {
            deadline: Some(deadline),
            stop,
        }
    }

    /// A budget ending `timeout` from now.
    pub fn from_timeout(timeout: Duration) -> Self {
        Budget::new(Instant::now() + timeout, Arc::new(AtomicBool::new(false)))
    }

    pub fn expired(&self) -> bool {
        self.stop.load(Ordering::Relaxed) || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    /// Shared handle to the stop flag.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbounded_expires_only_when_stopped() {
        let budget = Budget::unbounded();
        assert!(!budget.expired());
        assert!(budget.remaining().is_none());
        budget.stop();
        assert!(budget.expired());
    }

    #[test]
    fn stop_flag_is_shared_between_clones() {
        let budget = Budget::from_timeout(Duration::from_secs(60));
        let clone = budget.clone();
        budget.stop_flag().store(true, Ordering::Relaxed);
        assert!(clone.expired());
    }

    #[test]
    fn past_deadline_is_expired() {
        let budget = Budget::from_timeout(Duration::ZERO);
        assert!(budget.expired());
        assert_eq!(budget.remaining(), Some(Duration::ZERO));
    }
}
