//! The guarded set of pending requests.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use super::engine::RequestId;

/// Pending requests plus a condition variable signalled when the set drains.
///
/// Every access goes through the mutex. Removal is idempotent so a late
/// completion racing a rollback, or arriving after a flush gave up, is
/// harmless.
#[derive(Debug, Default)]
pub(crate) struct InFlight {
    pending: Mutex<HashSet<RequestId>>,
    drained: Condvar,
}

impl InFlight {
    pub(crate) fn insert(&self, id: RequestId) {
        self.pending.lock().insert(id);
    }

    /// Remove `id`, returning whether it was still pending.
    pub(crate) fn remove(&self, id: RequestId) -> bool {
        let mut pending = self.pending.lock();
        let removed = pending.remove(&id);
        if removed && pending.is_empty() {
            self.drained.notify_all();
        }
        removed
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub(crate) fn snapshot(&self) -> Vec<RequestId> {
        self.pending.lock().iter().copied().collect()
    }

    /// Wait until the set is empty or `deadline` passes.
    ///
    /// Each round hands a snapshot of the pending ids to `tick` outside the
    /// lock, then sleeps for at most `poll_interval` or until woken by the
    /// set draining. Returns the number of requests still pending, zero on
    /// success.
    pub(crate) fn wait_drained(
        &self,
        deadline: Instant,
        poll_interval: Duration,
        mut tick: impl FnMut(&[RequestId]),
    ) -> usize {
        loop {
            let snapshot = self.snapshot();
            if snapshot.is_empty() {
                return 0;
            }
            tick(&snapshot);

            let mut pending = self.pending.lock();
            if pending.is_empty() {
                return 0;
            }
            let now = Instant::now();
            if now >= deadline {
                return pending.len();
            }
            let wake = (now + poll_interval).min(deadline);
            let _ = self.drained.wait_until(&mut pending, wake);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn remove_is_idempotent() {
        let set = InFlight::default();
        set.insert(RequestId::new(1));
        assert!(set.remove(RequestId::new(1)));
        assert!(!set.remove(RequestId::new(1)));
        assert_eq!(set.len(), 0);
    }

    #[test]
    fn empty_set_drains_without_ticking() {
        let set = InFlight::default();
        let mut ticks = 0;
        let left = set.wait_drained(Instant::now(), Duration::from_millis(10), |_| ticks += 1);
        assert_eq!(left, 0);
        assert_eq!(ticks, 0);
    }

    #[test]
    fn past_deadline_reports_outstanding() {
        let set = InFlight::default();
        set.insert(RequestId::new(1));
        set.insert(RequestId::new(2));
        let left = set.wait_drained(Instant::now(), Duration::from_millis(10), |_| {});
        assert_eq!(left, 2);
    }

    #[test]
    fn tick_can_complete_requests() {
        let set = InFlight::default();
        set.insert(RequestId::new(1));
        let deadline = Instant::now() + Duration::from_secs(5);
        let left = set.wait_drained(deadline, Duration::from_millis(10), |ids| {
            for id in ids {
                set.remove(*id);
            }
        });
        assert_eq!(left, 0);
    }

    #[test]
    fn removal_on_other_thread_wakes_waiter() {
        let set = Arc::new(InFlight::default());
        set.insert(RequestId::new(9));
        let remover = {
            let set = Arc::clone(&set);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                set.remove(RequestId::new(9));
            })
        };
        let started = Instant::now();
        let left = set.wait_drained(
            started + Duration::from_secs(5),
            Duration::from_secs(1),
            |_| {},
        );
        remover.join().expect("remover thread panicked");
        assert_eq!(left, 0);
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
