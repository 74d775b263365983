//! An [`HttpEngine`] whose requests finish only when a test says so.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::error::SubmissionError;
use crate::transport::{
    CompletionCallback, DeliveryOutcome, EnvelopeRequest, HttpEngine, RequestId,
};

/// Engine that records submissions and holds their callbacks.
///
/// Nothing completes on its own. Tests call [`complete`](Self::complete)
/// or [`complete_all`](Self::complete_all) from any thread, or enable
/// completion on the next flush tick.
#[derive(Default)]
pub struct ManualEngine {
    submitted: Mutex<Vec<EnvelopeRequest>>,
    pending: Mutex<HashMap<RequestId, CompletionCallback>>,
    reject_next: AtomicUsize,
    ticks: AtomicUsize,
    complete_on_tick: Mutex<bool>,
}

impl ManualEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse the next `count` submissions with [`SubmissionError::QueueFull`].
    pub fn reject_next(&self, count: usize) {
        self.reject_next.store(count, Ordering::SeqCst);
    }

    /// Finish requests when the transport ticks them during a flush.
    pub fn complete_on_tick(&self, enabled: bool) {
        *self.complete_on_tick.lock() = enabled;
    }

    /// Every request accepted so far, in submission order.
    pub fn submitted(&self) -> Vec<EnvelopeRequest> {
        self.submitted.lock().clone()
    }

    pub fn submitted_count(&self) -> usize {
        self.submitted.lock().len()
    }

    pub fn pending_ids(&self) -> Vec<RequestId> {
        let mut ids: Vec<_> = self.pending.lock().keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn tick_count(&self) -> usize {
        self.ticks.load(Ordering::SeqCst)
    }

    /// Invoke the callback for `id`. Returns `false` if it is not pending.
    pub fn complete(&self, id: RequestId, outcome: DeliveryOutcome) -> bool {
        let callback = self.pending.lock().remove(&id);
        match callback {
            Some(callback) => {
                callback(id, outcome);
                true
            }
            None => false,
        }
    }

    /// Deliver every pending request with status 200.
    pub fn complete_all(&self) -> usize {
        let callbacks: Vec<_> = self.pending.lock().drain().collect();
        let count = callbacks.len();
        for (id, callback) in callbacks {
            callback(id, DeliveryOutcome::Delivered { status: 200 });
        }
        count
    }
}

impl HttpEngine for ManualEngine {
    fn submit(
        &self,
        request: EnvelopeRequest,
        on_complete: CompletionCallback,
    ) -> Result<(), SubmissionError> {
        let rejected = self
            .reject_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if rejected {
            return Err(SubmissionError::QueueFull);
        }
        self.pending.lock().insert(request.id, on_complete);
        self.submitted.lock().push(request);
        Ok(())
    }

    fn tick(&self, id: RequestId) {
        self.ticks.fetch_add(1, Ordering::SeqCst);
        if *self.complete_on_tick.lock() {
            self.complete(id, DeliveryOutcome::Delivered { status: 200 });
        }
    }
}
