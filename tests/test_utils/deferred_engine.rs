//! Engine that parks completion callbacks until the test releases them.

use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use sentry_transport::error::SubmissionError;
use sentry_transport::transport::{
    CompletionCallback, DeliveryOutcome, EnvelopeRequest, HttpEngine, RequestId,
};

#[derive(Default)]
pub struct DeferredEngine {
    parked: Mutex<Vec<(RequestId, CompletionCallback)>>,
    submissions: AtomicUsize,
}

impl DeferredEngine {
    pub fn submissions(&self) -> usize {
        self.submissions.load(Ordering::SeqCst)
    }

    /// Take every parked callback, leaving the engine empty.
    pub fn take_parked(&self) -> Vec<(RequestId, CompletionCallback)> {
        std::mem::take(&mut *self.parked.lock())
    }
}

impl HttpEngine for DeferredEngine {
    fn submit(
        &self,
        request: EnvelopeRequest,
        on_complete: CompletionCallback,
    ) -> Result<(), SubmissionError> {
        self.submissions.fetch_add(1, Ordering::SeqCst);
        self.parked.lock().push((request.id, on_complete));
        Ok(())
    }
}

/// Alternate outcomes so both success and failure paths are exercised.
pub fn outcome_for(index: usize) -> DeliveryOutcome {
    match index % 3 {
        0 => DeliveryOutcome::Delivered { status: 200 },
        1 => DeliveryOutcome::Rejected { status: 503 },
        _ => DeliveryOutcome::Failed("connection reset".into()),
    }
}
