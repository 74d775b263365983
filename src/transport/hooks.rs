//! Callback table handed to the host runtime.
//!
//! The host drives the transport through five entry points and never owns
//! it: the table holds a weak handle, and the transport's lifetime is
//! governed by its self-reference until [`TransportHooks::on_free`].

use std::sync::Weak;
use std::time::Duration;

use crate::envelope::Envelope;

use super::lifecycle::EnvelopeTransport;

/// Non-owning entry points into an [`EnvelopeTransport`].
///
/// Every call after the transport has been released is a no-op; status
/// returning calls then report `false`.
#[derive(Debug)]
pub struct TransportHooks {
    target: Weak<EnvelopeTransport>,
}

impl TransportHooks {
    pub(crate) fn new(target: Weak<EnvelopeTransport>) -> Self {
        Self { target }
    }

    /// Start the transport with a connection string.
    pub fn on_startup(&self, dsn: &str) -> bool {
        self.target
            .upgrade()
            .is_some_and(|transport| transport.startup(dsn))
    }

    /// Submit an envelope. Ownership passes to the transport.
    pub fn on_send(&self, envelope: Envelope) {
        if let Some(transport) = self.target.upgrade() {
            transport.send(envelope);
        }
    }

    /// Wait up to `timeout_ms` for in-flight requests.
    pub fn on_flush(&self, timeout_ms: u64) -> bool {
        self.target.upgrade().is_some_and(|transport| {
            transport
                .flush(Duration::from_millis(timeout_ms))
                .is_drained()
        })
    }

    /// Stop accepting envelopes and flush for up to `timeout_ms`.
    pub fn on_shutdown(&self, timeout_ms: u64) -> bool {
        self.target.upgrade().is_some_and(|transport| {
            transport
                .shutdown(Duration::from_millis(timeout_ms))
                .is_drained()
        })
    }

    /// Terminal callback: the host will not call into the transport again.
    pub fn on_free(self) {
        if let Some(transport) = self.target.upgrade() {
            transport.free();
        }
    }

    /// Whether the transport behind this table still exists.
    pub fn is_live(&self) -> bool {
        self.target.strong_count() > 0
    }
}
