//! The seam between the transport and the HTTP layer that carries requests.

use std::fmt;
use std::sync::Arc;

use crate::{envelope::Envelope, error::SubmissionError};

/// Content type of a serialized envelope body.
pub const ENVELOPE_CONTENT_TYPE: &str = "application/x-sentry-envelope";
/// Header carrying the DSN-derived credentials.
pub const AUTH_HEADER: &str = "X-Sentry-Auth";

/// Opaque handle identifying one pending request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl RequestId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A fully addressed envelope POST.
#[derive(Clone, Debug)]
pub struct EnvelopeRequest {
    pub id: RequestId,
    pub url: Arc<str>,
    pub headers: Vec<(&'static str, Arc<str>)>,
    pub body: Envelope,
}

impl EnvelopeRequest {
    /// Look up a header by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_ref())
    }
}

/// How a request finished.
///
/// The transport treats every variant the same way: the request leaves the
/// in-flight set and is never retried.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The collector answered with a 2xx status.
    Delivered { status: u16 },
    /// The collector answered with a non-2xx status.
    Rejected { status: u16 },
    /// The request never produced a response.
    Failed(String),
}

impl DeliveryOutcome {
    pub fn from_status(status: u16) -> Self {
        match status {
            200..=299 => Self::Delivered { status },
            _ => Self::Rejected { status },
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }
}

/// Callback invoked exactly once when a submitted request finishes.
pub type CompletionCallback = Box<dyn FnOnce(RequestId, DeliveryOutcome) + Send + 'static>;

/// An HTTP engine able to run envelope requests without blocking the caller.
///
/// `submit` either accepts the request, in which case `on_complete` is
/// eventually invoked from a thread of the engine's choosing, or rejects it
/// synchronously, in which case `on_complete` is dropped without being
/// called.
pub trait HttpEngine: Send + Sync {
    fn submit(
        &self,
        request: EnvelopeRequest,
        on_complete: CompletionCallback,
    ) -> Result<(), SubmissionError>;

    /// Drive progress of a pending request.
    ///
    /// Engines without their own scheduler get serviced here while a flush
    /// waits. Engines with dedicated I/O threads keep the default no-op.
    fn tick(&self, _id: RequestId) {}
}
