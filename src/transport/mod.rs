//! Envelope transport.
//!
//! [`EnvelopeTransport`] accepts serialized envelopes from any thread and
//! posts them to the envelope endpoint derived from a DSN. Requests run on
//! an [`HttpEngine`]; the transport tracks them in a guarded in-flight set
//! which completion callbacks drain from the engine's threads.
//!
//! # Lifecycle
//!
//! `Created → Started → ShuttingDown → Closed`. Startup parses the DSN,
//! shutdown closes the gate and performs a final bounded flush, and `free`
//! releases the transport's reference to itself.
//!
//! # Delivery semantics
//!
//! At most once. Envelopes are dropped when the transport is not accepting,
//! when the engine refuses them, or when delivery fails; nothing is retried
//! and nothing is reported back through `send`.

mod builder;
mod config;
mod engine;
mod hooks;
mod in_flight;
mod lifecycle;
mod ureq_engine;


pub use builder::TransportBuilder;
pub use config::{
    DEFAULT_CHANNEL_CAPACITY, DEFAULT_CLIENT_NAME, DEFAULT_CONNECT_TIMEOUT, DEFAULT_POLL_INTERVAL,
    DEFAULT_REQUEST_TIMEOUT, DEFAULT_WORKERS, TransportConfig,
};
pub use engine::{
    AUTH_HEADER, CompletionCallback, DeliveryOutcome, ENVELOPE_CONTENT_TYPE, EnvelopeRequest,
    HttpEngine, RequestId,
};
pub use hooks::TransportHooks;
pub use lifecycle::{EnvelopeTransport, FlushOutcome, TransportState};
pub use ureq_engine::UreqEngine;
