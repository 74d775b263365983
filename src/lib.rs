//! HTTP transport for serialized diagnostic envelopes.
//!
//! The transport accepts envelopes from any thread without blocking, posts
//! them to the envelope endpoint named by a DSN, and offers a bounded flush
//! for shutdown and crash paths. See [`transport`] for the lifecycle.

pub mod dsn;
pub mod envelope;
pub mod error;
pub mod rate_limited_warner;
pub mod settings;
pub mod transport;

#[cfg(test)]
mod test_utils;

pub use dsn::{Dsn, Endpoint};
pub use envelope::Envelope;
pub use error::{BuildError, ConfigurationError, SettingsError, SubmissionError};
pub use settings::ClientSettings;
pub use transport::{
    DeliveryOutcome, EnvelopeTransport, FlushOutcome, HttpEngine, TransportBuilder,
    TransportConfig, TransportHooks, TransportState, UreqEngine,
};
