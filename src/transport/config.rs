//! Configuration consumed by the transport and its default engine.
//!
//! [`TransportBuilder`](super::TransportBuilder) constructs these values
//! before passing them to [`EnvelopeTransport`](super::EnvelopeTransport).

use std::time::Duration;

use crate::rate_limited_warner::DEFAULT_WARN_INTERVAL;

/// Identifier used for both the user agent and the auth header's client.
pub const DEFAULT_CLIENT_NAME: &str = concat!("sentry-transport-rs/", env!("CARGO_PKG_VERSION"));
/// Default sleep between flush polling rounds.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);
/// Default bounded queue capacity of the request engine.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;
/// Default number of engine worker threads.
pub const DEFAULT_WORKERS: usize = 2;
/// Default connection timeout applied when establishing HTTP connections.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Default overall timeout applied to a single HTTP request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Transport settings.
#[derive(Clone, Debug)]
pub struct TransportConfig {
    /// Sent as the `User-Agent` header.
    pub user_agent: String,
    /// Sent as `sentry_client` inside the auth header.
    pub client_name: String,
    /// Upper bound on a single flush wait between polling rounds.
    pub poll_interval: Duration,
    /// Engine queue capacity; submissions beyond it are rejected.
    pub capacity: usize,
    /// Engine worker threads.
    pub workers: usize,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    /// Interval between rate-limited loss warnings.
    pub warn_interval: Duration,
    /// Skip TLS certificate validation (intended for test collectors).
    pub accept_invalid_certs: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_CLIENT_NAME.to_owned(),
            client_name: DEFAULT_CLIENT_NAME.to_owned(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            capacity: DEFAULT_CHANNEL_CAPACITY,
            workers: DEFAULT_WORKERS,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            warn_interval: DEFAULT_WARN_INTERVAL,
            accept_invalid_certs: false,
        }
    }
}
