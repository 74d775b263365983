//! The envelope transport: dispatcher, lifecycle and completion handling.

use std::{
    sync::{
        Arc, Weak,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

use log::{debug, info, warn};
use once_cell::sync::OnceCell;
use parking_lot::{Mutex, RwLock};

use crate::{dsn::Endpoint, envelope::Envelope, rate_limited_warner::RateLimitedWarner};

use super::{
    config::TransportConfig,
    engine::{
        AUTH_HEADER, CompletionCallback, DeliveryOutcome, ENVELOPE_CONTENT_TYPE, EnvelopeRequest,
        HttpEngine, RequestId,
    },
    hooks::TransportHooks,
    in_flight::InFlight,
};

/// Used when a flush timeout is too large to add to the current instant.
const FAR_FUTURE: Duration = Duration::from_secs(60 * 60 * 24 * 365);

/// Lifecycle phase of a transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportState {
    /// Not yet started; envelopes are dropped.
    Created,
    /// Accepting envelopes.
    Started,
    /// Shutdown has begun; envelopes are dropped while the final flush runs.
    ShuttingDown,
    /// Shutdown finished or the transport was freed.
    Closed,
}

/// Result of waiting for in-flight requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Nothing is in flight any more.
    Drained,
    /// The deadline passed with requests still in flight. They are
    /// abandoned, not cancelled.
    TimedOut { outstanding: usize },
}

impl FlushOutcome {
    pub fn is_drained(self) -> bool {
        matches!(self, Self::Drained)
    }
}

/// Addressing computed once at startup.
struct Route {
    url: Arc<str>,
    headers: Vec<(&'static str, Arc<str>)>,
}

impl Route {
    fn new(endpoint: &Endpoint, user_agent: &str) -> Self {
        Self {
            url: Arc::from(endpoint.url()),
            headers: vec![
                ("Content-Type", Arc::from(ENVELOPE_CONTENT_TYPE)),
                (AUTH_HEADER, Arc::from(endpoint.auth_header())),
                ("User-Agent", Arc::from(user_agent)),
            ],
        }
    }

    fn request(&self, id: RequestId, body: Envelope) -> EnvelopeRequest {
        EnvelopeRequest {
            id,
            url: Arc::clone(&self.url),
            headers: self.headers.clone(),
            body,
        }
    }
}

/// Delivers envelopes to the collector named by a DSN.
///
/// The transport keeps a strong reference to itself from construction until
/// [`free`](Self::free), so a host that only holds a non-owning handle (see
/// [`TransportHooks`]) keeps it alive. Any thread may call
/// [`send`](Self::send); lifecycle calls are expected to be serialised by the
/// host.
pub struct EnvelopeTransport {
    config: TransportConfig,
    engine: Arc<dyn HttpEngine>,
    route: OnceCell<Route>,
    state: RwLock<TransportState>,
    in_flight: InFlight,
    next_id: AtomicU64,
    dropped: RateLimitedWarner,
    failed: RateLimitedWarner,
    me: Weak<EnvelopeTransport>,
    self_ref: Mutex<Option<Arc<EnvelopeTransport>>>,
}

impl EnvelopeTransport {
    /// Create a transport that owns itself until [`free`](Self::free).
    pub fn new(config: TransportConfig, engine: Arc<dyn HttpEngine>) -> Arc<Self> {
        let transport = Arc::new_cyclic(|me| Self {
            dropped: RateLimitedWarner::new(config.warn_interval),
            failed: RateLimitedWarner::new(config.warn_interval),
            config,
            engine,
            route: OnceCell::new(),
            state: RwLock::new(TransportState::Created),
            in_flight: InFlight::default(),
            next_id: AtomicU64::new(1),
            me: me.clone(),
            self_ref: Mutex::new(None),
        });
        *transport.self_ref.lock() = Some(Arc::clone(&transport));
        transport
    }

    /// A non-owning callback table bound to this transport.
    pub fn hooks(&self) -> TransportHooks {
        TransportHooks::new(self.me.clone())
    }

    /// Derive the endpoint from `dsn` and begin accepting envelopes.
    ///
    /// Returns `false` if the DSN is malformed or the transport has already
    /// left the `Created` state; the transport then stays non-accepting.
    pub fn startup(&self, dsn: &str) -> bool {
        let mut state = self.state.write();
        if *state != TransportState::Created {
            warn!("EnvelopeTransport: startup ignored in state {:?}", *state);
            return false;
        }
        let endpoint = match Endpoint::parse(dsn, &self.config.client_name) {
            Ok(endpoint) => endpoint,
            Err(err) => {
                warn!("EnvelopeTransport: not starting, {err}");
                return false;
            }
        };
        let route = self
            .route
            .get_or_init(|| Route::new(&endpoint, &self.config.user_agent));
        info!("EnvelopeTransport: sending envelopes to {}", route.url);
        *state = TransportState::Started;
        true
    }

    /// Hand an envelope to the transport.
    ///
    /// Never blocks on I/O and never fails. Envelopes arriving while the
    /// transport is not accepting, or that the engine refuses, are dropped.
    pub fn send(&self, envelope: Envelope) {
        // A held write lock means startup or shutdown is mid-transition.
        let Some(state) = self.state.try_read() else {
            self.record_drop();
            return;
        };
        let current = *state;
        let route = match (current, self.route.get()) {
            (TransportState::Started, Some(route)) => route,
            _ => {
                drop(state);
                self.record_drop();
                return;
            }
        };

        let id = RequestId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let request = route.request(id, envelope);
        let me = self.me.clone();
        let on_complete: CompletionCallback = Box::new(move |id, outcome| {
            if let Some(transport) = me.upgrade() {
                transport.complete_request(id, outcome);
            }
        });

        // `state` stays read-locked until submission returns, so shutdown
        // cannot close the gate between the check and the dispatch.
        self.in_flight.insert(id);
        if let Err(err) = self.engine.submit(request, on_complete) {
            self.in_flight.remove(id);
            debug!("EnvelopeTransport: request {id} rejected: {err}");
            self.record_drop();
        }
    }

    /// Completion handler for request `id`.
    ///
    /// Removes the request from the in-flight set. A request that is no
    /// longer pending is ignored. Failures are counted, never retried.
    pub fn complete_request(&self, id: RequestId, outcome: DeliveryOutcome) {
        if !self.in_flight.remove(id) {
            debug!("EnvelopeTransport: ignoring completion of unknown request {id}");
            return;
        }
        if outcome.is_delivered() {
            debug!("EnvelopeTransport: request {id} delivered");
            return;
        }
        debug!("EnvelopeTransport: request {id} failed: {outcome:?}");
        self.failed.record_drop();
        self.failed.warn_if_due(|count| {
            warn!("EnvelopeTransport: {count} envelope deliveries failed");
        });
    }

    /// Wait up to `timeout` for every in-flight request to finish.
    ///
    /// Polls the in-flight set, ticking each pending request through the
    /// engine, and wakes early when the last request completes.
    pub fn flush(&self, timeout: Duration) -> FlushOutcome {
        self.report_losses();
        let now = Instant::now();
        let deadline = now
            .checked_add(timeout)
            .unwrap_or_else(|| now + FAR_FUTURE);
        let outstanding =
            self.in_flight
                .wait_drained(deadline, self.config.poll_interval, |pending| {
                    for id in pending {
                        self.engine.tick(*id);
                    }
                });
        if outstanding == 0 {
            return FlushOutcome::Drained;
        }
        warn!("EnvelopeTransport: flush timed out with {outstanding} requests in flight");
        FlushOutcome::TimedOut { outstanding }
    }

    /// Stop accepting envelopes, then flush for up to `timeout`.
    pub fn shutdown(&self, timeout: Duration) -> FlushOutcome {
        {
            let mut state = self.state.write();
            if *state != TransportState::Closed {
                *state = TransportState::ShuttingDown;
            }
        }
        info!("EnvelopeTransport: shutting down");
        let outcome = self.flush(timeout);
        *self.state.write() = TransportState::Closed;
        outcome
    }

    /// Release the transport's reference to itself.
    ///
    /// Once every other owner is gone the transport is destroyed. Calling
    /// this more than once has no further effect.
    pub fn free(&self) {
        *self.state.write() = TransportState::Closed;
        let me = self.self_ref.lock().take();
        if me.is_none() {
            debug!("EnvelopeTransport: free called more than once");
        }
        drop(me);
    }

    pub fn state(&self) -> TransportState {
        *self.state.read()
    }

    pub fn is_accepting(&self) -> bool {
        self.state() == TransportState::Started
    }

    /// Whether the transport still holds its own reference.
    pub fn is_self_owned(&self) -> bool {
        self.self_ref.lock().is_some()
    }

    pub fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }

    /// Envelope endpoint, available once startup has succeeded.
    pub fn endpoint_url(&self) -> Option<&str> {
        self.route.get().map(|route| route.url.as_ref())
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    fn record_drop(&self) {
        self.dropped.record_drop();
        self.dropped.warn_if_due(|count| {
            warn!("EnvelopeTransport dropped {count} envelopes");
        });
    }

    fn report_losses(&self) {
        self.dropped.flush(|count| {
            warn!("EnvelopeTransport dropped {count} envelopes in the last interval");
        });
        self.failed.flush(|count| {
            warn!("EnvelopeTransport: {count} envelope deliveries failed in the last interval");
        });
    }
}

impl Drop for EnvelopeTransport {
    fn drop(&mut self) {
        let abandoned = self.in_flight.len();
        if abandoned > 0 {
            debug!("EnvelopeTransport: released with {abandoned} requests in flight");
        }
    }
}

impl std::fmt::Debug for EnvelopeTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvelopeTransport")
            .field("state", &self.state())
            .field("endpoint", &self.endpoint_url())
            .field("in_flight", &self.in_flight_len())
            .finish()
    }
}
