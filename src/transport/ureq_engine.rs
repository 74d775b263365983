//! Default [`HttpEngine`] backed by ureq worker threads.
//!
//! Submissions go onto a bounded queue and return immediately. Each worker
//! owns a clone of one pooled `ureq::Agent`, performs the blocking POST and
//! invokes the completion callback on its own thread. No retries are made.

use std::{
    io,
    sync::Arc,
    thread::{self, JoinHandle},
};

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use log::{debug, warn};
use native_tls::TlsConnector;
use parking_lot::Mutex;
use ureq::{Agent, AgentBuilder};

use crate::error::SubmissionError;

use super::{
    config::TransportConfig,
    engine::{CompletionCallback, DeliveryOutcome, EnvelopeRequest, HttpEngine},
};

struct Job {
    request: EnvelopeRequest,
    on_complete: CompletionCallback,
}

/// Thread-pool HTTP engine using ureq.
pub struct UreqEngine {
    tx: Mutex<Option<Sender<Job>>>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl UreqEngine {
    /// Spawn `config.workers` threads sharing a queue of `config.capacity`.
    ///
    /// # Errors
    ///
    /// Fails if the TLS connector cannot be built or a thread cannot be
    /// spawned.
    pub fn with_config(config: &TransportConfig) -> io::Result<Self> {
        let agent = build_agent(config)?;
        let (tx, rx) = bounded(config.capacity);
        let mut handles = Vec::with_capacity(config.workers);
        for index in 0..config.workers {
            let rx = rx.clone();
            let agent = agent.clone();
            let handle = thread::Builder::new()
                .name(format!("sentry-transport-{index}"))
                .spawn(move || worker_loop(rx, agent))?;
            handles.push(handle);
        }
        Ok(Self {
            tx: Mutex::new(Some(tx)),
            handles: Mutex::new(handles),
        })
    }

    /// Stop accepting requests and wait for the workers to drain the queue.
    ///
    /// Blocks until queued requests finish or time out. A worker calling
    /// this on itself is skipped rather than joined.
    pub fn close(&self) {
        self.tx.lock().take();
        let handles = std::mem::take(&mut *self.handles.lock());
        let current = thread::current().id();
        for handle in handles {
            if handle.thread().id() == current {
                continue;
            }
            if handle.join().is_err() {
                warn!("UreqEngine: worker thread panicked");
            }
        }
    }
}

impl HttpEngine for UreqEngine {
    fn submit(
        &self,
        request: EnvelopeRequest,
        on_complete: CompletionCallback,
    ) -> Result<(), SubmissionError> {
        let Some(tx) = self.tx.lock().clone() else {
            return Err(SubmissionError::Closed);
        };
        match tx.try_send(Job {
            request,
            on_complete,
        }) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(SubmissionError::QueueFull),
            Err(TrySendError::Disconnected(_)) => Err(SubmissionError::Closed),
        }
    }
}

impl Drop for UreqEngine {
    fn drop(&mut self) {
        // Detach: workers finish whatever is queued, then exit.
        self.tx.get_mut().take();
    }
}

impl std::fmt::Debug for UreqEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UreqEngine")
            .field("workers", &self.handles.lock().len())
            .field("open", &self.tx.lock().is_some())
            .finish()
    }
}

fn build_agent(config: &TransportConfig) -> io::Result<Agent> {
    let mut builder = TlsConnector::builder();
    if config.accept_invalid_certs {
        builder.danger_accept_invalid_certs(true);
        builder.danger_accept_invalid_hostnames(true);
    }
    let tls = builder.build().map_err(io::Error::other)?;
    Ok(AgentBuilder::new()
        .timeout_connect(config.connect_timeout)
        .timeout(config.request_timeout)
        .tls_connector(Arc::new(tls))
        .build())
}

fn worker_loop(rx: Receiver<Job>, agent: Agent) {
    for job in rx.iter() {
        let Job {
            request,
            on_complete,
        } = job;
        let outcome = execute_request(&agent, &request);
        debug!(
            "UreqEngine: request {} finished with {:?}",
            request.id, outcome
        );
        on_complete(request.id, outcome);
    }
}

fn execute_request(agent: &Agent, request: &EnvelopeRequest) -> DeliveryOutcome {
    let mut req = agent.post(&request.url);
    for (name, value) in &request.headers {
        req = req.set(name, value);
    }
    match req.send_bytes(request.body.as_bytes()) {
        Ok(response) => DeliveryOutcome::from_status(response.status()),
        Err(ureq::Error::Status(code, _)) => DeliveryOutcome::from_status(code),
        Err(ureq::Error::Transport(err)) => DeliveryOutcome::Failed(err.to_string()),
    }
}
